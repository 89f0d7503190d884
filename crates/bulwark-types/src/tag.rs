//! The smallest ownable area of the world.
//!
//! A [`ClaimTag`] names one chunk column: a world (dimension) identifier plus
//! chunk coordinates. Tags are plain values; ownership of a tag lives in the
//! registry index, never in the tag itself.

use serde::{Deserialize, Serialize};

/// Number of blocks along one edge of a claim unit.
pub const UNIT_SIZE: i32 = 16;

/// Identifies one spatial claim unit: `(world, x, z)` in unit coordinates.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ClaimTag {
    /// World or dimension identifier, e.g. `minecraft:overworld`.
    pub world: String,
    /// Unit X coordinate.
    pub x: i32,
    /// Unit Z coordinate.
    pub z: i32,
}

impl ClaimTag {
    /// Create a tag from unit coordinates.
    pub fn new(world: impl Into<String>, x: i32, z: i32) -> Self {
        Self {
            world: world.into(),
            x,
            z,
        }
    }

    /// Create the tag of the unit containing a block position.
    ///
    /// Uses floor division so negative block coordinates map to the unit
    /// on their side of the origin.
    pub fn containing_block(world: impl Into<String>, block_x: i32, block_z: i32) -> Self {
        Self::new(
            world,
            block_x.div_euclid(UNIT_SIZE),
            block_z.div_euclid(UNIT_SIZE),
        )
    }
}

impl core::fmt::Display for ClaimTag {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}[{}, {}]", self.world, self.x, self.z)
    }
}
