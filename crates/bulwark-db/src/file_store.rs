//! One JSON file per claimant under a data directory.
//!
//! Records live at `<root>/<claimant-id>.json`. Writes go to a sibling
//! `.tmp` file first and are renamed into place, so a crash mid-write
//! leaves the previous record intact.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use bulwark_claims::{ClaimStore, StoreError};
use bulwark_types::{ClaimantId, ClaimantRecord};
use uuid::Uuid;

use crate::error::DbError;

/// File extension of record files.
const RECORD_EXTENSION: &str = "json";

/// A [`ClaimStore`] backed by a directory of JSON files.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Open the store at `root`, creating the directory if needed.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Io`] if the directory cannot be created.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, DbError> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        tracing::info!(root = %root.display(), "Opened claimant store");
        Ok(Self { root })
    }

    /// The data directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn record_path(&self, id: ClaimantId) -> PathBuf {
        self.root.join(format!("{id}.{RECORD_EXTENSION}"))
    }

    /// Read the record for `id`, or `None` if no file exists.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Io`] if the file cannot be read, or
    /// [`DbError::Serialization`] if it is not a valid record.
    pub fn read_record(&self, id: ClaimantId) -> Result<Option<ClaimantRecord>, DbError> {
        let bytes = match fs::read(self.record_path(id)) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        Ok(Some(serde_json::from_slice(&bytes)?))
    }

    /// Write `record`, replacing any previous file for the same identity.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Serialization`] if encoding fails, or
    /// [`DbError::Io`] if the file cannot be written or moved into place.
    pub fn write_record(&self, record: &ClaimantRecord) -> Result<(), DbError> {
        let path = self.record_path(record.id);
        let tmp = path.with_extension(format!("{RECORD_EXTENSION}.tmp"));
        let bytes = serde_json::to_vec_pretty(record)?;
        fs::write(&tmp, bytes)?;
        fs::rename(&tmp, &path)?;
        tracing::trace!(claimant = %record.id, path = %path.display(), "Record written");
        Ok(())
    }

    /// Every identity with a record file, sorted.
    ///
    /// Files that do not look like records are logged and skipped.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Io`] if the directory cannot be read.
    pub fn record_ids(&self) -> Result<Vec<ClaimantId>, DbError> {
        let mut ids = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let path = entry?.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(RECORD_EXTENSION) {
                continue;
            }
            match parse_record_name(&path) {
                Ok(id) => ids.push(id),
                Err(e) => tracing::warn!(error = %e, "Skipping unrecognised file in data directory"),
            }
        }
        ids.sort_unstable();
        Ok(ids)
    }
}

/// Parse `<uuid>.json` into a claimant identity.
fn parse_record_name(path: &Path) -> Result<ClaimantId, DbError> {
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .and_then(|stem| Uuid::parse_str(stem).ok())
        .map(ClaimantId::from)
        .ok_or_else(|| DbError::InvalidFileName(path.display().to_string()))
}

impl ClaimStore for FileStore {
    fn load(&self, id: ClaimantId) -> Result<Option<ClaimantRecord>, StoreError> {
        let record = match self.read_record(id) {
            Ok(record) => record,
            Err(DbError::Serialization(e)) => {
                return Err(StoreError::Corrupt {
                    id,
                    reason: e.to_string(),
                });
            }
            Err(e) => return Err(e.into()),
        };
        match record {
            Some(record) if record.id != id => Err(StoreError::Corrupt {
                id,
                reason: format!("file holds the record of {}", record.id),
            }),
            other => Ok(other),
        }
    }

    fn save(&self, record: &ClaimantRecord) -> Result<(), StoreError> {
        Ok(self.write_record(record)?)
    }

    fn list_ids(&self) -> Result<Vec<ClaimantId>, StoreError> {
        Ok(self.record_ids()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_names_parse_back_to_ids() {
        let id = ClaimantId::new();
        let path = PathBuf::from(format!("/data/{id}.json"));
        assert_eq!(parse_record_name(&path).ok(), Some(id));
    }

    #[test]
    fn foreign_names_are_rejected() {
        let path = PathBuf::from("/data/notes.json");
        assert!(matches!(
            parse_record_name(&path),
            Err(DbError::InvalidFileName(_))
        ));
    }
}
