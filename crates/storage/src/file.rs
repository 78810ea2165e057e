use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use companion_core::model::{Label, MarkPolicy, ProgressStore};
use companion_core::time::truncate_to_minute;
use serde::Deserialize;
use tracing::{debug, info};

use crate::repository::{ProgressRepository, StorageError};

/// Progress persisted as a pretty-printed JSON object in a UTF-8 file.
///
/// Every write replaces the whole file in place. There is no temp-file
/// rename, so a crash mid-write can leave a truncated file; readers treat
/// that as corrupt.
#[derive(Debug, Clone)]
pub struct JsonFileRepository {
    path: PathBuf,
}

impl JsonFileRepository {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Last modification time of the backing file, or now when unknown.
    async fn modified_at(&self) -> NaiveDateTime {
        let modified = tokio::fs::metadata(&self.path)
            .await
            .and_then(|meta| meta.modified())
            .map(DateTime::<Utc>::from)
            .unwrap_or_else(|_| Utc::now());
        truncate_to_minute(modified)
    }

    fn io_error(&self, source: std::io::Error) -> StorageError {
        StorageError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

/// Decode the backing-file format.
///
/// # Errors
///
/// Returns `StorageError::Corrupt` for non-UTF-8 bytes or content that is not
/// a map of label to timestamp.
pub fn decode_store(bytes: &[u8]) -> Result<ProgressStore, StorageError> {
    let text = std::str::from_utf8(bytes).map_err(|e| StorageError::Corrupt(e.to_string()))?;
    serde_json::from_str(text).map_err(|e| StorageError::Corrupt(e.to_string()))
}

/// Layout written by the first release: a plain list with no timestamps.
#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct ReadSurahsFile {
    read_surahs: Vec<Label>,
}

/// Decode the first-release `{"read_surahs": [...]}` layout, stamping every
/// label with `imported_at`. Returns `None` when `bytes` is not that layout.
#[must_use]
pub fn decode_read_surahs(bytes: &[u8], imported_at: NaiveDateTime) -> Option<ProgressStore> {
    let file: ReadSurahsFile = serde_json::from_slice(bytes).ok()?;
    let mut store = ProgressStore::new();
    for label in file.read_surahs {
        store.mark(label, imported_at, MarkPolicy::Idempotent);
    }
    Some(store)
}

/// Encode a store in the backing-file format.
///
/// # Errors
///
/// Returns `StorageError::Serialization` if encoding fails.
pub fn encode_store(store: &ProgressStore) -> Result<Vec<u8>, StorageError> {
    let mut bytes =
        serde_json::to_vec_pretty(store).map_err(|e| StorageError::Serialization(e.to_string()))?;
    bytes.push(b'\n');
    Ok(bytes)
}

#[async_trait]
impl ProgressRepository for JsonFileRepository {
    async fn read_store(&self) -> Result<Option<ProgressStore>, StorageError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no progress file yet");
                return Ok(None);
            }
            Err(err) => return Err(self.io_error(err)),
        };
        let store = match decode_store(&bytes) {
            Ok(store) => store,
            Err(err) => {
                let imported_at = self.modified_at().await;
                let Some(store) = decode_read_surahs(&bytes, imported_at) else {
                    return Err(err);
                };
                info!(
                    path = %self.path.display(),
                    entries = store.len(),
                    "importing read_surahs progress layout"
                );
                store
            }
        };
        debug!(path = %self.path.display(), entries = store.len(), "loaded progress file");
        Ok(Some(store))
    }

    async fn write_store(&self, store: &ProgressStore) -> Result<(), StorageError> {
        let bytes = encode_store(store)?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| self.io_error(e))?;
        }
        tokio::fs::write(&self.path, bytes)
            .await
            .map_err(|e| self.io_error(e))?;
        debug!(path = %self.path.display(), entries = store.len(), "wrote progress file");
        Ok(())
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_rejects_invalid_utf8() {
        let err = decode_store(&[0xff, 0xfe, 0x00]).unwrap_err();
        assert!(err.is_corrupt());
    }

    #[test]
    fn decode_accepts_empty_object() {
        assert!(decode_store(b"{}").unwrap().is_empty());
    }

    #[test]
    fn read_surahs_layout_keeps_order_and_drops_repeats() {
        let at = companion_core::time::fixed_clock().completion_stamp();
        let store = decode_read_surahs(
            br#"{"read_surahs": ["Al-Fatiha", "Al-Ikhlas", "Al-Fatiha"]}"#,
            at,
        )
        .unwrap();
        assert_eq!(store.labels(), vec!["Al-Fatiha", "Al-Ikhlas"]);
        assert_eq!(store.get("Al-Ikhlas").unwrap().completed_at(), at);
    }

    #[test]
    fn read_surahs_layout_rejects_other_shapes() {
        let at = companion_core::time::fixed_clock().completion_stamp();
        assert!(decode_read_surahs(br#"{"read_surahs": ["  "]}"#, at).is_none());
        assert!(decode_read_surahs(br#"{"read_surahs": [], "extra": 1}"#, at).is_none());
        assert!(decode_read_surahs(br#"{"Al-Fatiha": "2025-03-01 04:00"}"#, at).is_none());
    }

    #[test]
    fn encode_ends_with_newline() {
        let bytes = encode_store(&ProgressStore::new()).unwrap();
        assert_eq!(bytes, b"{}\n");
    }
}
