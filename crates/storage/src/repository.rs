use async_trait::async_trait;
use companion_core::model::ProgressStore;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use thiserror::Error;

use crate::file::JsonFileRepository;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("i/o error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed progress data: {0}")]
    Corrupt(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("in-memory progress lock poisoned: {0}")]
    LockPoisoned(String),
}

impl StorageError {
    /// True for errors caused by unreadable persisted content rather than I/O.
    #[must_use]
    pub fn is_corrupt(&self) -> bool {
        matches!(self, StorageError::Corrupt(_))
    }
}

/// Persistence contract for a single progress store.
#[async_trait]
pub trait ProgressRepository: Send + Sync {
    /// Read the whole persisted store.
    ///
    /// Returns `Ok(None)` when nothing has been persisted yet.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Corrupt` if the content cannot be decoded, or
    /// another `StorageError` if it cannot be read at all.
    async fn read_store(&self) -> Result<Option<ProgressStore>, StorageError>;

    /// Replace the persisted store with `store`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the store cannot be written.
    async fn write_store(&self, store: &ProgressStore) -> Result<(), StorageError>;

    /// Human-readable location, used in warnings.
    fn location(&self) -> String;
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    slot: Arc<Mutex<Option<ProgressStore>>>,
    writes: Arc<AtomicUsize>,
    fail_writes: Arc<AtomicBool>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Repository that already holds `store`.
    #[must_use]
    pub fn with_store(store: ProgressStore) -> Self {
        let repo = Self::new();
        if let Ok(mut guard) = repo.slot.lock() {
            *guard = Some(store);
        }
        repo
    }

    /// Number of successful `write_store` calls so far.
    #[must_use]
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Make subsequent writes fail, simulating a full disk or revoked permissions.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Snapshot of what is currently persisted.
    #[must_use]
    pub fn persisted(&self) -> Option<ProgressStore> {
        self.slot.lock().ok().and_then(|guard| guard.clone())
    }
}

#[async_trait]
impl ProgressRepository for InMemoryRepository {
    async fn read_store(&self) -> Result<Option<ProgressStore>, StorageError> {
        let guard = self
            .slot
            .lock()
            .map_err(|e| StorageError::LockPoisoned(e.to_string()))?;
        Ok(guard.clone())
    }

    async fn write_store(&self, store: &ProgressStore) -> Result<(), StorageError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StorageError::Io {
                path: PathBuf::from(self.location()),
                source: std::io::Error::new(
                    std::io::ErrorKind::PermissionDenied,
                    "writes disabled",
                ),
            });
        }
        let mut guard = self
            .slot
            .lock()
            .map_err(|e| StorageError::LockPoisoned(e.to_string()))?;
        *guard = Some(store.clone());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn location(&self) -> String {
        "memory".to_owned()
    }
}

/// Holds the progress repository behind a trait object for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub progress: Arc<dyn ProgressRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let progress: Arc<dyn ProgressRepository> = Arc::new(InMemoryRepository::new());
        Self { progress }
    }

    /// Storage backed by a JSON file at `path`. Nothing is touched until the first read or write.
    #[must_use]
    pub fn json_file(path: impl Into<PathBuf>) -> Self {
        let progress: Arc<dyn ProgressRepository> = Arc::new(JsonFileRepository::new(path));
        Self { progress }
    }
}
