#![forbid(unsafe_code)]

pub mod file;
pub mod repository;

pub use file::JsonFileRepository;
pub use repository::{InMemoryRepository, ProgressRepository, Storage, StorageError};
