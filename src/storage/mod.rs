pub mod csv_format;
pub mod file_store;

use crate::domain::Listing;
use async_trait::async_trait;
use thiserror::Error;

pub use file_store::FileSnapshotStore;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("snapshot I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("snapshot CSV is malformed: {0}")]
    Csv(#[from] csv::Error),

    #[error("snapshot is missing required column {0:?}")]
    MissingColumn(&'static str),
}

/// Where the previous cycle's merged listings live between runs.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Returns an empty collection when nothing has been saved yet.
    async fn load(&self) -> Result<Vec<Listing>, StorageError>;

    async fn save(&self, listings: &[Listing]) -> Result<(), StorageError>;
}
