// src/storage/file_store.rs

use crate::domain::Listing;
use crate::storage::csv_format::{read_listings, write_listings};
use crate::storage::{SnapshotStore, StorageError};
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::PathBuf;
use tracing::info;

/// Snapshot kept as a CSV file on the local filesystem.
pub struct FileSnapshotStore {
    path: PathBuf,
}

impl FileSnapshotStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl SnapshotStore for FileSnapshotStore {
    async fn load(&self) -> Result<Vec<Listing>, StorageError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!(path = %self.path.display(), "no snapshot yet, starting empty");
                return Ok(Vec::new());
            }
            Err(e) => return Err(e.into()),
        };

        let listings = read_listings(bytes.as_slice())?;
        info!(path = %self.path.display(), count = listings.len(), "loaded snapshot");
        Ok(listings)
    }

    async fn save(&self, listings: &[Listing]) -> Result<(), StorageError> {
        let mut buf = Vec::new();
        write_listings(&mut buf, listings)?;

        // Write beside the target, then swap it in.
        let tmp = self.temp_path();
        tokio::fs::write(&tmp, &buf).await?;
        tokio::fs::rename(&tmp, &self.path).await?;

        info!(path = %self.path.display(), count = listings.len(), "saved snapshot");
        Ok(())
    }
}
