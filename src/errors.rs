// errors.rs

use crate::crawler::{CrawlError, FetchError};
use crate::notifier::NotificationError;
use crate::storage::StorageError;
use thiserror::Error;

/// Why a hunting cycle stopped short of notifying.
#[derive(Debug, Error)]
pub enum CycleError {
    #[error("crawl failed on page {page}: {source}")]
    Crawl { page: u32, source: FetchError },

    #[error("crawl cancelled at page {page}")]
    Cancelled { page: u32 },

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Notification(#[from] NotificationError),
}

impl From<CrawlError> for CycleError {
    fn from(e: CrawlError) -> Self {
        match e {
            CrawlError::Page { page, source } => CycleError::Crawl { page, source },
            CrawlError::Cancelled { page } => CycleError::Cancelled { page },
        }
    }
}
