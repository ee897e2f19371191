pub mod discord;

use crate::domain::ScoredListing;
use async_trait::async_trait;
use thiserror::Error;

pub use discord::DiscordNotifier;

#[derive(Debug, Error)]
pub enum NotificationError {
    #[error("failed to send notification: {0}")]
    Request(String),

    #[error("webhook returned status {status}: {body}")]
    Status { status: u16, body: String },
}

impl From<reqwest::Error> for NotificationError {
    fn from(e: reqwest::Error) -> Self {
        NotificationError::Request(e.to_string())
    }
}

/// Delivers newly seen listings to a human.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// An empty slice sends nothing.
    async fn notify(&self, listings: &[ScoredListing]) -> Result<(), NotificationError>;
}
