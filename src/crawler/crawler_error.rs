use thiserror::Error;

/// Failure of a page fetch. Everything except `Cancelled` and
/// `RetriesExhausted` is retried by the page fetcher.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("network error: {0}")]
    Network(String),

    #[error("request timed out")]
    Timeout,

    #[error("unexpected status code: {0}")]
    BadStatus(u16),

    #[error("fetch cancelled")]
    Cancelled,

    #[error("gave up after {attempts} attempts: {last}")]
    RetriesExhausted {
        attempts: u32,
        last: Box<FetchError>,
    },
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            FetchError::Timeout
        } else if let Some(status) = e.status() {
            FetchError::BadStatus(status.as_u16())
        } else {
            FetchError::Network(e.to_string())
        }
    }
}

/// Why a crawl stopped early.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CrawlError {
    #[error("failed to scrape page {page}: {source}")]
    Page { page: u32, source: FetchError },

    #[error("crawl cancelled before page {page}")]
    Cancelled { page: u32 },
}
