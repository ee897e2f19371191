// src/crawler/fetcher.rs

use crate::config::{CrawlConfig, RetryConfig};
use crate::crawler::FetchError;
use async_trait::async_trait;
use rand::Rng;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE};
use reqwest::Client;
use scraper::Html;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use url::Url;

/// A single, un-retried GET returning the response body.
#[async_trait]
pub trait DocumentSource: Send + Sync {
    async fn get(&self, url: &Url) -> Result<String, FetchError>;
}

pub struct HttpDocumentSource {
    client: Client,
}

impl HttpDocumentSource {
    pub fn new(config: &CrawlConfig) -> Result<Self, FetchError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"),
        );
        headers.insert(
            ACCEPT_LANGUAGE,
            HeaderValue::from_static("ja,en-US;q=0.9,en;q=0.8"),
        );

        let client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.request_timeout)
            .default_headers(headers)
            .build()
            .map_err(|e| FetchError::Network(e.to_string()))?;

        Ok(Self { client })
    }
}

#[async_trait]
impl DocumentSource for HttpDocumentSource {
    async fn get(&self, url: &Url) -> Result<String, FetchError> {
        let resp = self.client.get(url.as_str()).send().await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::BadStatus(status.as_u16()));
        }

        Ok(resp.text().await?)
    }
}

/// Fetches and parses one page, retrying failed attempts with backoff.
pub struct PageFetcher<S> {
    source: S,
    retry: RetryConfig,
}

impl<S: DocumentSource> PageFetcher<S> {
    pub fn new(source: S, retry: RetryConfig) -> Self {
        Self { source, retry }
    }

    pub async fn fetch(&self, url: &Url, cancel: &CancellationToken) -> Result<Html, FetchError> {
        let body = self.fetch_body(url, cancel).await?;
        Ok(Html::parse_document(&body))
    }

    async fn fetch_body(&self, url: &Url, cancel: &CancellationToken) -> Result<String, FetchError> {
        let attempts = self.retry.attempts.max(1);
        let mut last_err = None;

        for attempt in 1..=attempts {
            if cancel.is_cancelled() {
                return Err(FetchError::Cancelled);
            }

            let start = Instant::now();
            let result = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(FetchError::Cancelled),
                r = self.source.get(url) => r,
            };

            match result {
                Ok(body) => {
                    debug!(%url, attempt, elapsed = ?start.elapsed(), bytes = body.len(), "fetched page");
                    return Ok(body);
                }
                Err(e) => {
                    warn!(%url, attempt, elapsed = ?start.elapsed(), error = %e, "page fetch attempt failed");
                    last_err = Some(e);

                    if attempt < attempts {
                        let delay = self.delay_after(attempt);
                        tokio::select! {
                            biased;
                            _ = cancel.cancelled() => return Err(FetchError::Cancelled),
                            _ = tokio::time::sleep(delay) => {}
                        }
                    }
                }
            }
        }

        Err(FetchError::RetriesExhausted {
            attempts,
            last: Box::new(last_err.unwrap_or_else(|| FetchError::Network("retry loop made no attempt".into()))),
        })
    }

    fn delay_after(&self, attempt: u32) -> Duration {
        let base = self.retry.backoff(attempt);
        let jitter_ms = self.retry.jitter.as_millis() as u64;
        if jitter_ms == 0 {
            return base;
        }
        base + Duration::from_millis(rand::thread_rng().gen_range(0..=jitter_ms))
    }
}
