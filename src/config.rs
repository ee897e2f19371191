// src/config.rs

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;
use url::Url;

pub const DEFAULT_MAX_PAGES: u32 = 30;
pub const DEFAULT_RETRY_ATTEMPTS: u32 = 3;
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(10);
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_SNAPSHOT_PATH: &str = "properties.csv";

pub const USER_AGENT: &str =
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("required environment variable {0} is not set")]
    Missing(&'static str),

    #[error("environment variable {key} has invalid value {value:?}")]
    Invalid { key: &'static str, value: String },
}

/// Retry policy for a single page fetch.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Total attempts, including the first one.
    pub attempts: u32,
    /// Delay before the second attempt; doubles for each later attempt.
    pub base_delay: Duration,
    pub max_delay: Duration,
    /// Upper bound of the random jitter added to every delay.
    pub jitter: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            attempts: DEFAULT_RETRY_ATTEMPTS,
            base_delay: DEFAULT_RETRY_DELAY,
            max_delay: Duration::from_secs(60),
            jitter: Duration::from_secs(1),
        }
    }
}

impl RetryConfig {
    /// Delay to wait after failed attempt number `attempt` (1-based),
    /// before jitter.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.base_delay
            .checked_mul(factor)
            .map_or(self.max_delay, |d| d.min(self.max_delay))
    }
}

/// How far and how fast to walk the search results.
#[derive(Debug, Clone)]
pub struct CrawlConfig {
    pub search_url: Url,
    /// Hard ceiling on pages fetched in one cycle.
    pub max_pages: u32,
    /// Pause between consecutive pages.
    pub page_delay: Duration,
    pub request_timeout: Duration,
    pub user_agent: String,
}

impl CrawlConfig {
    pub fn new(search_url: Url) -> Self {
        Self {
            search_url,
            max_pages: DEFAULT_MAX_PAGES,
            page_delay: Duration::ZERO,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            user_agent: USER_AGENT.to_string(),
        }
    }
}

/// Regression and labelling parameters.
#[derive(Debug, Clone)]
pub struct ValuationConfig {
    /// Fewer listings than this and nothing gets scored.
    pub min_samples: usize,
    /// Yen per month; a score at or beyond +/- this value is a bargain / expensive.
    pub bargain_threshold: f64,
}

impl Default for ValuationConfig {
    fn default() -> Self {
        Self {
            min_samples: 10,
            bargain_threshold: 10_000.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub crawl: CrawlConfig,
    pub retry: RetryConfig,
    pub valuation: ValuationConfig,
    pub webhook_url: String,
    pub snapshot_path: PathBuf,
    /// Cancel the cycle once this much time has passed.
    pub cycle_timeout: Option<Duration>,
}

impl AppConfig {
    /// Reads configuration from the process environment (after `.env`).
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let raw_url = required(&lookup, "SUUMO_SEARCH_URL")?;
        let search_url = Url::parse(&raw_url).map_err(|_| ConfigError::Invalid {
            key: "SUUMO_SEARCH_URL",
            value: raw_url.clone(),
        })?;
        let webhook_url = required(&lookup, "DISCORD_WEBHOOK_URL")?;

        let mut crawl = CrawlConfig::new(search_url);
        crawl.max_pages = optional(&lookup, "MAX_PAGE")?.unwrap_or(DEFAULT_MAX_PAGES);
        crawl.page_delay = optional(&lookup, "PAGE_DELAY_MS")?
            .map(Duration::from_millis)
            .unwrap_or(Duration::ZERO);
        crawl.request_timeout = optional(&lookup, "REQUEST_TIMEOUT_SECS")?
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_REQUEST_TIMEOUT);

        if crawl.max_pages == 0 {
            return Err(ConfigError::Invalid {
                key: "MAX_PAGE",
                value: "0".into(),
            });
        }

        let retry = RetryConfig {
            attempts: optional(&lookup, "RETRY_ATTEMPTS")?.unwrap_or(DEFAULT_RETRY_ATTEMPTS),
            base_delay: optional(&lookup, "RETRY_DELAY_SECS")?
                .map(Duration::from_secs)
                .unwrap_or(DEFAULT_RETRY_DELAY),
            ..RetryConfig::default()
        };

        Ok(Self {
            crawl,
            retry,
            valuation: ValuationConfig::default(),
            webhook_url,
            snapshot_path: lookup("SNAPSHOT_PATH")
                .filter(|s| !s.is_empty())
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_SNAPSHOT_PATH)),
            cycle_timeout: optional(&lookup, "CYCLE_TIMEOUT_SECS")?.map(Duration::from_secs),
        })
    }
}

fn required<F>(lookup: &F, key: &'static str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .filter(|v| !v.trim().is_empty())
        .ok_or(ConfigError::Missing(key))
}

fn optional<F, T>(lookup: &F, key: &'static str) -> Result<Option<T>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key).filter(|v| !v.trim().is_empty()) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::Invalid { key, value }),
    }
}
