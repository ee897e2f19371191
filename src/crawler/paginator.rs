// src/crawler/paginator.rs

use crate::config::CrawlConfig;
use crate::crawler::extractor::{has_next_page, ListingExtractor};
use crate::crawler::fetcher::{DocumentSource, PageFetcher};
use crate::crawler::{CrawlError, FetchError};
use crate::domain::Listing;
use std::collections::HashSet;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use url::Url;

/// How a crawl ended.
#[derive(Debug, Clone, PartialEq)]
pub enum CrawlStatus {
    /// No next page, or the page ceiling was reached.
    Exhausted,
    Cancelled(CrawlError),
    Failed(CrawlError),
}

/// Listings gathered by one crawl, whatever its ending.
#[derive(Debug, Clone)]
pub struct CrawlOutcome {
    pub listings: Vec<Listing>,
    pub pages_fetched: u32,
    pub status: CrawlStatus,
}

impl CrawlOutcome {
    pub fn error(&self) -> Option<&CrawlError> {
        match &self.status {
            CrawlStatus::Exhausted => None,
            CrawlStatus::Cancelled(e) | CrawlStatus::Failed(e) => Some(e),
        }
    }
}

/// Walks the paginated search results one page at a time.
pub struct SuumoScraper<S> {
    fetcher: PageFetcher<S>,
    extractor: ListingExtractor,
    config: CrawlConfig,
}

impl<S: DocumentSource> SuumoScraper<S> {
    pub fn new(fetcher: PageFetcher<S>, config: CrawlConfig) -> Self {
        let mut site_root = config.search_url.clone();
        site_root.set_path("/");
        site_root.set_query(None);
        site_root.set_fragment(None);

        Self {
            fetcher,
            extractor: ListingExtractor::new(site_root),
            config,
        }
    }

    /// Crawls from page 1 until there is no next page, `max_pages` is hit,
    /// a page fails after retries, or `cancel` fires. Listings are
    /// de-duplicated by id; the first page an id appears on wins.
    pub async fn crawl(&self, cancel: &CancellationToken) -> CrawlOutcome {
        let mut listings: Vec<Listing> = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();
        let mut pages_fetched = 0;
        let mut page = 1;

        let status = loop {
            if cancel.is_cancelled() {
                info!(page, "crawl cancelled");
                break CrawlStatus::Cancelled(CrawlError::Cancelled { page });
            }

            let url = self.page_url(page);
            info!(page, %url, "scraping page");

            let (found, has_next) = match self.fetcher.fetch(&url, cancel).await {
                Ok(document) => (self.extractor.extract(&document), has_next_page(&document)),
                Err(FetchError::Cancelled) => {
                    info!(page, "crawl cancelled during fetch");
                    break CrawlStatus::Cancelled(CrawlError::Cancelled { page });
                }
                Err(source) => {
                    warn!(page, error = %source, "page failed, stopping crawl");
                    break CrawlStatus::Failed(CrawlError::Page { page, source });
                }
            };
            pages_fetched += 1;

            let found_count = found.len();
            let before = listings.len();
            for listing in found {
                if seen.insert(listing.id.clone()) {
                    listings.push(listing);
                }
            }
            info!(
                page,
                found = found_count,
                added = listings.len() - before,
                total = listings.len(),
                "page parsed"
            );

            if !has_next {
                info!(page, "no next page");
                break CrawlStatus::Exhausted;
            }
            if page >= self.config.max_pages {
                info!(page, max_pages = self.config.max_pages, "page limit reached");
                break CrawlStatus::Exhausted;
            }
            page += 1;

            if !self.config.page_delay.is_zero() {
                tokio::select! {
                    _ = cancel.cancelled() => {}
                    _ = tokio::time::sleep(self.config.page_delay) => {}
                }
            }
        };

        CrawlOutcome {
            listings,
            pages_fetched,
            status,
        }
    }

    /// Search URL with `page=N` appended to its query as written. A query
    /// already ending in `page=` just gets the number.
    pub fn page_url(&self, page: u32) -> Url {
        let mut url = self.config.search_url.clone();
        let query = match url.query() {
            None | Some("") => format!("page={page}"),
            Some(q) if q.ends_with("page=") => format!("{q}{page}"),
            Some(q) => format!("{q}&page={page}"),
        };
        url.set_query(Some(&query));
        url
    }
}
