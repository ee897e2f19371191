// src/pipeline.rs
//
// One hunting cycle: crawl, reconcile with the previous snapshot, persist,
// then score and announce whatever is new.

use crate::crawler::{DocumentSource, SuumoScraper};
use crate::domain::{diff_new, merge, Listing, ScoredListing};
use crate::errors::CycleError;
use crate::notifier::Notifier;
use crate::storage::SnapshotStore;
use crate::valuation::Analyzer;
use chrono::{DateTime, Utc};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// What a cycle produced, including partial results when it stopped early.
#[derive(Debug)]
pub struct CycleReport {
    pub merged: Vec<Listing>,
    pub new_listings: Vec<ScoredListing>,
    pub pages_fetched: u32,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub error: Option<CycleError>,
}

impl CycleReport {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }

    fn empty(started_at: DateTime<Utc>) -> Self {
        Self {
            merged: Vec::new(),
            new_listings: Vec::new(),
            pages_fetched: 0,
            started_at,
            finished_at: started_at,
            error: None,
        }
    }

    fn finish(mut self, error: Option<CycleError>) -> Self {
        self.finished_at = Utc::now();
        self.error = error;
        self
    }
}

pub struct Hunter<S, St, N> {
    scraper: SuumoScraper<S>,
    store: St,
    notifier: N,
    analyzer: Analyzer,
}

impl<S, St, N> Hunter<S, St, N>
where
    S: DocumentSource,
    St: SnapshotStore,
    N: Notifier,
{
    pub fn new(scraper: SuumoScraper<S>, store: St, notifier: N, analyzer: Analyzer) -> Self {
        Self {
            scraper,
            store,
            notifier,
            analyzer,
        }
    }

    /// Loads the last snapshot and runs one cycle against it.
    pub async fn run(&self, cancel: &CancellationToken) -> CycleReport {
        let previous = match self.store.load().await {
            Ok(previous) => previous,
            Err(e) => {
                warn!(error = %e, "could not load snapshot");
                return CycleReport::empty(Utc::now()).finish(Some(e.into()));
            }
        };
        self.run_cycle(&previous, cancel).await
    }

    pub async fn run_cycle(&self, previous: &[Listing], cancel: &CancellationToken) -> CycleReport {
        let mut report = CycleReport::empty(Utc::now());

        let outcome = self.scraper.crawl(cancel).await;
        report.pages_fetched = outcome.pages_fetched;

        if let Some(e) = outcome.error().cloned() {
            // Partial results are reported but never saved or announced.
            report.merged = merge(&outcome.listings, previous);
            warn!(
                error = %e,
                scraped = outcome.listings.len(),
                pages = outcome.pages_fetched,
                "crawl stopped early, snapshot left untouched"
            );
            return report.finish(Some(e.into()));
        }

        let fresh = diff_new(&outcome.listings, previous);
        report.merged = merge(&outcome.listings, previous);
        info!(
            scraped = outcome.listings.len(),
            previous = previous.len(),
            new = fresh.len(),
            merged = report.merged.len(),
            "reconciled listings"
        );

        if let Err(e) = self.store.save(&report.merged).await {
            return report.finish(Some(e.into()));
        }

        if fresh.is_empty() {
            info!("no new listings");
            return report.finish(None);
        }

        report.new_listings = self.analyzer.analyze(&report.merged, &fresh);
        if let Err(e) = self.notifier.notify(&report.new_listings).await {
            return report.finish(Some(e.into()));
        }

        report.finish(None)
    }
}
