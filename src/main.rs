use crate::config::AppConfig;
use crate::crawler::{HttpDocumentSource, PageFetcher, SuumoScraper};
use crate::notifier::DiscordNotifier;
use crate::pipeline::Hunter;
use crate::storage::FileSnapshotStore;
use crate::valuation::Analyzer;
use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod config;
mod crawler;
mod domain;
mod errors;
mod notifier;
mod pipeline;
mod storage;
mod valuation;

#[cfg(test)]
mod tests;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::from_env().context("invalid configuration")?;
    info!(
        search_url = %config.crawl.search_url,
        max_pages = config.crawl.max_pages,
        snapshot = %config.snapshot_path.display(),
        "rent hunter starting"
    );

    let source = HttpDocumentSource::new(&config.crawl).context("failed to build HTTP client")?;
    let scraper = SuumoScraper::new(
        PageFetcher::new(source, config.retry.clone()),
        config.crawl.clone(),
    );
    let hunter = Hunter::new(
        scraper,
        FileSnapshotStore::new(&config.snapshot_path),
        DiscordNotifier::new(config.webhook_url.clone()),
        Analyzer::new(config.valuation.clone()),
    );

    let cancel = CancellationToken::new();
    let watcher = {
        let cancel = cancel.clone();
        let timeout = config.cycle_timeout;
        tokio::spawn(async move {
            let deadline = async {
                match timeout {
                    Some(limit) => tokio::time::sleep(limit).await,
                    None => std::future::pending::<()>().await,
                }
            };
            tokio::select! {
                _ = tokio::signal::ctrl_c() => warn!("interrupted, cancelling cycle"),
                _ = deadline => warn!("cycle timeout reached, cancelling"),
                _ = cancel.cancelled() => {}
            }
            cancel.cancel();
        })
    };

    let mut report = hunter.run(&cancel).await;
    cancel.cancel();
    watcher.await.ok();

    info!(
        ok = report.is_ok(),
        pages = report.pages_fetched,
        merged = report.merged.len(),
        new = report.new_listings.len(),
        elapsed_ms = (report.finished_at - report.started_at).num_milliseconds(),
        "cycle finished"
    );

    match report.error.take() {
        Some(e) => Err(anyhow::Error::new(e).context("cycle failed")),
        None => Ok(()),
    }
}
