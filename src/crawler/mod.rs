mod crawler_error;
pub mod extractor;
pub mod fetcher;
pub mod paginator;

pub use crawler_error::{CrawlError, FetchError};
pub use fetcher::{DocumentSource, HttpDocumentSource, PageFetcher};
pub use paginator::SuumoScraper;
