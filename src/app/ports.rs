use crate::error::Result;
use crate::types::RawRecord;
use async_trait::async_trait;

// Crawl-side ports
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// GET `url`; non-success statuses are errors
    async fn fetch(&self, url: &str) -> Result<FetchedPage>;
}

#[derive(Clone, Debug)]
pub struct FetchedPage {
    /// Final URL after redirects, used to resolve relative links
    pub url: String,
    pub status: u16,
    pub body: String,
}

/// Destination for raw records as they are scraped.
///
/// Implementations accept concurrent appends; each call stores exactly one
/// whole record.
#[async_trait]
pub trait RecordSink: Send + Sync {
    async fn append(&self, record: RawRecord) -> Result<()>;

    /// Closes the sink; records appended so far stay persisted
    async fn finish(&self) -> Result<()>;
}
