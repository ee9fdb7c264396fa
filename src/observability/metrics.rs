//! Metric names and recording helpers for the crawl and clean phases.
//!
//! Without an installed recorder every call is a no-op.

use std::fmt;

/// All metric names used by the crate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricName {
    // Crawl metrics
    CrawlPagesFetched,
    CrawlFetchErrors,
    CrawlFetchRetries,
    CrawlFetchDuration,
    CrawlRecordsEmitted,
    CrawlDuplicatesSkipped,

    // Clean metrics
    CleanRowsWritten,
    CleanRowsSkipped,
    CleanDatesParsed,
    CleanDatesUnparsed,
}

impl MetricName {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricName::CrawlPagesFetched => "blindtest_crawl_pages_fetched_total",
            MetricName::CrawlFetchErrors => "blindtest_crawl_fetch_errors_total",
            MetricName::CrawlFetchRetries => "blindtest_crawl_fetch_retries_total",
            MetricName::CrawlFetchDuration => "blindtest_crawl_fetch_duration_seconds",
            MetricName::CrawlRecordsEmitted => "blindtest_crawl_records_emitted_total",
            MetricName::CrawlDuplicatesSkipped => "blindtest_crawl_duplicates_skipped_total",
            MetricName::CleanRowsWritten => "blindtest_clean_rows_written_total",
            MetricName::CleanRowsSkipped => "blindtest_clean_rows_skipped_total",
            MetricName::CleanDatesParsed => "blindtest_clean_dates_parsed_total",
            MetricName::CleanDatesUnparsed => "blindtest_clean_dates_unparsed_total",
        }
    }
}

impl fmt::Display for MetricName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub mod crawl {
    use super::MetricName;

    /// Record a page fetched successfully, by page kind ("index" or "detail")
    pub fn page_fetched(kind: &'static str, secs: f64) {
        ::metrics::counter!(MetricName::CrawlPagesFetched.as_str(), "kind" => kind).increment(1);
        ::metrics::histogram!(MetricName::CrawlFetchDuration.as_str(), "kind" => kind).record(secs);
    }

    pub fn fetch_error(kind: &'static str) {
        ::metrics::counter!(MetricName::CrawlFetchErrors.as_str(), "kind" => kind).increment(1);
    }

    pub fn fetch_retry() {
        ::metrics::counter!(MetricName::CrawlFetchRetries.as_str()).increment(1);
    }

    pub fn record_emitted() {
        ::metrics::counter!(MetricName::CrawlRecordsEmitted.as_str()).increment(1);
    }

    pub fn duplicate_skipped() {
        ::metrics::counter!(MetricName::CrawlDuplicatesSkipped.as_str()).increment(1);
    }
}

pub mod clean {
    use super::MetricName;

    pub fn rows_written(count: usize) {
        ::metrics::counter!(MetricName::CleanRowsWritten.as_str()).increment(count as u64);
    }

    /// Raw record dropped because no known name could be derived
    pub fn row_skipped() {
        ::metrics::counter!(MetricName::CleanRowsSkipped.as_str()).increment(1);
    }

    pub fn date_parsed(complete: bool) {
        if complete {
            ::metrics::counter!(MetricName::CleanDatesParsed.as_str()).increment(1);
        } else {
            ::metrics::counter!(MetricName::CleanDatesUnparsed.as_str()).increment(1);
        }
    }
}
