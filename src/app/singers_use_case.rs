use crate::app::ports::{PageFetcher, RecordSink};
use crate::config::CrawlerConfig;
use crate::error::{Result, ScraperError};
use crate::pipeline::crawler::{CrawlEngine, CrawlSummary};
use crate::pipeline::csv_out::write_table;
use crate::scrapers::singers::clean_records;
use crate::storage::{load_raw_records, JsonArraySink};
use std::fs;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn, Span};

/// Outcome of a full fetch-and-clean run
#[derive(Debug)]
pub struct SingersReport {
    pub crawl: CrawlSummary,
    pub rows_written: usize,
    pub output: PathBuf,
}

/// Crawl singers into an intermediate JSON file, then clean it into a table
pub struct SingersUseCase {
    config: CrawlerConfig,
    fetcher: Arc<dyn PageFetcher>,
    span: Span,
}

impl SingersUseCase {
    pub fn new(config: CrawlerConfig, fetcher: Arc<dyn PageFetcher>, span: Span) -> Self {
        Self {
            config,
            fetcher,
            span,
        }
    }

    /// Crawls every performer into `dest_json`
    pub async fn crawl<S>(&self, dest_json: &Path, shutdown: S) -> Result<CrawlSummary>
    where
        S: Future<Output = ()> + Send,
    {
        let sink: Arc<dyn RecordSink> = Arc::new(JsonArraySink::create(dest_json)?);
        let engine = CrawlEngine::new(self.fetcher.clone(), &self.config, self.span.clone());
        engine.run(&self.config.start_url, sink, shutdown).await
    }

    /// Cleans the raw records in `src_json` into the CSV `dest_csv`
    pub fn clean(src_json: &Path, dest_csv: &Path) -> Result<usize> {
        let raw = load_raw_records(src_json)?;
        let rows = clean_records(&raw)?;
        write_table(&rows, dest_csv)?;
        Ok(rows.len())
    }

    /// Crawls next to `singer_file` (same name, `.json` extension), cleans the
    /// result into `singer_file` and removes the intermediate file.
    pub async fn get_singers<S>(&self, singer_file: &Path, shutdown: S) -> Result<SingersReport>
    where
        S: Future<Output = ()> + Send,
    {
        let scraped = intermediate_path(singer_file)?;

        let crawl = self.crawl(&scraped, shutdown).await?;
        if crawl.cancelled {
            warn!("Crawl was cancelled; cleaning the {} records gathered so far", crawl.records);
        }

        let rows_written = Self::clean(&scraped, singer_file)?;
        if let Err(e) = fs::remove_file(&scraped) {
            warn!("Could not remove {}: {}", scraped.display(), e);
        }
        info!("Singers table ready at {}", singer_file.display());

        Ok(SingersReport {
            crawl,
            rows_written,
            output: singer_file.to_path_buf(),
        })
    }
}

/// The raw JSON lives beside the table, under the same stem
pub fn intermediate_path(singer_file: &Path) -> Result<PathBuf> {
    let is_json = singer_file
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("json"))
        .unwrap_or(false);
    if is_json {
        return Err(ScraperError::Config(format!(
            "output '{}' would collide with the intermediate JSON file",
            singer_file.display()
        )));
    }
    Ok(singer_file.with_extension("json"))
}
