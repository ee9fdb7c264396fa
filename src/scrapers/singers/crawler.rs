use crate::app::ports::FetchedPage;
use crate::error::{Result, ScraperError};
use crate::scrapers::singers::parser::{self, PerformerLink};
use crate::types::RawRecord;
use reqwest::Url;

/// One unit of crawl work: a page to fetch and how to read it
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CrawlTask {
    /// Category index page
    Index { url: String },
    /// Performer page, with the name shown on the index as fallback
    Detail { url: String, name: String },
}

impl CrawlTask {
    pub fn index(url: impl Into<String>) -> Self {
        CrawlTask::Index { url: url.into() }
    }

    pub fn url(&self) -> &str {
        match self {
            CrawlTask::Index { url } | CrawlTask::Detail { url, .. } => url,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            CrawlTask::Index { .. } => "index",
            CrawlTask::Detail { .. } => "detail",
        }
    }
}

/// Records ready for the sink plus further pages to schedule
#[derive(Debug, Default)]
pub struct TaskOutput {
    pub records: Vec<RawRecord>,
    pub follow_ups: Vec<CrawlTask>,
}

/// Turns a fetched page into records and follow-up tasks
pub fn process(task: &CrawlTask, page: &FetchedPage) -> Result<TaskOutput> {
    match task {
        CrawlTask::Index { .. } => {
            let base = Url::parse(&page.url).map_err(|e| {
                ScraperError::fetch(&page.url, format!("unusable page URL: {}", e))
            })?;
            let index = parser::discover(&base, &page.body);

            let mut output = TaskOutput::default();
            for performer in index.performers {
                match performer {
                    PerformerLink::Detail { url, name } => {
                        output.follow_ups.push(CrawlTask::Detail { url, name })
                    }
                    PerformerLink::Unlinked { name } => output.records.push(RawRecord::new(name)),
                }
            }
            if let Some(next) = index.next_page {
                output.follow_ups.push(CrawlTask::index(next.into_string()));
            }
            Ok(output)
        }
        CrawlTask::Detail { name, .. } => Ok(TaskOutput {
            records: vec![parser::extract(&page.body, name)],
            follow_ups: Vec::new(),
        }),
    }
}
