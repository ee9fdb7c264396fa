use crate::app::ports::{PageFetcher, RecordSink};
use crate::config::CrawlerConfig;
use crate::error::Result;
use crate::observability::metrics;
use crate::pipeline::rate_limiter::{Limits, RateLimiter};
use crate::scrapers::singers::{process, CrawlTask, TaskOutput};
use chrono::{DateTime, Utc};
use std::collections::{HashSet, VecDeque};
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::{JoinError, JoinSet};
use tracing::{debug, info, warn, Instrument, Span};
use uuid::Uuid;

/// Result of a crawl run
#[derive(Debug, Clone)]
pub struct CrawlSummary {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub index_pages: usize,
    pub detail_pages: usize,
    pub records: usize,
    pub failed_fetches: usize,
    pub duplicates_skipped: usize,
    /// Tasks still queued or in flight when the crawl stopped early
    pub abandoned_tasks: usize,
    pub cancelled: bool,
}

type TaskResult = (CrawlTask, Result<TaskOutput>, Duration);

/// Frontier-driven crawl: a queue of pending pages consumed by at most
/// `concurrency` concurrent fetches. The crawl ends once the queue is empty
/// and nothing is in flight.
pub struct CrawlEngine {
    fetcher: Arc<dyn PageFetcher>,
    limiter: RateLimiter,
    concurrency: usize,
    shutdown_grace: Duration,
    span: Span,
}

impl CrawlEngine {
    /// `span` is the caller's logging handle; every crawl event is recorded
    /// under it.
    pub fn new(fetcher: Arc<dyn PageFetcher>, config: &CrawlerConfig, span: Span) -> Self {
        Self {
            fetcher,
            limiter: RateLimiter::new(Limits {
                requests_per_min: config.requests_per_min,
                delay: config.delay(),
            }),
            concurrency: config.concurrency.max(1) as usize,
            shutdown_grace: config.shutdown_grace(),
            span,
        }
    }

    /// Crawls from `start_url` until the frontier is exhausted or `shutdown`
    /// resolves, appending records to `sink` as they are scraped. The sink is
    /// finished in both cases.
    pub async fn run<S>(
        &self,
        start_url: &str,
        sink: Arc<dyn RecordSink>,
        shutdown: S,
    ) -> Result<CrawlSummary>
    where
        S: Future<Output = ()> + Send,
    {
        let run_id = Uuid::new_v4();
        let span = tracing::info_span!(parent: &self.span, "crawl", %run_id);
        self.run_inner(run_id, start_url, sink, shutdown)
            .instrument(span)
            .await
    }

    async fn run_inner<S>(
        &self,
        run_id: Uuid,
        start_url: &str,
        sink: Arc<dyn RecordSink>,
        shutdown: S,
    ) -> Result<CrawlSummary>
    where
        S: Future<Output = ()> + Send,
    {
        let started_at = Utc::now();
        info!("Starting crawl at {} with concurrency {}", start_url, self.concurrency);

        let mut frontier = Frontier::new(CrawlTask::index(start_url));
        let mut in_flight: JoinSet<TaskResult> = JoinSet::new();
        let mut cancelled = false;
        tokio::pin!(shutdown);

        loop {
            while in_flight.len() < self.concurrency {
                let Some(task) = frontier.pop() else { break };
                self.spawn_fetch(&mut in_flight, task);
            }
            if in_flight.is_empty() {
                break;
            }

            tokio::select! {
                _ = &mut shutdown => {
                    warn!(
                        "Shutdown requested, {} fetches in flight, {} queued",
                        in_flight.len(),
                        frontier.len()
                    );
                    cancelled = true;
                    break;
                }
                joined = in_flight.join_next() => {
                    if let Some(joined) = joined {
                        frontier.absorb(joined, sink.as_ref(), true).await?;
                    }
                }
            }
        }

        let mut abandoned = 0;
        if cancelled {
            abandoned = frontier.len();
            let grace = self.shutdown_grace;
            let drained = tokio::time::timeout(grace, async {
                while let Some(joined) = in_flight.join_next().await {
                    frontier.absorb(joined, sink.as_ref(), false).await?;
                }
                Result::Ok(())
            })
            .await;
            match drained {
                Ok(result) => result?,
                Err(_) => {
                    abandoned += in_flight.len();
                    warn!(
                        "Grace period of {:?} elapsed, aborting {} fetches",
                        grace,
                        in_flight.len()
                    );
                    in_flight.abort_all();
                }
            }
        }

        sink.finish().await?;

        let summary = CrawlSummary {
            run_id,
            started_at,
            finished_at: Utc::now(),
            index_pages: frontier.index_pages,
            detail_pages: frontier.detail_pages,
            records: frontier.records,
            failed_fetches: frontier.failed_fetches,
            duplicates_skipped: frontier.duplicates_skipped,
            abandoned_tasks: abandoned,
            cancelled,
        };
        info!(
            "Crawl finished: {} records from {} index and {} detail pages, {} failed fetches{}",
            summary.records,
            summary.index_pages,
            summary.detail_pages,
            summary.failed_fetches,
            if cancelled { " (cancelled)" } else { "" }
        );
        Ok(summary)
    }

    fn spawn_fetch(&self, in_flight: &mut JoinSet<TaskResult>, task: CrawlTask) {
        let fetcher = self.fetcher.clone();
        let limiter = self.limiter.clone();
        let span = tracing::debug_span!("fetch", kind = task.kind(), url = %task.url());
        in_flight.spawn(
            async move {
                limiter.acquire().await;
                let started = Instant::now();
                let result = match fetcher.fetch(task.url()).await {
                    // parsing is plain CPU work on the received body
                    Ok(page) => {
                        debug!(status = page.status, bytes = page.body.len(), "Fetched {}", page.url);
                        process(&task, &page)
                    }
                    Err(e) => Err(e),
                };
                (task, result, started.elapsed())
            }
            .instrument(span),
        );
    }
}

/// Pending work plus bookkeeping: every URL is scheduled at most once
struct Frontier {
    queue: VecDeque<CrawlTask>,
    seen: HashSet<String>,
    index_pages: usize,
    detail_pages: usize,
    records: usize,
    failed_fetches: usize,
    duplicates_skipped: usize,
}

impl Frontier {
    fn new(start: CrawlTask) -> Self {
        let mut seen = HashSet::new();
        seen.insert(start.url().to_string());
        Self {
            queue: VecDeque::from([start]),
            seen,
            index_pages: 0,
            detail_pages: 0,
            records: 0,
            failed_fetches: 0,
            duplicates_skipped: 0,
        }
    }

    fn pop(&mut self) -> Option<CrawlTask> {
        self.queue.pop_front()
    }

    fn len(&self) -> usize {
        self.queue.len()
    }

    fn push(&mut self, task: CrawlTask) {
        if self.seen.insert(task.url().to_string()) {
            self.queue.push_back(task);
        } else {
            debug!("Skipping already scheduled {}", task.url());
            self.duplicates_skipped += 1;
            metrics::crawl::duplicate_skipped();
        }
    }

    /// Stores a finished task's records and, when `schedule` is set, queues
    /// its follow-ups. Fetch failures are logged and dropped.
    async fn absorb(
        &mut self,
        joined: std::result::Result<TaskResult, JoinError>,
        sink: &dyn RecordSink,
        schedule: bool,
    ) -> Result<()> {
        let (task, result, elapsed) = match joined {
            Ok(done) => done,
            Err(e) => {
                warn!("Crawl task did not complete: {}", e);
                self.failed_fetches += 1;
                return Ok(());
            }
        };

        let output = match result {
            Ok(output) => output,
            Err(e) => {
                warn!(kind = task.kind(), url = %task.url(), "Dropping page: {}", e);
                self.failed_fetches += 1;
                metrics::crawl::fetch_error(task.kind());
                return Ok(());
            }
        };

        metrics::crawl::page_fetched(task.kind(), elapsed.as_secs_f64());
        match task {
            CrawlTask::Index { .. } => self.index_pages += 1,
            CrawlTask::Detail { .. } => self.detail_pages += 1,
        }

        for record in output.records {
            sink.append(record).await?;
            self.records += 1;
            metrics::crawl::record_emitted();
        }
        if schedule {
            for follow_up in output.follow_ups {
                self.push(follow_up);
            }
        }
        Ok(())
    }
}
