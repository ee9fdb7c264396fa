use crate::app::ports::{FetchedPage, PageFetcher};
use crate::config::CrawlerConfig;
use crate::error::{Result, ScraperError};
use crate::observability::metrics;
use async_trait::async_trait;
use reqwest::StatusCode;
use std::time::Duration;
use tracing::{debug, warn};

/// Statuses worth another attempt
const RETRY_STATUSES: [u16; 8] = [408, 429, 500, 502, 503, 504, 522, 524];

/// `PageFetcher` over a shared reqwest client, with retry and backoff
pub struct ReqwestFetcher {
    client: reqwest::Client,
    max_retries: u32,
    backoff: Duration,
}

impl ReqwestFetcher {
    pub fn new(config: &CrawlerConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(config.timeout())
            .build()?;
        Ok(Self::from_client(client, config))
    }

    /// Uses `client` as built; only the retry settings are read from `config`
    pub fn from_client(client: reqwest::Client, config: &CrawlerConfig) -> Self {
        Self {
            client,
            max_retries: config.max_retries,
            backoff: Duration::from_millis(config.retry_backoff_ms),
        }
    }

    async fn fetch_once(&self, url: &str) -> std::result::Result<FetchedPage, Attempt> {
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| Attempt::Retry(e.to_string()))?;
        let status = resp.status();
        let final_url = resp.url().to_string();

        if !status.is_success() {
            let message = format!("HTTP status {}", status.as_u16());
            return Err(if is_retryable(status) {
                Attempt::Retry(message)
            } else {
                Attempt::Fatal(message)
            });
        }

        let body = resp.text().await.map_err(|e| Attempt::Retry(e.to_string()))?;
        Ok(FetchedPage {
            url: final_url,
            status: status.as_u16(),
            body,
        })
    }
}

enum Attempt {
    Retry(String),
    Fatal(String),
}

fn is_retryable(status: StatusCode) -> bool {
    RETRY_STATUSES.contains(&status.as_u16())
}

#[async_trait]
impl PageFetcher for ReqwestFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedPage> {
        let mut attempt = 0u32;
        loop {
            match self.fetch_once(url).await {
                Ok(page) => return Ok(page),
                Err(Attempt::Fatal(message)) => return Err(ScraperError::fetch(url, message)),
                Err(Attempt::Retry(message)) if attempt < self.max_retries => {
                    attempt += 1;
                    let wait = self.backoff * 2u32.saturating_pow(attempt - 1);
                    debug!(url, attempt, ?wait, "Retrying fetch: {}", message);
                    metrics::crawl::fetch_retry();
                    tokio::time::sleep(wait).await;
                }
                Err(Attempt::Retry(message)) => {
                    warn!(url, attempts = attempt + 1, "Giving up on fetch: {}", message);
                    return Err(ScraperError::fetch(url, message));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Answers the n-th connection with `statuses[n]`, repeating the last one.
    /// Returns the page URL and the connection counter.
    async fn serve(statuses: Vec<u16>) -> (String, Arc<AtomicUsize>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let attempts = Arc::new(AtomicUsize::new(0));
        let counter = attempts.clone();

        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                let n = counter.fetch_add(1, Ordering::SeqCst);
                let status = statuses[n.min(statuses.len() - 1)];

                let mut request = Vec::new();
                let mut buf = [0u8; 1024];
                while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                    match socket.read(&mut buf).await {
                        Ok(0) | Err(_) => break,
                        Ok(k) => request.extend_from_slice(&buf[..k]),
                    }
                }

                let body = "<html><body>Zaz</body></html>";
                let response = format!(
                    "HTTP/1.1 {} Test\r\nContent-Type: text/html\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status,
                    body.len(),
                    body
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            }
        });

        (format!("http://{}/wiki/Zaz", addr), attempts)
    }

    fn fetcher(max_retries: u32) -> ReqwestFetcher {
        let config = CrawlerConfig {
            max_retries,
            retry_backoff_ms: 10,
            ..CrawlerConfig::default()
        };
        let client = reqwest::Client::builder()
            .no_proxy()
            .timeout(Duration::from_secs(5))
            .build()
            .unwrap();
        ReqwestFetcher::from_client(client, &config)
    }

    #[test]
    fn test_retryable_statuses() {
        assert!(is_retryable(StatusCode::SERVICE_UNAVAILABLE));
        assert!(is_retryable(StatusCode::TOO_MANY_REQUESTS));
        assert!(!is_retryable(StatusCode::NOT_FOUND));
        assert!(!is_retryable(StatusCode::FORBIDDEN));
    }

    #[test]
    fn test_builds_from_default_config() {
        let fetcher = ReqwestFetcher::new(&CrawlerConfig::default()).unwrap();
        assert_eq!(fetcher.max_retries, 2);
        assert_eq!(fetcher.backoff, Duration::from_millis(500));
    }

    #[tokio::test]
    async fn test_retries_transient_status_until_success() {
        let (url, attempts) = serve(vec![503, 503, 200]).await;
        let started = std::time::Instant::now();

        let page = fetcher(2).fetch(&url).await.unwrap();

        assert_eq!(page.status, 200);
        assert!(page.body.contains("Zaz"));
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
        // backoff doubles: 10ms then 20ms
        assert!(started.elapsed() >= Duration::from_millis(30));
    }

    #[tokio::test]
    async fn test_gives_up_after_max_retries() {
        let (url, attempts) = serve(vec![503]).await;

        let result = fetcher(2).fetch(&url).await;

        match result {
            Err(ScraperError::Fetch { message, .. }) => assert_eq!(message, "HTTP status 503"),
            other => panic!("expected fetch error, got {:?}", other.map(|p| p.status)),
        }
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_not_found_is_not_retried() {
        let (url, attempts) = serve(vec![404, 200]).await;

        let result = fetcher(2).fetch(&url).await;

        assert!(matches!(result, Err(ScraperError::Fetch { .. })));
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }
}
