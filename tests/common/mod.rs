#![allow(dead_code)]

use async_trait::async_trait;
use blindtest::app::ports::{FetchedPage, PageFetcher};
use blindtest::error::{Result, ScraperError};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

pub const ORIGIN: &str = "https://fr.wikipedia.org";
pub const CATEGORY_PATH: &str =
    "/wiki/Cat%C3%A9gorie:Auteur-compositeur-interpr%C3%A8te_fran%C3%A7ais";
pub const PAGE2_PATH: &str = "/w/index.php?title=Cat%C3%A9gorie:Auteur-compositeur-interpr%C3%A8te_fran%C3%A7ais&pagefrom=Souchon";

pub fn url(path: &str) -> String {
    format!("{}{}", ORIGIN, path)
}

/// Serves fixture pages from memory; unknown URLs answer 404
#[derive(Default)]
pub struct MockFetcher {
    pages: HashMap<String, String>,
    hanging: HashSet<String>,
    requested: Mutex<Vec<String>>,
    latency: Option<Duration>,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
}

impl MockFetcher {
    /// The two-page category with its performer pages
    pub fn singers_site() -> Self {
        Self::default()
            .with_page(CATEGORY_PATH, include_str!("../fixtures/category_page1.html"))
            .with_page(PAGE2_PATH, include_str!("../fixtures/category_page2.html"))
            .with_page("/wiki/Barbara_(chanteuse)", include_str!("../fixtures/barbara.html"))
            .with_page("/wiki/Georges_Brassens", include_str!("../fixtures/brassens.html"))
            .with_page("/wiki/Alain_Souchon", include_str!("../fixtures/souchon.html"))
    }

    pub fn with_page(mut self, path: &str, body: &str) -> Self {
        self.pages.insert(url(path), body.to_string());
        self
    }

    /// Requests for `path` never complete
    pub fn hanging_on(mut self, path: &str) -> Self {
        self.hanging.insert(url(path));
        self
    }

    /// Every response takes `latency` to arrive
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Highest number of fetches observed running at once
    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }

    pub fn requested(&self) -> Vec<String> {
        self.requested.lock().unwrap().clone()
    }
}

#[async_trait]
impl PageFetcher for MockFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedPage> {
        self.requested.lock().unwrap().push(url.to_string());
        let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(running, Ordering::SeqCst);
        if self.hanging.contains(url) {
            std::future::pending::<()>().await;
        }
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        match self.pages.get(url) {
            Some(body) => Ok(FetchedPage {
                url: url.to_string(),
                status: 200,
                body: body.clone(),
            }),
            None => Err(ScraperError::fetch(url, "HTTP status 404")),
        }
    }
}
