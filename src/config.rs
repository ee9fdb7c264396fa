use crate::constants::{DEFAULT_USER_AGENT, SINGERS_CATEGORY_URL};
use crate::error::{Result, ScraperError};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub crawler: CrawlerConfig,
    pub logging: LogConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    pub start_url: String,
    pub concurrency: u32,
    pub requests_per_min: Option<u64>,
    pub delay_ms: u64,
    pub timeout_seconds: u64,
    pub max_retries: u32,
    pub retry_backoff_ms: u64,
    pub shutdown_grace_seconds: u64,
    pub user_agent: String,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            start_url: SINGERS_CATEGORY_URL.to_string(),
            concurrency: 16,
            requests_per_min: None,
            delay_ms: 0,
            timeout_seconds: 180,
            max_retries: 2,
            retry_backoff_ms: 500,
            shutdown_grace_seconds: 10,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl CrawlerConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.shutdown_grace_seconds)
    }

    pub fn validate(&self) -> Result<()> {
        if self.concurrency == 0 {
            return Err(ScraperError::Config("crawler.concurrency must be at least 1".into()));
        }
        if self.start_url.trim().is_empty() {
            return Err(ScraperError::Config("crawler.start_url is empty".into()));
        }
        reqwest::Url::parse(&self.start_url).map_err(|e| {
            ScraperError::Config(format!("Invalid crawler.start_url '{}': {}", self.start_url, e))
        })?;
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Directory for daily-rolling JSON logs; console only when unset
    pub directory: Option<PathBuf>,
    /// `EnvFilter` directives used when `RUST_LOG` is not set
    pub filter: Option<String>,
}

impl Config {
    /// Reads `path` when given, otherwise starts from defaults, then applies
    /// `BLINDTEST_*` environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => {
                let content = fs::read_to_string(path).map_err(|e| {
                    ScraperError::Config(format!(
                        "Failed to read config file '{}': {}",
                        path.display(),
                        e
                    ))
                })?;
                Self::from_toml(&content)?
            }
            None => Self::default(),
        };
        config.apply_env_overrides()?;
        config.crawler.validate()?;
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        Ok(config)
    }

    fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(url) = std::env::var("BLINDTEST_START_URL") {
            self.crawler.start_url = url;
        }
        if let Some(v) = env_number("BLINDTEST_CONCURRENCY")? {
            self.crawler.concurrency = v;
        }
        if let Some(v) = env_number("BLINDTEST_DELAY_MS")? {
            self.crawler.delay_ms = v;
        }
        if let Some(v) = env_number("BLINDTEST_MAX_RETRIES")? {
            self.crawler.max_retries = v;
        }
        Ok(())
    }
}

fn env_number<T: std::str::FromStr>(key: &str) -> Result<Option<T>> {
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| ScraperError::Config(format!("{} is not a valid number: '{}'", key, raw))),
        Err(_) => Ok(None),
    }
}
