use std::time::Duration;

use serde::Deserialize;

/// Crawl behavior configuration
///
/// Immutable for the duration of a crawl. All fields have defaults, so an
/// empty TOML document is a valid configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlConfig {
    /// Maximum number of page records to produce
    #[serde(rename = "max-pages", default = "default_max_pages")]
    pub max_pages: usize,

    /// Pause before each fetch, in seconds
    #[serde(rename = "crawl-delay", default = "default_crawl_delay")]
    pub crawl_delay: f64,

    /// Maximum number of concurrent page fetches
    #[serde(rename = "max-concurrent-crawls", default = "default_max_concurrent_crawls")]
    pub max_concurrent_crawls: usize,

    /// Whether robots.txt directives gate fetching
    #[serde(rename = "respect-robots", default = "default_respect_robots")]
    pub respect_robots: bool,

    /// Total per-request timeout, in seconds
    #[serde(rename = "fetch-timeout", default = "default_fetch_timeout")]
    pub fetch_timeout: u64,

    /// Fetch pages through a headless browser instead of plain HTTP
    #[serde(rename = "render-js", default)]
    pub render_js: bool,
}

fn default_max_pages() -> usize {
    500
}

fn default_crawl_delay() -> f64 {
    1.0
}

fn default_max_concurrent_crawls() -> usize {
    3
}

fn default_respect_robots() -> bool {
    true
}

fn default_fetch_timeout() -> u64 {
    30
}

impl Default for CrawlConfig {
    fn default() -> Self {
        CrawlConfig {
            max_pages: default_max_pages(),
            crawl_delay: default_crawl_delay(),
            max_concurrent_crawls: default_max_concurrent_crawls(),
            respect_robots: default_respect_robots(),
            fetch_timeout: default_fetch_timeout(),
            render_js: false,
        }
    }
}

impl CrawlConfig {
    /// The politeness delay as a [`Duration`]
    pub fn crawl_delay_duration(&self) -> Duration {
        Duration::from_secs_f64(self.crawl_delay)
    }

    /// The fetch timeout as a [`Duration`]
    pub fn fetch_timeout_duration(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout)
    }
}
