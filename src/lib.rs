//! Kumo-Harvest: A respectful site crawler
//!
//! This crate crawls a website starting from a seed URL, honoring robots.txt,
//! per-request pacing, and a bounded concurrency budget. Each fetched page is
//! turned into a structured [`PageRecord`] (text, headings, links, images)
//! for downstream consumers.

pub mod config;
pub mod crawler;
pub mod robots;
pub mod sitemap;

use thiserror::Error;

/// Main error type for Kumo-Harvest operations
#[derive(Debug, Error)]
pub enum KumoError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Invalid seed URL '{url}': {source}")]
    Seed { url: String, source: url::ParseError },

    #[error("HTTP error for {url}: {source}")]
    Http { url: String, source: reqwest::Error },

    #[error("Request timeout for {url}")]
    Timeout { url: String },

    #[error("HTTP status {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("Browser error: {0}")]
    Browser(String),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),
}

/// Result type alias for Kumo-Harvest operations
pub type Result<T> = std::result::Result<T, KumoError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::{load_config, CrawlConfig};
pub use crawler::{crawl_site, extract, Crawler, HeadingOutline, PageRecord};
pub use robots::{ParsedRobots, RobotsCache};
pub use sitemap::SitemapResolver;
