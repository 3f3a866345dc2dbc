//! Crawling engine
//!
//! This module contains the core crawling logic, including:
//! - Page fetching over plain HTTP or a headless browser, with retry
//! - Structured content extraction from raw HTML
//! - Frontier management, concurrency limiting, and the page budget
//! - Overall crawl orchestration

mod browser;
mod extractor;
mod fetcher;
mod orchestrator;
mod retry;

pub use extractor::{extract, HeadingOutline, PageRecord};
pub use fetcher::{build_http_client, FetchedPage, PageFetcher, USER_AGENT};
pub use orchestrator::{crawl_site, Crawler};
pub use retry::{retry_with_backoff, RetryPolicy};
