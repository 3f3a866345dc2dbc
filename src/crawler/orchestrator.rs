//! Crawl orchestration
//!
//! The crawler owns the frontier and drives the fetch/extract pipeline: draw
//! a bounded batch of pending URLs, dispatch them concurrently under the
//! admission limiter, fold the outcomes back into records and new frontier
//! entries, and repeat until the frontier drains or the page budget is met.

use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use url::Url;

use crate::config::CrawlConfig;
use crate::crawler::extractor::{extract, PageRecord};
use crate::crawler::fetcher::{build_http_client, PageFetcher};
use crate::robots::RobotsCache;
use crate::sitemap::SitemapResolver;
use crate::{KumoError, Result};

/// URLs drawn from the frontier per dispatch round
const DISPATCH_BATCH: usize = 10;

/// Internal links considered for enqueueing per crawled page
const LINKS_PER_PAGE: usize = 10;

/// Pending and visited URL bookkeeping, mutated only by the crawl loop
///
/// URLs are compared as plain strings. Resolution already produced absolute
/// URLs; no further normalization is applied, so two spellings of the same
/// page count as distinct entries. The visited set outlives a single crawl
/// pass; pending state does not.
struct Frontier {
    pending: VecDeque<String>,
    enqueued: HashSet<String>,
    visited: HashSet<String>,
}

impl Frontier {
    fn new() -> Self {
        Frontier {
            pending: VecDeque::new(),
            enqueued: HashSet::new(),
            visited: HashSet::new(),
        }
    }

    /// Discards pending state for a fresh crawl pass, keeping the visited set
    fn begin_session(&mut self) {
        self.pending.clear();
        self.enqueued.clear();
    }

    /// Adds a URL unless it is already pending or was visited before
    fn enqueue(&mut self, url: String) -> bool {
        if self.visited.contains(&url) {
            return false;
        }
        if self.enqueued.insert(url.clone()) {
            self.pending.push_back(url);
            true
        } else {
            false
        }
    }

    /// Removes up to `n` URLs from pending, marking each visited
    fn draw_batch(&mut self, n: usize) -> Vec<String> {
        let mut batch = Vec::with_capacity(n.min(self.pending.len()));
        while batch.len() < n {
            let Some(url) = self.pending.pop_front() else {
                break;
            };
            self.visited.insert(url.clone());
            batch.push(url);
        }
        batch
    }

    fn is_exhausted(&self) -> bool {
        self.pending.is_empty()
    }
}

/// Shared state handed to each dispatched fetch task
struct TaskContext {
    robots: Arc<RobotsCache>,
    fetcher: Arc<PageFetcher>,
    limiter: Arc<Semaphore>,
    produced: Arc<AtomicUsize>,
    budget: usize,
    delay: Duration,
    render_js: bool,
}

/// One crawl session: shared clients plus the frontier-driving loop
pub struct Crawler {
    config: CrawlConfig,
    robots: Arc<RobotsCache>,
    sitemaps: SitemapResolver,
    fetcher: Arc<PageFetcher>,
    limiter: Arc<Semaphore>,
    frontier: Frontier,
}

impl Crawler {
    /// Builds the shared HTTP client and component stack for one session
    pub fn new(config: CrawlConfig) -> Result<Self> {
        let client = build_http_client(config.fetch_timeout_duration())?;
        let robots = Arc::new(RobotsCache::new(client.clone(), config.respect_robots));
        let sitemaps = SitemapResolver::new(client.clone());
        let fetcher = Arc::new(PageFetcher::new(client, config.fetch_timeout_duration()));
        let limiter = Arc::new(Semaphore::new(config.max_concurrent_crawls));

        Ok(Crawler {
            config,
            robots,
            sitemaps,
            fetcher,
            limiter,
            frontier: Frontier::new(),
        })
    }

    /// Crawls from `seed` until the page budget is met or the frontier drains
    ///
    /// `max_pages` overrides the configured budget for this call. Records
    /// come back in completion order, never more than the budget of them.
    /// Per-URL failures are logged and dropped; a seed whose fetch never
    /// succeeds yields an empty sequence, not an error. Only a seed that is
    /// not an absolute URL is rejected up front.
    ///
    /// The visited set carries over between calls on one `Crawler`, so a
    /// second crawl skips every page an earlier one already fetched.
    pub async fn crawl(
        &mut self,
        seed: &str,
        max_pages: Option<usize>,
    ) -> Result<Vec<PageRecord>> {
        let seed_url = Url::parse(seed).map_err(|source| KumoError::Seed {
            url: seed.to_string(),
            source,
        })?;
        let seed_host = (seed_url.host_str().map(str::to_string), seed_url.port());
        let budget = max_pages.unwrap_or(self.config.max_pages);

        self.frontier.begin_session();
        self.frontier.enqueue(seed.to_string());

        // Sitemap discovery widens the seed set before the loop starts.
        let discovered = self.sitemaps.discover(&seed_url, &self.robots).await;
        for url in discovered.into_iter().take(budget) {
            self.frontier.enqueue(url);
        }

        let produced = Arc::new(AtomicUsize::new(0));
        let mut records: Vec<PageRecord> = Vec::new();

        while !self.frontier.is_exhausted() && records.len() < budget {
            let batch = self.frontier.draw_batch(DISPATCH_BATCH);

            let mut handles = Vec::with_capacity(batch.len());
            for url in batch {
                let ctx = TaskContext {
                    robots: Arc::clone(&self.robots),
                    fetcher: Arc::clone(&self.fetcher),
                    limiter: Arc::clone(&self.limiter),
                    produced: Arc::clone(&produced),
                    budget,
                    delay: self.config.crawl_delay_duration(),
                    render_js: self.config.render_js,
                };
                handles.push(tokio::spawn(process_url(ctx, url)));
            }

            for outcome in futures::future::join_all(handles).await {
                match outcome {
                    Ok(Some(record)) => {
                        // No expansion once this record fills the budget.
                        if records.len() + 1 < budget {
                            expand_frontier(&mut self.frontier, &record, &seed_host);
                        }
                        records.push(record);
                    }
                    Ok(None) => {}
                    Err(e) => tracing::error!("Fetch task failed: {}", e),
                }
            }
        }

        tracing::info!("Crawled {} pages from {}", records.len(), seed);
        Ok(records)
    }

    /// Releases the session's shared resources
    ///
    /// Tears down the headless browser if any rendered fetch launched it.
    pub async fn close(self) {
        match Arc::try_unwrap(self.fetcher) {
            Ok(mut fetcher) => fetcher.shutdown().await,
            Err(_) => {
                tracing::warn!("Fetcher still shared at teardown; skipping browser shutdown");
            }
        }
    }
}

/// Fetches and extracts one URL, or returns None when it is skipped
///
/// The budget slot is claimed only after a successful fetch, so failed and
/// robots-denied URLs never consume budget, and concurrent successes cannot
/// push the record count past the limit.
async fn process_url(ctx: TaskContext, url: String) -> Option<PageRecord> {
    let _permit = ctx.limiter.acquire().await.ok()?;

    if ctx.produced.load(Ordering::Relaxed) >= ctx.budget {
        return None;
    }

    let Ok(parsed) = Url::parse(&url) else {
        tracing::debug!("Skipping unparseable URL: {}", url);
        return None;
    };

    if !ctx.robots.allowed(&parsed).await {
        tracing::info!("Skipping {} due to robots.txt", url);
        return None;
    }

    // The politeness pause precedes every fetch.
    tokio::time::sleep(ctx.delay).await;

    let page = match ctx.fetcher.fetch(&url, ctx.render_js).await {
        Ok(page) => page,
        Err(e) => {
            tracing::error!("Failed to fetch {}: {}", url, e);
            return None;
        }
    };

    let slot = ctx.produced.fetch_add(1, Ordering::Relaxed);
    if slot >= ctx.budget {
        return None;
    }

    Some(extract(&page.body, &url, page.status))
}

/// Enqueues up to [`LINKS_PER_PAGE`] of a record's links that stay on the
/// seed's host
fn expand_frontier(
    frontier: &mut Frontier,
    record: &PageRecord,
    seed_host: &(Option<String>, Option<u16>),
) {
    for link in record.internal_links.iter().take(LINKS_PER_PAGE) {
        let Ok(parsed) = Url::parse(link) else {
            continue;
        };
        let link_host = (parsed.host_str().map(str::to_string), parsed.port());
        if link_host == *seed_host {
            frontier.enqueue(link.clone());
        }
    }
}

/// Crawls a site with a fresh session, releasing resources afterwards
///
/// Convenience wrapper over [`Crawler::new`], [`Crawler::crawl`], and
/// [`Crawler::close`]; teardown runs whether or not the crawl succeeded.
pub async fn crawl_site(config: CrawlConfig, seed: &str) -> Result<Vec<PageRecord>> {
    let mut crawler = Crawler::new(config)?;
    let result = crawler.crawl(seed, None).await;
    crawler.close().await;
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enqueue_rejects_duplicates() {
        let mut frontier = Frontier::new();
        assert!(frontier.enqueue("https://example.com/".to_string()));
        assert!(!frontier.enqueue("https://example.com/".to_string()));
        assert_eq!(frontier.pending.len(), 1);
    }

    #[test]
    fn test_syntactically_distinct_urls_are_distinct_entries() {
        let mut frontier = Frontier::new();
        assert!(frontier.enqueue("https://example.com/page".to_string()));
        assert!(frontier.enqueue("https://example.com/page/".to_string()));
        assert_eq!(frontier.pending.len(), 2);
    }

    #[test]
    fn test_draw_batch_marks_visited() {
        let mut frontier = Frontier::new();
        frontier.enqueue("https://example.com/a".to_string());
        frontier.enqueue("https://example.com/b".to_string());

        let batch = frontier.draw_batch(10);
        assert_eq!(batch.len(), 2);
        assert!(frontier.visited.contains("https://example.com/a"));
        assert!(frontier.visited.contains("https://example.com/b"));
        assert!(frontier.is_exhausted());
    }

    #[test]
    fn test_draw_batch_respects_limit() {
        let mut frontier = Frontier::new();
        for i in 0..15 {
            frontier.enqueue(format!("https://example.com/{i}"));
        }

        let batch = frontier.draw_batch(10);
        assert_eq!(batch.len(), 10);
        assert_eq!(frontier.pending.len(), 5);
    }

    #[test]
    fn test_visited_url_never_reenqueued() {
        let mut frontier = Frontier::new();
        frontier.enqueue("https://example.com/a".to_string());
        frontier.draw_batch(1);

        assert!(!frontier.enqueue("https://example.com/a".to_string()));
        assert!(frontier.is_exhausted());
    }

    #[test]
    fn test_begin_session_keeps_visited_discards_pending() {
        let mut frontier = Frontier::new();
        frontier.enqueue("https://example.com/a".to_string());
        frontier.enqueue("https://example.com/b".to_string());
        frontier.draw_batch(1);

        frontier.begin_session();
        assert!(frontier.is_exhausted());
        // A leftover pending URL may come back; a visited one may not.
        assert!(frontier.enqueue("https://example.com/b".to_string()));
        assert!(!frontier.enqueue("https://example.com/a".to_string()));
    }

    #[test]
    fn test_expand_frontier_keeps_seed_host_only() {
        let mut frontier = Frontier::new();
        let seed_host = (Some("example.com".to_string()), None);
        let record = extract(
            r#"<html><body>
                <a href="https://example.com/keep">Keep</a>
                <a href="https://elsewhere.net/drop">Drop</a>
            </body></html>"#,
            "https://example.com/",
            200,
        );

        // The extractor already classified the offsite link as external, so
        // only the same-host one is a candidate here.
        expand_frontier(&mut frontier, &record, &seed_host);
        assert_eq!(frontier.pending.len(), 1);
        assert!(frontier.enqueued.contains("https://example.com/keep"));
    }

    #[test]
    fn test_expand_frontier_caps_links_per_page() {
        let mut frontier = Frontier::new();
        let seed_host = (Some("example.com".to_string()), None);
        let anchors: String = (0..20)
            .map(|i| format!(r#"<a href="https://example.com/p{i}">L</a>"#))
            .collect();
        let html = format!("<html><body>{anchors}</body></html>");
        let record = extract(&html, "https://example.com/", 200);

        expand_frontier(&mut frontier, &record, &seed_host);
        assert_eq!(frontier.pending.len(), LINKS_PER_PAGE);
    }
}
