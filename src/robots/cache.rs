//! Robots.txt policy cache
//!
//! Per-origin robots.txt rules, fetched lazily on first need and kept for the
//! lifetime of one crawl session. A robots.txt that cannot be fetched yields
//! an allow-all rule (fail-open), cached like any other entry.

use std::collections::HashMap;

use tokio::sync::Mutex;
use url::Url;

use crate::robots::ParsedRobots;

/// User agent product token used for permission checks
///
/// Directive groups are matched for the wildcard agent, so only `User-agent: *`
/// groups bind this crawler.
const GENERIC_AGENT: &str = "*";

/// Session-scoped robots.txt cache keyed by origin
///
/// The cache is shared between the orchestrator's permission checks and the
/// sitemap resolver's declared-sitemap lookups, so each origin's robots.txt is
/// fetched at most once per session no matter which side asks first.
pub struct RobotsCache {
    client: reqwest::Client,
    respect_robots: bool,
    /// Rules per origin. The lock is held across the fetch so concurrent
    /// first-time lookups of one origin collapse into a single request.
    rules: Mutex<HashMap<String, ParsedRobots>>,
}

impl RobotsCache {
    /// Creates a cache backed by the session's shared HTTP client
    pub fn new(client: reqwest::Client, respect_robots: bool) -> Self {
        Self {
            client,
            respect_robots,
            rules: Mutex::new(HashMap::new()),
        }
    }

    /// Checks whether the generic user agent may fetch `url`
    ///
    /// When `respect-robots` is disabled this returns `true` without touching
    /// the network or the cache.
    pub async fn allowed(&self, url: &Url) -> bool {
        if !self.respect_robots {
            return true;
        }

        let rules = self.rules_for(url).await;
        rules.is_allowed(url.as_str(), GENERIC_AGENT)
    }

    /// Returns the sitemap URLs declared by `url`'s origin
    ///
    /// Used by sitemap discovery, which wants declared sitemaps even when
    /// permission checking is disabled, so this does not consult
    /// `respect-robots`.
    pub async fn sitemaps_for(&self, url: &Url) -> Vec<String> {
        let rules = self.rules_for(url).await;
        rules.sitemaps()
    }

    /// Looks up the cached rules for `url`'s origin, fetching them on a miss
    async fn rules_for(&self, url: &Url) -> ParsedRobots {
        let origin = url.origin().ascii_serialization();

        let mut rules = self.rules.lock().await;
        if let Some(cached) = rules.get(&origin) {
            return cached.clone();
        }

        let fetched = self.fetch_rules(&origin).await;
        rules.insert(origin, fetched.clone());
        fetched
    }

    /// Fetches and parses `<origin>/robots.txt`, failing open
    async fn fetch_rules(&self, origin: &str) -> ParsedRobots {
        let robots_url = format!("{}/robots.txt", origin);

        match self.client.get(&robots_url).send().await {
            Ok(response) if response.status().as_u16() == 200 => {
                match response.text().await {
                    Ok(body) => ParsedRobots::from_content(&body),
                    Err(e) => {
                        tracing::warn!(
                            "Failed to read robots.txt body from {}: {}, allowing all",
                            origin,
                            e
                        );
                        ParsedRobots::allow_all()
                    }
                }
            }
            Ok(response) => {
                tracing::debug!(
                    "robots.txt at {} returned status {}, allowing all",
                    origin,
                    response.status()
                );
                ParsedRobots::allow_all()
            }
            Err(e) => {
                tracing::warn!(
                    "Failed to fetch robots.txt from {}: {}, allowing all",
                    origin,
                    e
                );
                ParsedRobots::allow_all()
            }
        }
    }
}
