//! Sitemap discovery module
//!
//! Discovers supplementary seed URLs for a crawl: sitemaps declared in the
//! origin's robots.txt plus the conventional `/sitemap.xml` location, each
//! scanned for `<loc>` entries. Discovery failures never abort a crawl; an
//! unreachable or malformed sitemap simply contributes nothing.

mod parser;

pub use parser::parse_sitemap;

use std::collections::BTreeSet;

use url::Url;

use crate::robots::RobotsCache;

/// Resolves sitemap-declared URLs for a seed's origin
///
/// Holds a clone of the session's shared HTTP client; cloning a `reqwest`
/// client shares the underlying connection pool.
pub struct SitemapResolver {
    client: reqwest::Client,
}

impl SitemapResolver {
    /// Creates a resolver backed by the session's shared HTTP client
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// Discovers candidate page URLs from the seed origin's sitemaps
    ///
    /// Consults the robots cache for declared sitemap locations and always
    /// probes `<origin>/sitemap.xml` as well. The same document is fetched at
    /// most once even when declared and conventional locations coincide.
    ///
    /// # Arguments
    ///
    /// * `seed` - The crawl's seed URL; only its origin matters here
    /// * `robots` - The session robots cache, source of declared sitemaps
    ///
    /// # Returns
    ///
    /// The union of all `<loc>` entries across reachable sitemaps. A
    /// `BTreeSet` keeps the union deduplicated and its iteration order
    /// deterministic for budget truncation.
    pub async fn discover(&self, seed: &Url, robots: &RobotsCache) -> BTreeSet<String> {
        let mut candidates = robots.sitemaps_for(seed).await;

        let origin = seed.origin().ascii_serialization();
        let default_sitemap = format!("{}/sitemap.xml", origin);
        if !candidates.contains(&default_sitemap) {
            candidates.push(default_sitemap);
        }

        let mut discovered = BTreeSet::new();
        for candidate in candidates {
            for url in self.fetch_and_parse(&candidate).await {
                discovered.insert(url);
            }
        }

        if !discovered.is_empty() {
            tracing::info!("Discovered {} URLs from sitemaps", discovered.len());
        }

        discovered
    }

    /// Fetches one sitemap document and scans it for `<loc>` entries
    ///
    /// Returns an empty contribution on any fetch or parse problem.
    async fn fetch_and_parse(&self, sitemap_url: &str) -> Vec<String> {
        match self.client.get(sitemap_url).send().await {
            Ok(response) if response.status().as_u16() == 200 => match response.text().await {
                Ok(body) => parse_sitemap(&body),
                Err(e) => {
                    tracing::debug!("Failed to read sitemap body from {}: {}", sitemap_url, e);
                    Vec::new()
                }
            },
            Ok(response) => {
                tracing::debug!(
                    "Sitemap {} returned status {}",
                    sitemap_url,
                    response.status()
                );
                Vec::new()
            }
            Err(e) => {
                tracing::debug!("Failed to fetch sitemap {}: {}", sitemap_url, e);
                Vec::new()
            }
        }
    }
}
