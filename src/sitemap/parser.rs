//! Sitemap document scanning
//!
//! Sitemap XML is scanned leniently for `<loc>` elements only; priority,
//! changefreq and lastmod are ignored. Sitemap indexes are not recursed
//! into: their `<loc>` entries surface as ordinary candidate URLs.

use scraper::{Html, Selector};
use std::sync::LazyLock;

static LOC_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("loc").expect("valid loc selector"));

/// Extracts every `<loc>` entry from a sitemap document
///
/// The scan uses a lenient HTML-style parse, so declaration junk, unknown
/// elements and malformed markup degrade to an empty or partial result
/// instead of an error.
///
/// # Arguments
///
/// * `content` - The raw sitemap document
///
/// # Returns
///
/// The `<loc>` texts in document order, trimmed, empty entries dropped
pub fn parse_sitemap(content: &str) -> Vec<String> {
    let document = Html::parse_document(content);

    document
        .select(&LOC_SELECTOR)
        .map(|loc| loc.text().collect::<String>().trim().to_string())
        .filter(|url| !url.is_empty())
        .collect()
}
