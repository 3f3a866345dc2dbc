//! Content extraction
//!
//! Turns raw HTML into a structured [`PageRecord`]: body text with
//! boilerplate stripped, title/description/heading metadata, and classified
//! link and image lists. Extraction is pure; the only non-deterministic
//! field is the record's timestamp.

use std::collections::HashSet;
use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use ego_tree::NodeId;
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use url::Url;

// Containers likely to hold the article body, in priority order.
static CONTENT_SELECTORS: LazyLock<Vec<Selector>> = LazyLock::new(|| {
    [
        "main",
        "article",
        "[role='main']",
        "#main-content",
        ".main-content",
        "#content",
        ".content",
        ".post-content",
        ".entry-content",
        "[itemprop='articleBody']",
        ".article-body",
    ]
    .iter()
    .map(|s| Selector::parse(s).expect("valid content selector"))
    .collect()
});

// Page chrome that never belongs in extracted text.
static BOILERPLATE_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(
        "nav, header, footer, aside, form, script, style, noscript, \
         .sidebar, #sidebar, .navigation, .menu, .ads, .advertisement, \
         .social-share, .comments, #comments, .related-posts, \
         .cookie-notice, .popup, .modal",
    )
    .expect("valid boilerplate selector")
});

// Elements treated as standalone text blocks.
static BLOCK_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("p, h1, h2, h3, h4, h5, h6, li, blockquote, pre, td, th, dt, dd, figcaption")
        .expect("valid block selector")
});

static BODY_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("body").expect("valid body selector"));

static TITLE_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("title").expect("valid title selector"));

static META_DESCRIPTION_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("meta[name='description']").expect("valid meta description selector")
});

static H1_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("h1").expect("valid h1 selector"));

static H2_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("h2").expect("valid h2 selector"));

static H3_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("h3").expect("valid h3 selector"));

static H4_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("h4").expect("valid h4 selector"));

static ANCHOR_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a[href]").expect("valid anchor selector"));

static IMAGE_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("img[src]").expect("valid image selector"));

static SCRIPT_STYLE_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("script, style").expect("valid script/style selector"));

/// Heading texts grouped by level, document order preserved within each level
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HeadingOutline {
    pub h2: Vec<String>,
    pub h3: Vec<String>,
    pub h4: Vec<String>,
}

/// Structured content extracted from one crawled page
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageRecord {
    /// The URL exactly as it was fetched
    pub url: String,

    /// Final HTTP status of the fetch
    pub status_code: u16,

    /// Text of the title element, if present and non-empty
    pub title: Option<String>,

    /// Content of the `description` meta tag, if present
    pub meta_description: Option<String>,

    /// Text of the first h1, if present and non-empty
    pub h1: Option<String>,

    /// h2/h3/h4 texts in document order
    pub headings: HeadingOutline,

    /// Extracted body text, boilerplate removed
    pub text_content: String,

    /// Same-host links, resolved to absolute URLs
    pub internal_links: Vec<String>,

    /// Offsite http/https links
    pub external_links: Vec<String>,

    /// Image sources resolved to absolute URLs
    pub images: Vec<String>,

    /// Whitespace-token count of `text_content`
    pub word_count: usize,

    /// When this record was produced
    pub crawled_at: DateTime<Utc>,
}

/// Extracts a structured record from one page's HTML
///
/// `url` is stored verbatim in the record and used as the base for resolving
/// relative links and image sources; if it does not parse as an absolute URL
/// the link and image lists stay empty. `status_code` is recorded as given.
pub fn extract(html: &str, url: &str, status_code: u16) -> PageRecord {
    let document = Html::parse_document(html);

    let text_content = extract_text(&document);
    let word_count = text_content.split_whitespace().count();

    let title = document
        .select(&TITLE_SELECTOR)
        .next()
        .map(element_text)
        .filter(|text| !text.is_empty());

    let meta_description = document
        .select(&META_DESCRIPTION_SELECTOR)
        .next()
        .and_then(|el| el.value().attr("content"))
        .map(str::to_string);

    let h1 = document
        .select(&H1_SELECTOR)
        .next()
        .map(element_text)
        .filter(|text| !text.is_empty());

    let headings = HeadingOutline {
        h2: collect_headings(&document, &H2_SELECTOR),
        h3: collect_headings(&document, &H3_SELECTOR),
        h4: collect_headings(&document, &H4_SELECTOR),
    };

    let base = Url::parse(url).ok();
    let (internal_links, external_links) = match &base {
        Some(base) => classify_links(&document, base),
        None => (Vec::new(), Vec::new()),
    };
    let images = match &base {
        Some(base) => collect_images(&document, base),
        None => Vec::new(),
    };

    PageRecord {
        url: url.to_string(),
        status_code,
        title,
        meta_description,
        h1,
        headings,
        text_content,
        internal_links,
        external_links,
        images,
        word_count,
        crawled_at: Utc::now(),
    }
}

/// Body text with boilerplate stripped
///
/// Walks the most specific content container found (falling back to `body`),
/// collects outermost text blocks outside boilerplate regions, and drops
/// repeated blocks. When that yields nothing, the whole document is
/// flattened to visible text instead.
fn extract_text(document: &Html) -> String {
    let primary = primary_text(document);
    if primary.is_empty() {
        fallback_text(document)
    } else {
        primary
    }
}

fn primary_text(document: &Html) -> String {
    let Some(root) = content_root(document) else {
        return String::new();
    };

    let boilerplate: HashSet<NodeId> = root
        .select(&BOILERPLATE_SELECTOR)
        .map(|el| el.id())
        .collect();
    let block_ids: HashSet<NodeId> = root.select(&BLOCK_SELECTOR).map(|el| el.id()).collect();

    let mut seen = HashSet::new();
    let mut blocks = Vec::new();
    for block in root.select(&BLOCK_SELECTOR) {
        // Only outermost blocks count; nested ones are covered by their parent.
        let skip = block
            .ancestors()
            .any(|a| block_ids.contains(&a.id()) || boilerplate.contains(&a.id()));
        if skip {
            continue;
        }

        let text = text_outside(block, &boilerplate);
        if text.is_empty() {
            continue;
        }
        if seen.insert(text.clone()) {
            blocks.push(text);
        }
    }

    blocks.join("\n")
}

fn content_root(document: &Html) -> Option<ElementRef<'_>> {
    for selector in CONTENT_SELECTORS.iter() {
        if let Some(element) = document.select(selector).next() {
            return Some(element);
        }
    }
    document.select(&BODY_SELECTOR).next()
}

/// All visible text in the document, scripts and styles removed
fn fallback_text(document: &Html) -> String {
    let skipped: HashSet<NodeId> = document
        .select(&SCRIPT_STYLE_SELECTOR)
        .map(|el| el.id())
        .collect();
    text_outside(document.root_element(), &skipped)
}

/// Whitespace-normalized text of `element`, skipping excluded subtrees
fn text_outside(element: ElementRef<'_>, excluded: &HashSet<NodeId>) -> String {
    let mut words: Vec<&str> = Vec::new();
    for node in element.descendants() {
        if let Some(text) = node.value().as_text() {
            if node.ancestors().any(|a| excluded.contains(&a.id())) {
                continue;
            }
            words.extend(text.split_whitespace());
        }
    }
    words.join(" ")
}

/// Whitespace-normalized text content of an element
fn element_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

fn collect_headings(document: &Html, selector: &Selector) -> Vec<String> {
    document
        .select(selector)
        .map(element_text)
        .filter(|text| !text.is_empty())
        .collect()
}

/// Splits anchors into same-host and offsite links
///
/// Hrefs resolve against the page URL, so relative and fragment-only links
/// become absolute. Non-web schemes (javascript, mailto, tel, data) drop
/// out: they carry no host to match and fail the http/https filter.
fn classify_links(document: &Html, base: &Url) -> (Vec<String>, Vec<String>) {
    let mut internal = Vec::new();
    let mut external = Vec::new();

    for anchor in document.select(&ANCHOR_SELECTOR) {
        let Some(href) = anchor.value().attr("href") else {
            continue;
        };
        let Ok(resolved) = base.join(href) else {
            continue;
        };

        if same_host(&resolved, base) {
            internal.push(resolved.to_string());
        } else if matches!(resolved.scheme(), "http" | "https") {
            external.push(resolved.to_string());
        }
    }

    (internal, external)
}

fn same_host(a: &Url, b: &Url) -> bool {
    a.host_str() == b.host_str() && a.port() == b.port()
}

fn collect_images(document: &Html, base: &Url) -> Vec<String> {
    document
        .select(&IMAGE_SELECTOR)
        .filter_map(|img| img.value().attr("src"))
        .filter_map(|src| base.join(src).ok())
        .map(|url| url.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE_URL: &str = "https://example.com/page";

    #[test]
    fn test_extract_title() {
        let html = r#"<html><head><title>Test Page</title></head><body></body></html>"#;
        let record = extract(html, PAGE_URL, 200);
        assert_eq!(record.title, Some("Test Page".to_string()));
    }

    #[test]
    fn test_missing_title_is_none() {
        let html = r#"<html><head></head><body><p>Text</p></body></html>"#;
        let record = extract(html, PAGE_URL, 200);
        assert_eq!(record.title, None);
    }

    #[test]
    fn test_title_whitespace_normalized() {
        let html = "<html><head><title>  Test \n  Page  </title></head><body></body></html>";
        let record = extract(html, PAGE_URL, 200);
        assert_eq!(record.title, Some("Test Page".to_string()));
    }

    #[test]
    fn test_meta_description() {
        let html = r#"<html><head><meta name="description" content="A fine page."></head><body></body></html>"#;
        let record = extract(html, PAGE_URL, 200);
        assert_eq!(record.meta_description, Some("A fine page.".to_string()));
    }

    #[test]
    fn test_missing_meta_description_is_none() {
        let html = r#"<html><head><meta name="keywords" content="a,b"></head><body></body></html>"#;
        let record = extract(html, PAGE_URL, 200);
        assert_eq!(record.meta_description, None);
    }

    #[test]
    fn test_first_h1_wins() {
        let html = r#"<html><body><h1>Primary</h1><h1>Secondary</h1></body></html>"#;
        let record = extract(html, PAGE_URL, 200);
        assert_eq!(record.h1, Some("Primary".to_string()));
    }

    #[test]
    fn test_heading_outline_in_document_order() {
        let html = r#"
            <html><body>
                <h2>Alpha</h2>
                <h3>Alpha One</h3>
                <h2>Beta</h2>
                <h4>Detail</h4>
                <h3>Beta One</h3>
            </body></html>
        "#;
        let record = extract(html, PAGE_URL, 200);
        assert_eq!(record.headings.h2, vec!["Alpha", "Beta"]);
        assert_eq!(record.headings.h3, vec!["Alpha One", "Beta One"]);
        assert_eq!(record.headings.h4, vec!["Detail"]);
    }

    #[test]
    fn test_primary_text_prefers_article_content() {
        let html = r#"
            <html><body>
                <nav><a href="/home">Home</a></nav>
                <article>
                    <h1>Headline</h1>
                    <p>First paragraph.</p>
                    <p>Second paragraph.</p>
                </article>
                <footer>Copyright notice</footer>
            </body></html>
        "#;
        let record = extract(html, PAGE_URL, 200);
        assert_eq!(
            record.text_content,
            "Headline\nFirst paragraph.\nSecond paragraph."
        );
    }

    #[test]
    fn test_boilerplate_inside_container_is_dropped() {
        let html = r#"
            <html><body>
                <article>
                    <p>Real content.</p>
                    <div class="sidebar"><p>Recent posts</p></div>
                </article>
            </body></html>
        "#;
        let record = extract(html, PAGE_URL, 200);
        assert_eq!(record.text_content, "Real content.");
    }

    #[test]
    fn test_repeated_blocks_deduplicated() {
        let html = r#"
            <html><body><article>
                <p>Sign up for our newsletter</p>
                <p>Actual story text.</p>
                <p>Sign up for our newsletter</p>
            </article></body></html>
        "#;
        let record = extract(html, PAGE_URL, 200);
        assert_eq!(
            record.text_content,
            "Sign up for our newsletter\nActual story text."
        );
    }

    #[test]
    fn test_nested_blocks_collapse_into_outermost() {
        let html = r#"<html><body><article><li><p>Only once</p></li></article></body></html>"#;
        let record = extract(html, PAGE_URL, 200);
        assert_eq!(record.text_content, "Only once");
    }

    #[test]
    fn test_script_text_never_leaks_into_blocks() {
        let html =
            r#"<html><body><article><p>hello<script>var x = 1;</script> world</p></article></body></html>"#;
        let record = extract(html, PAGE_URL, 200);
        assert_eq!(record.text_content, "hello world");
    }

    #[test]
    fn test_fallback_when_no_text_blocks() {
        let html = r#"<html><body><div>loose text here</div></body></html>"#;
        let record = extract(html, PAGE_URL, 200);
        assert_eq!(record.text_content, "loose text here");
    }

    #[test]
    fn test_fallback_skips_scripts_and_styles() {
        let html = r#"<html><body><div>visible</div><script>var hidden = 1;</script><style>.x{}</style></body></html>"#;
        let record = extract(html, PAGE_URL, 200);
        assert_eq!(record.text_content, "visible");
    }

    #[test]
    fn test_internal_and_external_links() {
        let html = r#"
            <html><body>
                <a href="/about">About</a>
                <a href="https://example.com/contact">Contact</a>
                <a href="https://other.com/page">Elsewhere</a>
            </body></html>
        "#;
        let record = extract(html, PAGE_URL, 200);
        assert_eq!(
            record.internal_links,
            vec!["https://example.com/about", "https://example.com/contact"]
        );
        assert_eq!(record.external_links, vec!["https://other.com/page"]);
    }

    #[test]
    fn test_fragment_link_is_internal() {
        let html = r##"<html><body><a href="#section">Jump</a></body></html>"##;
        let record = extract(html, PAGE_URL, 200);
        assert_eq!(record.internal_links, vec!["https://example.com/page#section"]);
    }

    #[test]
    fn test_non_web_schemes_dropped() {
        let html = r#"
            <html><body>
                <a href="javascript:void(0)">Run</a>
                <a href="mailto:test@example.com">Email</a>
                <a href="tel:+1234567890">Call</a>
                <a href="data:text/plain,hi">Data</a>
            </body></html>
        "#;
        let record = extract(html, PAGE_URL, 200);
        assert!(record.internal_links.is_empty());
        assert!(record.external_links.is_empty());
    }

    #[test]
    fn test_same_host_different_port_is_external() {
        let html = r#"<html><body><a href="https://example.com:8443/admin">Admin</a></body></html>"#;
        let record = extract(html, PAGE_URL, 200);
        assert!(record.internal_links.is_empty());
        assert_eq!(record.external_links, vec!["https://example.com:8443/admin"]);
    }

    #[test]
    fn test_images_resolved_to_absolute() {
        let html = r#"<html><body><img src="/logo.png"><img src="https://cdn.example.net/pic.jpg"></body></html>"#;
        let record = extract(html, PAGE_URL, 200);
        assert_eq!(
            record.images,
            vec![
                "https://example.com/logo.png",
                "https://cdn.example.net/pic.jpg"
            ]
        );
    }

    #[test]
    fn test_unparseable_url_leaves_links_empty() {
        let html = r#"<html><head><title>Still Works</title></head><body><a href="/x">X</a></body></html>"#;
        let record = extract(html, "not a url", 200);
        assert_eq!(record.url, "not a url");
        assert_eq!(record.title, Some("Still Works".to_string()));
        assert!(record.internal_links.is_empty());
        assert!(record.external_links.is_empty());
        assert!(record.images.is_empty());
    }

    #[test]
    fn test_word_count_matches_stored_text() {
        let html = r#"<html><body><article><p>one two three</p><p>four five</p></article></body></html>"#;
        let record = extract(html, PAGE_URL, 200);
        assert_eq!(record.word_count, 5);
        assert_eq!(
            record.word_count,
            record.text_content.split_whitespace().count()
        );
    }

    #[test]
    fn test_empty_page_yields_empty_record() {
        let record = extract("", PAGE_URL, 200);
        assert_eq!(record.text_content, "");
        assert_eq!(record.word_count, 0);
        assert_eq!(record.title, None);
    }

    #[test]
    fn test_status_code_recorded_as_given() {
        let html = r#"<html><body><p>ok</p></body></html>"#;
        let record = extract(html, PAGE_URL, 203);
        assert_eq!(record.status_code, 203);
    }

    #[test]
    fn test_record_serializes_to_json() {
        let html = r#"<html><head><title>T</title></head><body><p>body</p></body></html>"#;
        let record = extract(html, PAGE_URL, 200);
        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains(r#""url":"https://example.com/page""#));
        assert!(json.contains(r#""word_count":1"#));
    }
}
