//! Page fetching
//!
//! Two strategies behind one call: a plain HTTP GET through a shared reqwest
//! client, and a headless-browser render for JavaScript-heavy sites. Both are
//! wrapped in the crate's retry policy, so transient failures are absorbed
//! before the orchestrator ever sees them.

use std::time::Duration;

use reqwest::{redirect, Client};

use crate::crawler::browser::BrowserSession;
use crate::crawler::retry::{retry_with_backoff, RetryPolicy};
use crate::{KumoError, Result};

/// Identifies the crawler to servers on every request
pub const USER_AGENT: &str = "kumo-harvest/0.1 (Compatible; Respectful Crawler)";

/// How long to wait for a TCP connection before giving up
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Redirect chains longer than this are treated as fetch failures
const MAX_REDIRECTS: usize = 10;

/// A successfully fetched page
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// Final HTTP status after redirects
    pub status: u16,

    /// Response body as text
    pub body: String,
}

/// Builds the shared HTTP client used for pages, robots.txt, and sitemaps
///
/// The client follows redirects, decompresses gzip and brotli bodies, and
/// sends the crawler's user agent on every request.
pub fn build_http_client(timeout: Duration) -> reqwest::Result<Client> {
    Client::builder()
        .user_agent(USER_AGENT)
        .timeout(timeout)
        .connect_timeout(CONNECT_TIMEOUT)
        .redirect(redirect::Policy::limited(MAX_REDIRECTS))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches pages with retry, choosing plain HTTP or a rendered browser tab
pub struct PageFetcher {
    client: Client,
    browser: BrowserSession,
    policy: RetryPolicy,
}

impl PageFetcher {
    /// Creates a fetcher with the default retry policy
    ///
    /// The browser is not launched here; it starts lazily on the first
    /// rendered fetch.
    pub fn new(client: Client, timeout: Duration) -> Self {
        Self::with_policy(client, timeout, RetryPolicy::default())
    }

    /// Creates a fetcher with an explicit retry policy
    pub fn with_policy(client: Client, timeout: Duration, policy: RetryPolicy) -> Self {
        PageFetcher {
            client,
            browser: BrowserSession::new(timeout),
            policy,
        }
    }

    /// Fetches `url`, retrying per the policy until success or exhaustion
    ///
    /// With `render_js` the page is loaded in a headless browser tab and the
    /// DOM is serialized after scripts run; otherwise the raw response body
    /// is returned as-is.
    pub async fn fetch(&self, url: &str, render_js: bool) -> Result<FetchedPage> {
        retry_with_backoff(&self.policy, url, move || self.fetch_once(url, render_js)).await
    }

    async fn fetch_once(&self, url: &str, render_js: bool) -> Result<FetchedPage> {
        if render_js {
            self.fetch_rendered(url).await
        } else {
            self.fetch_plain(url).await
        }
    }

    async fn fetch_plain(&self, url: &str) -> Result<FetchedPage> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| classify_error(url, e))?;

        let status = response.status();
        // Redirects were already followed, so a surviving 3xx is kept as-is.
        if !(status.is_success() || status.is_redirection()) {
            return Err(KumoError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.text().await.map_err(|e| classify_error(url, e))?;

        Ok(FetchedPage {
            status: status.as_u16(),
            body,
        })
    }

    async fn fetch_rendered(&self, url: &str) -> Result<FetchedPage> {
        let body = self.browser.render(url).await?;

        // CDP does not surface the main document's status code, so rendered
        // pages report 200 once navigation succeeds.
        Ok(FetchedPage { status: 200, body })
    }

    /// Tears down the browser if one was launched
    pub async fn shutdown(&mut self) {
        self.browser.shutdown().await;
    }
}

fn classify_error(url: &str, e: reqwest::Error) -> KumoError {
    if e.is_timeout() {
        KumoError::Timeout {
            url: url.to_string(),
        }
    } else {
        KumoError::Http {
            url: url.to_string(),
            source: e,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn fast_fetcher() -> PageFetcher {
        let client = build_http_client(Duration::from_secs(5)).unwrap();
        let policy = RetryPolicy {
            max_attempts: 3,
            base_delay: Duration::from_millis(5),
            max_delay: Duration::from_millis(20),
        };
        PageFetcher::with_policy(client, Duration::from_secs(5), policy)
    }

    #[tokio::test]
    async fn test_fetch_returns_status_and_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/page"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>hi</html>"))
            .mount(&server)
            .await;

        let fetcher = fast_fetcher();
        let page = fetcher
            .fetch(&format!("{}/page", server.uri()), false)
            .await
            .unwrap();

        assert_eq!(page.status, 200);
        assert_eq!(page.body, "<html>hi</html>");
    }

    #[tokio::test]
    async fn test_fetch_sends_user_agent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .and(header("user-agent", USER_AGENT))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let fetcher = fast_fetcher();
        fetcher.fetch(&server.uri(), false).await.unwrap();
    }

    #[tokio::test]
    async fn test_fetch_follows_redirects() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/old"))
            .respond_with(ResponseTemplate::new(301).insert_header("location", "/new"))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/new"))
            .respond_with(ResponseTemplate::new(200).set_body_string("moved"))
            .mount(&server)
            .await;

        let fetcher = fast_fetcher();
        let page = fetcher
            .fetch(&format!("{}/old", server.uri()), false)
            .await
            .unwrap();

        assert_eq!(page.status, 200);
        assert_eq!(page.body, "moved");
    }

    #[tokio::test]
    async fn test_fetch_retries_then_succeeds() {
        let server = MockServer::start().await;
        // Two failures, then the fallthrough mock answers
        Mock::given(method("GET"))
            .and(path("/flaky"))
            .respond_with(ResponseTemplate::new(500))
            .up_to_n_times(2)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/flaky"))
            .respond_with(ResponseTemplate::new(200).set_body_string("recovered"))
            .mount(&server)
            .await;

        let fetcher = fast_fetcher();
        let page = fetcher
            .fetch(&format!("{}/flaky", server.uri()), false)
            .await
            .unwrap();

        assert_eq!(page.body, "recovered");
    }

    #[tokio::test]
    async fn test_fetch_gives_up_after_max_attempts() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/broken"))
            .respond_with(ResponseTemplate::new(500))
            .expect(3)
            .mount(&server)
            .await;

        let fetcher = fast_fetcher();
        let result = fetcher
            .fetch(&format!("{}/broken", server.uri()), false)
            .await;

        assert!(matches!(result, Err(KumoError::Status { status: 500, .. })));
    }

    #[tokio::test]
    async fn test_fetch_not_modified_passes_through_without_retry() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/cached"))
            .respond_with(ResponseTemplate::new(304))
            .expect(1)
            .mount(&server)
            .await;

        let fetcher = fast_fetcher();
        let page = fetcher
            .fetch(&format!("{}/cached", server.uri()), false)
            .await
            .unwrap();

        assert_eq!(page.status, 304);
        assert_eq!(page.body, "");
    }

    #[tokio::test]
    async fn test_fetch_reports_client_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/missing"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let fetcher = fast_fetcher();
        let result = fetcher
            .fetch(&format!("{}/missing", server.uri()), false)
            .await;

        assert!(matches!(result, Err(KumoError::Status { status: 404, .. })));
    }

    #[tokio::test]
    async fn test_fetch_connection_refused_is_http_error() {
        let server = MockServer::start().await;
        let uri = server.uri();
        drop(server);

        let fetcher = fast_fetcher();
        let result = fetcher.fetch(&format!("{uri}/gone"), false).await;

        assert!(matches!(result, Err(KumoError::Http { .. })));
    }
}
