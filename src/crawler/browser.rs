//! Headless browser session
//!
//! A single shared Chromium instance, launched lazily on the first rendered
//! fetch and torn down once when the crawl finishes. Each render opens a
//! fresh tab, waits for navigation to settle, serializes the DOM, and closes
//! the tab again.

use std::time::Duration;

use chromiumoxide::browser::{Browser, BrowserConfig};
use futures::StreamExt;
use tokio::sync::OnceCell;
use tokio::task::JoinHandle;

use crate::{KumoError, Result};

struct BrowserHandle {
    browser: Browser,
    handler_task: JoinHandle<()>,
}

/// Lazily launched headless browser shared by all rendered fetches
pub struct BrowserSession {
    handle: OnceCell<BrowserHandle>,
    request_timeout: Duration,
}

impl BrowserSession {
    /// Creates a session without launching anything
    pub fn new(request_timeout: Duration) -> Self {
        BrowserSession {
            handle: OnceCell::new(),
            request_timeout,
        }
    }

    /// Loads `url` in a new tab and returns the DOM after scripts have run
    ///
    /// Launches the browser on first use; concurrent callers share the one
    /// instance and only ever pay the launch cost once.
    pub async fn render(&self, url: &str) -> Result<String> {
        let handle = self
            .handle
            .get_or_try_init(|| launch(self.request_timeout))
            .await?;

        let page = handle
            .browser
            .new_page("about:blank")
            .await
            .map_err(browser_error)?;

        let result = async {
            page.goto(url).await.map_err(browser_error)?;
            page.wait_for_navigation().await.map_err(browser_error)?;
            page.content().await.map_err(browser_error)
        }
        .await;

        // Close the tab on both paths so failed renders do not leak tabs.
        if let Err(e) = page.close().await {
            tracing::debug!("Failed to close tab for {}: {}", url, e);
        }

        result
    }

    /// Closes Chrome and stops the CDP event loop
    ///
    /// A no-op when no rendered fetch ever launched the browser. Calling it
    /// twice is safe; the second call finds nothing to tear down.
    pub async fn shutdown(&mut self) {
        let Some(mut handle) = self.handle.take() else {
            return;
        };

        tracing::info!("Shutting down headless browser");
        if let Err(e) = handle.browser.close().await {
            tracing::warn!("Failed to close browser: {}", e);
        }
        // Waiting for process exit prevents orphaned Chrome processes.
        if let Err(e) = handle.browser.wait().await {
            tracing::warn!("Failed to wait for browser exit: {}", e);
        }
        handle.handler_task.abort();
    }
}

async fn launch(request_timeout: Duration) -> Result<BrowserHandle> {
    let config = BrowserConfig::builder()
        .request_timeout(request_timeout)
        .window_size(1920, 1080)
        .build()
        .map_err(KumoError::Browser)?;

    tracing::info!("Launching headless browser");
    let (browser, mut handler) = Browser::launch(config).await.map_err(browser_error)?;

    // The handler stream must be drained for CDP traffic to flow.
    let handler_task = tokio::spawn(async move {
        while let Some(event) = handler.next().await {
            if let Err(e) = event {
                tracing::debug!("Browser handler event: {}", e);
            }
        }
    });

    Ok(BrowserHandle {
        browser,
        handler_task,
    })
}

fn browser_error(e: impl std::fmt::Display) -> KumoError {
    KumoError::Browser(e.to_string())
}
