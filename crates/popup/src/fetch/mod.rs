// ABOUTME: Page fetcher that renders one item page in an isolated browser session.
// ABOUTME: Waits for navigation, network quiet and the popup fragment; captures diagnostics on timeout.

//! Rendered page fetching.
//!
//! The browser sits behind [`SessionLauncher`] / [`PageSession`] so the wait
//! logic can run against any session implementation. [`chrome`] provides the
//! Chrome DevTools one.

pub mod chrome;
pub mod diagnostics;

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::error::ParseError;
use crate::options::{FetchOptions, PageFetcherBuilder};

/// Markup of one fully rendered detail page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderedPage {
    pub url: String,
    pub html: String,
}

/// One open browser page.
#[allow(async_fn_in_trait)]
pub trait PageSession {
    /// Navigate and return once the document has been parsed.
    async fn goto(&mut self, url: &str) -> anyhow::Result<()>;

    /// Wait until no new network activity is seen for `quiet`, giving up after `budget`.
    ///
    /// Returns `false` when the budget ran out first.
    async fn wait_network_idle(&mut self, quiet: Duration, budget: Duration)
        -> anyhow::Result<bool>;

    /// Whether an element matching `selector` is attached to the DOM.
    async fn has_element(&mut self, selector: &str) -> anyhow::Result<bool>;

    /// Current serialized DOM.
    async fn content(&mut self) -> anyhow::Result<String>;

    /// Full-page PNG screenshot.
    async fn screenshot_png(&mut self) -> anyhow::Result<Vec<u8>>;

    /// Tear down the page and its browser.
    async fn close(self) -> anyhow::Result<()>;
}

/// Opens a fresh, unshared browser session per call.
#[allow(async_fn_in_trait)]
pub trait SessionLauncher {
    type Session: PageSession;

    async fn launch(&self, opts: &FetchOptions) -> anyhow::Result<Self::Session>;
}

/// Loads item pages and returns their rendered markup.
#[derive(Debug, Clone)]
pub struct PageFetcher<L> {
    launcher: L,
    opts: FetchOptions,
}

impl PageFetcher<chrome::ChromeLauncher> {
    pub fn builder() -> PageFetcherBuilder {
        PageFetcherBuilder::new()
    }
}

impl<L: SessionLauncher> PageFetcher<L> {
    pub fn new(launcher: L, opts: FetchOptions) -> Self {
        Self { launcher, opts }
    }

    pub fn options(&self) -> &FetchOptions {
        &self.opts
    }

    /// Render `url` and return its markup once the popup fragment is attached.
    ///
    /// Each call launches and closes its own session.
    pub async fn fetch(&self, url: &str) -> Result<RenderedPage, ParseError> {
        info!(url, "fetching item page");
        let mut session = self
            .launcher
            .launch(&self.opts)
            .await
            .map_err(|e| ParseError::browser(url, "LaunchBrowser", Some(e)))?;

        let outcome = self.drive(&mut session, url).await;

        if let Err(e) = session.close().await {
            debug!(url, error = %e, "closing browser session failed");
        }
        outcome
    }

    async fn drive(&self, session: &mut L::Session, url: &str) -> Result<RenderedPage, ParseError> {
        let budget = self.opts.timeout;

        match tokio::time::timeout(budget, session.goto(url)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(ParseError::browser(url, "Navigate", Some(e))),
            Err(_) => {
                return Err(ParseError::browser(
                    url,
                    "Navigate",
                    Some(anyhow::anyhow!(
                        "navigation did not finish within {}ms",
                        budget.as_millis()
                    )),
                ))
            }
        }
        debug!(url, "document parsed");

        // Quiet network does not imply the popup exists; widgets may still be pending.
        match session.wait_network_idle(self.opts.network_quiet, budget).await {
            Ok(true) => debug!(url, "network idle"),
            Ok(false) => debug!(url, "network never went idle; waiting for fragment anyway"),
            Err(e) => return Err(ParseError::browser(url, "WaitNetworkIdle", Some(e))),
        }

        self.wait_for_fragment(session, url).await?;

        let html = session
            .content()
            .await
            .map_err(|e| ParseError::browser(url, "ReadContent", Some(e)))?;
        Ok(RenderedPage {
            url: url.to_string(),
            html,
        })
    }

    async fn wait_for_fragment(&self, session: &mut L::Session, url: &str) -> Result<(), ParseError> {
        let selector = self.opts.fragment_selector.as_str();
        let deadline = Instant::now() + self.opts.timeout;

        loop {
            match session.has_element(selector).await {
                Ok(true) => {
                    debug!(url, selector, "fragment attached");
                    return Ok(());
                }
                Ok(false) => {}
                Err(e) => debug!(url, selector, error = %e, "fragment probe failed"),
            }

            let now = Instant::now();
            if now >= deadline {
                let bundle =
                    diagnostics::capture(session, &self.opts.diagnostics_dir, url).await;
                warn!(
                    url,
                    selector,
                    timeout_ms = self.opts.timeout.as_millis() as u64,
                    "fragment never appeared"
                );
                return Err(ParseError::timeout(
                    url,
                    "WaitForFragment",
                    self.opts.timeout,
                    Some(bundle),
                ));
            }
            tokio::time::sleep(self.opts.poll_interval.min(deadline - now)).await;
        }
    }
}
