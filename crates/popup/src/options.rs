// ABOUTME: Configuration options for the page fetcher and the builder that constructs it.
// ABOUTME: PageFetcherBuilder provides a fluent API with defaults matching poedb item pages.

use std::path::PathBuf;
use std::time::Duration;

use crate::fetch::chrome::ChromeLauncher;
use crate::fetch::{PageFetcher, SessionLauncher};

/// Configuration for one page fetch.
#[derive(Debug, Clone)]
pub struct FetchOptions {
    /// Budget for navigation and for the fragment wait.
    pub timeout: Duration,
    pub headless: bool,
    /// Browser UI language, e.g. `zh-CN`.
    pub locale: String,
    /// Element whose presence marks the page as rendered.
    pub fragment_selector: String,
    /// Where timeout screenshots and markup snapshots are written.
    pub diagnostics_dir: PathBuf,
    /// Delay between fragment presence checks.
    pub poll_interval: Duration,
    /// How long the network must stay quiet to count as idle.
    pub network_quiet: Duration,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(60),
            headless: true,
            locale: "zh-CN".to_string(),
            fragment_selector: "div.newItemPopup".to_string(),
            diagnostics_dir: PathBuf::from("tmp"),
            poll_interval: Duration::from_millis(250),
            network_quiet: Duration::from_millis(500),
        }
    }
}

/// Builder for constructing [`PageFetcher`] instances with custom configuration.
#[derive(Debug, Clone)]
pub struct PageFetcherBuilder {
    opts: FetchOptions,
}

impl PageFetcherBuilder {
    /// Create a new builder with default options.
    pub fn new() -> Self {
        Self {
            opts: FetchOptions::default(),
        }
    }

    /// Set the navigation and fragment wait budget.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.opts.timeout = timeout;
        self
    }

    /// Run the browser without a visible window (default) or with one.
    pub fn headless(mut self, headless: bool) -> Self {
        self.opts.headless = headless;
        self
    }

    pub fn locale(mut self, locale: impl Into<String>) -> Self {
        self.opts.locale = locale.into();
        self
    }

    /// Set the selector that must be present before the page counts as rendered.
    pub fn fragment_selector(mut self, selector: impl Into<String>) -> Self {
        self.opts.fragment_selector = selector.into();
        self
    }

    /// Set the directory that receives timeout diagnostics.
    pub fn diagnostics_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.opts.diagnostics_dir = dir.into();
        self
    }

    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.opts.poll_interval = interval;
        self
    }

    pub fn network_quiet(mut self, quiet: Duration) -> Self {
        self.opts.network_quiet = quiet;
        self
    }

    /// Build a fetcher driving a local Chrome/Chromium.
    pub fn build(self) -> PageFetcher<ChromeLauncher> {
        PageFetcher::new(ChromeLauncher::default(), self.opts)
    }

    /// Build a fetcher around a custom session launcher.
    pub fn build_with<L: SessionLauncher>(self, launcher: L) -> PageFetcher<L> {
        PageFetcher::new(launcher, self.opts)
    }
}

impl Default for PageFetcherBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_item_pages() {
        let opts = FetchOptions::default();
        assert_eq!(opts.timeout, Duration::from_secs(60));
        assert!(opts.headless);
        assert_eq!(opts.locale, "zh-CN");
        assert_eq!(opts.fragment_selector, "div.newItemPopup");
        assert_eq!(opts.diagnostics_dir, PathBuf::from("tmp"));
    }

    #[test]
    fn builder_overrides() {
        let fetcher = PageFetcherBuilder::new()
            .timeout(Duration::from_millis(1500))
            .headless(false)
            .locale("en-US")
            .diagnostics_dir("/tmp/diag")
            .build();
        let opts = fetcher.options();
        assert_eq!(opts.timeout, Duration::from_millis(1500));
        assert!(!opts.headless);
        assert_eq!(opts.locale, "en-US");
        assert_eq!(opts.diagnostics_dir, PathBuf::from("/tmp/diag"));
    }
}
