// ABOUTME: Chrome DevTools session implementation backed by chromiumoxide.
// ABOUTME: Launches one browser per session and drives a single page through CDP.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{anyhow, Context};
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::page::CaptureScreenshotFormat;
use chromiumoxide::page::ScreenshotParams;
use chromiumoxide::Page;
use futures::StreamExt;
use serde::Deserialize;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::debug;

use crate::fetch::{PageSession, SessionLauncher};
use crate::options::FetchOptions;

const IDLE_PROBE_INTERVAL: Duration = Duration::from_millis(100);

/// Launches a local Chrome/Chromium for every session.
#[derive(Debug, Clone, Default)]
pub struct ChromeLauncher {
    /// Browser binary; auto-detected when `None`.
    pub executable: Option<PathBuf>,
}

impl ChromeLauncher {
    pub fn with_executable(executable: impl Into<PathBuf>) -> Self {
        Self {
            executable: Some(executable.into()),
        }
    }
}

impl SessionLauncher for ChromeLauncher {
    type Session = ChromeSession;

    async fn launch(&self, opts: &FetchOptions) -> anyhow::Result<ChromeSession> {
        let mut builder = BrowserConfig::builder()
            .window_size(1920, 1080)
            .arg(format!("--lang={}", opts.locale))
            .arg("--disable-dev-shm-usage")
            .arg("--no-first-run");
        if !opts.headless {
            builder = builder.with_head();
        }
        if let Some(ref exe) = self.executable {
            builder = builder.chrome_executable(exe);
        }
        let config = builder
            .build()
            .map_err(|e| anyhow!("browser config error: {}", e))?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .context("failed to launch browser")?;
        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        let page = browser
            .new_page("about:blank")
            .await
            .context("failed to open page")?;
        debug!(headless = opts.headless, "browser session launched");

        Ok(ChromeSession {
            browser,
            page,
            handler,
        })
    }
}

/// One browser process with one page.
pub struct ChromeSession {
    browser: Browser,
    page: Page,
    handler: JoinHandle<()>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoadProbe {
    ready_state: String,
    resources: u64,
}

const LOAD_PROBE_JS: &str = "({ readyState: document.readyState, \
    resources: performance.getEntriesByType('resource').length })";

impl ChromeSession {
    async fn probe(&self) -> anyhow::Result<LoadProbe> {
        Ok(self.page.evaluate(LOAD_PROBE_JS).await?.into_value()?)
    }
}

impl PageSession for ChromeSession {
    async fn goto(&mut self, url: &str) -> anyhow::Result<()> {
        self.page
            .goto(url)
            .await
            .with_context(|| format!("failed to navigate to {}", url))?;
        Ok(())
    }

    async fn wait_network_idle(
        &mut self,
        quiet: Duration,
        budget: Duration,
    ) -> anyhow::Result<bool> {
        let deadline = Instant::now() + budget;
        let mut last_count = None;
        let mut last_change = Instant::now();

        while Instant::now() < deadline {
            let probe = self.probe().await?;
            if last_count != Some(probe.resources) {
                last_count = Some(probe.resources);
                last_change = Instant::now();
            } else if probe.ready_state == "complete" && last_change.elapsed() >= quiet {
                return Ok(true);
            }
            tokio::time::sleep(IDLE_PROBE_INTERVAL).await;
        }
        Ok(false)
    }

    async fn has_element(&mut self, selector: &str) -> anyhow::Result<bool> {
        let js = format!(
            "document.querySelector({}) !== null",
            serde_json::to_string(selector)?
        );
        Ok(self.page.evaluate(js).await?.into_value()?)
    }

    async fn content(&mut self) -> anyhow::Result<String> {
        Ok(self.page.content().await?)
    }

    async fn screenshot_png(&mut self) -> anyhow::Result<Vec<u8>> {
        let params = ScreenshotParams::builder()
            .format(CaptureScreenshotFormat::Png)
            .full_page(true)
            .build();
        Ok(self.page.screenshot(params).await?)
    }

    async fn close(self) -> anyhow::Result<()> {
        let ChromeSession {
            mut browser,
            page,
            handler,
        } = self;
        let closed = async {
            page.close().await?;
            browser.close().await?;
            browser.wait().await?;
            anyhow::Ok(())
        }
        .await;
        handler.abort();
        closed
    }
}
