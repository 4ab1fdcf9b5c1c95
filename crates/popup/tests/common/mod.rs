// ABOUTME: Shared helpers for integration tests: fixture loading and an in-process fake browser.
// ABOUTME: The fake session serves canned markup and records how it was driven.

#![allow(dead_code)]

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use poewiki_popup::{FetchOptions, PageSession, SessionLauncher};

pub fn fixture_path(rel: &str) -> PathBuf {
    PathBuf::from(format!("{}/tests/fixtures/{}", env!("CARGO_MANIFEST_DIR"), rel))
}

pub fn load_html_fixture(name: &str) -> String {
    let path = fixture_path(&format!("html/{}.html", name));
    fs::read_to_string(&path).unwrap_or_else(|_| panic!("Failed to read HTML fixture: {:?}", path))
}

/// Counters shared between a [`FakeLauncher`] and the sessions it hands out.
#[derive(Debug, Default)]
pub struct FakeStats {
    pub launched: AtomicUsize,
    pub closed: AtomicUsize,
    pub probes: AtomicUsize,
    pub visited: Mutex<Vec<String>>,
}

/// Serves fixture markup per URL. URLs without an entry render a page that
/// never shows the popup.
#[derive(Clone, Default)]
pub struct FakeLauncher {
    pub pages: HashMap<String, String>,
    pub stats: Arc<FakeStats>,
}

impl FakeLauncher {
    pub fn with_page(mut self, url: &str, html: String) -> Self {
        self.pages.insert(url.to_string(), html);
        self
    }
}

pub struct FakeSession {
    pages: HashMap<String, String>,
    stats: Arc<FakeStats>,
    current: Option<String>,
}

impl SessionLauncher for FakeLauncher {
    type Session = FakeSession;

    async fn launch(&self, _opts: &FetchOptions) -> anyhow::Result<FakeSession> {
        self.stats.launched.fetch_add(1, Ordering::SeqCst);
        Ok(FakeSession {
            pages: self.pages.clone(),
            stats: Arc::clone(&self.stats),
            current: None,
        })
    }
}

impl FakeSession {
    fn current_html(&self) -> String {
        self.current
            .as_ref()
            .and_then(|url| self.pages.get(url))
            .cloned()
            .unwrap_or_else(|| load_html_fixture("loading"))
    }
}

impl PageSession for FakeSession {
    async fn goto(&mut self, url: &str) -> anyhow::Result<()> {
        self.stats.visited.lock().unwrap().push(url.to_string());
        self.current = Some(url.to_string());
        Ok(())
    }

    async fn wait_network_idle(
        &mut self,
        _quiet: Duration,
        _budget: Duration,
    ) -> anyhow::Result<bool> {
        Ok(true)
    }

    async fn has_element(&mut self, _selector: &str) -> anyhow::Result<bool> {
        self.stats.probes.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .current
            .as_ref()
            .is_some_and(|url| self.pages.contains_key(url)))
    }

    async fn content(&mut self) -> anyhow::Result<String> {
        Ok(self.current_html())
    }

    async fn screenshot_png(&mut self) -> anyhow::Result<Vec<u8>> {
        Ok(b"\x89PNG\r\n\x1a\nfake".to_vec())
    }

    async fn close(self) -> anyhow::Result<()> {
        self.stats.closed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
