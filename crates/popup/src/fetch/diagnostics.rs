// ABOUTME: Best-effort diagnostics captured when the popup fragment never renders.
// ABOUTME: Writes a screenshot and a markup snapshot named with one timestamp tag and the URL.

use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::fetch::PageSession;

static UNSAFE_RUN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^a-zA-Z0-9_-]+").expect("valid url sanitizer regex"));

const MAX_URL_FRAGMENT: usize = 80;

/// The files written for one failed fetch. Either path is `None` when its capture failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagnosticBundle {
    /// Timestamp tag shared by both file names (`%Y%m%d_%H%M%S`).
    pub tag: String,
    pub screenshot: Option<PathBuf>,
    pub markup: Option<PathBuf>,
}

impl DiagnosticBundle {
    /// File names (without directories) of the captured artifacts.
    pub fn file_names(&self) -> Vec<String> {
        [&self.screenshot, &self.markup]
            .into_iter()
            .flatten()
            .filter_map(|p| p.file_name())
            .map(|n| n.to_string_lossy().into_owned())
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.screenshot.is_none() && self.markup.is_none()
    }
}

/// Replaces runs of characters outside `[a-zA-Z0-9_-]` with `_`, truncated to 80 characters.
pub fn sanitize_url_fragment(url: &str) -> String {
    UNSAFE_RUN_RE
        .replace_all(url, "_")
        .chars()
        .take(MAX_URL_FRAGMENT)
        .collect()
}

/// Current local time as a diagnostics tag.
pub fn timestamp_tag() -> String {
    chrono::Local::now().format("%Y%m%d_%H%M%S").to_string()
}

/// Capture a screenshot and the current markup of `session` into `dir`.
///
/// Never fails: capture errors are logged and the corresponding path is left `None`.
pub async fn capture<S: PageSession>(session: &mut S, dir: &Path, url: &str) -> DiagnosticBundle {
    let tag = timestamp_tag();
    let stem = format!("poedb_timeout_{}_{}", tag, sanitize_url_fragment(url));

    if let Err(e) = tokio::fs::create_dir_all(dir).await {
        warn!(dir = %dir.display(), error = %e, "cannot create diagnostics directory");
        return DiagnosticBundle {
            tag,
            screenshot: None,
            markup: None,
        };
    }

    let screenshot_path = dir.join(format!("{}.png", stem));
    let screenshot = match session.screenshot_png().await {
        Ok(png) => write_artifact(&screenshot_path, &png).await,
        Err(e) => {
            warn!(url, error = %e, "screenshot capture failed");
            None
        }
    };

    let markup_path = dir.join(format!("{}.html", stem));
    let markup = match session.content().await {
        Ok(html) => write_artifact(&markup_path, html.as_bytes()).await,
        Err(e) => {
            warn!(url, error = %e, "markup snapshot failed");
            None
        }
    };

    let bundle = DiagnosticBundle {
        tag,
        screenshot,
        markup,
    };
    info!(url, files = ?bundle.file_names(), "saved fetch diagnostics");
    bundle
}

async fn write_artifact(path: &Path, bytes: &[u8]) -> Option<PathBuf> {
    match tokio::fs::write(path, bytes).await {
        Ok(()) => Some(path.to_path_buf()),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "cannot write diagnostics file");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn sanitizes_url_runs() {
        assert_eq!(
            sanitize_url_fragment("https://poedb.tw/cn/Scroll_of_Wisdom"),
            "https_poedb_tw_cn_Scroll_of_Wisdom"
        );
        assert_eq!(sanitize_url_fragment("a%20b?c=d&e"), "a_20b_c_d_e");
    }

    #[test]
    fn truncates_long_urls() {
        let long = format!("https://poedb.tw/cn/{}", "x".repeat(200));
        assert_eq!(sanitize_url_fragment(&long).chars().count(), 80);
    }

    #[test]
    fn tag_has_fixed_shape() {
        let tag = timestamp_tag();
        assert_eq!(tag.len(), 15);
        assert_eq!(&tag[8..9], "_");
        assert!(tag.chars().filter(|c| *c != '_').all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn file_names_skip_missing_artifacts() {
        let bundle = DiagnosticBundle {
            tag: "t".to_string(),
            screenshot: None,
            markup: Some(PathBuf::from("tmp/poedb_timeout_t_x.html")),
        };
        assert_eq!(bundle.file_names(), vec!["poedb_timeout_t_x.html".to_string()]);
        assert!(!bundle.is_empty());
    }

    struct StaticSession;

    impl PageSession for StaticSession {
        async fn goto(&mut self, _url: &str) -> anyhow::Result<()> {
            Ok(())
        }

        async fn wait_network_idle(
            &mut self,
            _quiet: std::time::Duration,
            _budget: std::time::Duration,
        ) -> anyhow::Result<bool> {
            Ok(true)
        }

        async fn has_element(&mut self, _selector: &str) -> anyhow::Result<bool> {
            Ok(false)
        }

        async fn content(&mut self) -> anyhow::Result<String> {
            Ok("<html><body>loading</body></html>".to_string())
        }

        async fn screenshot_png(&mut self) -> anyhow::Result<Vec<u8>> {
            anyhow::bail!("no renderer attached")
        }

        async fn close(self) -> anyhow::Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn capture_creates_dir_and_keeps_markup_when_screenshot_fails() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let dir = temp_dir.path().join("nested/diag");

        let bundle = capture(&mut StaticSession, &dir, "https://poedb.tw/cn/A").await;

        assert_eq!(bundle.screenshot, None);
        let markup = bundle.markup.clone().unwrap();
        assert_eq!(
            markup,
            dir.join(format!("poedb_timeout_{}_https_poedb_tw_cn_A.html", bundle.tag))
        );
        assert_eq!(
            tokio::fs::read_to_string(&markup).await.unwrap(),
            "<html><body>loading</body></html>"
        );
    }
}
