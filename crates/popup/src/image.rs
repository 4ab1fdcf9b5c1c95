// ABOUTME: Image URL normalization from the source site's CDN naming to the wiki CDN's naming.
// ABOUTME: Strict: URLs that do not end in `<name>.webp` are rejected instead of guessed.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::ParseError;

/// Final path segment `<name>.webp`, optionally followed by a query string.
static WEBP_NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/([^/]+?)\.webp(?:\?.*)?$").expect("valid webp name regex"));

/// The wiki CDN location icons are published under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CdnTarget {
    /// Base URL without a trailing slash.
    pub base: String,
    /// Value of the `v` query parameter.
    pub version: String,
}

impl Default for CdnTarget {
    fn default() -> Self {
        Self {
            base: "https://cdn.max-c.com/wiki/238960".to_string(),
            version: "1".to_string(),
        }
    }
}

impl CdnTarget {
    /// Rewrite a source image URL to this CDN's `<base>/<name>.png?v=<version>` form.
    pub fn normalize(&self, url: &str) -> Result<String, ParseError> {
        let name = webp_asset_name(url)?;
        Ok(format!(
            "{}/{}.png?v={}",
            self.base.trim_end_matches('/'),
            name,
            self.version
        ))
    }
}

/// Extracts `<name>` from a URL ending in `<name>.webp`.
pub fn webp_asset_name(url: &str) -> Result<&str, ParseError> {
    WEBP_NAME_RE
        .captures(url.trim())
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
        .ok_or_else(|| {
            ParseError::format_mismatch(
                url,
                "NormalizeImage",
                Some(anyhow::anyhow!("expected a URL ending in <name>.webp")),
            )
        })
}

/// Normalize with the default wiki CDN target.
pub fn normalize_image_url(url: &str) -> Result<String, ParseError> {
    CdnTarget::default().normalize(url)
}
