// ABOUTME: Icon downloader saving an image URL into a directory under a safe, unique file name.
// ABOUTME: Uses a fixed attempt count with no backoff; names come from Content-Disposition or the URL.

use std::path::{Path, PathBuf};
use std::time::Duration;

use once_cell::sync::Lazy;
use percent_encoding::percent_decode_str;
use regex::Regex;
use reqwest::header::{ACCEPT, CONTENT_DISPOSITION, REFERER, USER_AGENT};
use tracing::{debug, warn};

use crate::error::ParseError;

static FORBIDDEN_CHARS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"[\\/:*?"<>|]+"#).expect("valid filename regex"));
static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid whitespace regex"));
static FILENAME_STAR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)filename\*=UTF-8''([^;]+)").expect("valid disposition regex"));
static FILENAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)filename="?([^";]+)"?"#).expect("valid disposition regex"));

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "webp", "bmp", "svg"];
const MAX_DEDUPE_SUFFIX: u32 = 10_000;

/// Settings for [`download_image`].
#[derive(Debug, Clone)]
pub struct DownloadOptions {
    pub timeout: Duration,
    /// Total attempts, at least one.
    pub attempts: u32,
    pub user_agent: String,
}

impl Default for DownloadOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            attempts: 3,
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0 Safari/537.36".to_string(),
        }
    }
}

/// Replace characters Windows forbids in file names, collapse whitespace, trim dots and spaces.
pub fn sanitize_filename(name: &str, fallback: &str) -> String {
    let name = FORBIDDEN_CHARS_RE.replace_all(name.trim(), "_");
    let name = WHITESPACE_RE.replace_all(&name, " ");
    let name = name.trim_matches(|c| c == ' ' || c == '.');
    if name.is_empty() {
        fallback.to_string()
    } else {
        name.to_string()
    }
}

/// File name announced by a Content-Disposition header, RFC 5987 form first.
pub fn disposition_filename(header: &str) -> Option<String> {
    if let Some(caps) = FILENAME_STAR_RE.captures(header) {
        return Some(
            percent_decode_str(caps[1].trim())
                .decode_utf8_lossy()
                .into_owned(),
        );
    }
    FILENAME_RE
        .captures(header)
        .map(|caps| caps[1].trim().to_string())
}

/// `<stem>.<ext>` from a URL path; unknown extensions become `.png`.
pub fn filename_from_url(url: &url::Url) -> String {
    let path = Path::new(url.path());
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .filter(|e| IMAGE_EXTENSIONS.contains(&e.as_str()))
        .unwrap_or_else(|| "png".to_string());
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    format!("{}.{}", sanitize_filename(&stem, "image"), ext)
}

/// First of `path`, `stem_1.ext`, `stem_2.ext`, … that does not exist yet.
pub async fn dedupe_path(path: &Path) -> Result<PathBuf, ParseError> {
    if !exists(path).await {
        return Ok(path.to_path_buf());
    }
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let suffix = path
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();
    for i in 1..MAX_DEDUPE_SUFFIX {
        let candidate = path.with_file_name(format!("{}_{}{}", stem, i, suffix));
        if !exists(&candidate).await {
            return Ok(candidate);
        }
    }
    Err(ParseError::invalid_input(
        path.display().to_string(),
        "DedupePath",
        Some(anyhow::anyhow!("no free file name left")),
    ))
}

async fn exists(path: &Path) -> bool {
    tokio::fs::try_exists(path).await.unwrap_or(false)
}

/// Download `url` into `save_dir`, creating the directory if needed. Returns the written path.
pub async fn download_image(
    client: &reqwest::Client,
    url: &str,
    save_dir: impl AsRef<Path>,
    opts: &DownloadOptions,
) -> Result<PathBuf, ParseError> {
    let save_dir = save_dir.as_ref();
    tokio::fs::create_dir_all(save_dir)
        .await
        .map_err(|e| ParseError::io(save_dir.display().to_string(), "CreateSaveDir", e))?;

    let attempts = opts.attempts.max(1);
    let mut attempt = 1;
    loop {
        match download_once(client, url, save_dir, opts).await {
            Ok(path) => return Ok(path),
            Err(e) if attempt < attempts => {
                warn!(url, attempt, attempts, error = %e, "image download failed, retrying");
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

async fn download_once(
    client: &reqwest::Client,
    url: &str,
    save_dir: &Path,
    opts: &DownloadOptions,
) -> Result<PathBuf, ParseError> {
    let fetch_err = |e: reqwest::Error| ParseError::fetch(url, "DownloadImage", Some(e.into()));

    let response = client
        .get(url)
        .header(USER_AGENT, opts.user_agent.as_str())
        .header(ACCEPT, "image/avif,image/webp,image/apng,image/*,*/*;q=0.8")
        .header(REFERER, url)
        .timeout(opts.timeout)
        .send()
        .await
        .map_err(fetch_err)?
        .error_for_status()
        .map_err(fetch_err)?;

    let filename = response
        .headers()
        .get(CONTENT_DISPOSITION)
        .and_then(|v| v.to_str().ok())
        .and_then(disposition_filename)
        .map(|name| sanitize_filename(&name, "image"))
        .unwrap_or_else(|| filename_from_url(response.url()));

    let body = response.bytes().await.map_err(fetch_err)?;

    let dst = dedupe_path(&save_dir.join(filename)).await?;
    tokio::fs::write(&dst, &body)
        .await
        .map_err(|e| ParseError::io(dst.display().to_string(), "WriteImage", e))?;
    debug!(url, path = %dst.display(), bytes = body.len(), "downloaded image");
    Ok(dst)
}
