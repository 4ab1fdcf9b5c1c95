// ABOUTME: Workflow orchestrator running fetch, extract, normalize and render for each selected item.
// ABOUTME: Aborts on the first failure unless continue_on_error is set; returns a per-item run report.

use std::path::PathBuf;

use tracing::{info, warn};

use crate::download::{download_image, sanitize_filename, DownloadOptions};
use crate::error::ParseError;
use crate::extractors::popup::PopupExtractor;
use crate::fetch::{PageFetcher, SessionLauncher};
use crate::image::CdnTarget;
use crate::items::ItemReference;
use crate::template::{render_item_popup, TemplateValues};

/// Configuration for a workflow run.
#[derive(Debug, Clone)]
pub struct WorkflowOptions {
    /// Detail pages live at `<detail_base>/<value>`.
    pub detail_base: String,
    pub template: PathBuf,
    pub output_dir: PathBuf,
    /// When set, each item's source icon is downloaded here.
    pub icon_dir: Option<PathBuf>,
    /// Record per-item failures and keep going instead of aborting.
    pub continue_on_error: bool,
    /// Process at most this many selected items.
    pub limit: Option<usize>,
}

impl Default for WorkflowOptions {
    fn default() -> Self {
        Self {
            detail_base: "https://poedb.tw/cn".to_string(),
            template: PathBuf::from("template.html"),
            output_dir: PathBuf::from("tmp"),
            icon_dir: None,
            continue_on_error: false,
            limit: None,
        }
    }
}

/// Result of one processed item.
#[derive(Debug)]
pub struct ItemOutcome {
    /// The item's `value` key.
    pub key: String,
    pub result: Result<PathBuf, ParseError>,
}

/// Per-item outcomes of a run, in processing order.
#[derive(Debug, Default)]
pub struct RunReport {
    pub outcomes: Vec<ItemOutcome>,
}

impl RunReport {
    pub fn ok_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.result.is_ok()).count()
    }

    pub fn failed_count(&self) -> usize {
        self.outcomes.len() - self.ok_count()
    }

    pub fn has_failures(&self) -> bool {
        self.failed_count() > 0
    }
}

/// Drives items through the pipeline one at a time.
pub struct Workflow<L> {
    fetcher: PageFetcher<L>,
    extractor: PopupExtractor,
    cdn: CdnTarget,
    opts: WorkflowOptions,
    http: reqwest::Client,
    download: DownloadOptions,
}

impl<L: SessionLauncher> Workflow<L> {
    pub fn new(fetcher: PageFetcher<L>, extractor: PopupExtractor, opts: WorkflowOptions) -> Self {
        Self {
            fetcher,
            extractor,
            cdn: CdnTarget::default(),
            opts,
            http: reqwest::Client::new(),
            download: DownloadOptions::default(),
        }
    }

    pub fn with_cdn(mut self, cdn: CdnTarget) -> Self {
        self.cdn = cdn;
        self
    }

    pub fn with_download_options(mut self, download: DownloadOptions) -> Self {
        self.download = download;
        self
    }

    pub fn options(&self) -> &WorkflowOptions {
        &self.opts
    }

    /// Fetch, extract and render one item. Returns the rendered file path.
    pub async fn process_item(&self, item: &ItemReference) -> Result<PathBuf, ParseError> {
        let url = item.detail_url(&self.opts.detail_base);
        let page = self.fetcher.fetch(&url).await?;

        let fields = self.extractor.extract(&page.html).map_err(|mut e| {
            e.target = url.clone();
            e
        })?;

        let source_image = fields.image_url.as_deref().ok_or_else(|| {
            ParseError::structure_not_found(
                url.as_str(),
                "LocateImage",
                Some(anyhow::anyhow!("popup has no item image")),
            )
        })?;
        let icon_url = self.cdn.normalize(source_image)?;

        let values = TemplateValues::from_popup(&fields, icon_url).map_err(|e| {
            ParseError::structure_not_found(url.as_str(), e.op.clone(), e.source)
        })?;

        // A failed download must leave no rendered file behind.
        let icon = match self.opts.icon_dir {
            Some(ref icon_dir) => {
                let saved = download_image(&self.http, source_image, icon_dir, &self.download).await?;
                info!(key = %item.value, icon = %saved.display(), "saved icon");
                Some(saved)
            }
            None => None,
        };

        let file_name = format!("{}.html", sanitize_filename(&values.en, &item.value));
        let rendered =
            render_item_popup(&self.opts.template, &values, self.opts.output_dir.join(file_name));
        if let (Err(_), Some(icon)) = (&rendered, icon) {
            if let Err(e) = tokio::fs::remove_file(&icon).await {
                warn!(icon = %icon.display(), error = %e, "cannot remove icon of failed item");
            }
        }
        rendered
    }

    /// Process every item `select` accepts, in order, up to the configured limit.
    ///
    /// Without `continue_on_error` the first failure is returned as the error.
    pub async fn run<F>(&self, items: &[ItemReference], select: F) -> Result<RunReport, ParseError>
    where
        F: Fn(&ItemReference) -> bool,
    {
        let mut report = RunReport::default();
        let selected: Vec<&ItemReference> = items
            .iter()
            .filter(|item| select(item))
            .take(self.opts.limit.unwrap_or(usize::MAX))
            .collect();
        info!(total = items.len(), selected = selected.len(), "starting run");

        for (i, item) in selected.iter().enumerate() {
            info!(key = %item.value, n = i + 1, of = selected.len(), "processing item");
            let result = match self.process_item(item).await {
                Err(e) if !self.opts.continue_on_error => return Err(e),
                result => result,
            };
            match &result {
                Ok(path) => info!(key = %item.value, out = %path.display(), "rendered item"),
                Err(e) => warn!(key = %item.value, error = %e, "skipping item"),
            }
            report.outcomes.push(ItemOutcome {
                key: item.value.clone(),
                result,
            });
        }

        info!(ok = report.ok_count(), failed = report.failed_count(), "run finished");
        Ok(report)
    }
}
