// ABOUTME: CLI that runs the popup workflow over a JSON item list.
// ABOUTME: Renders one HTML fragment per selected item and prints a JSON run report.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use poewiki_popup::{
    load_item_list, PageFetcher, PopupExtractor, PopupProfile, RunReport, Workflow,
    WorkflowOptions,
};
use serde_json::json;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Render wiki popups for every item in a poedb item list.
#[derive(Parser, Debug)]
#[command(name = "poewiki")]
#[command(about = "Fetch poedb item pages and render wiki item popups", long_about = None)]
struct Args {
    /// JSON list of item references (`value`, `desc`, optional `label`).
    #[arg(long)]
    items: PathBuf,

    /// Only process items whose `desc` equals this tag.
    #[arg(long, default_value = "可堆叠通货")]
    desc: String,

    /// Process at most this many selected items.
    #[arg(long)]
    limit: Option<usize>,

    /// Template with `{title}`, `{category}`, `{stack}`, `{affix}`, `{desc_html}`, `{en}`, `{icon_url}` placeholders.
    #[arg(long, default_value = "template.html")]
    template: PathBuf,

    /// Directory receiving one `<English name>.html` per item.
    #[arg(long, default_value = "tmp")]
    out_dir: PathBuf,

    /// Directory for timeout screenshots and markup snapshots.
    #[arg(long, default_value = "tmp")]
    diagnostics_dir: PathBuf,

    /// Wait budget per page, in milliseconds.
    #[arg(long, default_value_t = 60_000)]
    timeout_ms: u64,

    /// Show the browser window.
    #[arg(long, default_value_t = false)]
    headed: bool,

    /// Record failed items and continue with the next one.
    #[arg(long, default_value_t = false)]
    keep_going: bool,

    /// Also download each item's source icon into this directory.
    #[arg(long)]
    icons_dir: Option<PathBuf>,

    /// Detail page base URL.
    #[arg(long, default_value = "https://poedb.tw/cn")]
    base_url: String,

    /// Extraction profile JSON (default: built-in poedb profile).
    #[arg(long)]
    profile: Option<PathBuf>,

    /// Output compact JSON instead of pretty.
    #[arg(long, default_value_t = false)]
    compact: bool,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let items = load_item_list(&args.items)
        .with_context(|| format!("cannot load item list {}", args.items.display()))?;
    info!(items = items.len(), desc = %args.desc, "loaded item list");

    let extractor = match &args.profile {
        Some(path) => PopupExtractor::new(PopupProfile::from_file(path)?)?,
        None => PopupExtractor::builtin(),
    };

    let fetcher = PageFetcher::builder()
        .timeout(Duration::from_millis(args.timeout_ms))
        .headless(!args.headed)
        .diagnostics_dir(args.diagnostics_dir.clone())
        .build();

    let workflow = Workflow::new(
        fetcher,
        extractor,
        WorkflowOptions {
            detail_base: args.base_url.clone(),
            template: args.template.clone(),
            output_dir: args.out_dir.clone(),
            icon_dir: args.icons_dir.clone(),
            continue_on_error: args.keep_going,
            limit: args.limit,
        },
    );

    let report = workflow
        .run(&items, |item| item.has_desc(&args.desc))
        .await?;
    let output = report_json(&report);

    if args.compact {
        println!("{}", serde_json::to_string(&output)?);
    } else {
        println!("{}", serde_json::to_string_pretty(&output)?);
    }

    Ok(if report.has_failures() {
        ExitCode::from(1)
    } else {
        ExitCode::SUCCESS
    })
}

fn report_json(report: &RunReport) -> serde_json::Value {
    let items: Vec<_> = report
        .outcomes
        .iter()
        .map(|outcome| match &outcome.result {
            Ok(path) => json!({
                "key": outcome.key,
                "ok": true,
                "output": path.display().to_string(),
                "error": null
            }),
            Err(err) => json!({
                "key": outcome.key,
                "ok": false,
                "output": null,
                "error": err.to_string()
            }),
        })
        .collect();
    json!({
        "items": items,
        "total_items": report.outcomes.len(),
        "rendered": report.ok_count(),
        "failed": report.failed_count()
    })
}
