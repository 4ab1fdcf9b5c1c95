// ABOUTME: CLI binary extracting one poedb item popup from a live URL or a saved HTML file.
// ABOUTME: Prints the ordered field sequence (or the named record) as JSON on stdout.

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use poewiki_popup::{PageFetcher, PopupExtractor, PopupProfile};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "popup")]
#[command(about = "Extract the item popup of a poedb detail page")]
struct Args {
    /// Detail page URL to render (fetch mode)
    #[arg()]
    url: Option<String>,

    /// Saved HTML file to parse instead of fetching
    #[arg(long = "html", conflicts_with = "url")]
    html: Option<PathBuf>,

    /// Print the named record instead of the ordered field list
    #[arg(long = "named")]
    named: bool,

    /// Show the browser window
    #[arg(long = "headed")]
    headed: bool,

    /// Wait budget for navigation and the popup, in milliseconds
    #[arg(long = "timeout-ms", default_value_t = 60_000)]
    timeout_ms: u64,

    /// Directory for timeout screenshots and markup snapshots
    #[arg(long = "diagnostics-dir", default_value = "tmp")]
    diagnostics_dir: PathBuf,

    /// Extraction profile JSON (default: built-in poedb profile)
    #[arg(long = "profile")]
    profile: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    if args.html.is_none() && args.url.is_none() {
        eprintln!("error: a URL is required, or use --html");
        return ExitCode::from(1);
    }

    let extractor = match &args.profile {
        Some(path) => match PopupProfile::from_file(path).and_then(PopupExtractor::new) {
            Ok(extractor) => extractor,
            Err(e) => {
                eprintln!("error loading profile: {}", e);
                return ExitCode::from(1);
            }
        },
        None => PopupExtractor::builtin(),
    };

    let html = if let Some(html_path) = &args.html {
        match fs::read_to_string(html_path) {
            Ok(html) => html,
            Err(e) => {
                eprintln!("error reading file {:?}: {}", html_path, e);
                return ExitCode::from(1);
            }
        }
    } else {
        let url = args.url.as_deref().unwrap_or_default();
        let fetcher = PageFetcher::builder()
            .timeout(Duration::from_millis(args.timeout_ms))
            .headless(!args.headed)
            .diagnostics_dir(args.diagnostics_dir.clone())
            .build();
        match fetcher.fetch(url).await {
            Ok(page) => page.html,
            Err(e) => {
                eprintln!("error fetching {}: {}", url, e);
                return ExitCode::from(1);
            }
        }
    };

    let output = if args.named {
        extractor
            .extract(&html)
            .map(|fields| serde_json::to_string_pretty(&fields))
    } else {
        extractor
            .extract_sequence(&html)
            .map(|seq| serde_json::to_string_pretty(&seq))
    };

    match output {
        Ok(Ok(json)) => {
            println!("{}", json);
            ExitCode::SUCCESS
        }
        Ok(Err(e)) => {
            eprintln!("error serializing output: {}", e);
            ExitCode::from(1)
        }
        Err(e) => {
            eprintln!("error extracting popup: {}", e);
            ExitCode::from(1)
        }
    }
}
