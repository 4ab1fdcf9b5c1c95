// ABOUTME: Library entry point for the poedb item popup pipeline.
// ABOUTME: Re-exports the fetcher, extractor, normalizer, renderer and workflow APIs.

//! poewiki-popup - render poedb item pages, extract their popup tooltips and
//! publish them as wiki HTML fragments.
//!
//! # Example
//!
//! ```no_run
//! use poewiki_popup::{PageFetcher, ParseError, PopupExtractor};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), ParseError> {
//!     let fetcher = PageFetcher::builder().build();
//!     let page = fetcher.fetch("https://poedb.tw/cn/Scroll_of_Wisdom").await?;
//!     let fields = PopupExtractor::builtin().extract_sequence(&page.html)?;
//!     println!("{:?}", fields);
//!     Ok(())
//! }
//! ```

pub mod download;
pub mod error;
pub mod extractors;
pub mod fetch;
pub mod image;
pub mod items;
pub mod options;
pub mod result;
pub mod template;
pub mod workflow;

pub use crate::download::{download_image, sanitize_filename, DownloadOptions};
pub use crate::error::{ErrorCode, ParseError};
pub use crate::extractors::loader::load_builtin_profile;
pub use crate::extractors::popup::PopupExtractor;
pub use crate::extractors::profile::PopupProfile;
pub use crate::fetch::chrome::{ChromeLauncher, ChromeSession};
pub use crate::fetch::diagnostics::DiagnosticBundle;
pub use crate::fetch::{PageFetcher, PageSession, RenderedPage, SessionLauncher};
pub use crate::image::{normalize_image_url, CdnTarget};
pub use crate::items::{load_item_list, parse_item_list, ItemReference};
pub use crate::options::{FetchOptions, PageFetcherBuilder};
pub use crate::result::{field_position, FieldSequence, PopupFields, PropertyLine};
pub use crate::template::{render_item_popup, TemplateValues};
pub use crate::workflow::{ItemOutcome, RunReport, Workflow, WorkflowOptions};
