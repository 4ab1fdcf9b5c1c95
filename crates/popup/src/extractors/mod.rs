// ABOUTME: Field extraction for rendered item detail pages.
// ABOUTME: Profiles describe the page layout; the popup extractor applies them.

//! Field extraction module.
//!
//! Submodules:
//! - `profile`: serde-backed description of a site's popup layout.
//! - `loader`: the built-in poedb profile.
//! - `popup`: the compiled extractor producing `PopupFields`.
//! - `select`: selector and text flattening helpers.

pub mod loader;
pub mod popup;
pub mod profile;
pub mod select;
