// ABOUTME: Extraction profile describing where a site keeps each popup field.
// ABOUTME: Selectors, the known-variable rows to drop, and the stack-size row pattern are all data.

//! Popup extraction profiles.
//!
//! A profile names the CSS selectors for each popup region plus the regex
//! rules applied to property rows. Rows known to appear on some items and not
//! others are listed in `skip_rows`; that list is open-ended configuration,
//! and new variable rows are added here rather than in code.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ParseError;

fn default_image_attr() -> String {
    "src".to_string()
}

fn default_image_search_depth() -> usize {
    6
}

/// Selectors and row rules for one source site.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PopupProfile {
    /// Profile label used in log output.
    pub name: String,
    /// Popup container selectors, most specific first.
    pub popup: Vec<String>,
    /// Display name element inside the popup.
    pub name_selector: String,
    /// Property rows inside the stats section.
    pub property: String,
    /// Modifier/affix rows inside the stats section.
    pub modifier: String,
    /// Default description block.
    pub description: String,
    /// Content container whose last direct `div` holds the alternate name.
    pub content: String,
    /// Image element searched for in the popup's ancestors.
    pub image: String,
    #[serde(default = "default_image_attr")]
    pub image_attr: String,
    /// How many ancestor levels to search for the image.
    #[serde(default = "default_image_search_depth")]
    pub image_search_depth: usize,
    /// Regexes for property rows that are dropped entirely.
    #[serde(default)]
    pub skip_rows: Vec<String>,
    /// Regex with three groups (label, numerator, denominator) for stack-size rows.
    #[serde(default)]
    pub stack_row: Option<String>,
    /// Number of sequence fields the property rows should produce, if known.
    #[serde(default)]
    pub expected_property_fields: Option<usize>,
}

impl PopupProfile {
    /// Parse a profile from JSON text.
    pub fn from_json_str(json: &str) -> Result<Self, ParseError> {
        serde_json::from_str(json).map_err(|e| {
            ParseError::invalid_input("<profile>", "ParseProfile", Some(anyhow::Error::new(e)))
        })
    }

    /// Load a profile from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ParseError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| ParseError::io(path.display().to_string(), "ReadProfile", e))?;
        Self::from_json_str(&text).map_err(|mut err| {
            err.target = path.display().to_string();
            err
        })
    }
}
