// ABOUTME: Item reference records and the JSON list loader that supplies them.
// ABOUTME: The loader rejects files whose top-level value is not a list.

use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ParseError;

/// One item as listed by the source site's index export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemReference {
    /// Page slug, e.g. `Scroll_of_Wisdom`.
    pub value: String,
    /// Category tag, e.g. `可堆叠通货`.
    #[serde(default)]
    pub desc: String,
    #[serde(default)]
    pub label: Option<String>,
}

impl ItemReference {
    pub fn has_desc(&self, desc: &str) -> bool {
        self.desc == desc
    }

    /// Detail page URL under `base` (no trailing slash needed).
    pub fn detail_url(&self, base: &str) -> String {
        format!("{}/{}", base.trim_end_matches('/'), self.value)
    }
}

/// Parse a JSON list of item references.
pub fn parse_item_list(json: &str, source: &str) -> Result<Vec<ItemReference>, ParseError> {
    let value: Value = serde_json::from_str(json).map_err(|e| {
        ParseError::invalid_input(source, "ParseItemList", Some(anyhow::Error::new(e)))
    })?;
    if !value.is_array() {
        return Err(ParseError::invalid_input(
            source,
            "ParseItemList",
            Some(anyhow::anyhow!("top-level JSON value is not a list")),
        ));
    }
    serde_json::from_value(value).map_err(|e| {
        ParseError::invalid_input(source, "ParseItemList", Some(anyhow::Error::new(e)))
    })
}

/// Read and parse a JSON list file.
pub fn load_item_list(path: impl AsRef<Path>) -> Result<Vec<ItemReference>, ParseError> {
    let path = path.as_ref();
    let source = path.display().to_string();
    let text =
        std::fs::read_to_string(path).map_err(|e| ParseError::io(source.as_str(), "ReadItemList", e))?;
    parse_item_list(&text, &source)
}
