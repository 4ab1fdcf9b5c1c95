// ABOUTME: Template rendering for item popups using literal `{name}` placeholder substitution.
// ABOUTME: Unknown placeholders stay in the output untouched; output directories are created.

use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ParseError;
use crate::result::PopupFields;

static PLACEHOLDER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("valid placeholder regex"));

/// The values every item popup template is filled with.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateValues {
    pub title: String,
    pub category: String,
    pub stack: String,
    pub affix: String,
    pub desc_html: String,
    /// Alternate-language (English) name.
    pub en: String,
    pub icon_url: String,
}

impl TemplateValues {
    /// Placeholder names this value set fills.
    pub const NAMES: [&'static str; 7] = [
        "title",
        "category",
        "stack",
        "affix",
        "desc_html",
        "en",
        "icon_url",
    ];

    /// Value for a placeholder name, `None` when the name is not one of ours.
    pub fn get(&self, name: &str) -> Option<&str> {
        let v = match name {
            "title" => &self.title,
            "category" => &self.category,
            "stack" => &self.stack,
            "affix" => &self.affix,
            "desc_html" => &self.desc_html,
            "en" => &self.en,
            "icon_url" => &self.icon_url,
            _ => return None,
        };
        Some(v.as_str())
    }

    /// Map an extracted popup into template slots.
    ///
    /// `icon_url` is the already-normalized image URL. Fails with
    /// StructureNotFound naming the first slot the popup could not fill.
    pub fn from_popup(fields: &PopupFields, icon_url: impl Into<String>) -> Result<Self, ParseError> {
        fn require<T>(value: Option<T>, slot: &str) -> Result<T, ParseError> {
            value.ok_or_else(|| {
                ParseError::structure_not_found(
                    slot,
                    "MapTemplateSlots",
                    Some(anyhow::anyhow!("popup has no value for slot {}", slot)),
                )
            })
        }

        Ok(Self {
            title: require(fields.name.clone(), "title")?,
            category: require(fields.category(), "category")?.to_string(),
            stack: require(fields.stack_ratio(), "stack")?.to_string(),
            affix: require(fields.affix(), "affix")?,
            desc_html: require(fields.description.clone(), "desc_html")?,
            en: require(fields.alternate_name.clone(), "en")?,
            icon_url: icon_url.into(),
        })
    }
}

/// Replace each `{name}` for which `lookup` returns a value; leave the rest as written.
pub fn substitute<'a, F>(text: &str, lookup: F) -> String
where
    F: Fn(&str) -> Option<&'a str>,
{
    PLACEHOLDER_RE
        .replace_all(text, |caps: &Captures<'_>| match lookup(&caps[1]) {
            Some(value) => value.to_string(),
            None => caps[0].to_string(),
        })
        .into_owned()
}

/// Load `template_path`, fill it with `values` and write it to `out_path`.
///
/// Returns the output path.
pub fn render_item_popup(
    template_path: impl AsRef<Path>,
    values: &TemplateValues,
    out_path: impl AsRef<Path>,
) -> Result<PathBuf, ParseError> {
    let template_path = template_path.as_ref();
    let out_path = out_path.as_ref();

    if !template_path.exists() {
        return Err(ParseError::file_not_found(
            template_path.display().to_string(),
            "ReadTemplate",
        ));
    }
    let text = std::fs::read_to_string(template_path)
        .map_err(|e| ParseError::io(template_path.display().to_string(), "ReadTemplate", e))?;

    let rendered = substitute(&text, |name| values.get(name));

    if let Some(parent) = out_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .map_err(|e| ParseError::io(parent.display().to_string(), "CreateOutputDir", e))?;
        }
    }
    std::fs::write(out_path, rendered)
        .map_err(|e| ParseError::io(out_path.display().to_string(), "WriteArtifact", e))?;

    debug!(template = %template_path.display(), out = %out_path.display(), "rendered template");
    Ok(out_path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::result::PropertyLine;
    use pretty_assertions::assert_eq;

    #[test]
    fn substitute_leaves_unknown_placeholders() {
        let out = substitute("<h1>{title}</h1>{unused}<img src=\"{icon_url}\">", |name| {
            match name {
                "title" => Some("知识卷轴"),
                "icon_url" => Some("https://cdn.max-c.com/wiki/238960/a.png?v=1"),
                _ => None,
            }
        });
        assert_eq!(
            out,
            "<h1>知识卷轴</h1>{unused}<img src=\"https://cdn.max-c.com/wiki/238960/a.png?v=1\">"
        );
    }

    #[test]
    fn substitute_ignores_non_identifier_braces() {
        let css = ".popup { color: red; } {1} {title}";
        let out = substitute(css, |n| (n == "title").then_some("T"));
        assert_eq!(out, ".popup { color: red; } {1} T");
    }

    #[test]
    fn every_name_resolves() {
        let values = TemplateValues::default();
        for name in TemplateValues::NAMES {
            assert!(values.get(name).is_some(), "{}", name);
        }
        assert!(values.get("unused").is_none());
    }

    #[test]
    fn from_popup_requires_stack_row() {
        let fields = PopupFields {
            name: Some("A".to_string()),
            properties: vec![PropertyLine::Text {
                text: "通货".to_string(),
            }],
            modifiers: vec!["m".to_string()],
            description: Some("d".to_string()),
            alternate_name: Some("A".to_string()),
            image_url: None,
        };
        let err = TemplateValues::from_popup(&fields, "x").unwrap_err();
        assert!(err.is_structure_not_found());
        assert_eq!(err.target, "stack");
    }
}
