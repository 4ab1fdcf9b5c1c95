// ABOUTME: Item popup field extractor: locates the popup fragment and pulls its fields in order.
// ABOUTME: Applies skip and stack-split rules to property rows so field positions stay stable.

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, warn};

use crate::error::ParseError;
use crate::extractors::loader::load_builtin_profile;
use crate::extractors::profile::PopupProfile;
use crate::extractors::select::{compile_selector, first_attr, first_in_document, flatten_text};
use crate::result::{FieldSequence, PopupFields, PropertyLine};

/// A compiled [`PopupProfile`], ready to run against page markup.
#[derive(Debug, Clone)]
pub struct PopupExtractor {
    profile_name: String,
    popup: Vec<Selector>,
    name: Selector,
    property: Selector,
    modifier: Selector,
    description: Selector,
    content: Selector,
    image: Selector,
    image_attr: String,
    image_search_depth: usize,
    skip_rows: Vec<Regex>,
    stack_row: Option<Regex>,
    expected_property_fields: Option<usize>,
}

fn compile_regex(pattern: &str) -> Result<Regex, ParseError> {
    Regex::new(pattern).map_err(|e| {
        ParseError::invalid_input(pattern, "CompileRowPattern", Some(anyhow::Error::new(e)))
    })
}

impl PopupExtractor {
    /// Compile a profile. Fails with InvalidInput on a bad selector or pattern.
    pub fn new(profile: PopupProfile) -> Result<Self, ParseError> {
        if profile.popup.is_empty() {
            return Err(ParseError::invalid_input(
                profile.name.as_str(),
                "CompileProfile",
                Some(anyhow::anyhow!("profile lists no popup selectors")),
            ));
        }
        let popup = profile
            .popup
            .iter()
            .map(|css| compile_selector(css))
            .collect::<Result<Vec<_>, _>>()?;
        let skip_rows = profile
            .skip_rows
            .iter()
            .map(|p| compile_regex(p))
            .collect::<Result<Vec<_>, _>>()?;
        let stack_row = match profile.stack_row {
            Some(ref p) => {
                let re = compile_regex(p)?;
                // label, numerator, denominator
                if re.captures_len() != 4 {
                    return Err(ParseError::invalid_input(
                        p.as_str(),
                        "CompileRowPattern",
                        Some(anyhow::anyhow!("stack row pattern needs exactly three groups")),
                    ));
                }
                Some(re)
            }
            None => None,
        };

        Ok(Self {
            popup,
            name: compile_selector(&profile.name_selector)?,
            property: compile_selector(&profile.property)?,
            modifier: compile_selector(&profile.modifier)?,
            description: compile_selector(&profile.description)?,
            content: compile_selector(&profile.content)?,
            image: compile_selector(&profile.image)?,
            image_attr: profile.image_attr,
            image_search_depth: profile.image_search_depth,
            skip_rows,
            stack_row,
            expected_property_fields: profile.expected_property_fields,
            profile_name: profile.name,
        })
    }

    /// Extractor for the built-in poedb profile.
    ///
    /// # Panics
    ///
    /// Panics if the embedded profile does not compile.
    pub fn builtin() -> Self {
        Self::new(load_builtin_profile()).expect("builtin profile must compile")
    }

    /// Extract the popup of `html` into the named record.
    pub fn extract(&self, html: &str) -> Result<PopupFields, ParseError> {
        let doc = Html::parse_document(html);
        let popup = first_in_document(&doc, &self.popup).ok_or_else(|| {
            ParseError::structure_not_found(
                "<markup>",
                "LocatePopup",
                Some(anyhow::anyhow!(
                    "no popup container found (profile {}); the page layout may have changed or not finished rendering",
                    self.profile_name
                )),
            )
        })?;

        let mut fields = PopupFields {
            image_url: self.locate_image(popup),
            ..Default::default()
        };

        fields.name = popup
            .select(&self.name)
            .next()
            .map(|el| flatten_text(&el, ""))
            .filter(|s| !s.is_empty());

        let mut seen_rows = Vec::new();
        for row in popup.select(&self.property) {
            let text = flatten_text(&row, " ");
            if text.is_empty() {
                continue;
            }
            seen_rows.push(text.clone());
            if let Some(line) = self.classify_row(text) {
                fields.properties.push(line);
            }
        }
        self.check_property_layout(&fields, &seen_rows);

        fields.modifiers = popup
            .select(&self.modifier)
            .map(|el| flatten_text(&el, " "))
            .filter(|s| !s.is_empty())
            .collect();

        fields.description = popup
            .select(&self.description)
            .next()
            .map(|el| flatten_text(&el, "\n"))
            .filter(|s| !s.is_empty());

        fields.alternate_name = popup
            .select(&self.content)
            .next()
            .and_then(|content| {
                content
                    .children()
                    .filter_map(ElementRef::wrap)
                    .filter(|el| el.value().name() == "div")
                    .last()
            })
            .map(|el| flatten_text(&el, " "))
            .filter(|s| !s.is_empty());

        debug!(
            profile = %self.profile_name,
            properties = fields.properties.len(),
            modifiers = fields.modifiers.len(),
            has_image = fields.image_url.is_some(),
            "extracted popup"
        );
        Ok(fields)
    }

    /// Extract straight into the ordered sequence form.
    pub fn extract_sequence(&self, html: &str) -> Result<FieldSequence, ParseError> {
        self.extract(html).map(|f| f.to_sequence())
    }

    /// Searches the popup and then each ancestor, up to the profile's depth.
    fn locate_image(&self, popup: ElementRef<'_>) -> Option<String> {
        let mut container = popup;
        for _ in 0..self.image_search_depth {
            if let Some(src) = first_attr(&container, &self.image, &self.image_attr) {
                return Some(src);
            }
            match container.parent().and_then(ElementRef::wrap) {
                Some(parent) => container = parent,
                None => break,
            }
        }
        None
    }

    fn classify_row(&self, text: String) -> Option<PropertyLine> {
        if self.skip_rows.iter().any(|re| re.is_match(&text)) {
            debug!(row = %text, "skipping variable property row");
            return None;
        }
        if let Some(caps) = self.stack_row.as_ref().and_then(|re| re.captures(&text)) {
            return Some(PropertyLine::Stack {
                label: caps[1].to_string(),
                ratio: format!("{}/{}", &caps[2], &caps[3]),
            });
        }
        Some(PropertyLine::Text { text })
    }

    fn check_property_layout(&self, fields: &PopupFields, rows: &[String]) {
        if let Some(expected) = self.expected_property_fields {
            let got = fields.property_field_count();
            if got != expected {
                warn!(
                    profile = %self.profile_name,
                    expected,
                    got,
                    ?rows,
                    "property rows do not match the expected layout; a new variable row may need a skip rule"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn popup_html(rows: &str) -> String {
        format!(
            r#"<html><body>
            <div class="newItemPopup">
              <div class="itemName"><span class="lc">蜕变石</span></div>
              <div class="content">
                <div class="Stats">{}<div class="explicitMod">将普通物品升级为魔法物品</div></div>
                <div>Orb of Transmutation</div>
              </div>
            </div></body></html>"#,
            rows
        )
    }

    #[test]
    fn skip_rule_drops_limit_rows() {
        let ex = PopupExtractor::builtin();
        let fields = ex
            .extract(&popup_html(
                r#"<div class="property">通货</div><div class="property">限制: 1</div>"#,
            ))
            .unwrap();
        assert_eq!(
            fields.properties,
            vec![PropertyLine::Text {
                text: "通货".to_string()
            }]
        );
    }

    #[test]
    fn english_rows_follow_same_rules() {
        let ex = PopupExtractor::builtin();
        let fields = ex
            .extract(&popup_html(
                r#"<div class="property">Stackable Currency</div>
                   <div class="property">Limit: 20</div>
                   <div class="property">Stack Size: 1 / 40</div>"#,
            ))
            .unwrap();
        assert_eq!(
            fields.properties,
            vec![
                PropertyLine::Text {
                    text: "Stackable Currency".to_string()
                },
                PropertyLine::Stack {
                    label: "Stack Size".to_string(),
                    ratio: "1/40".to_string()
                },
            ]
        );
    }

    #[test]
    fn missing_popup_is_structure_not_found() {
        let ex = PopupExtractor::builtin();
        let err = ex
            .extract("<html><body><div class='itemPopup'></div></body></html>")
            .unwrap_err();
        assert!(err.is_structure_not_found());
    }

    #[test]
    fn image_beyond_search_depth_is_absent() {
        let mut profile = load_builtin_profile();
        profile.image_search_depth = 1;
        let ex = PopupExtractor::new(profile).unwrap();
        let html = r#"<html><body><div class="row">
            <div class="itemboximage"><img src="https://cdn.poedb.tw/image/a.webp"></div>
            <div class="col"><div class="newItemPopup"><div class="itemName"><span class="lc">A</span></div></div></div>
        </div></body></html>"#;
        let fields = ex.extract(html).unwrap();
        assert_eq!(fields.image_url, None);
        assert_eq!(fields.name.as_deref(), Some("A"));
    }

    #[test]
    fn stack_pattern_must_have_three_groups() {
        let mut profile = load_builtin_profile();
        profile.stack_row = Some(r"^stack (\d+)$".to_string());
        let err = PopupExtractor::new(profile).unwrap_err();
        assert_eq!(err.code, crate::error::ErrorCode::InvalidInput);
    }

    #[test]
    fn empty_rows_are_not_inserted() {
        let ex = PopupExtractor::builtin();
        let fields = ex
            .extract(&popup_html(
                r#"<div class="property">  </div><div class="property">通货</div>"#,
            ))
            .unwrap();
        assert_eq!(fields.properties.len(), 1);
        assert!(fields.description.is_none());
    }
}
