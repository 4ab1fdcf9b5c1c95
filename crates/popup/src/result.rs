// ABOUTME: Extraction results: the named PopupFields record and its ordered FieldSequence form.
// ABOUTME: The sequence keeps the positional contract that downstream consumers index into.

use serde::{Deserialize, Serialize};

/// Positions of each field inside a [`FieldSequence`] for a well-formed popup.
pub mod field_position {
    pub const NAME: usize = 0;
    pub const CATEGORY: usize = 1;
    pub const STACK_LABEL: usize = 2;
    pub const STACK_RATIO: usize = 3;
    pub const AFFIX: usize = 4;
    pub const DESCRIPTION: usize = 5;
    pub const ALTERNATE_NAME: usize = 6;
    pub const IMAGE: usize = 7;
}

/// One kept row from the popup's stats section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PropertyLine {
    Text { text: String },
    /// A stack-size row split into its label and the `a/b` ratio.
    Stack { label: String, ratio: String },
}

impl PropertyLine {
    fn push_fields(&self, out: &mut Vec<String>) {
        match self {
            PropertyLine::Text { text } => out.push(text.clone()),
            PropertyLine::Stack { label, ratio } => {
                out.push(label.clone());
                out.push(ratio.clone());
            }
        }
    }

    /// Number of sequence fields this row contributes.
    pub fn width(&self) -> usize {
        match self {
            PropertyLine::Text { .. } => 1,
            PropertyLine::Stack { .. } => 2,
        }
    }
}

/// Named record of everything pulled out of one item popup.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PopupFields {
    pub name: Option<String>,
    pub properties: Vec<PropertyLine>,
    pub modifiers: Vec<String>,
    /// Description text with line breaks kept as `\n`.
    pub description: Option<String>,
    pub alternate_name: Option<String>,
    pub image_url: Option<String>,
}

impl PopupFields {
    /// First plain property row; on item popups this is the category line.
    pub fn category(&self) -> Option<&str> {
        self.properties.iter().find_map(|p| match p {
            PropertyLine::Text { text } => Some(text.as_str()),
            PropertyLine::Stack { .. } => None,
        })
    }

    /// The stack ratio (`"1/20"`) when the popup has a stack-size row.
    pub fn stack_ratio(&self) -> Option<&str> {
        self.properties.iter().find_map(|p| match p {
            PropertyLine::Stack { ratio, .. } => Some(ratio.as_str()),
            PropertyLine::Text { .. } => None,
        })
    }

    /// Modifier lines joined with newlines, `None` when there are none.
    pub fn affix(&self) -> Option<String> {
        if self.modifiers.is_empty() {
            None
        } else {
            Some(self.modifiers.join("\n"))
        }
    }

    /// Number of sequence fields produced by the property rows.
    pub fn property_field_count(&self) -> usize {
        self.properties.iter().map(PropertyLine::width).sum()
    }

    /// Flatten into the ordered sequence form.
    pub fn to_sequence(&self) -> FieldSequence {
        let mut out = Vec::new();
        if let Some(ref name) = self.name {
            out.push(name.clone());
        }
        for prop in &self.properties {
            prop.push_fields(&mut out);
        }
        out.extend(self.modifiers.iter().cloned());
        if let Some(ref desc) = self.description {
            out.push(desc.clone());
        }
        if let Some(ref alt) = self.alternate_name {
            out.push(alt.clone());
        }
        if let Some(ref img) = self.image_url {
            out.push(img.clone());
        }
        FieldSequence(out)
    }
}

/// Ordered item fields, optionally ending with the image source URL.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldSequence(pub Vec<String>);

impl FieldSequence {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, position: usize) -> Option<&str> {
        self.0.get(position).map(String::as_str)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn into_vec(self) -> Vec<String> {
        self.0
    }
}
