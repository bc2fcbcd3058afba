//! Shortcode descriptors as supplied by configuration

use super::{ContentType, ShortcodeType};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Value type of a declared attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttributeType {
    #[default]
    Text,
    Number,
    Boolean,
    Select,
    Color,
}

/// Schema for one shortcode attribute.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AttributeSpec {
    #[serde(rename = "type")]
    pub kind: AttributeType,
    pub default: Option<String>,
    pub required: bool,
    /// Allowed values for `select` attributes
    pub options: Vec<String>,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

/// Registry entry for one shortcode name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShortcodeDescriptor {
    pub name: String,
    pub title: String,
    #[serde(rename = "type")]
    pub kind: Option<ShortcodeType>,
    /// Content-less shortcodes are always written self-closing
    pub has_content: bool,
    pub content_type: ContentType,
    pub attributes: BTreeMap<String, AttributeSpec>,
    pub allowed_children: Vec<String>,
    pub parent_only: bool,
    /// Attribute receiving the value of `[name=value]`
    pub bbcode_attribute: Option<String>,
    /// Preview styling, `{{attr}}` placeholders filled from attribute values
    pub css_template: Option<String>,
}

impl Default for ShortcodeDescriptor {
    fn default() -> Self {
        ShortcodeDescriptor {
            name: String::new(),
            title: String::new(),
            kind: None,
            has_content: true,
            content_type: ContentType::Blocks,
            attributes: BTreeMap::new(),
            allowed_children: Vec::new(),
            parent_only: false,
            bbcode_attribute: None,
            css_template: None,
        }
    }
}

impl ShortcodeDescriptor {
    pub fn new(name: impl Into<String>, title: impl Into<String>, kind: ShortcodeType) -> Self {
        ShortcodeDescriptor {
            name: name.into(),
            title: title.into(),
            kind: Some(kind),
            ..Default::default()
        }
    }

    pub fn with_content_type(mut self, content_type: ContentType) -> Self {
        self.content_type = content_type;
        self
    }

    pub fn without_content(mut self) -> Self {
        self.has_content = false;
        self
    }

    pub fn with_attribute(mut self, name: impl Into<String>, spec: AttributeSpec) -> Self {
        self.attributes.insert(name.into(), spec);
        self
    }

    pub fn with_children<I, S>(mut self, children: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_children = children.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_bbcode_attribute(mut self, attribute: impl Into<String>) -> Self {
        self.bbcode_attribute = Some(attribute.into());
        self
    }

    pub fn with_css(mut self, template: impl Into<String>) -> Self {
        self.css_template = Some(template.into());
        self
    }

    pub fn parent_only(mut self) -> Self {
        self.parent_only = true;
        self
    }

    /// The attribute a bare `[name=value]` maps to.
    pub fn positional_attribute(&self) -> &str {
        self.bbcode_attribute.as_deref().unwrap_or(&self.name)
    }

    pub fn is_block(&self) -> bool {
        self.kind == Some(ShortcodeType::Block)
    }

    /// Default values declared in the attribute schema.
    pub fn defaults(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attributes
            .iter()
            .filter_map(|(name, spec)| spec.default.as_deref().map(|value| (name.as_str(), value)))
    }
}
