//! Shortcode registry
//!
//! Read-only lookup consulted by the extractor and both bridges. Built once from
//! configuration and shared behind an `Arc`.

use super::css::interpolate_css;
use super::validate::{validate, AttributeError};
use super::{
    AttributeSpec, Attributes, ContentType, ShortcodeDescriptor, ShortcodeType, BLOCK_FALLBACK,
};
use crate::placeholder::PreservedBlock;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Errors raised when registering a descriptor
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RegistryError {
    #[error("shortcode descriptor is missing required field '{field}'")]
    MissingField { field: &'static str },
    #[error("shortcode name '{0}' is not a valid tag name")]
    InvalidName(String),
}

/// Typed preview renderer for one shortcode name.
pub trait ShortcodeRenderer: Send + Sync {
    fn render(&self, block: &PreservedBlock, descriptor: &ShortcodeDescriptor) -> String;
}

impl<F> ShortcodeRenderer for F
where
    F: Fn(&PreservedBlock, &ShortcodeDescriptor) -> String + Send + Sync,
{
    fn render(&self, block: &PreservedBlock, descriptor: &ShortcodeDescriptor) -> String {
        self(block, descriptor)
    }
}

#[derive(Clone, Default)]
pub struct ShortcodeRegistry {
    descriptors: BTreeMap<String, ShortcodeDescriptor>,
    renderers: HashMap<String, Arc<dyn ShortcodeRenderer>>,
}

impl fmt::Debug for ShortcodeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShortcodeRegistry")
            .field("descriptors", &self.descriptors.keys().collect::<Vec<_>>())
            .field("renderers", &self.renderers.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl ShortcodeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a descriptor, replacing any existing entry with the same name.
    pub fn register(&mut self, descriptor: ShortcodeDescriptor) -> Result<(), RegistryError> {
        if descriptor.name.trim().is_empty() {
            return Err(RegistryError::MissingField { field: "name" });
        }
        if !is_tag_name(&descriptor.name) {
            return Err(RegistryError::InvalidName(descriptor.name));
        }
        if descriptor.title.trim().is_empty() {
            return Err(RegistryError::MissingField { field: "title" });
        }
        if descriptor.kind.is_none() {
            return Err(RegistryError::MissingField { field: "type" });
        }
        tracing::debug!(name = %descriptor.name, "registered shortcode");
        self.descriptors.insert(descriptor.name.clone(), descriptor);
        Ok(())
    }

    pub fn register_renderer(&mut self, name: impl Into<String>, renderer: impl ShortcodeRenderer + 'static) {
        self.renderers.insert(name.into(), Arc::new(renderer));
    }

    pub fn get(&self, name: &str) -> Option<&ShortcodeDescriptor> {
        self.descriptors.get(name)
    }

    pub fn has(&self, name: &str) -> bool {
        self.descriptors.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.descriptors.keys().map(String::as_str)
    }

    pub fn descriptors(&self) -> impl Iterator<Item = &ShortcodeDescriptor> {
        self.descriptors.values()
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    pub fn shortcode_type(&self, name: &str) -> Option<ShortcodeType> {
        self.get(name).and_then(|d| d.kind)
    }

    pub fn content_type(&self, name: &str) -> ContentType {
        self.get(name).map(|d| d.content_type).unwrap_or_default()
    }

    pub fn is_code(&self, name: &str) -> bool {
        self.content_type(name) == ContentType::Code
    }

    /// Content-less shortcodes are always written self-closing.
    pub fn is_content_less(&self, name: &str) -> bool {
        self.get(name).is_some_and(|d| !d.has_content)
    }

    pub fn positional_attribute(&self, name: &str) -> Option<String> {
        self.get(name).map(|d| d.positional_attribute().to_string())
    }

    /// Whether `child` may be nested directly inside `parent`.
    ///
    /// A `parent_only` child must be listed by the parent. A parent with an
    /// allow-list accepts only the names on it. Anything else is allowed.
    pub fn is_child_allowed(&self, parent: &str, child: &str) -> bool {
        let listed = self
            .get(parent)
            .is_some_and(|d| d.allowed_children.iter().any(|c| c == child));
        if self.get(child).is_some_and(|d| d.parent_only) {
            return listed;
        }
        match self.get(parent) {
            Some(d) if !d.allowed_children.is_empty() => listed,
            _ => true,
        }
    }

    pub fn can_have_children(&self, name: &str) -> bool {
        self.get(name).is_some_and(|d| !d.allowed_children.is_empty())
    }

    /// Container shortcodes whose allow-list names `child`.
    pub fn containers_allowing(&self, child: &str) -> Vec<&str> {
        self.descriptors
            .values()
            .filter(|d| d.allowed_children.iter().any(|c| c == child))
            .map(|d| d.name.as_str())
            .collect()
    }

    /// Minimal descriptor for a shortcode the registry does not know, with every
    /// parsed attribute declared as text.
    pub fn synthesize(&self, name: &str, attributes: &Attributes) -> ShortcodeDescriptor {
        if let Some(known) = self.get(name) {
            return known.clone();
        }
        let kind = if BLOCK_FALLBACK.contains(&name) {
            ShortcodeType::Block
        } else {
            ShortcodeType::Inline
        };
        let mut descriptor = ShortcodeDescriptor::new(name, name, kind);
        for key in attributes.keys() {
            descriptor
                .attributes
                .insert(key.to_string(), AttributeSpec::default());
        }
        descriptor
    }

    /// Preview CSS for `name`, attribute values merged over schema defaults.
    pub fn generate_css(&self, name: &str, attributes: &Attributes) -> String {
        let Some(descriptor) = self.get(name) else {
            return String::new();
        };
        let Some(template) = descriptor.css_template.as_deref() else {
            return String::new();
        };
        let mut values: Attributes = descriptor.defaults().collect();
        for (key, value) in attributes.iter() {
            if !value.is_empty() {
                values.insert(key, value);
            }
        }
        interpolate_css(template, &values)
    }

    /// Validate attributes against the schema of `name`. Unknown names always pass.
    pub fn validate_attributes(
        &self,
        name: &str,
        attributes: &Attributes,
    ) -> Result<(), Vec<AttributeError>> {
        match self.get(name) {
            Some(descriptor) => validate(descriptor, attributes),
            None => Ok(()),
        }
    }

    /// Preview HTML from the renderer registered for the record's shortcode name.
    pub fn render_preview(&self, block: &PreservedBlock) -> Option<String> {
        let data = block.shortcode()?;
        let renderer = self.renderers.get(&data.tag_name)?;
        let descriptor = self.synthesize(&data.tag_name, &data.attributes);
        Some(renderer.render(block, &descriptor))
    }
}

fn is_tag_name(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}
