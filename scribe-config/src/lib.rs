//! Shared configuration loader for the scribe toolchain.
//!
//! `defaults/scribe.default.toml` is embedded into every binary so that docs and
//! runtime behavior stay in sync. Applications layer user-specific files on top
//! of those defaults via [`Loader`] before deserializing into [`ScribeConfig`].

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, File, FileFormat, ValueKind};
use scribe_babel::shortcodes::{RegistryError, ShortcodeDescriptor, ShortcodeRegistry};
use scribe_babel::ConvertOptions;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

const DEFAULT_TOML: &str = include_str!("../defaults/scribe.default.toml");

/// Top-level configuration consumed by scribe applications.
#[derive(Debug, Clone, Deserialize)]
pub struct ScribeConfig {
    pub conversion: ConversionConfig,
    pub images: ImagesConfig,
    #[serde(default)]
    pub shortcodes: BTreeMap<String, ShortcodeDescriptor>,
}

/// Mirrors the knobs exposed by the converter.
#[derive(Debug, Clone, Deserialize)]
pub struct ConversionConfig {
    pub summary_delimiter: String,
    pub max_shortcode_depth: usize,
    pub max_restore_passes: usize,
    pub max_extract_passes: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ImagesConfig {
    pub transform_keys: Vec<String>,
}

impl From<&ConversionConfig> for ConvertOptions {
    fn from(config: &ConversionConfig) -> Self {
        ConvertOptions {
            summary_delimiter: config.summary_delimiter.clone(),
            max_shortcode_depth: config.max_shortcode_depth,
            max_restore_passes: config.max_restore_passes,
            max_extract_passes: config.max_extract_passes,
            ..ConvertOptions::default()
        }
    }
}

impl ScribeConfig {
    /// Conversion options, including the image transform keys.
    pub fn convert_options(&self) -> ConvertOptions {
        ConvertOptions {
            image_transform_keys: self.images.transform_keys.clone(),
            ..ConvertOptions::from(&self.conversion)
        }
    }

    /// Build a registry from the `[shortcodes.*]` tables.
    ///
    /// A descriptor without a `name` takes its table key.
    pub fn shortcode_registry(&self) -> Result<ShortcodeRegistry, RegistryError> {
        let mut registry = ShortcodeRegistry::new();
        for (key, descriptor) in &self.shortcodes {
            let mut descriptor = descriptor.clone();
            if descriptor.name.is_empty() {
                descriptor.name = key.clone();
            }
            registry.register(descriptor)?;
        }
        Ok(registry)
    }
}

/// Helper for layering user overrides over the built-in defaults.
#[derive(Debug, Clone)]
pub struct Loader {
    builder: ConfigBuilder<DefaultState>,
}

impl Loader {
    /// Start a loader seeded with the embedded defaults.
    pub fn new() -> Self {
        let builder = Config::builder().add_source(File::from_str(DEFAULT_TOML, FileFormat::Toml));
        Self { builder }
    }

    /// Layer a configuration file. Missing files trigger an error.
    pub fn with_file(mut self, path: impl AsRef<Path>) -> Self {
        let source = File::from(path.as_ref())
            .format(FileFormat::Toml)
            .required(true);
        self.builder = self.builder.add_source(source);
        self
    }

    /// Layer an optional configuration file (ignored if the file is absent).
    pub fn with_optional_file(mut self, path: impl AsRef<Path>) -> Self {
        let source = File::from(path.as_ref())
            .format(FileFormat::Toml)
            .required(false);
        self.builder = self.builder.add_source(source);
        self
    }

    /// Layer configuration given as TOML text.
    pub fn with_toml(mut self, toml: &str) -> Self {
        self.builder = self
            .builder
            .add_source(File::from_str(toml, FileFormat::Toml));
        self
    }

    /// Apply a single key/value override (useful for CLI settings).
    pub fn set_override<I>(mut self, key: &str, value: I) -> Result<Self, ConfigError>
    where
        I: Into<ValueKind>,
    {
        self.builder = self.builder.set_override(key, value)?;
        Ok(self)
    }

    /// Finalize the builder and deserialize the resulting configuration.
    pub fn build(self) -> Result<ScribeConfig, ConfigError> {
        self.builder.build()?.try_deserialize()
    }
}

impl Default for Loader {
    fn default() -> Self {
        Self::new()
    }
}

/// Convenience helper for callers that only need the defaults.
pub fn load_defaults() -> Result<ScribeConfig, ConfigError> {
    Loader::new().build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use scribe_babel::shortcodes::{ContentType, ShortcodeType};

    #[test]
    fn loads_default_config() {
        let config = load_defaults().expect("defaults to deserialize");
        assert_eq!(config.conversion.summary_delimiter, "===");
        assert_eq!(config.conversion.max_shortcode_depth, 10);
        assert!(config.images.transform_keys.iter().any(|k| k == "cropResize"));
        assert!(config.shortcodes.contains_key("notice"));
    }

    #[test]
    fn supports_overrides() {
        let config = Loader::new()
            .set_override("conversion.summary_delimiter", "+++")
            .expect("override to apply")
            .build()
            .expect("config to build");
        assert_eq!(config.conversion.summary_delimiter, "+++");
    }

    #[test]
    fn conversion_config_converts_to_options() {
        let config = load_defaults().expect("defaults to deserialize");
        let options = config.convert_options();
        assert_eq!(options.summary_delimiter, "===");
        assert_eq!(options.max_restore_passes, 50);
        assert_eq!(options.max_extract_passes, 32);
        assert!(options.is_image_transform_key("resize"));
        assert_eq!(options, ConvertOptions::default());
    }

    #[test]
    fn default_shortcodes_build_a_registry() {
        let config = load_defaults().expect("defaults to deserialize");
        let registry = config.shortcode_registry().expect("defaults are valid");
        assert_eq!(registry.shortcode_type("notice"), Some(ShortcodeType::Block));
        assert_eq!(registry.shortcode_type("mark"), Some(ShortcodeType::Inline));
        assert_eq!(registry.content_type("prism"), ContentType::Code);
        assert!(registry.is_content_less("icon"));
        assert_eq!(registry.positional_attribute("color").as_deref(), Some("color"));
        assert!(registry.is_child_allowed("tabs", "tab"));
        assert_eq!(
            registry.get("notice").and_then(|d| d.attributes.get("type")).and_then(|a| a.default.as_deref()),
            Some("info")
        );
    }

    #[test]
    fn user_toml_adds_shortcodes() {
        let config = Loader::new()
            .with_toml("[shortcodes.badge]\ntitle = \"Badge\"\ntype = \"inline\"\n")
            .build()
            .expect("config to build");
        let registry = config.shortcode_registry().expect("valid");
        assert!(registry.has("badge"));
        assert!(registry.has("notice"));
    }

    #[test]
    fn descriptors_without_title_are_rejected() {
        let config = Loader::new()
            .with_toml("[shortcodes.broken]\ntype = \"block\"\n")
            .build()
            .expect("config to build");
        assert!(config.shortcode_registry().is_err());
    }
}
