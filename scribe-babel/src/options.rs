//! Conversion options shared by the extractor, both bridges and the restorer

/// Image query keys that mark an image as using server-side transforms.
pub const DEFAULT_IMAGE_TRANSFORM_KEYS: &[&str] = &[
    "classes", "crop", "cropResize", "cropZoom", "derivatives", "forceResize", "grayscale",
    "height", "id", "lightbox", "quality", "resize", "rotate", "sizes", "width",
];

#[derive(Debug, Clone, PartialEq)]
pub struct ConvertOptions {
    /// Line that separates the summary from the rest of a page
    pub summary_delimiter: String,
    /// Nesting cap for shortcode content, in both directions
    pub max_shortcode_depth: usize,
    /// Substitution rounds before the restorer gives up
    pub max_restore_passes: usize,
    /// Rounds of nested-shortcode extraction before giving up
    pub max_extract_passes: usize,
    pub image_transform_keys: Vec<String>,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        ConvertOptions {
            summary_delimiter: "===".to_string(),
            max_shortcode_depth: 10,
            max_restore_passes: 50,
            max_extract_passes: 32,
            image_transform_keys: DEFAULT_IMAGE_TRANSFORM_KEYS
                .iter()
                .map(|key| key.to_string())
                .collect(),
        }
    }
}

impl ConvertOptions {
    pub fn with_summary_delimiter(mut self, delimiter: impl Into<String>) -> Self {
        self.summary_delimiter = delimiter.into();
        self
    }

    pub fn with_max_shortcode_depth(mut self, depth: usize) -> Self {
        self.max_shortcode_depth = depth;
        self
    }

    pub fn is_image_transform_key(&self, key: &str) -> bool {
        self.image_transform_keys.iter().any(|k| k == key)
    }
}
