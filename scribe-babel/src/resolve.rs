//! Path resolution for links and images
//!
//! The host CMS turns page-relative paths into URLs. Resolution may fail or
//! arrive late; either way the document keeps working with the original path, and
//! the original is what gets written back to markdown.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ResolveError {
    #[error("path '{0}' could not be resolved")]
    NotFound(String),
    #[error("path resolution failed: {0}")]
    Failed(String),
}

/// A resolved path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resolution {
    pub resolved_url: String,
    /// Preview markup supplied by the host, if any
    pub html: String,
}

impl Resolution {
    pub fn url(url: impl Into<String>) -> Self {
        Resolution {
            resolved_url: url.into(),
            html: String::new(),
        }
    }
}

pub trait PathResolver: Send + Sync {
    fn resolve(&self, path: &str) -> Result<Resolution, ResolveError>;
}

/// Resolver that leaves every path as written.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopResolver;

impl PathResolver for NoopResolver {
    fn resolve(&self, path: &str) -> Result<Resolution, ResolveError> {
        Ok(Resolution::url(path))
    }
}

impl<F> PathResolver for F
where
    F: Fn(&str) -> Result<Resolution, ResolveError> + Send + Sync,
{
    fn resolve(&self, path: &str) -> Result<Resolution, ResolveError> {
        self(path)
    }
}

/// Paths that are already final and are never sent to a resolver.
pub fn is_absolute(path: &str) -> bool {
    if path.is_empty() || path.starts_with('#') || path.starts_with("//") {
        return true;
    }
    url::Url::parse(path).is_ok()
}

/// Resolved URL to original path, so saving writes the original back.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PathMap(BTreeMap<String, String>);

impl PathMap {
    pub fn record(&mut self, resolved: impl Into<String>, original: impl Into<String>) {
        let resolved = resolved.into();
        let original = original.into();
        if resolved != original {
            self.0.insert(resolved, original);
        }
    }

    /// The path to write for a URL found in the tree.
    pub fn original<'a>(&'a self, url: &'a str) -> &'a str {
        self.0.get(url).map(String::as_str).unwrap_or(url)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Resolve `path`, degrading to the original on failure.
pub fn resolve_path(resolver: &dyn PathResolver, paths: &mut PathMap, path: &str) -> String {
    if is_absolute(path) {
        return path.to_string();
    }
    match resolver.resolve(path) {
        Ok(resolution) => {
            paths.record(&resolution.resolved_url, path);
            resolution.resolved_url
        }
        Err(err) => {
            tracing::warn!(path, error = %err, "path left unresolved");
            path.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absolute_paths_skip_the_resolver() {
        assert!(is_absolute("https://example.com/a.png"));
        assert!(is_absolute("//cdn.example.com/a.png"));
        assert!(is_absolute("#section"));
        assert!(is_absolute("mailto:me@example.com"));
        assert!(!is_absolute("image.png"));
        assert!(!is_absolute("../blog/post"));
    }

    #[test]
    fn resolved_paths_map_back_to_originals() {
        let resolver = |path: &str| -> Result<Resolution, ResolveError> {
            Ok(Resolution::url(format!("/user/pages/{path}")))
        };
        let mut paths = PathMap::default();
        let url = resolve_path(&resolver, &mut paths, "cat.jpg");
        assert_eq!(url, "/user/pages/cat.jpg");
        assert_eq!(paths.original(&url), "cat.jpg");
        assert_eq!(paths.original("other"), "other");
    }

    #[test]
    fn failures_keep_the_original_path() {
        let resolver = |path: &str| -> Result<Resolution, ResolveError> {
            Err(ResolveError::NotFound(path.to_string()))
        };
        let mut paths = PathMap::default();
        assert_eq!(resolve_path(&resolver, &mut paths, "missing.png"), "missing.png");
        assert!(paths.is_empty());
    }
}
