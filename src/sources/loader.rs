//! Trait-based loading of local pixel data.
//!
//! Local files are turned into a [`PixelSource`] so that the same fetch code
//! runs against a remote store and against data on disk.
//!
//! ## Supported Formats
//!
//! - **NumPy Arrays**: `.npy` files with 2 to 5 dimensions
//! - **Standard Images**: PNG, JPEG, BMP, TIFF, WebP (one channel per color band)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use roi5d::sources::LoaderRegistry;
//!
//! let registry = LoaderRegistry::new();
//! let source = registry.load(&bytes, Some("stack.npy"))?;
//! ```

use std::path::Path;

use crate::pixels::PixelSource;

/// Error type for loader operations.
#[derive(Debug, Clone)]
pub struct LoaderError {
    /// Human-readable error message.
    pub message: String,
    /// The loader that produced this error (if known).
    pub loader_id: Option<&'static str>,
}

impl LoaderError {
    /// Create a new loader error.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            loader_id: None,
        }
    }

    /// Create an error with loader context.
    pub fn with_loader(mut self, loader_id: &'static str) -> Self {
        self.loader_id = Some(loader_id);
        self
    }
}

impl std::fmt::Display for LoaderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(loader) = self.loader_id {
            write!(f, "[{}] {}", loader, self.message)
        } else {
            write!(f, "{}", self.message)
        }
    }
}

impl std::error::Error for LoaderError {}

impl From<String> for LoaderError {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&str> for LoaderError {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Trait for local pixel data loaders.
pub trait SourceLoader: Send + Sync {
    /// Unique identifier for this loader (e.g., "image", "npy").
    fn id(&self) -> &'static str;

    /// Human-readable name.
    fn display_name(&self) -> &'static str;

    /// File extensions this loader handles (lowercase, without dots).
    fn extensions(&self) -> &'static [&'static str];

    /// Check magic bytes to see whether this loader can likely handle `data`.
    fn can_load(&self, data: &[u8]) -> bool;

    /// Decode raw file bytes into a pixel source.
    fn load(&self, data: &[u8]) -> Result<Box<dyn PixelSource>, LoaderError>;

    /// Priority for format detection (higher = checked first).
    fn priority(&self) -> i32 {
        0
    }
}

/// Registry of available loaders.
pub struct LoaderRegistry {
    loaders: Vec<Box<dyn SourceLoader>>,
}

impl LoaderRegistry {
    /// Create a new registry with all built-in loaders.
    pub fn new() -> Self {
        let mut registry = Self {
            loaders: Vec::new(),
        };
        registry.register(Box::new(super::ImageLoader));
        registry.register(Box::new(super::NpyLoader));
        registry
    }

    /// Register a new loader.
    pub fn register(&mut self, loader: Box<dyn SourceLoader>) {
        self.loaders.push(loader);
        self.loaders.sort_by_key(|l| std::cmp::Reverse(l.priority()));
    }

    /// Get all supported file extensions.
    pub fn supported_extensions(&self) -> Vec<&'static str> {
        let mut extensions: Vec<&'static str> = self
            .loaders
            .iter()
            .flat_map(|l| l.extensions().iter().copied())
            .collect();
        extensions.sort_unstable();
        extensions.dedup();
        extensions
    }

    /// Load data, trying loaders by extension first, then by magic bytes.
    pub fn load(
        &self,
        data: &[u8],
        filename: Option<&str>,
    ) -> Result<Box<dyn PixelSource>, LoaderError> {
        let extension = filename
            .and_then(|f| f.rsplit_once('.'))
            .map(|(_, ext)| ext.to_lowercase());

        if let Some(ref ext) = extension {
            for loader in self
                .loaders
                .iter()
                .filter(|l| l.extensions().contains(&ext.as_str()))
            {
                match loader.load(data) {
                    Ok(source) => {
                        log::debug!("Loaded with {} loader (by extension)", loader.id());
                        return Ok(source);
                    }
                    Err(e) => log::trace!("Loader {} failed: {}", loader.id(), e),
                }
            }
        }

        if let Some(loader) = self.loaders.iter().find(|l| l.can_load(data)) {
            return loader.load(data).map_err(|e| e.with_loader(loader.id()));
        }

        Err(LoaderError::new(format!(
            "No loader could handle the data{}",
            filename
                .map(|f| format!(" (file: {})", f))
                .unwrap_or_default()
        )))
    }

    /// Read and load a file from disk.
    pub fn load_file(&self, path: &Path) -> Result<Box<dyn PixelSource>, LoaderError> {
        let data = std::fs::read(path)
            .map_err(|e| LoaderError::new(format!("Cannot read {}: {}", path.display(), e)))?;
        self.load(&data, path.file_name().and_then(|n| n.to_str()))
    }

    /// Get all registered loaders.
    pub fn loaders(&self) -> &[Box<dyn SourceLoader>] {
        &self.loaders
    }
}

impl Default for LoaderRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_npy_checked_first() {
        let registry = LoaderRegistry::new();
        assert_eq!(registry.loaders()[0].id(), "npy");
    }

    #[test]
    fn test_supported_extensions() {
        let extensions = LoaderRegistry::new().supported_extensions();
        assert!(extensions.contains(&"png"));
        assert!(extensions.contains(&"tif"));
        assert!(extensions.contains(&"npy"));
    }

    #[test]
    fn test_unknown_data() {
        let registry = LoaderRegistry::new();
        let err = registry.load(b"plain text", Some("notes.txt")).err().unwrap();
        assert!(err.message.contains("notes.txt"));
    }
}
