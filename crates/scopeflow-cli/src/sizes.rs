//! Stream size catalog backed by a JSON file.
//!
//! The file maps resolved stream paths to display labels:
//!
//! ```json
//! { "/shares/pipeline/raw/2024/03/10/events.ss": "12.5 GB" }
//! ```

use anyhow::{Context, Result};
use scopeflow_core::{AnnotationError, StreamInfoProvider};
use std::collections::HashMap;
use std::path::Path;

/// Size labels keyed by stream path.
#[derive(Debug, Clone, Default)]
pub struct SizeCatalog {
    sizes: HashMap<String, String>,
}

impl SizeCatalog {
    /// Load a catalog from a JSON object file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read size catalog: {}", path.display()))?;
        Self::from_json(&content)
            .with_context(|| format!("Invalid size catalog: {}", path.display()))
    }

    pub fn from_json(content: &str) -> Result<Self> {
        let sizes: HashMap<String, String> = serde_json::from_str(content)?;
        Ok(Self { sizes })
    }

    pub fn len(&self) -> usize {
        self.sizes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sizes.is_empty()
    }
}

impl StreamInfoProvider for SizeCatalog {
    fn stream_size(&self, path: &str) -> Result<String, AnnotationError> {
        self.sizes
            .get(path)
            .cloned()
            .ok_or_else(|| AnnotationError::NotFound(path.to_string()))
    }
}
