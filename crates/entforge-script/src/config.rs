//! Loader configuration

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Options for [`Loader`](crate::Loader)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    /// File extension picked up by `load_directory`, without the dot
    pub extension: String,
    /// Descend into subdirectories in `load_directory`
    pub recursive: bool,
    /// Load files named by `@include` relative to the including file
    pub follow_includes: bool,
    /// Log every validation warning when the schema is finished
    pub warn_on_validation: bool,
}

impl LoaderConfig {
    /// Parse a configuration from RON text
    pub fn from_ron_str(text: &str) -> Result<Self> {
        Ok(ron::from_str(text)?)
    }

    /// Read a RON configuration file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_ron_str(&text)
    }

    /// Whether `path` has the configured extension (ASCII case-insensitive)
    pub fn matches_extension(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case(&self.extension))
    }
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            extension: "fgd".to_string(),
            recursive: true,
            follow_includes: true,
            warn_on_validation: true,
        }
    }
}
