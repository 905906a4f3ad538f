//! Export configuration
//!
//! Controls what the FGD writer emits for a resolved schema. Configurations
//! can be written by hand in RON:
//!
//! ```
//! use entforge_core::ExportConfig;
//!
//! let config = ExportConfig::from_ron_str("(include_base_classes: true, indent: 2)").unwrap();
//! assert!(config.include_base_classes);
//! assert!(config.include_engine_fields);
//! assert_eq!(config.indent, 2);
//!
//! let hl2 = ExportConfig::from_ron_str(r#"(tags: ["HL2"])"#).unwrap();
//! assert!(hl2.search_tags().unwrap().contains("SINCE_HLS"));
//! ```

use crate::error::{Error, Result};
use crate::tags::{TagRules, TagSet};
use serde::{Deserialize, Serialize};

/// Widest indent accepted, in spaces
pub const MAX_INDENT: usize = 16;

/// Options for writing a schema back out as FGD text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Emit `@BaseClass` declarations. Resolved classes already carry their
    /// inherited members, so bases are dropped by default.
    pub include_base_classes: bool,
    /// Emit fields marked engine-only
    pub include_engine_fields: bool,
    /// Emit help text after defaults
    pub include_help_text: bool,
    /// Spaces per indent level inside class blocks
    pub indent: usize,
    /// Search tags, usually one game. When set, only classes and members
    /// whose tags match are written, and the tags themselves are left out.
    pub tags: Vec<String>,
    /// Game order and features used to expand `tags`
    pub tag_rules: TagRules,
}

impl ExportConfig {
    /// Parse and validate a configuration from RON text
    pub fn from_ron_str(text: &str) -> Result<Self> {
        let config: Self =
            ron::from_str(text).map_err(|e| Error::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Configuration for an editor-facing file: placeable classes only, no
    /// engine-only fields
    pub fn editor() -> Self {
        Self {
            include_engine_fields: false,
            ..Self::default()
        }
    }

    /// Export for the given search tags, e.g. a single game
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Expanded search tags, or `None` when exporting every game
    pub fn search_tags(&self) -> Option<TagSet> {
        if self.tags.is_empty() {
            return None;
        }
        Some(self.tag_rules.expand(&self.tags))
    }

    /// Check value ranges
    pub fn validate(&self) -> Result<()> {
        if self.indent == 0 || self.indent > MAX_INDENT {
            return Err(Error::InvalidConfig(format!(
                "indent must be between 1 and {}, got {}",
                MAX_INDENT, self.indent
            )));
        }
        Ok(())
    }

    /// Indentation string for one level
    pub fn indent_str(&self) -> String {
        " ".repeat(self.indent)
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            include_base_classes: false,
            include_engine_fields: true,
            include_help_text: true,
            indent: 4,
            tags: Vec::new(),
            tag_rules: TagRules::default(),
        }
    }
}
