//! Schema loader
//!
//! Collects classes from text chunks, files and directories into one
//! [`SchemaBuilder`], then resolves them in a single step. Nothing is
//! resolved until [`Loader::finish`], so classes may reference bases that
//! are declared in a later chunk or file.
//!
//! A chunk or file is added whole or not at all. The first error also sticks:
//! later loads and [`Loader::finish`] return it again.

use crate::config::LoaderConfig;
use crate::error::{Error, ParseError, Result};
use crate::parser::{parse_document, Document};
use entforge_core::{Schema, SchemaBuilder};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Loader for FGD schema sets
#[derive(Debug, Default)]
pub struct Loader {
    config: LoaderConfig,
    builder: SchemaBuilder,
    /// Canonical paths already read, so includes are loaded once
    loaded: HashSet<PathBuf>,
    /// First error hit by any load
    failure: Option<Error>,
}

impl Loader {
    /// Create a loader with the default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a loader with a custom configuration
    pub fn with_config(config: LoaderConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Configuration in use
    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    /// Number of raw classes collected so far
    pub fn class_count(&self) -> usize {
        self.builder.len()
    }

    /// Load one chunk of already-decoded schema text
    ///
    /// `@include` directives in a chunk are ignored; there is no file to
    /// resolve them against.
    pub fn load_str(&mut self, source: &str) -> Result<()> {
        self.check_failure()?;
        let result = self.read_str(source);
        self.record(result)
    }

    /// First error hit so far, if any
    pub fn failure(&self) -> Option<&Error> {
        self.failure.as_ref()
    }

    fn read_str(&mut self, source: &str) -> Result<()> {
        let doc = parse_document(source)?;
        if !doc.includes.is_empty() {
            log::debug!(
                "ignoring {} @include directive(s) in a text chunk",
                doc.includes.len()
            );
        }
        self.add_document(doc)
    }

    /// Load several chunks in order
    pub fn load_chunks<I, S>(&mut self, chunks: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for chunk in chunks {
            self.load_str(chunk.as_ref())?;
        }
        Ok(())
    }

    /// Load a single schema file, following its includes first
    pub fn load_file(&mut self, path: impl AsRef<Path>) -> Result<()> {
        self.check_failure()?;
        let result = self.read_file(path.as_ref());
        self.record(result)
    }

    fn read_file(&mut self, path: &Path) -> Result<()> {
        let canonical = fs::canonicalize(path)?;
        if !self.loaded.insert(canonical.clone()) {
            log::debug!("skipping {:?}, already loaded", path);
            return Ok(());
        }

        let content = fs::read_to_string(&canonical)?;
        let mut doc = parse_document(&content)?;
        log::debug!("parsed {:?}: {} classes", path, doc.classes.len());

        let includes = std::mem::take(&mut doc.includes);
        if self.config.follow_includes {
            let dir = canonical.parent().unwrap_or_else(|| Path::new("."));
            for include in includes {
                self.read_file(&dir.join(include))?;
            }
        }

        self.add_document(doc)
    }

    /// Load every matching file under a directory, in path order
    pub fn load_directory(&mut self, path: impl AsRef<Path>) -> Result<()> {
        self.check_failure()?;
        let result = self.read_directory(path.as_ref());
        self.record(result)
    }

    fn read_directory(&mut self, path: &Path) -> Result<()> {
        if !path.is_dir() {
            return Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("Not a directory: {:?}", path),
            )));
        }

        let mut entries = fs::read_dir(path)?
            .map(|entry| entry.map(|e| e.path()))
            .collect::<std::io::Result<Vec<_>>>()?;
        entries.sort();

        for file_path in entries {
            if file_path.is_dir() {
                if self.config.recursive {
                    self.read_directory(&file_path)?;
                }
            } else if self.config.matches_extension(&file_path) {
                self.read_file(&file_path)?;
            }
        }

        Ok(())
    }

    /// Resolve everything loaded so far into a schema
    pub fn finish(self) -> Result<Schema> {
        if let Some(err) = self.failure {
            return Err(err);
        }
        let schema = self.builder.build()?;
        log::debug!("schema built with {} classes", schema.len());
        if self.config.warn_on_validation {
            for warning in schema.validate() {
                log::warn!("{}", warning);
            }
        }
        Ok(schema)
    }

    fn check_failure(&self) -> Result<()> {
        match &self.failure {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    fn record(&mut self, result: Result<()>) -> Result<()> {
        if let Err(err) = &result {
            if self.failure.is_none() {
                log::debug!("loader failed: {}", err);
                self.failure = Some(err.clone());
            }
        }
        result
    }

    /// Add a document's classes, or none of them on a duplicate
    fn add_document(&mut self, doc: Document) -> Result<()> {
        let mut seen = HashSet::new();
        for class in &doc.classes {
            if self.builder.contains(class.name.as_str()) || !seen.insert(class.name.as_str()) {
                return Err(ParseError::DuplicateClass {
                    name: class.name.clone(),
                }
                .into());
            }
        }
        if let Some(size) = doc.map_size {
            self.builder.set_map_size(size);
        }
        for class in doc.classes {
            self.builder.add_class(class)?;
        }
        Ok(())
    }
}

/// Parse and resolve a set of text chunks in one go
pub fn build_schema<I, S>(chunks: I) -> Result<Schema>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut loader = Loader::new();
    loader.load_chunks(chunks)?;
    loader.finish()
}
