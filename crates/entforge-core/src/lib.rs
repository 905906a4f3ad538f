//! Entforge Core - entity class model and schema resolution
//!
//! This crate holds everything about entity schemas that does not involve
//! reading text:
//! - Class, keyvalue and I/O definitions (`EntityClass`, `FieldSpec`, `IOSpec`)
//! - Keyvalue kinds and typed defaults (`ValueKind`, `Value`)
//! - Inheritance resolution with merge-by-name overrides
//! - The resolved `Schema` registry and its validation warnings
//! - Game tag expansion and matching for multi-game schemas
//! - Export configuration for writers
//!
//! Building a schema is a one-shot, single-threaded pass. Independent builds
//! share no state and can run on separate threads.
//!
//! ```
//! use entforge_core::{ClassKind, EntityClass, FieldSpec, SchemaBuilder, ValueKind};
//!
//! let mut builder = SchemaBuilder::new();
//! builder.add_class(
//!     EntityClass::new("Targetname", ClassKind::Base)
//!         .with_field(FieldSpec::new("targetname", ValueKind::String)),
//! ).unwrap();
//! builder.add_class(EntityClass::new("info_target", ClassKind::Point).with_base("Targetname")).unwrap();
//!
//! let schema = builder.build().unwrap();
//! assert!(schema.lookup("info_target").unwrap().field("targetname").is_some());
//! ```

mod config;
mod error;
mod identity;
mod model;
mod registry;
pub mod resolve;
mod tags;
mod value;

pub use config::{ExportConfig, MAX_INDENT};
pub use error::{Error, ResolveError, Result};
pub use identity::ClassName;
pub use model::{
    ChoiceOption, ClassKind, Direction, EditorHint, EntityClass, FieldSpec, FlagOption, IOSpec,
};
pub use registry::{MapSize, Schema, SchemaBuilder, ValidationWarning};
pub use resolve::{Resolution, Shadowed};
pub use tags::{normalize_tag, TagRules, TagSet};
pub use value::{Value, ValueKind};
