//! Schema registry
//!
//! [`SchemaBuilder`] collects raw classes; [`SchemaBuilder::build`] resolves
//! them all at once and either returns a complete [`Schema`] or the first
//! error. There is no partially built schema.

use crate::error::{Error, Result};
use crate::identity::ClassName;
use crate::model::EntityClass;
use crate::resolve::{resolve, Shadowed};
use crate::value::ValueKind;
use indexmap::IndexMap;
use serde::Serialize;
use std::fmt;

/// Map extent declared by `@mapsize(min, max)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MapSize {
    pub min: i64,
    pub max: i64,
}

/// Collects raw classes for one schema build
#[derive(Debug, Default)]
pub struct SchemaBuilder {
    classes: IndexMap<ClassName, EntityClass>,
    map_size: Option<MapSize>,
}

impl SchemaBuilder {
    /// Create an empty builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a raw class
    ///
    /// Fails if a class with the same name was already added.
    pub fn add_class(&mut self, class: EntityClass) -> Result<()> {
        if self.classes.contains_key(&class.name) {
            return Err(Error::DuplicateClass(class.name));
        }
        self.classes.insert(class.name.clone(), class);
        Ok(())
    }

    /// Whether a class with this name was already added
    pub fn contains(&self, name: &str) -> bool {
        self.classes.contains_key(name)
    }

    /// Record the map extent; a later declaration replaces an earlier one
    pub fn set_map_size(&mut self, map_size: MapSize) {
        self.map_size = Some(map_size);
    }

    /// Number of raw classes added so far
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    /// Whether no class was added yet
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Resolve every class and produce the schema
    pub fn build(self) -> Result<Schema> {
        let resolution = resolve(&self.classes)?;
        Ok(Schema {
            classes: resolution.classes,
            shadowed: resolution.shadowed,
            map_size: self.map_size,
        })
    }
}

/// Fully resolved entity classes
///
/// Every class carries its inherited fields and signals. Classes are kept in
/// declaration order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Schema {
    classes: IndexMap<ClassName, EntityClass>,
    #[serde(skip)]
    shadowed: IndexMap<ClassName, Vec<Shadowed>>,
    map_size: Option<MapSize>,
}

impl Schema {
    /// Look up a class by name
    pub fn lookup(&self, name: &str) -> Result<&EntityClass> {
        self.get(name)
            .ok_or_else(|| Error::ClassNotFound(name.to_string()))
    }

    /// Get a class by name
    pub fn get(&self, name: &str) -> Option<&EntityClass> {
        self.classes.get(name)
    }

    /// Whether a class with this name exists
    pub fn contains(&self, name: &str) -> bool {
        self.classes.contains_key(name)
    }

    /// All classes in declaration order
    pub fn all_classes(&self) -> impl Iterator<Item = &EntityClass> {
        self.classes.values()
    }

    /// Classes that may be placed in a map, in declaration order
    pub fn instantiable(&self) -> impl Iterator<Item = &EntityClass> {
        self.classes.values().filter(|c| !c.is_base_only())
    }

    /// Number of resolved classes
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    /// Whether the schema holds no classes
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Map extent from `@mapsize`, if any was declared
    pub fn map_size(&self) -> Option<MapSize> {
        self.map_size
    }

    /// Re-check cross-class invariants
    ///
    /// Warnings never invalidate the schema; they point at merges an author
    /// probably did not intend.
    pub fn validate(&self) -> Vec<ValidationWarning> {
        let mut warnings = Vec::new();
        for (class, records) in &self.shadowed {
            for record in records {
                check_shadowed(class, record, &mut warnings);
            }
        }
        warnings
    }
}

fn check_shadowed(class: &ClassName, record: &Shadowed, warnings: &mut Vec<ValidationWarning>) {
    let previous = &record.previous;
    let replacement = &record.replacement;
    let origin = |field: &crate::model::FieldSpec| {
        field.declared_in.clone().unwrap_or_else(|| class.clone())
    };

    if previous.readonly
        && previous.engine_only
        && previous.default.is_some()
        && !replacement.readonly
    {
        warnings.push(ValidationWarning::ReadonlyEngineOverridden {
            class: class.clone(),
            field: previous.name.clone(),
            declared_in: origin(previous),
            overridden_in: origin(replacement),
        });
    }

    if previous.kind != replacement.kind {
        let warning = if record.from_base {
            ValidationWarning::ConflictingBases {
                class: class.clone(),
                field: previous.name.clone(),
                kept: origin(replacement),
                dropped: origin(previous),
            }
        } else {
            ValidationWarning::KindChanged {
                class: class.clone(),
                field: previous.name.clone(),
                from: previous.kind.clone(),
                to: replacement.kind.clone(),
            }
        };
        warnings.push(warning);
    }
}

/// A non-fatal finding from [`Schema::validate`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ValidationWarning {
    /// A readonly, engine-only field with a default is redeclared as
    /// editable further down the chain
    ReadonlyEngineOverridden {
        class: ClassName,
        field: String,
        declared_in: ClassName,
        overridden_in: ClassName,
    },
    /// A class redeclares an inherited field with a different kind
    KindChanged {
        class: ClassName,
        field: String,
        from: ValueKind,
        to: ValueKind,
    },
    /// Two bases supply the same field with different kinds; the later base wins
    ConflictingBases {
        class: ClassName,
        field: String,
        kept: ClassName,
        dropped: ClassName,
    },
}

impl fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationWarning::ReadonlyEngineOverridden {
                class,
                field,
                declared_in,
                overridden_in,
            } => write!(
                f,
                "{}.{}: readonly engine field from {} is made editable by {}",
                class, field, declared_in, overridden_in
            ),
            ValidationWarning::KindChanged {
                class,
                field,
                from,
                to,
            } => write!(f, "{}.{}: kind changed from {} to {}", class, field, from, to),
            ValidationWarning::ConflictingBases {
                class,
                field,
                kept,
                dropped,
            } => write!(
                f,
                "{}.{}: bases disagree on the field, {} replaces {}",
                class, field, kept, dropped
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ClassKind, FieldSpec, IOSpec};
    use crate::value::Value;

    fn sample_builder() -> SchemaBuilder {
        let mut builder = SchemaBuilder::new();
        builder
            .add_class(
                EntityClass::new("Targetname", ClassKind::Base)
                    .with_field(FieldSpec::new("targetname", ValueKind::String))
                    .with_io(IOSpec::input("Kill", None)),
            )
            .unwrap();
        builder
            .add_class(
                EntityClass::new("info_target", ClassKind::Point)
                    .with_base("Targetname")
                    .with_field(FieldSpec::new("spawnflags", ValueKind::Flags)),
            )
            .unwrap();
        builder
    }

    #[test]
    fn test_lookup_and_order() {
        let schema = sample_builder().build().unwrap();
        assert_eq!(schema.len(), 2);

        let target = schema.lookup("info_target").unwrap();
        assert_eq!(target.fields.len(), 2);
        assert!(target.input("Kill").is_some());

        let names: Vec<_> = schema.all_classes().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Targetname", "info_target"]);

        let placeable: Vec<_> = schema.instantiable().map(|c| c.name.as_str()).collect();
        assert_eq!(placeable, vec!["info_target"]);
    }

    #[test]
    fn test_lookup_missing() {
        let schema = sample_builder().build().unwrap();
        assert!(matches!(
            schema.lookup("info_landmark"),
            Err(Error::ClassNotFound(name)) if name == "info_landmark"
        ));
        assert!(schema.get("info_landmark").is_none());
    }

    #[test]
    fn test_duplicate_class_rejected() {
        let mut builder = sample_builder();
        let err = builder
            .add_class(EntityClass::new("info_target", ClassKind::Point))
            .unwrap_err();
        assert!(matches!(err, Error::DuplicateClass(name) if name.as_str() == "info_target"));
        assert_eq!(builder.len(), 2);
    }

    #[test]
    fn test_build_fails_atomically() {
        let mut builder = sample_builder();
        builder
            .add_class(EntityClass::new("prop_static", ClassKind::Point).with_base("Studiomodel"))
            .unwrap();
        assert!(matches!(builder.build(), Err(Error::Resolve(_))));
    }

    #[test]
    fn test_build_is_idempotent() {
        let first = sample_builder().build().unwrap();
        let second = sample_builder().build().unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_clean_schema_has_no_warnings() {
        let schema = sample_builder().build().unwrap();
        assert!(schema.validate().is_empty());
    }

    #[test]
    fn test_readonly_engine_override_warning() {
        let mut builder = SchemaBuilder::new();
        builder
            .add_class(
                EntityClass::new("Physbox", ClassKind::Base).with_field(
                    FieldSpec::new("massscale", ValueKind::Float)
                        .readonly()
                        .engine_only()
                        .with_default(Value::Float(1.0)),
                ),
            )
            .unwrap();
        builder
            .add_class(
                EntityClass::new("func_physbox", ClassKind::Solid)
                    .with_base("Physbox")
                    .with_field(FieldSpec::new("massscale", ValueKind::Float)),
            )
            .unwrap();

        let schema = builder.build().unwrap();
        let warnings = schema.validate();
        assert_eq!(
            warnings,
            vec![ValidationWarning::ReadonlyEngineOverridden {
                class: "func_physbox".into(),
                field: "massscale".into(),
                declared_in: "Physbox".into(),
                overridden_in: "func_physbox".into(),
            }]
        );
        assert!(warnings[0].to_string().contains("made editable"));
    }

    #[test]
    fn test_kind_change_and_base_conflict_warnings() {
        let mut builder = SchemaBuilder::new();
        for class in [
            EntityClass::new("Left", ClassKind::Base)
                .with_field(FieldSpec::new("model", ValueKind::String)),
            EntityClass::new("Right", ClassKind::Base)
                .with_field(FieldSpec::new("model", ValueKind::FreeForm("studio".into()))),
            EntityClass::new("prop_both", ClassKind::Point)
                .with_base("Left")
                .with_base("Right")
                .with_field(FieldSpec::new("model", ValueKind::Integer)),
        ] {
            builder.add_class(class).unwrap();
        }

        let warnings = builder.build().unwrap().validate();
        assert_eq!(warnings.len(), 2);
        assert!(matches!(
            &warnings[0],
            ValidationWarning::ConflictingBases { kept, dropped, .. }
                if kept.as_str() == "Right" && dropped.as_str() == "Left"
        ));
        assert!(matches!(
            &warnings[1],
            ValidationWarning::KindChanged { to: ValueKind::Integer, .. }
        ));
    }

    #[test]
    fn test_override_through_later_base_warns_once() {
        let mut builder = SchemaBuilder::new();
        for class in [
            EntityClass::new("A", ClassKind::Base)
                .with_field(FieldSpec::new("health", ValueKind::Integer)),
            EntityClass::new("B", ClassKind::Base)
                .with_base("A")
                .with_field(FieldSpec::new("health", ValueKind::Float)),
            EntityClass::new("C", ClassKind::Base).with_base("A"),
            EntityClass::new("D", ClassKind::Point).with_base("C").with_base("B"),
        ] {
            builder.add_class(class).unwrap();
        }

        let warnings = builder.build().unwrap().validate();
        assert_eq!(
            warnings,
            vec![ValidationWarning::KindChanged {
                class: "B".into(),
                field: "health".into(),
                from: ValueKind::Integer,
                to: ValueKind::Float,
            }]
        );
    }

    #[test]
    fn test_map_size() {
        let mut builder = SchemaBuilder::new();
        builder.set_map_size(MapSize {
            min: -16384,
            max: 16384,
        });
        let schema = builder.build().unwrap();
        assert!(schema.is_empty());
        assert_eq!(schema.map_size(), Some(MapSize { min: -16384, max: 16384 }));
    }
}
