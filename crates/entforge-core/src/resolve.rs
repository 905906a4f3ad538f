//! Inheritance resolution
//!
//! Flattens every class's base list into one ordered set of fields and
//! signals. Bases are resolved depth-first, left to right, with each class
//! resolved at most once. Members are merged by name: a name already present
//! keeps its slot and takes the more-derived declaration, a new name is
//! appended. Declarations of one name with different game tags are separate
//! variants and merge independently.
//!
//! Editor hints are inherited too: base hints come first, in base order,
//! without duplicates, and a hint name the class declares itself replaces
//! the inherited ones. `appliesto(...)` is never inherited.
//!
//! Cycle detection tracks the classes on the current DFS path rather than
//! every visited class, so a diamond (`D: B, C` with `B: A`, `C: A`) is not
//! mistaken for a cycle.

use crate::error::ResolveError;
use crate::identity::ClassName;
use crate::model::{EditorHint, EntityClass, FieldSpec, IOSpec};
use indexmap::{IndexMap, IndexSet};
use serde::Serialize;
use std::collections::HashMap;

/// A field declaration that was replaced while merging a class
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Shadowed {
    /// Declaration that held the slot before the merge
    pub previous: FieldSpec,
    /// Declaration that took the slot
    pub replacement: FieldSpec,
    /// Whether the replacement came from a later base rather than the
    /// class's own block
    pub from_base: bool,
}

/// Output of a resolution pass
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    /// Flattened classes, in declaration order
    pub classes: IndexMap<ClassName, EntityClass>,
    /// Replaced field declarations, keyed by the class that replaced them
    pub shadowed: IndexMap<ClassName, Vec<Shadowed>>,
}

/// Resolve every class in `raw` against the others
///
/// `raw` holds the classes as parsed, in declaration order. The first
/// unknown base or cycle met in that order is returned as the error.
pub fn resolve(raw: &IndexMap<ClassName, EntityClass>) -> Result<Resolution, ResolveError> {
    let mut resolver = Resolver::new(raw);
    for name in raw.keys() {
        resolver.resolve_class(name)?;
    }

    let Resolver {
        mut done,
        mut shadowed,
        ..
    } = resolver;

    let mut classes = IndexMap::with_capacity(raw.len());
    let mut ordered_shadows = IndexMap::new();
    for name in raw.keys() {
        if let Some(class) = done.remove(name) {
            classes.insert(name.clone(), class);
        }
        if let Some(records) = shadowed.remove(name) {
            ordered_shadows.insert(name.clone(), records);
        }
    }

    log::debug!("resolved {} entity classes", classes.len());
    Ok(Resolution {
        classes,
        shadowed: ordered_shadows,
    })
}

/// Something merged by name that remembers which class declared it
trait Member: Clone + PartialEq {
    fn name(&self) -> &str;
    fn tags(&self) -> &[String];
    fn declared_in(&self) -> Option<&ClassName>;

    /// Merge key: the name, plus the sorted tags for a tagged variant
    fn key(&self) -> String {
        if self.tags().is_empty() {
            return self.name().to_string();
        }
        let mut tags = self.tags().to_vec();
        tags.sort();
        tags.dedup();
        format!("{}[{}]", self.name(), tags.join(","))
    }
}

impl Member for FieldSpec {
    fn name(&self) -> &str {
        &self.name
    }

    fn tags(&self) -> &[String] {
        &self.tags
    }

    fn declared_in(&self) -> Option<&ClassName> {
        self.declared_in.as_ref()
    }
}

impl Member for IOSpec {
    fn name(&self) -> &str {
        &self.name
    }

    fn tags(&self) -> &[String] {
        &self.tags
    }

    fn declared_in(&self) -> Option<&ClassName> {
        self.declared_in.as_ref()
    }
}

/// Ordered by-name accumulator for one member list
struct Merge<T> {
    members: IndexMap<String, T>,
}

impl<T: Member> Merge<T> {
    fn new() -> Self {
        Self {
            members: IndexMap::new(),
        }
    }

    /// Merge a member inherited from a base
    ///
    /// The incoming declaration is skipped when the current one is the same
    /// declaration or already overrides it (its declaring class descends from
    /// the incoming one's). Returns the replaced member, if any.
    fn inherit(
        &mut self,
        incoming: &T,
        ancestors: &HashMap<ClassName, IndexSet<ClassName>>,
    ) -> Option<T> {
        let key = incoming.key();
        if let Some(current) = self.members.get(&key) {
            if current == incoming || overrides(current, incoming, ancestors) {
                return None;
            }
        }
        self.members.insert(key, incoming.clone())
    }

    /// Merge a member declared by the class itself
    fn declare(&mut self, own: &T) -> Option<T> {
        self.members.insert(own.key(), own.clone())
    }

    fn into_vec(self) -> Vec<T> {
        self.members.into_values().collect()
    }
}

/// Whether `current` is a more-derived declaration than `incoming`
fn overrides<T: Member>(
    current: &T,
    incoming: &T,
    ancestors: &HashMap<ClassName, IndexSet<ClassName>>,
) -> bool {
    match (current.declared_in(), incoming.declared_in()) {
        (Some(cur), Some(inc)) => {
            cur == inc || ancestors.get(cur).is_some_and(|set| set.contains(inc))
        }
        _ => false,
    }
}

struct Resolver<'a> {
    raw: &'a IndexMap<ClassName, EntityClass>,
    /// Memoised flattened classes
    done: HashMap<ClassName, EntityClass>,
    /// Transitive bases of every resolved class
    ancestors: HashMap<ClassName, IndexSet<ClassName>>,
    shadowed: HashMap<ClassName, Vec<Shadowed>>,
    /// Classes on the current DFS path, in visiting order
    path: IndexSet<ClassName>,
}

impl<'a> Resolver<'a> {
    fn new(raw: &'a IndexMap<ClassName, EntityClass>) -> Self {
        Self {
            raw,
            done: HashMap::with_capacity(raw.len()),
            ancestors: HashMap::with_capacity(raw.len()),
            shadowed: HashMap::new(),
            path: IndexSet::new(),
        }
    }

    fn resolve_class(&mut self, name: &ClassName) -> Result<(), ResolveError> {
        if self.done.contains_key(name) {
            return Ok(());
        }
        if let Some(start) = self.path.get_index_of(name) {
            let mut path: Vec<ClassName> = self.path.iter().skip(start).cloned().collect();
            path.push(name.clone());
            return Err(ResolveError::InheritanceCycle { path });
        }

        let raw = self.raw;
        // Callers only pass names that exist in `raw`.
        let Some(class) = raw.get(name) else {
            return Ok(());
        };

        self.path.insert(name.clone());
        for base in &class.bases {
            if !raw.contains_key(base) {
                return Err(ResolveError::UnknownBaseClass {
                    class: name.clone(),
                    missing: base.clone(),
                });
            }
            self.resolve_class(base)?;
        }
        self.path.pop();

        let flattened = self.merge(class);
        log::trace!(
            "resolved class {} ({} fields, {} inputs, {} outputs)",
            name,
            flattened.fields.len(),
            flattened.inputs.len(),
            flattened.outputs.len()
        );
        self.done.insert(name.clone(), flattened);
        Ok(())
    }

    /// Flatten `class` once all of its bases are resolved
    fn merge(&mut self, class: &EntityClass) -> EntityClass {
        let mut ancestors = IndexSet::new();
        let mut hints: Vec<EditorHint> = Vec::new();
        let mut fields = Merge::new();
        let mut inputs = Merge::new();
        let mut outputs = Merge::new();
        let mut shadowed = Vec::new();

        for base_name in &class.bases {
            let Some(base) = self.done.get(base_name) else {
                continue;
            };
            ancestors.insert(base_name.clone());
            if let Some(base_ancestors) = self.ancestors.get(base_name) {
                ancestors.extend(base_ancestors.iter().cloned());
            }

            for hint in &base.hints {
                let own = class.hints.iter().any(|h| h.name == hint.name);
                if !own && !hint.is_applies_to() && !hints.contains(hint) {
                    hints.push(hint.clone());
                }
            }
            for field in &base.fields {
                let Some(previous) = fields.inherit(field, &self.ancestors) else {
                    continue;
                };
                // An override arriving through a later base was already
                // recorded where it was declared.
                if !overrides(field, &previous, &self.ancestors) {
                    shadowed.push(Shadowed {
                        previous,
                        replacement: field.clone(),
                        from_base: true,
                    });
                }
            }
            for io in &base.inputs {
                inputs.inherit(io, &self.ancestors);
            }
            for io in &base.outputs {
                outputs.inherit(io, &self.ancestors);
            }
        }

        for hint in &class.hints {
            if !hints.contains(hint) {
                hints.push(hint.clone());
            }
        }
        for field in &class.fields {
            if let Some(previous) = fields.declare(field) {
                if previous != *field {
                    shadowed.push(Shadowed {
                        previous,
                        replacement: field.clone(),
                        from_base: false,
                    });
                }
            }
        }
        for io in &class.inputs {
            inputs.declare(io);
        }
        for io in &class.outputs {
            outputs.declare(io);
        }

        self.ancestors.insert(class.name.clone(), ancestors);
        if !shadowed.is_empty() {
            self.shadowed.insert(class.name.clone(), shadowed);
        }

        EntityClass {
            hints,
            fields: fields.into_vec(),
            inputs: inputs.into_vec(),
            outputs: outputs.into_vec(),
            ..class.clone()
        }
    }
}
