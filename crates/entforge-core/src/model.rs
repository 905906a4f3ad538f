//! Entity class, keyvalue and I/O definitions
//!
//! These are the records the parser produces and the resolver flattens. A
//! class is built once per parsed block, gains its inherited members during
//! resolution, and is read-only once it sits in a [`Schema`](crate::Schema).

use crate::identity::ClassName;
use crate::tags::normalize_tag;
use crate::value::{Value, ValueKind};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The `@...Class` keyword a class was declared with
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClassKind {
    /// `@BaseClass`: only ever inherited from, never placed
    Base,
    Point,
    Solid,
    Npc,
    KeyFrame,
    Move,
    Filter,
    /// Any other `@...Class` keyword, kept verbatim
    Other(String),
}

impl ClassKind {
    /// Map a class keyword (without the `@`) to a kind
    ///
    /// Returns `None` for keywords that do not end in `Class`; those are
    /// directives, not class declarations.
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        let lower = keyword.to_ascii_lowercase();
        let kind = match lower.as_str() {
            "baseclass" => ClassKind::Base,
            "pointclass" => ClassKind::Point,
            "solidclass" => ClassKind::Solid,
            "npcclass" => ClassKind::Npc,
            "keyframeclass" => ClassKind::KeyFrame,
            "moveclass" => ClassKind::Move,
            "filterclass" => ClassKind::Filter,
            _ if lower.ends_with("class") => ClassKind::Other(keyword.to_string()),
            _ => return None,
        };
        Some(kind)
    }

    /// The keyword written back to FGD text, without the `@`
    pub fn keyword(&self) -> &str {
        match self {
            ClassKind::Base => "BaseClass",
            ClassKind::Point => "PointClass",
            ClassKind::Solid => "SolidClass",
            ClassKind::Npc => "NPCClass",
            ClassKind::KeyFrame => "KeyFrameClass",
            ClassKind::Move => "MoveClass",
            ClassKind::Filter => "FilterClass",
            ClassKind::Other(keyword) => keyword,
        }
    }

    /// Whether classes of this kind can never be instantiated directly
    pub fn is_base_only(&self) -> bool {
        matches!(self, ClassKind::Base)
    }
}

/// An editor hint from the class header, e.g. `sphere(distmax)`
///
/// Hints are opaque to the core. The name is compared as written and the
/// arguments are kept exactly as they appeared, one string per
/// comma-separated group.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EditorHint {
    pub name: String,
    #[serde(default)]
    pub args: Vec<String>,
}

impl EditorHint {
    /// Create a hint with no arguments
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            args: Vec::new(),
        }
    }

    /// Append one argument group
    pub fn with_arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Whether this is an `appliesto(...)` game filter
    pub fn is_applies_to(&self) -> bool {
        self.name.eq_ignore_ascii_case("appliesto")
    }
}

impl fmt::Display for EditorHint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.name, self.args.join(", "))
    }
}

/// One `literal : "label"` entry of a choices field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChoiceOption {
    pub value: String,
    pub label: String,
}

/// One `bit : "label" : default` entry of a flags field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlagOption {
    pub bit: u64,
    pub label: String,
    pub enabled: bool,
}

/// Definition of a keyvalue on an entity class
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSpec {
    /// Keyvalue name
    pub name: String,
    /// Declared kind
    pub kind: ValueKind,
    /// Value fixed in the editor; still type-checked
    #[serde(default)]
    pub readonly: bool,
    /// Computed by the engine and hidden from manual editing; still type-checked
    #[serde(default)]
    pub engine_only: bool,
    /// Shown in the editor's entity report
    #[serde(default)]
    pub report: bool,
    /// Display label
    #[serde(default)]
    pub label: String,
    /// Default value, coerced to `kind`
    #[serde(default)]
    pub default: Option<Value>,
    /// Help text
    #[serde(default)]
    pub help: String,
    /// Options of a choices field, in declaration order
    #[serde(default)]
    pub choices: Vec<ChoiceOption>,
    /// Options of a flags field, in declaration order
    #[serde(default)]
    pub flags: Vec<FlagOption>,
    /// Normalised tags limiting the games this declaration applies to
    #[serde(default)]
    pub tags: Vec<String>,
    /// Class whose block declared this field
    #[serde(default)]
    pub declared_in: Option<ClassName>,
}

impl FieldSpec {
    /// Create a field with no qualifiers, label or default
    pub fn new(name: impl Into<String>, kind: ValueKind) -> Self {
        Self {
            name: name.into(),
            kind,
            readonly: false,
            engine_only: false,
            report: false,
            label: String::new(),
            default: None,
            help: String::new(),
            choices: Vec::new(),
            flags: Vec::new(),
            tags: Vec::new(),
            declared_in: None,
        }
    }

    /// Set the display label
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Set the default value
    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Set the help text
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = help.into();
        self
    }

    /// Append a `literal : "label"` option
    pub fn with_choice(mut self, value: impl Into<String>, label: impl Into<String>) -> Self {
        self.choices.push(ChoiceOption {
            value: value.into(),
            label: label.into(),
        });
        self
    }

    /// Append a `bit : "label" : enabled` option
    pub fn with_flag(mut self, bit: u64, label: impl Into<String>, enabled: bool) -> Self {
        self.flags.push(FlagOption {
            bit,
            label: label.into(),
            enabled,
        });
        self
    }

    /// Add a game tag, e.g. `since_ep1` or `!tf2`
    pub fn with_tag(mut self, tag: &str) -> Self {
        self.tags.push(normalize_tag(tag));
        self
    }

    /// Mark the field readonly
    pub fn readonly(mut self) -> Self {
        self.readonly = true;
        self
    }

    /// Mark the field engine-only
    pub fn engine_only(mut self) -> Self {
        self.engine_only = true;
        self
    }

    /// Whether `literal` is one of this field's choice values
    pub fn allows_choice(&self, literal: &str) -> bool {
        self.choices.iter().any(|c| c.value == literal)
    }

    /// Bitwise OR of every flag enabled by default
    pub fn flags_default(&self) -> i64 {
        self.flags
            .iter()
            .filter(|f| f.enabled)
            .fold(0u64, |acc, f| acc | f.bit) as i64
    }

    /// Whether the default, if any, is admissible for this field
    ///
    /// A choices default must name one of the declared literals; every other
    /// default must already carry the declared kind's shape.
    pub fn default_is_valid(&self) -> bool {
        let Some(default) = &self.default else {
            return true;
        };
        match (&self.kind, default) {
            (ValueKind::Choices, Value::Choice(literal)) => self.allows_choice(literal),
            (ValueKind::Integer | ValueKind::Flags, Value::Int(_)) => true,
            (ValueKind::Float, Value::Float(_)) => true,
            (ValueKind::Boolean, Value::Bool(_)) => true,
            (ValueKind::Color, Value::Color { .. }) => true,
            (ValueKind::Vector, Value::Vector(_)) => true,
            (ValueKind::String | ValueKind::FreeForm(_), Value::String(_)) => true,
            _ => false,
        }
    }
}

/// Direction of an I/O signal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Input,
    Output,
}

impl Direction {
    /// `input` or `output`, as written in FGD text
    pub fn keyword(&self) -> &'static str {
        match self {
            Direction::Input => "input",
            Direction::Output => "output",
        }
    }
}

/// Definition of an input or output signal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IOSpec {
    pub direction: Direction,
    pub name: String,
    /// Payload kind; `None` for `void`
    #[serde(default)]
    pub payload: Option<ValueKind>,
    #[serde(default)]
    pub description: String,
    /// Normalised game tags, as on [`FieldSpec::tags`]
    #[serde(default)]
    pub tags: Vec<String>,
    /// Class whose block declared this signal
    #[serde(default)]
    pub declared_in: Option<ClassName>,
}

impl IOSpec {
    /// Create an input signal
    pub fn input(name: impl Into<String>, payload: Option<ValueKind>) -> Self {
        Self::new(Direction::Input, name, payload)
    }

    /// Create an output signal
    pub fn output(name: impl Into<String>, payload: Option<ValueKind>) -> Self {
        Self::new(Direction::Output, name, payload)
    }

    fn new(direction: Direction, name: impl Into<String>, payload: Option<ValueKind>) -> Self {
        Self {
            direction,
            name: name.into(),
            payload,
            description: String::new(),
            tags: Vec::new(),
            declared_in: None,
        }
    }

    /// Set the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Add a game tag
    pub fn with_tag(mut self, tag: &str) -> Self {
        self.tags.push(normalize_tag(tag));
        self
    }

    /// Payload type name as written in FGD text
    pub fn payload_name(&self) -> &str {
        self.payload.as_ref().map_or("void", ValueKind::type_name)
    }
}

/// Definition of an entity class
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityClass {
    /// Unique, case-sensitive class name
    pub name: ClassName,
    /// Declaring keyword
    pub kind: ClassKind,
    /// Base classes in declaration order
    #[serde(default)]
    pub bases: Vec<ClassName>,
    /// Editor hints other than `base(...)`, in declaration order
    #[serde(default)]
    pub hints: Vec<EditorHint>,
    /// Class description
    #[serde(default)]
    pub description: String,
    /// Keyvalues in display order
    #[serde(default)]
    pub fields: Vec<FieldSpec>,
    /// Input signals in display order
    #[serde(default)]
    pub inputs: Vec<IOSpec>,
    /// Output signals in display order
    #[serde(default)]
    pub outputs: Vec<IOSpec>,
}

impl EntityClass {
    /// Create an empty class
    pub fn new(name: impl Into<ClassName>, kind: ClassKind) -> Self {
        Self {
            name: name.into(),
            kind,
            bases: Vec::new(),
            hints: Vec::new(),
            description: String::new(),
            fields: Vec::new(),
            inputs: Vec::new(),
            outputs: Vec::new(),
        }
    }

    /// Append a base class
    pub fn with_base(mut self, base: impl Into<ClassName>) -> Self {
        self.bases.push(base.into());
        self
    }

    /// Append an editor hint
    pub fn with_hint(mut self, hint: EditorHint) -> Self {
        self.hints.push(hint);
        self
    }

    /// Append a field declared by this class
    pub fn with_field(mut self, field: FieldSpec) -> Self {
        self.push_field(field);
        self
    }

    /// Append a signal declared by this class
    pub fn with_io(mut self, io: IOSpec) -> Self {
        self.push_io(io);
        self
    }

    /// Append a field declared by this class
    pub fn push_field(&mut self, mut field: FieldSpec) {
        field.declared_in = Some(self.name.clone());
        self.fields.push(field);
    }

    /// Append a signal declared by this class to the list for its direction
    pub fn push_io(&mut self, mut io: IOSpec) {
        io.declared_in = Some(self.name.clone());
        match io.direction {
            Direction::Input => self.inputs.push(io),
            Direction::Output => self.outputs.push(io),
        }
    }

    /// Whether the class is only ever used as a base
    pub fn is_base_only(&self) -> bool {
        self.kind.is_base_only()
    }

    /// First field with the given name
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// First input with the given name
    pub fn input(&self, name: &str) -> Option<&IOSpec> {
        self.inputs.iter().find(|io| io.name == name)
    }

    /// First output with the given name
    pub fn output(&self, name: &str) -> Option<&IOSpec> {
        self.outputs.iter().find(|io| io.name == name)
    }

    /// Fields an editor should show, i.e. everything not engine-only
    pub fn editor_fields(&self) -> impl Iterator<Item = &FieldSpec> {
        self.fields.iter().filter(|f| !f.engine_only)
    }

    /// Names of the editor hints, in declaration order
    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.hints.iter().map(|h| h.name.as_str())
    }

    /// First hint with the given name
    pub fn hint(&self, name: &str) -> Option<&EditorHint> {
        self.hints.iter().find(|h| h.name == name)
    }

    /// Games named by every `appliesto(...)` hint, normalised, sorted and
    /// deduplicated. Empty means the class applies everywhere.
    pub fn applies_to(&self) -> Vec<String> {
        let mut tags: Vec<String> = self
            .hints
            .iter()
            .filter(|h| h.is_applies_to())
            .flat_map(|h| h.args.iter().flat_map(|arg| arg.split_whitespace()))
            .map(normalize_tag)
            .collect();
        tags.sort();
        tags.dedup();
        tags
    }
}
