//! Keyvalue kinds and typed default values

use serde::{Deserialize, Serialize};
use std::fmt;

/// Declared kind of a keyvalue or I/O payload
///
/// Type names are matched case-insensitively. Names the core has no special
/// handling for are kept verbatim in [`ValueKind::FreeForm`] so they survive
/// a parse/write cycle (`target_destination`, `studio`, `sound`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueKind {
    Integer,
    Float,
    Boolean,
    String,
    /// `color255`: three 0-255 components with an optional brightness
    Color,
    /// `origin` or `vector`: three floats
    Vector,
    /// Enumerated literal/label pairs
    Choices,
    /// Bitfield of named flags
    Flags,
    /// Any other type name, lowercased
    FreeForm(String),
}

impl ValueKind {
    /// Map an FGD type name to a kind
    pub fn from_type_name(name: &str) -> Self {
        let lower = name.to_ascii_lowercase();
        match lower.as_str() {
            "integer" | "int" => ValueKind::Integer,
            "float" => ValueKind::Float,
            "boolean" | "bool" => ValueKind::Boolean,
            "string" => ValueKind::String,
            "color255" => ValueKind::Color,
            "origin" | "vector" => ValueKind::Vector,
            "choices" => ValueKind::Choices,
            "flags" => ValueKind::Flags,
            _ => ValueKind::FreeForm(lower),
        }
    }

    /// The type name written back to FGD text
    pub fn type_name(&self) -> &str {
        match self {
            ValueKind::Integer => "integer",
            ValueKind::Float => "float",
            ValueKind::Boolean => "boolean",
            ValueKind::String => "string",
            ValueKind::Color => "color255",
            ValueKind::Vector => "vector",
            ValueKind::Choices => "choices",
            ValueKind::Flags => "flags",
            ValueKind::FreeForm(name) => name,
        }
    }

    /// Whether this kind carries a nested `= [ ... ]` option block
    pub fn has_options(&self) -> bool {
        matches!(self, ValueKind::Choices | ValueKind::Flags)
    }

    /// Coerce raw default text into a typed value of this kind
    ///
    /// Returns `None` when the text cannot represent a value of this kind.
    /// Choice literals are only checked for shape here; membership in the
    /// option set is checked by the field that owns them.
    pub fn coerce(&self, raw: &str) -> Option<Value> {
        let text = raw.trim();
        match self {
            ValueKind::Integer | ValueKind::Flags => text.parse::<i64>().ok().map(Value::Int),
            ValueKind::Float => parse_float(text).map(Value::Float),
            ValueKind::Boolean => parse_bool(text).map(Value::Bool),
            ValueKind::Color => parse_color(text),
            ValueKind::Vector => parse_vector(text).map(Value::Vector),
            ValueKind::Choices => Some(Value::Choice(text.to_string())),
            ValueKind::String | ValueKind::FreeForm(_) => Some(Value::String(raw.to_string())),
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.type_name())
    }
}

/// A typed default value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Int(i64),
    Float(f64),
    Bool(bool),
    String(String),
    Color { rgb: [u8; 3], brightness: Option<u32> },
    Vector([f64; 3]),
    /// Literal of a choices field
    Choice(String),
}

impl Value {
    /// Try to get this value as an integer
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Try to get this value as a float
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Try to get this value as a string or choice literal
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) | Value::Choice(s) => Some(s),
            _ => None,
        }
    }

    /// Whether FGD output should write this value without quotes
    pub fn is_bare(&self) -> bool {
        match self {
            Value::Int(_) | Value::Float(_) | Value::Bool(_) => true,
            Value::Choice(literal) => literal.parse::<i64>().is_ok(),
            _ => false,
        }
    }
}

/// Raw FGD text for the value, without quotes
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(fl) => write!(f, "{}", fl),
            Value::Bool(b) => write!(f, "{}", u8::from(*b)),
            Value::String(s) | Value::Choice(s) => write!(f, "{}", s),
            Value::Color { rgb, brightness } => {
                write!(f, "{} {} {}", rgb[0], rgb[1], rgb[2])?;
                if let Some(b) = brightness {
                    write!(f, " {}", b)?;
                }
                Ok(())
            }
            Value::Vector([x, y, z]) => write!(f, "{} {} {}", x, y, z),
        }
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

fn parse_float(text: &str) -> Option<f64> {
    text.parse::<f64>().ok().filter(|f| f.is_finite())
}

fn parse_bool(text: &str) -> Option<bool> {
    match text.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Some(true),
        "0" | "false" | "no" => Some(false),
        _ => None,
    }
}

fn parse_color(text: &str) -> Option<Value> {
    let parts: Vec<&str> = text.split_whitespace().collect();
    let (rgb_parts, brightness) = match parts.as_slice() {
        [r, g, b] => ([*r, *g, *b], None),
        [r, g, b, bright] => ([*r, *g, *b], Some(bright.parse::<u32>().ok()?)),
        _ => return None,
    };
    let mut rgb = [0u8; 3];
    for (slot, part) in rgb.iter_mut().zip(rgb_parts) {
        *slot = part.parse::<u8>().ok()?;
    }
    Some(Value::Color { rgb, brightness })
}

fn parse_vector(text: &str) -> Option<[f64; 3]> {
    let mut parts = text.split_whitespace();
    let x = parse_float(parts.next()?)?;
    let y = parse_float(parts.next()?)?;
    let z = parse_float(parts.next()?)?;
    if parts.next().is_some() {
        return None;
    }
    Some([x, y, z])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_from_type_name() {
        assert_eq!(ValueKind::from_type_name("integer"), ValueKind::Integer);
        assert_eq!(ValueKind::from_type_name("Choices"), ValueKind::Choices);
        assert_eq!(ValueKind::from_type_name("origin"), ValueKind::Vector);
        assert_eq!(ValueKind::from_type_name("color255"), ValueKind::Color);
        assert_eq!(
            ValueKind::from_type_name("Target_Destination"),
            ValueKind::FreeForm("target_destination".into())
        );
    }

    #[test]
    fn test_coerce_numbers() {
        assert_eq!(ValueKind::Integer.coerce("40"), Some(Value::Int(40)));
        assert_eq!(ValueKind::Integer.coerce("-3"), Some(Value::Int(-3)));
        assert_eq!(ValueKind::Integer.coerce("4.5"), None);
        assert_eq!(ValueKind::Integer.coerce("forty"), None);
        assert_eq!(ValueKind::Float.coerce("0.25"), Some(Value::Float(0.25)));
        assert_eq!(ValueKind::Float.coerce("inf"), None);
    }

    #[test]
    fn test_coerce_bool() {
        assert_eq!(ValueKind::Boolean.coerce("1"), Some(Value::Bool(true)));
        assert_eq!(ValueKind::Boolean.coerce("No"), Some(Value::Bool(false)));
        assert_eq!(ValueKind::Boolean.coerce("2"), None);
    }

    #[test]
    fn test_coerce_color_and_vector() {
        assert_eq!(
            ValueKind::Color.coerce("255 128 0"),
            Some(Value::Color { rgb: [255, 128, 0], brightness: None })
        );
        assert_eq!(
            ValueKind::Color.coerce("255 255 255 200"),
            Some(Value::Color { rgb: [255, 255, 255], brightness: Some(200) })
        );
        assert_eq!(ValueKind::Color.coerce("256 0 0"), None);
        assert_eq!(ValueKind::Vector.coerce("0 -1 2.5"), Some(Value::Vector([0.0, -1.0, 2.5])));
        assert_eq!(ValueKind::Vector.coerce("0 1"), None);
    }

    #[test]
    fn test_display_is_reparsable() {
        let values = [
            (ValueKind::Float, Value::Float(1.5)),
            (ValueKind::Boolean, Value::Bool(true)),
            (ValueKind::Vector, Value::Vector([1.0, 2.0, 3.0])),
            (ValueKind::Color, Value::Color { rgb: [1, 2, 3], brightness: Some(9) }),
        ];
        for (kind, value) in values {
            assert_eq!(kind.coerce(&value.to_string()), Some(value));
        }
    }

    #[test]
    fn test_bare_values() {
        assert!(Value::Int(3).is_bare());
        assert!(Value::Choice("0".into()).is_bare());
        assert!(!Value::Choice("models/a.mdl".into()).is_bare());
        assert!(!Value::String("1".into()).is_bare());
    }
}
