//! Error types for entforge-core

use crate::identity::ClassName;
use thiserror::Error;

/// Graph-level failures raised while linearising base classes
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    /// A class names a base that is not declared anywhere in the input set
    #[error("class {class} inherits from unknown base class {missing}")]
    UnknownBaseClass { class: ClassName, missing: ClassName },

    /// A class reaches itself through its base list
    ///
    /// `path` starts and ends with the same class, e.g. `[X, Y, X]`.
    #[error("inheritance cycle: {}", Self::format_path(.path))]
    InheritanceCycle { path: Vec<ClassName> },
}

impl ResolveError {
    fn format_path(path: &[ClassName]) -> String {
        path.iter()
            .map(ClassName::as_str)
            .collect::<Vec<_>>()
            .join(" -> ")
    }
}

/// Core error type
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("resolve error: {0}")]
    Resolve(#[from] ResolveError),

    #[error("duplicate class: {0}")]
    DuplicateClass(ClassName),

    #[error("class not found: {0}")]
    ClassNotFound(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

// Compile-time check that errors can cross thread boundaries; independent
// schema builds may run on separate threads.
fn _assert_error_send_sync<T: Send + Sync>() {}
fn _error_is_send_sync() {
    _assert_error_send_sync::<Error>();
    _assert_error_send_sync::<ResolveError>();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cycle_message() {
        let err = ResolveError::InheritanceCycle {
            path: vec!["X".into(), "Y".into(), "X".into()],
        };
        assert_eq!(err.to_string(), "inheritance cycle: X -> Y -> X");
    }

    #[test]
    fn test_unknown_base_message() {
        let err: Error = ResolveError::UnknownBaseClass {
            class: "prop_dynamic".into(),
            missing: "Studiomodel".into(),
        }
        .into();
        assert_eq!(
            err.to_string(),
            "resolve error: class prop_dynamic inherits from unknown base class Studiomodel"
        );
    }
}
