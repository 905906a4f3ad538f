//! Error types for entforge-script

use entforge_core::{ClassName, ResolveError, ValueKind};
use thiserror::Error;

/// Malformed token stream
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LexError {
    #[error("line {line}: unterminated string")]
    UnterminatedString { line: usize },

    #[error("line {line}: unexpected character {ch:?}")]
    UnexpectedChar { ch: char, line: usize },
}

/// Structural problem inside a class or field declaration
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("line {line}: expected {expected}, found {found}")]
    UnexpectedToken {
        line: usize,
        expected: String,
        found: String,
    },

    #[error("duplicate class: {name}")]
    DuplicateClass { name: ClassName },

    #[error("field {field}: option list is empty")]
    EmptyChoiceSet { field: String },

    #[error("field {field}: default {raw:?} is not a valid {expected}")]
    TypeMismatch {
        field: String,
        expected: ValueKind,
        raw: String,
    },
}

/// Script loading error type
#[derive(Error, Debug)]
pub enum Error {
    #[error("lex error: {0}")]
    Lex(#[from] LexError),

    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("resolve error: {0}")]
    Resolve(#[from] ResolveError),

    #[error("schema error: {0}")]
    Core(entforge_core::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("RON parse error: {0}")]
    Ron(#[from] ron::error::SpannedError),
}

impl Clone for Error {
    /// I/O errors are rebuilt from their kind and message
    fn clone(&self) -> Self {
        match self {
            Error::Lex(err) => Error::Lex(err.clone()),
            Error::Parse(err) => Error::Parse(err.clone()),
            Error::Resolve(err) => Error::Resolve(err.clone()),
            Error::Core(err) => Error::Core(err.clone()),
            Error::Io(err) => Error::Io(std::io::Error::new(err.kind(), err.to_string())),
            Error::Ron(err) => Error::Ron(err.clone()),
        }
    }
}

impl From<entforge_core::Error> for Error {
    fn from(err: entforge_core::Error) -> Self {
        match err {
            entforge_core::Error::Resolve(resolve) => Error::Resolve(resolve),
            entforge_core::Error::DuplicateClass(name) => {
                Error::Parse(ParseError::DuplicateClass { name })
            }
            other => Error::Core(other),
        }
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

fn _assert_error_send_sync<T: Send + Sync>() {}
fn _error_is_send_sync() {
    _assert_error_send_sync::<Error>();
}
