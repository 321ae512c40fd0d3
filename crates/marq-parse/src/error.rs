//! Marker parsing errors.

use std::fmt;

use marq_tokenizer::Position;

/// The marker name attached to errors that precede scope resolution.
pub const UNKNOWN_MARKER: &str = "Unknown Marker";

/// An error discovered while lexing, binding, or inflating a marker.
///
/// Errors travel in-band: the parser delivers them as the `Err` variant of a
/// result's object slot, so one spoiled marker never hides the markers that
/// follow it in the same input.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerError {
    /// The resolved marker name, or [`UNKNOWN_MARKER`].
    pub marker: String,
    /// Where the error was discovered.
    pub position: Position,
    /// What went wrong.
    pub kind: MarkerErrorKind,
}

/// The kinds of marker error.
#[derive(Debug, Clone, PartialEq)]
pub enum MarkerErrorKind {
    /// The lexer reported a malformed token. The message carries the lexer's
    /// own position and context suffix.
    Lex(String),
    /// An argument name is not declared by the resolved schema.
    UnknownArgument(String),
    /// A bound literal's type is not convertible to the declared type.
    TypeMismatch {
        argument: String,
        expected: String,
        found: String,
    },
    /// A custom type rejected the literal's string form.
    Unmarshal {
        argument: String,
        value: String,
        message: String,
    },
    /// A literal's text failed native conversion.
    InvalidLiteral {
        literal: String,
        expected: &'static str,
    },
    /// Required arguments were never bound.
    MissingArguments(Vec<String>),
}

impl fmt::Display for MarkerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "marker {} at {}: {}", self.marker, self.position, self.kind)
    }
}

impl std::error::Error for MarkerError {}

impl fmt::Display for MarkerErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MarkerErrorKind::Lex(message) => f.write_str(message),
            MarkerErrorKind::UnknownArgument(name) => {
                write!(f, "unknown argument {name}")
            }
            MarkerErrorKind::TypeMismatch {
                argument,
                expected,
                found,
            } => write!(
                f,
                "argument {argument} expects {expected}, got {found}"
            ),
            MarkerErrorKind::Unmarshal {
                argument,
                value,
                message,
            } => write!(
                f,
                "argument {argument} rejected value {value:?}: {message}"
            ),
            MarkerErrorKind::InvalidLiteral { literal, expected } => {
                write!(f, "{literal:?} is not a valid {expected} literal")
            }
            MarkerErrorKind::MissingArguments(names) => {
                write!(f, "missing required arguments: {}", names.join(", "))
            }
        }
    }
}

impl std::error::Error for MarkerErrorKind {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let error = MarkerError {
            marker: "+galaxy".into(),
            position: Position::new(2, 7),
            kind: MarkerErrorKind::MissingArguments(vec!["name".into(), "type".into()]),
        };
        assert_eq!(
            error.to_string(),
            "marker +galaxy at 2:7: missing required arguments: name, type"
        );
    }

    #[test]
    fn test_type_mismatch_names_both_types() {
        let kind = MarkerErrorKind::TypeMismatch {
            argument: "count".into(),
            expected: "int".into(),
            found: "string".into(),
        };
        assert_eq!(kind.to_string(), "argument count expects int, got string");
    }
}
