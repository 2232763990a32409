//! Error types for condition parsing and evaluation.

use thiserror::Error;

use super::CompareOp;
use crate::value::Value;

/// The condition text could not be parsed.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SyntaxError {
    /// The condition is empty or only whitespace.
    #[error("expression is empty")]
    Empty,

    /// The parser rejected the input.
    #[error("invalid expression:\n{message}")]
    Invalid {
        /// Parser diagnostic, including the offending position.
        message: String,
    },
}

/// A condition could not be evaluated against one file's bindings.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum EvaluationError {
    /// The two sides of a comparison have no common type.
    #[error(
        "cannot compare {left} ({}) {op} {right} ({})",
        .left.type_name(),
        .right.type_name()
    )]
    Incompatible {
        left: Value,
        op: CompareOp,
        right: Value,
    },

    /// A lone operand was used as a condition but is not a boolean.
    #[error("{value} is not a boolean")]
    NotBoolean { value: Value },

    /// The expression references a field that has no binding.
    #[error("field `{0}` is not bound")]
    Unbound(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn incompatible_display_names_types() {
        let err = EvaluationError::Incompatible {
            left: Value::from("Ha"),
            op: CompareOp::Gt,
            right: Value::Int(3),
        };
        assert_eq!(err.to_string(), "cannot compare 'Ha' (string) > 3 (integer)");
    }

    #[test]
    fn empty_display() {
        assert_eq!(SyntaxError::Empty.to_string(), "expression is empty");
    }
}
