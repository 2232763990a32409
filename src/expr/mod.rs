//! Condition expressions over header keywords.
//!
//! A condition is a single boolean formula: comparisons between header
//! fields and literals, joined with `and`, `or` and `not`.
//!
//! ```text
//! ECC > 0.8
//! GAIN == 100 and OFFSET == 30
//! not (FILTER == 'Ha' or FILTER == 'OIII')
//! 0.5 < HFR <= 3.5
//! `DATE-OBS` >= '2021-01-01'
//! ```
//!
//! There are no function calls, attribute access, arithmetic or
//! assignment, so a condition can only ever read the values bound for the
//! file under test.

mod ast;
mod error;
mod evaluate;
mod grammar;

use std::collections::BTreeSet;
use std::fmt;

use crate::binding::BindingEnvironment;

pub use ast::{CompareOp, Expr, Operand};
pub use error::{EvaluationError, SyntaxError};
pub use evaluate::evaluate;

/// Distinct header field names referenced by a condition.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldSet(BTreeSet<String>);

impl FieldSet {
    fn from_expr(expr: &Expr) -> Self {
        let mut names = BTreeSet::new();
        expr.collect_fields(&mut names);
        Self(names)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for FieldSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.iter().collect();
        write!(f, "{}", names.join(", "))
    }
}

/// An analyzed condition: source text, syntax tree and referenced fields.
///
/// Built once per run by [`analyze`] and read-only afterwards.
#[derive(Debug, Clone)]
pub struct Condition {
    source: String,
    expr: Expr,
    fields: FieldSet,
}

impl Condition {
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn expr(&self) -> &Expr {
        &self.expr
    }

    pub fn fields(&self) -> &FieldSet {
        &self.fields
    }

    /// Evaluate the condition against one file's bindings.
    pub fn matches(&self, env: &BindingEnvironment) -> Result<bool, EvaluationError> {
        evaluate(&self.expr, env)
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.source)
    }
}

/// Parse a condition and extract the header fields it references.
///
/// # Errors
///
/// Returns [`SyntaxError`] if `input` is empty or not a valid condition.
pub fn analyze(input: &str) -> Result<Condition, SyntaxError> {
    use winnow::Parser;

    if input.trim().is_empty() {
        return Err(SyntaxError::Empty);
    }
    let expr = grammar::condition
        .parse(input)
        .map_err(|e| SyntaxError::Invalid {
            message: e.to_string(),
        })?;
    let fields = FieldSet::from_expr(&expr);
    tracing::debug!(condition = %expr, fields = %fields, "analyzed condition");

    Ok(Condition {
        source: input.trim().to_owned(),
        expr,
        fields,
    })
}
