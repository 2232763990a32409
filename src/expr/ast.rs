use std::collections::BTreeSet;
use std::fmt;

use crate::value::Value;

/// Comparison operators supported in conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Neq,
    Gt,
    Gte,
    Lt,
    Lte,
}

/// One side of a comparison: a header field or a literal.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Field(String),
    Literal(Value),
}

/// Parsed condition. Closed over comparisons and boolean connectives, so
/// evaluating it can never reach anything but the bound header values.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Compare {
        left: Operand,
        op: CompareOp,
        right: Operand,
    },
    /// A lone field or literal, which must evaluate to a boolean.
    Operand(Operand),
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
    Not(Box<Expr>),
}

impl Expr {
    /// Add every field name referenced by this expression to `out`.
    pub(crate) fn collect_fields(&self, out: &mut BTreeSet<String>) {
        match self {
            Expr::Compare { left, right, .. } => {
                left.collect_field(out);
                right.collect_field(out);
            }
            Expr::Operand(operand) => operand.collect_field(out),
            Expr::And(a, b) | Expr::Or(a, b) => {
                a.collect_fields(out);
                b.collect_fields(out);
            }
            Expr::Not(inner) => inner.collect_fields(out),
        }
    }
}

impl Operand {
    fn collect_field(&self, out: &mut BTreeSet<String>) {
        if let Operand::Field(name) = self {
            out.insert(name.clone());
        }
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompareOp::Eq => write!(f, "=="),
            CompareOp::Neq => write!(f, "!="),
            CompareOp::Gt => write!(f, ">"),
            CompareOp::Gte => write!(f, ">="),
            CompareOp::Lt => write!(f, "<"),
            CompareOp::Lte => write!(f, "<="),
        }
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Field(name) if super::grammar::is_plain_identifier(name) => {
                write!(f, "{name}")
            }
            Operand::Field(name) => write!(f, "`{name}`"),
            Operand::Literal(value) => write!(f, "{value}"),
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Compare { left, op, right } => write!(f, "({left} {op} {right})"),
            Expr::Operand(operand) => write!(f, "{operand}"),
            Expr::And(a, b) => write!(f, "({a} and {b})"),
            Expr::Or(a, b) => write!(f, "({a} or {b})"),
            Expr::Not(inner) => write!(f, "(not {inner})"),
        }
    }
}
