use std::cmp::Ordering;
use std::fmt::{self, Write};

use crate::expr::CompareOp;

/// A scalar header value or expression literal.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i64),
    Float(f64),
    Bool(bool),
    String(String),
}

impl Value {
    /// Compare this value to another using the given operator.
    ///
    /// Numbers compare numerically regardless of integer/float mix. A string
    /// facing a number is trimmed and parsed as `f64`; when that fails the
    /// pair is incompatible. Strings order by code point, booleans only
    /// support `==` and `!=`. Returns `None` for incompatible pairs.
    #[must_use]
    pub fn compare(&self, op: CompareOp, other: &Value) -> Option<bool> {
        match (self, other) {
            (Value::Bool(a), Value::Bool(b)) => match op {
                CompareOp::Eq => Some(a == b),
                CompareOp::Neq => Some(a != b),
                _ => None,
            },
            (Value::String(a), Value::String(b)) => Some(op.holds(a.cmp(b))),
            (Value::Int(a), Value::Int(b)) => Some(op.holds(a.cmp(b))),
            _ => {
                let a = self.as_number()?;
                let b = other.as_number()?;
                match a.partial_cmp(&b) {
                    Some(ord) => Some(op.holds(ord)),
                    // NaN is unequal to everything
                    None => Some(op == CompareOp::Neq),
                }
            }
        }
    }

    /// Numeric view used for mixed comparisons.
    #[allow(clippy::cast_precision_loss)]
    fn as_number(&self) -> Option<f64> {
        match self {
            Value::Int(v) => Some(*v as f64),
            Value::Float(v) => Some(*v),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            Value::Bool(_) => None,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Int(_) => "integer",
            Value::Float(_) => "float",
            Value::Bool(_) => "boolean",
            Value::String(_) => "string",
        }
    }
}

impl CompareOp {
    fn holds(self, ord: Ordering) -> bool {
        match self {
            CompareOp::Eq => ord == Ordering::Equal,
            CompareOp::Neq => ord != Ordering::Equal,
            CompareOp::Gt => ord == Ordering::Greater,
            CompareOp::Gte => ord != Ordering::Less,
            CompareOp::Lt => ord == Ordering::Less,
            CompareOp::Lte => ord != Ordering::Greater,
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_owned())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(v) => write!(f, "{v}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Bool(v) => write!(f, "{v}"),
            Value::String(v) => {
                f.write_char('\'')?;
                for c in v.chars() {
                    if matches!(c, '\'' | '\\') {
                        f.write_char('\\')?;
                    }
                    f.write_char(c)?;
                }
                f.write_char('\'')
            }
        }
    }
}
