use super::ast::{Expr, Operand};
use super::error::EvaluationError;
use crate::binding::BindingEnvironment;
use crate::value::Value;

/// Evaluate `expr` against one file's bindings.
///
/// Pure: the result depends only on `expr` and `env`. `and`/`or`
/// short-circuit, so an error on the right-hand side is never raised when
/// the left-hand side already decides the outcome.
pub fn evaluate(expr: &Expr, env: &BindingEnvironment) -> Result<bool, EvaluationError> {
    match expr {
        Expr::Compare { left, op, right } => {
            let l = lookup(left, env)?;
            let r = lookup(right, env)?;
            l.compare(*op, r)
                .ok_or_else(|| EvaluationError::Incompatible {
                    left: l.clone(),
                    op: *op,
                    right: r.clone(),
                })
        }
        Expr::Operand(operand) => match lookup(operand, env)? {
            Value::Bool(b) => Ok(*b),
            other => Err(EvaluationError::NotBoolean {
                value: other.clone(),
            }),
        },
        Expr::And(a, b) => Ok(evaluate(a, env)? && evaluate(b, env)?),
        Expr::Or(a, b) => Ok(evaluate(a, env)? || evaluate(b, env)?),
        Expr::Not(inner) => Ok(!evaluate(inner, env)?),
    }
}

fn lookup<'a>(
    operand: &'a Operand,
    env: &'a BindingEnvironment,
) -> Result<&'a Value, EvaluationError> {
    match operand {
        Operand::Literal(value) => Ok(value),
        Operand::Field(name) => env
            .get(name)
            .ok_or_else(|| EvaluationError::Unbound(name.clone())),
    }
}
