use winnow::ascii::digit1;
use winnow::combinator::{alt, cut_err, delimited, not, opt, preceded, repeat, terminated};
use winnow::error::{ErrMode, ModalResult, StrContext, StrContextValue};
use winnow::prelude::*;
use winnow::token::{any, one_of, take_till, take_while};

use super::ast::{CompareOp, Expr, Operand};
use crate::value::Value;

/// Words that can never name a header field.
const KEYWORDS: &[&str] = &["and", "or", "not", "True", "False", "true", "false"];

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// True when `name` can be written without backticks.
pub(crate) fn is_plain_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if is_ident_start(c))
        && chars.all(is_ident_char)
        && !KEYWORDS.contains(&name)
}

// -- Whitespace & keywords --------------------------------------------------

fn ws(input: &mut &str) -> ModalResult<()> {
    take_while(0.., |c: char| c.is_whitespace())
        .void()
        .parse_next(input)
}

fn keyword(input: &mut &str, kw: &'static str) -> ModalResult<()> {
    terminated(kw, not(one_of(is_ident_char)))
        .void()
        .parse_next(input)
}

fn and_kw(input: &mut &str) -> ModalResult<()> {
    keyword(input, "and")
}

fn or_kw(input: &mut &str) -> ModalResult<()> {
    keyword(input, "or")
}

fn not_kw(input: &mut &str) -> ModalResult<()> {
    keyword(input, "not")
}

// -- Operands ---------------------------------------------------------------

fn bare_word<'i>(input: &mut &'i str) -> ModalResult<&'i str> {
    (one_of(is_ident_start), take_while(0.., is_ident_char))
        .take()
        .parse_next(input)
}

fn plain_field(input: &mut &str) -> ModalResult<String> {
    let word = bare_word.parse_next(input)?;
    if KEYWORDS.contains(&word) {
        return Err(ErrMode::from_input(input));
    }
    Ok(word.to_owned())
}

fn quoted_field(input: &mut &str) -> ModalResult<String> {
    delimited('`', cut_err(take_till(1.., '`')), cut_err('`'))
        .map(|name: &str| name.to_owned())
        .parse_next(input)
}

fn field(input: &mut &str) -> ModalResult<String> {
    alt((quoted_field, plain_field)).parse_next(input)
}

fn string_literal(input: &mut &str) -> ModalResult<String> {
    let quote = one_of(['\'', '"']).parse_next(input)?;
    let mut s = String::new();
    loop {
        let ch = cut_err(any)
            .context(StrContext::Expected(StrContextValue::Description(
                "closing quote",
            )))
            .parse_next(input)?;
        match ch {
            c if c == quote => return Ok(s),
            '\\' => {
                let esc = cut_err(any).parse_next(input)?;
                match esc {
                    'n' => s.push('\n'),
                    't' => s.push('\t'),
                    other => s.push(other),
                }
            }
            c => s.push(c),
        }
    }
}

fn boolean(input: &mut &str) -> ModalResult<bool> {
    match bare_word.parse_next(input)? {
        "True" | "true" => Ok(true),
        "False" | "false" => Ok(false),
        _ => Err(ErrMode::from_input(input)),
    }
}

fn number(input: &mut &str) -> ModalResult<Value> {
    let text = (
        opt(one_of(['+', '-'])),
        alt((
            (digit1, opt(('.', opt(digit1)))).void(),
            ('.', digit1).void(),
        )),
        opt((one_of(['e', 'E']), opt(one_of(['+', '-'])), cut_err(digit1))),
    )
        .take()
        .parse_next(input)?;
    not(one_of(is_ident_char)).parse_next(input)?;

    let is_float = text.contains(|c: char| matches!(c, '.' | 'e' | 'E'));
    if !is_float {
        if let Ok(i) = text.parse::<i64>() {
            return Ok(Value::Int(i));
        }
    }
    // 1e999 overflows to infinity, which no literal can spell
    match text.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(Value::Float(v)),
        _ => Err(ErrMode::from_input(input).cut()),
    }
}

fn literal(input: &mut &str) -> ModalResult<Value> {
    alt((
        string_literal.map(Value::String),
        boolean.map(Value::Bool),
        number,
    ))
    .parse_next(input)
}

fn operand(input: &mut &str) -> ModalResult<Operand> {
    alt((literal.map(Operand::Literal), field.map(Operand::Field))).parse_next(input)
}

// -- Comparisons ------------------------------------------------------------

fn compare_op(input: &mut &str) -> ModalResult<CompareOp> {
    ws.parse_next(input)?;
    alt((
        "==".value(CompareOp::Eq),
        "!=".value(CompareOp::Neq),
        "<=".value(CompareOp::Lte),
        ">=".value(CompareOp::Gte),
        "<".value(CompareOp::Lt),
        ">".value(CompareOp::Gt),
    ))
    .parse_next(input)
}

fn primary(input: &mut &str) -> ModalResult<Expr> {
    ws.parse_next(input)?;
    alt((
        delimited('(', cut_err(or_expr), (ws, cut_err(')'))),
        operand.map(Expr::Operand),
    ))
    .context(StrContext::Expected(StrContextValue::Description(
        "field, literal or parenthesized condition",
    )))
    .parse_next(input)
}

fn into_operand(expr: Expr) -> Option<Operand> {
    match expr {
        Expr::Operand(operand) => Some(operand),
        _ => None,
    }
}

/// `a < b < c` reads as `a < b and b < c`.
fn comparison(input: &mut &str) -> ModalResult<Expr> {
    let first = primary(input)?;
    let rest: Vec<(CompareOp, Expr)> =
        repeat(0.., (compare_op, cut_err(primary))).parse_next(input)?;
    if rest.is_empty() {
        return Ok(first);
    }

    let Some(mut left) = into_operand(first) else {
        return Err(ErrMode::from_input(input).cut());
    };
    let mut links = Vec::with_capacity(rest.len());
    for (op, term) in rest {
        let Some(right) = into_operand(term) else {
            return Err(ErrMode::from_input(input).cut());
        };
        links.push(Expr::Compare {
            left,
            op,
            right: right.clone(),
        });
        left = right;
    }
    links
        .into_iter()
        .reduce(|acc, link| Expr::And(Box::new(acc), Box::new(link)))
        .ok_or_else(|| ErrMode::from_input(input).cut())
}

// -- Boolean connectives (precedence: or < and < not < comparison) ---------

fn not_expr(input: &mut &str) -> ModalResult<Expr> {
    ws.parse_next(input)?;
    if opt(not_kw).parse_next(input)?.is_some() {
        let inner = cut_err(not_expr).parse_next(input)?;
        return Ok(Expr::Not(Box::new(inner)));
    }
    comparison(input)
}

fn and_expr(input: &mut &str) -> ModalResult<Expr> {
    let first = not_expr(input)?;
    let rest: Vec<Expr> =
        repeat(0.., preceded((ws, and_kw), cut_err(not_expr))).parse_next(input)?;
    Ok(rest
        .into_iter()
        .fold(first, |acc, r| Expr::And(Box::new(acc), Box::new(r))))
}

fn or_expr(input: &mut &str) -> ModalResult<Expr> {
    ws.parse_next(input)?;
    let first = and_expr(input)?;
    let rest: Vec<Expr> =
        repeat(0.., preceded((ws, or_kw), cut_err(and_expr))).parse_next(input)?;
    Ok(rest
        .into_iter()
        .fold(first, |acc, r| Expr::Or(Box::new(acc), Box::new(r))))
}

/// Top-level rule: one condition, optionally surrounded by whitespace.
pub(super) fn condition(input: &mut &str) -> ModalResult<Expr> {
    let expr = or_expr(input)?;
    ws.parse_next(input)?;
    Ok(expr)
}
