//! Typed operands coerced from SQL literals.

use crate::expression::{ExpressionError, ExpressionResult};
use crate::sql::Literal;
use rust_decimal::Decimal;
use std::fmt;
use std::str::FromStr;

/// Right-hand side of a comparison after coercion
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    String(String),
    Integer(i64),
    /// Fractional literals are kept as exact decimals so `0.1` means 0.1
    Decimal(Decimal),
    /// Numbers beyond the range of `Decimal`
    Float(f64),
    Boolean(bool),
}

impl Operand {
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            Operand::Integer(_) | Operand::Decimal(_) | Operand::Float(_)
        )
    }

    /// Canonical text used when an operand is compared lexically
    pub fn as_text(&self) -> String {
        match self {
            Operand::String(s) => s.clone(),
            Operand::Integer(n) => n.to_string(),
            Operand::Decimal(d) => d.normalize().to_string(),
            Operand::Float(f) => format!("{:e}", f),
            Operand::Boolean(b) => b.to_string(),
        }
    }

    /// Arithmetic negation, used for literals written as `-5` or `-2.5`
    pub fn negate(self) -> ExpressionResult<Operand> {
        match self {
            Operand::Integer(n) => match n.checked_neg() {
                Some(n) => Ok(Operand::Integer(n)),
                None => Ok(Operand::Decimal(-Decimal::from(n))),
            },
            Operand::Decimal(d) => Ok(Operand::Decimal(-d)),
            Operand::Float(f) => Ok(Operand::Float(-f)),
            other => Err(ExpressionError::unsupported(format!(
                "unary minus on {} literal",
                other.type_name()
            ))),
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Operand::String(_) => "string",
            Operand::Integer(_) => "integer",
            Operand::Decimal(_) => "decimal",
            Operand::Float(_) => "float",
            Operand::Boolean(_) => "boolean",
        }
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::String(s) => write!(f, "'{}'", s),
            other => f.write_str(&other.as_text()),
        }
    }
}

/// Parse decimal text in plain (`12.5`) or scientific (`1.25e1`) notation
pub fn parse_decimal(text: &str) -> Option<Decimal> {
    if text.contains(|c: char| c == 'e' || c == 'E') {
        Decimal::from_scientific(text).ok()
    } else {
        Decimal::from_str(text).ok()
    }
}

/// Parse a finite `f64`; the last resort for numbers `Decimal` cannot hold
pub fn parse_float(text: &str) -> Option<f64> {
    text.parse::<f64>().ok().filter(|f| f.is_finite())
}

/// Exact decimal when it fits, otherwise a finite float
fn numeric_literal(raw: &str, reason: &str) -> ExpressionResult<Operand> {
    parse_decimal(raw)
        .map(Operand::Decimal)
        .or_else(|| parse_float(raw).map(Operand::Float))
        .ok_or_else(|| ExpressionError::InvalidLiteral {
            literal: raw.to_string(),
            reason: reason.to_string(),
        })
}

/// Convert a parsed SQL literal into an operand
pub fn coerce(literal: &Literal) -> ExpressionResult<Operand> {
    match literal {
        Literal::String(s) => Ok(Operand::String(s.clone())),
        Literal::Integer(raw) => match raw.parse::<i64>() {
            Ok(n) => Ok(Operand::Integer(n)),
            // Too wide for i64
            Err(_) => numeric_literal(raw, "integer out of range"),
        },
        Literal::Float(raw) => numeric_literal(raw, "not a finite number"),
        Literal::Boolean(b) => Ok(Operand::Boolean(*b)),
        Literal::Null => Err(ExpressionError::unsupported(
            "NULL literal as comparison operand",
        )),
    }
}
