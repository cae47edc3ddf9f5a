//! Comparison of extracted record values against coerced operands.

use crate::expression::{
    parse_decimal, parse_float, ExpressionError, ExpressionResult, Operand,
};
use crate::sql::ComparisonOperator;
use regex::Regex;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::cmp::Ordering;

/// Whether `ordering` (value relative to operand) satisfies `op`
fn holds(op: ComparisonOperator, ordering: Ordering) -> bool {
    match op {
        ComparisonOperator::Equal => ordering == Ordering::Equal,
        ComparisonOperator::NotEqual => ordering != Ordering::Equal,
        ComparisonOperator::Less => ordering == Ordering::Less,
        ComparisonOperator::LessEqual => ordering != Ordering::Greater,
        ComparisonOperator::Greater => ordering == Ordering::Greater,
        ComparisonOperator::GreaterEqual => ordering != Ordering::Less,
    }
}

/// Apply `op` to an extracted value and an operand.
///
/// Numeric and boolean operands first try to read `value` as the same kind.
/// Numbers go through `i64`, then `Decimal`, then `f64` for magnitudes
/// `Decimal` cannot hold.
/// When that fails, `=` and `!=` compare the texts byte-wise, an empty
/// (absent) value never satisfies an ordering operator, and any other value
/// is a type mismatch.
pub fn compare(value: &str, op: ComparisonOperator, operand: &Operand) -> ExpressionResult<bool> {
    let ordering = match operand {
        Operand::String(s) => Some(value.cmp(s.as_str())),
        Operand::Integer(n) => match value.parse::<i64>() {
            Ok(v) => Some(v.cmp(n)),
            // Fractional or wide record values against an integer literal
            Err(_) => parse_decimal(value)
                .map(|v| v.cmp(&Decimal::from(*n)))
                .or_else(|| float_ordering(value, *n as f64)),
        },
        Operand::Decimal(d) => parse_decimal(value)
            .map(|v| v.cmp(d))
            .or_else(|| d.to_f64().and_then(|d| float_ordering(value, d))),
        Operand::Float(f) => float_ordering(value, *f),
        Operand::Boolean(b) => parse_bool(value).map(|v| v.cmp(b)),
    };

    match ordering {
        Some(ordering) => Ok(holds(op, ordering)),
        None => incomparable(value, op, operand),
    }
}

fn float_ordering(value: &str, operand: f64) -> Option<Ordering> {
    parse_float(value).and_then(|v| v.partial_cmp(&operand))
}

fn parse_bool(value: &str) -> Option<bool> {
    match value {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}

fn incomparable(value: &str, op: ComparisonOperator, operand: &Operand) -> ExpressionResult<bool> {
    if !op.is_ordering() {
        return Ok(holds(op, value.cmp(operand.as_text().as_str())));
    }
    if value.is_empty() {
        return Ok(false);
    }
    Err(ExpressionError::TypeMismatch {
        operator: op.to_string(),
        value: value.to_string(),
        operand: operand.to_string(),
    })
}

/// Compiled SQL LIKE pattern
#[derive(Debug, Clone)]
pub struct LikePattern {
    regex: Regex,
}

impl LikePattern {
    /// Compile `pattern`: `%` matches any run of characters, `_` exactly one,
    /// and `escape` makes the character after it literal.
    pub fn compile(pattern: &str, escape: Option<char>) -> ExpressionResult<Self> {
        let mut source = String::from("(?s)^");
        let mut chars = pattern.chars();

        while let Some(ch) = chars.next() {
            if Some(ch) == escape {
                let Some(escaped) = chars.next() else {
                    return Err(ExpressionError::InvalidLiteral {
                        literal: pattern.to_string(),
                        reason: "escape character at end of LIKE pattern".to_string(),
                    });
                };
                source.push_str(&regex::escape(&escaped.to_string()));
                continue;
            }
            match ch {
                '%' => source.push_str(".*"),
                '_' => source.push('.'),
                c => source.push_str(&regex::escape(&c.to_string())),
            }
        }
        source.push('$');

        let regex = Regex::new(&source).map_err(|e| ExpressionError::InvalidLiteral {
            literal: pattern.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self { regex })
    }

    pub fn matches(&self, value: &str) -> bool {
        self.regex.is_match(value)
    }
}

/// `value LIKE pattern [ESCAPE escape]`
pub fn like(value: &str, pattern: &str, escape: Option<char>) -> ExpressionResult<bool> {
    Ok(LikePattern::compile(pattern, escape)?.matches(value))
}
