//! Range conditions.

use crate::expression::{compare, ExpressionResult, Operand};
use crate::sql::ComparisonOperator;

/// Inclusive `low <= value <= high`, using the ordering rules of [`compare`].
///
/// Bounds written in descending order are swapped first. Bounds that cannot
/// be ordered against each other are left as written.
pub fn evaluate_between(value: &str, low: &Operand, high: &Operand) -> ExpressionResult<bool> {
    let (low, high) = if matches!(
        compare(&low.as_text(), ComparisonOperator::Greater, high),
        Ok(true)
    ) {
        (high, low)
    } else {
        (low, high)
    };

    let above_low = compare(value, ComparisonOperator::GreaterEqual, low)?;
    let below_high = compare(value, ComparisonOperator::LessEqual, high)?;
    Ok(above_low && below_high)
}
