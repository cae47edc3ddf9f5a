//! WHERE clause evaluation over JSON records.
//!
//! This module provides:
//! - Operand coercion from SQL literals
//! - Value extraction by column path
//! - Comparison, LIKE and BETWEEN evaluation
//! - The WHERE clause evaluator

pub mod between;
pub mod compare;
pub mod error;
pub mod eval;
pub mod extract;
pub mod operand;

pub use between::evaluate_between;
pub use compare::{compare, like, LikePattern};
pub use error::{ExpressionError, ExpressionResult};
pub use eval::{evaluate_where, ExpressionEvaluator};
pub use extract::{extract, lookup, value_text, ColumnNames, ColumnResolver};
pub use operand::{coerce, parse_decimal, parse_float, Operand};
