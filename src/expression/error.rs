//! Error types for WHERE clause evaluation.

use thiserror::Error;

/// Errors that can occur during expression evaluation
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExpressionError {
    /// The clause uses a construct, operator, or literal kind the evaluator
    /// does not implement
    #[error("Unsupported SQL operation: {construct}")]
    UnsupportedOperation { construct: String },

    /// A record value cannot be ordered against the operand
    #[error("Type mismatch: cannot compare '{value}' {operator} {operand}")]
    TypeMismatch {
        operator: String,
        value: String,
        operand: String,
    },

    /// A literal could not be converted to an operand
    #[error("Invalid literal '{literal}': {reason}")]
    InvalidLiteral { literal: String, reason: String },
}

impl ExpressionError {
    pub fn unsupported(construct: impl Into<String>) -> Self {
        ExpressionError::UnsupportedOperation {
            construct: construct.into(),
        }
    }

    pub fn is_unsupported(&self) -> bool {
        matches!(self, ExpressionError::UnsupportedOperation { .. })
    }
}

/// Result type for expression operations
pub type ExpressionResult<T> = Result<T, ExpressionError>;
