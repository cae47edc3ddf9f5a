pub mod expression;
pub mod record;
pub mod select;
pub mod sql;

pub use expression::{evaluate_where, ColumnNames, ExpressionError, ExpressionEvaluator};
pub use record::{JsonRecordReader, Record, RecordError};
pub use select::{SelectError, SelectOptions, SelectQuery, SelectStats};
