//! Query driver.
//!
//! A [`SelectQuery`] is prepared once from SQL text and then run against a
//! stream of JSON records. Each record is decoded, filtered through the WHERE
//! clause and, if it matches, written out as one line of compact JSON. A
//! failure ends the current request only; the query itself can be run again.

use crate::expression::{ColumnNames, ExpressionError, ExpressionEvaluator};
use crate::record::{JsonRecordReader, Record, RecordError};
use crate::sql::{parse_select, Expression, SelectItem};
use log::{debug, info};
use serde::Serialize;
use std::io::{self, Read, Write};
use thiserror::Error;

/// Errors that end a select request.
#[derive(Error, Debug)]
pub enum SelectError {
    #[error("SQL parse error: {0}")]
    Parse(String),

    #[error(transparent)]
    Expression(#[from] ExpressionError),

    #[error(transparent)]
    Record(#[from] RecordError),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to encode record: {0}")]
    Json(#[from] serde_json::Error),
}

impl SelectError {
    /// The input stream held malformed records
    pub fn is_decode_failure(&self) -> bool {
        matches!(self, SelectError::Record(_))
    }

    /// The query uses a construct the evaluator does not implement
    pub fn is_unsupported(&self) -> bool {
        matches!(self, SelectError::Expression(e) if e.is_unsupported())
    }
}

/// Result type for select operations.
pub type SelectResult<T> = Result<T, SelectError>;

/// Counters for one run of a query
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SelectStats {
    pub records_scanned: u64,
    pub records_matched: u64,
    pub bytes_returned: u64,
}

/// Settings applied when preparing a query
#[derive(Debug, Clone)]
pub struct SelectOptions {
    /// Column names in ordinal order, used when a column path does not
    /// resolve against a record
    pub column_names: Vec<String>,
    /// Written after every output record
    pub record_delimiter: String,
}

impl Default for SelectOptions {
    fn default() -> Self {
        Self {
            column_names: Vec::new(),
            record_delimiter: "\n".to_string(),
        }
    }
}

/// A parsed SELECT statement ready to be run against record streams
#[derive(Debug, Clone)]
pub struct SelectQuery {
    table: String,
    alias: Option<String>,
    where_clause: Option<Expression>,
    limit: Option<u64>,
    column_names: ColumnNames,
    record_delimiter: String,
}

impl SelectQuery {
    /// Parse and validate `sql` with default options
    pub fn prepare(sql: &str) -> SelectResult<Self> {
        Self::prepare_with(sql, &SelectOptions::default())
    }

    pub fn prepare_with(sql: &str, options: &SelectOptions) -> SelectResult<Self> {
        let statement = parse_select(sql).map_err(|e| SelectError::Parse(format!("{:#}", e)))?;
        let table = statement.from.name;
        let alias = statement.from.alias;

        for item in &statement.projections {
            match item {
                SelectItem::AllColumns => {}
                SelectItem::AllColumnsFrom(qualifier)
                    if qualifier.eq_ignore_ascii_case(&table)
                        || alias
                            .as_deref()
                            .is_some_and(|a| qualifier.eq_ignore_ascii_case(a)) => {}
                SelectItem::AllColumnsFrom(qualifier) => {
                    return Err(ExpressionError::unsupported(format!(
                        "projection from unknown source {}.*",
                        qualifier
                    ))
                    .into())
                }
                SelectItem::Expression(..) => {
                    return Err(ExpressionError::unsupported("column projection").into())
                }
            }
        }

        debug!(
            "prepared query on {} (alias {:?}, limit {:?}, filtered: {})",
            table,
            alias,
            statement.limit,
            statement.where_clause.is_some()
        );

        Ok(Self {
            table,
            alias,
            where_clause: statement.where_clause,
            limit: statement.limit,
            column_names: ColumnNames::from_names(&options.column_names),
            record_delimiter: options.record_delimiter.clone(),
        })
    }

    /// Replace the column-name mapping
    pub fn with_column_names(mut self, column_names: ColumnNames) -> Self {
        self.column_names = column_names;
        self
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn alias(&self) -> Option<&str> {
        self.alias.as_deref()
    }

    pub fn where_clause(&self) -> Option<&Expression> {
        self.where_clause.as_ref()
    }

    pub fn limit(&self) -> Option<u64> {
        self.limit
    }

    /// Whether `record` passes the WHERE clause. A query without one
    /// matches every record.
    pub fn matches(&self, record: &Record) -> SelectResult<bool> {
        let Some(clause) = &self.where_clause else {
            return Ok(true);
        };

        let evaluator = ExpressionEvaluator::new(record, &self.column_names, self.alias.as_deref())
            .with_table(&self.table);
        Ok(evaluator.evaluate(clause)?)
    }

    /// Stream records from `reader`, writing the matching ones to `writer`.
    ///
    /// Stops after LIMIT matches without reading further input. The first
    /// decode or evaluation error ends the run; records written before it
    /// stay written.
    pub fn run<R: Read, W: Write>(&self, reader: R, mut writer: W) -> SelectResult<SelectStats> {
        let mut stats = SelectStats::default();
        let mut records = JsonRecordReader::new(reader);

        while self.limit.map_or(true, |limit| stats.records_matched < limit) {
            let Some(record) = records.next_record()? else {
                break;
            };
            stats.records_scanned += 1;

            if !self.matches(&record)? {
                continue;
            }

            let line = serde_json::to_string(&record)?;
            writer.write_all(line.as_bytes())?;
            writer.write_all(self.record_delimiter.as_bytes())?;

            stats.records_matched += 1;
            stats.bytes_returned += (line.len() + self.record_delimiter.len()) as u64;
        }

        writer.flush()?;
        info!(
            "scanned {} records, matched {}, returned {} bytes",
            stats.records_scanned, stats.records_matched, stats.bytes_returned
        );
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::parse_record;

    fn run(sql: &str, input: &str) -> SelectResult<(String, SelectStats)> {
        let query = SelectQuery::prepare(sql)?;
        let mut output = Vec::new();
        let stats = query.run(input.as_bytes(), &mut output)?;
        Ok((String::from_utf8(output).unwrap(), stats))
    }

    #[test]
    fn test_prepare() {
        let query = SelectQuery::prepare("SELECT * FROM S3Object s WHERE s.age > 1 LIMIT 5").unwrap();
        assert_eq!(query.table(), "S3Object");
        assert_eq!(query.alias(), Some("s"));
        assert_eq!(query.limit(), Some(5));
        assert!(query.where_clause().is_some());

        assert!(SelectQuery::prepare("SELECT s.* FROM S3Object s").is_ok());
        assert!(SelectQuery::prepare("SELECT s3object.* FROM S3Object").is_ok());
    }

    #[test]
    fn test_prepare_rejects_projections() {
        let err = SelectQuery::prepare("SELECT name FROM S3Object").unwrap_err();
        assert!(err.is_unsupported());

        let err = SelectQuery::prepare("SELECT t.* FROM S3Object s").unwrap_err();
        assert!(err.is_unsupported());
    }

    #[test]
    fn test_prepare_parse_error() {
        let err = SelectQuery::prepare("SELECT * FROM").unwrap_err();
        assert!(matches!(err, SelectError::Parse(_)));
        assert!(!err.is_decode_failure());
    }

    #[test]
    fn test_matches_without_where() {
        let query = SelectQuery::prepare("SELECT * FROM S3Object").unwrap();
        assert!(query.matches(&parse_record(r#"{"a": 1}"#).unwrap()).unwrap());
    }

    #[test]
    fn test_run_filters_and_counts() {
        let input = "{\"n\": 1}\n{\"n\": 5}\n{\"n\": 9}\n";
        let (output, stats) = run("SELECT * FROM S3Object WHERE n > 2", input).unwrap();

        assert_eq!(output, "{\"n\":5}\n{\"n\":9}\n");
        assert_eq!(
            stats,
            SelectStats {
                records_scanned: 3,
                records_matched: 2,
                bytes_returned: output.len() as u64,
            }
        );
    }

    #[test]
    fn test_run_stops_at_limit() {
        let input = "{\"n\": 1}\n{\"n\": 2}\n{\"n\": 3}\n{broken";
        let (output, stats) = run("SELECT * FROM S3Object LIMIT 2", input).unwrap();
        assert_eq!(output.lines().count(), 2);
        assert_eq!(stats.records_scanned, 2);

        let (output, stats) = run("SELECT * FROM S3Object LIMIT 0", input).unwrap();
        assert!(output.is_empty());
        assert_eq!(stats.records_scanned, 0);
    }

    #[test]
    fn test_run_decode_failure() {
        let err = run("SELECT * FROM S3Object", "{\"n\": 1}\n{\"n\": ").unwrap_err();
        assert!(err.is_decode_failure());
        assert!(!err.is_unsupported());
    }

    #[test]
    fn test_run_unsupported_clause() {
        let err = run("SELECT * FROM S3Object WHERE n IS NULL", "{\"n\": 1}").unwrap_err();
        assert!(err.is_unsupported());
        assert!(!err.is_decode_failure());
    }

    #[test]
    fn test_custom_delimiter() {
        let options = SelectOptions {
            record_delimiter: ",".to_string(),
            ..SelectOptions::default()
        };
        let query = SelectQuery::prepare_with("SELECT * FROM S3Object", &options).unwrap();
        let mut output = Vec::new();
        query
            .run("{\"a\": 1} {\"a\": 2}".as_bytes(), &mut output)
            .unwrap();
        assert_eq!(String::from_utf8(output).unwrap(), "{\"a\":1},{\"a\":2},");
    }

    #[test]
    fn test_stats_serialize() {
        let stats = SelectStats {
            records_scanned: 3,
            records_matched: 1,
            bytes_returned: 8,
        };
        assert_eq!(
            serde_json::to_string(&stats).unwrap(),
            r#"{"records_scanned":3,"records_matched":1,"bytes_returned":8}"#
        );
    }
}
