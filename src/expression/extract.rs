//! Column value extraction from JSON records.

use crate::record::Record;
use crate::sql::ColumnRef;
use serde_json::Value;
use std::collections::HashMap;

/// Mapping from lower-cased column name to its ordinal position.
///
/// JSON records are addressed by path; the mapping is only consulted when a
/// path resolves to nothing, in which case the ordinal selects the n-th
/// top-level field of the record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnNames {
    ordinals: HashMap<String, usize>,
}

impl ColumnNames {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a mapping from names in ordinal order. Names are case-normalized;
    /// the first occurrence of a duplicate wins.
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut ordinals = HashMap::new();
        for (index, name) in names.into_iter().enumerate() {
            ordinals
                .entry(name.as_ref().to_lowercase())
                .or_insert(index);
        }
        Self { ordinals }
    }

    pub fn ordinal(&self, name: &str) -> Option<usize> {
        self.ordinals.get(&name.to_lowercase()).copied()
    }

    pub fn len(&self) -> usize {
        self.ordinals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ordinals.is_empty()
    }
}

/// Follow `path` through nested objects and arrays
pub fn lookup<'a>(record: &'a Record, path: &[String]) -> Option<&'a Value> {
    let (first, rest) = path.split_first()?;
    let mut current = record.get(first)?;

    for segment in rest {
        current = match current {
            Value::Object(map) => map.get(segment)?,
            Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }

    Some(current)
}

/// Textual form of a JSON value as seen by comparisons
pub fn value_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}

/// Textual value at `path`, or the empty string when the path does not exist
pub fn extract(record: &Record, path: &[String]) -> String {
    lookup(record, path).map(value_text).unwrap_or_default()
}

/// Resolves column references against records for one query.
///
/// A leading segment naming the table alias (or the table itself) is
/// dropped, so `s.age` under `FROM S3Object s` reads the `age` field.
#[derive(Debug, Clone, Copy)]
pub struct ColumnResolver<'a> {
    column_names: &'a ColumnNames,
    alias: Option<&'a str>,
    table: Option<&'a str>,
}

impl<'a> ColumnResolver<'a> {
    pub fn new(column_names: &'a ColumnNames, alias: Option<&'a str>) -> Self {
        Self {
            column_names,
            alias,
            table: None,
        }
    }

    pub fn with_table(mut self, table: &'a str) -> Self {
        self.table = Some(table);
        self
    }

    /// Textual value of `column` in `record`, or `""` when it resolves to nothing
    pub fn resolve(&self, record: &Record, column: &ColumnRef) -> String {
        let path = self.strip_qualifier(&column.path);

        if let Some(value) = lookup(record, path) {
            return value_text(value);
        }

        self.column_names
            .ordinal(&path.join("."))
            .and_then(|ordinal| record.values().nth(ordinal))
            .map(value_text)
            .unwrap_or_default()
    }

    fn strip_qualifier<'p>(&self, path: &'p [String]) -> &'p [String] {
        match path.split_first() {
            Some((first, rest)) if !rest.is_empty() => {
                let qualifies =
                    |name: Option<&str>| name.is_some_and(|n| n.eq_ignore_ascii_case(first));
                if qualifies(self.alias) || qualifies(self.table) {
                    rest
                } else {
                    path
                }
            }
            _ => path,
        }
    }
}
