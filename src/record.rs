//! JSON record input.
//!
//! A record is one JSON object decoded from the input stream. Documents are
//! read one at a time; a record is dropped as soon as it has been evaluated
//! and, if it matched, written out.

use log::debug;
use serde_json::de::{IoRead, StreamDeserializer};
use serde_json::{Map, Value};
use std::io::Read;
use std::iter::Peekable;
use thiserror::Error;

/// One decoded JSON document. Field order follows the document.
pub type Record = Map<String, Value>;

/// Errors produced while decoding records from the input stream.
#[derive(Error, Debug)]
pub enum RecordError {
    #[error("Malformed JSON in record {index}: {source}")]
    Decode {
        index: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("Record {index} is a JSON {found}, expected an object")]
    NotAnObject { index: usize, found: &'static str },
}

/// Result type for record decoding.
pub type RecordResult<T> = Result<T, RecordError>;

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Streaming reader yielding successive JSON objects from a byte stream.
///
/// Documents may be separated by any amount of whitespace (JSON Lines, or
/// concatenated pretty-printed objects). A decode failure ends the stream:
/// the error is returned once and later calls report end of input.
pub struct JsonRecordReader<R: Read> {
    documents: Peekable<StreamDeserializer<'static, IoRead<R>, Value>>,
    decoded: usize,
    failed: bool,
}

impl<R: Read> JsonRecordReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            documents: serde_json::Deserializer::from_reader(reader)
                .into_iter::<Value>()
                .peekable(),
            decoded: 0,
            failed: false,
        }
    }

    /// Whether another document may follow. Decoding errors count as "more"
    /// so that the next call to [`next_record`](Self::next_record) reports
    /// them.
    pub fn has_more(&mut self) -> bool {
        !self.failed && self.documents.peek().is_some()
    }

    /// Decode the next record. `Ok(None)` signals a clean end of input.
    pub fn next_record(&mut self) -> RecordResult<Option<Record>> {
        if self.failed {
            return Ok(None);
        }

        let index = self.decoded;
        match self.documents.next() {
            None => Ok(None),
            Some(Err(source)) => {
                self.failed = true;
                debug!("decode failed at record {}: {}", index, source);
                Err(RecordError::Decode { index, source })
            }
            Some(Ok(Value::Object(record))) => {
                self.decoded += 1;
                Ok(Some(record))
            }
            Some(Ok(other)) => {
                self.failed = true;
                Err(RecordError::NotAnObject {
                    index,
                    found: json_type_name(&other),
                })
            }
        }
    }

    /// Number of records successfully decoded so far
    pub fn records_decoded(&self) -> usize {
        self.decoded
    }
}

impl<R: Read> Iterator for JsonRecordReader<R> {
    type Item = RecordResult<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_record().transpose()
    }
}

/// Decode a single record from a JSON string
pub fn parse_record(json: &str) -> RecordResult<Record> {
    let mut reader = JsonRecordReader::new(json.as_bytes());
    match reader.next_record()? {
        Some(record) => Ok(record),
        None => Ok(Record::new()),
    }
}
