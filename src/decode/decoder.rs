//! JSON page decoder
//!
//! Expects a top-level object holding a list of entity objects and a string
//! continuation field. Either may be absent or `null`.

use crate::error::{Error, Result};
use crate::record::Page;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Default name of the list field in the upstream response
pub const DEFAULT_RECORDS_FIELD: &str = "followers";

/// Default name of the continuation field in the upstream response
pub const DEFAULT_CURSOR_FIELD: &str = "cursor";

/// Decodes response bodies into pages of records
#[derive(Debug, Clone)]
pub struct PageDecoder {
    /// Key of the record list
    records_field: String,
    /// Key of the continuation token
    cursor_field: String,
}

impl Default for PageDecoder {
    fn default() -> Self {
        Self::new(DEFAULT_RECORDS_FIELD, DEFAULT_CURSOR_FIELD)
    }
}

impl PageDecoder {
    /// Create a decoder for the given field names
    pub fn new(records_field: impl Into<String>, cursor_field: impl Into<String>) -> Self {
        Self {
            records_field: records_field.into(),
            cursor_field: cursor_field.into(),
        }
    }

    /// Key of the record list
    pub fn records_field(&self) -> &str {
        &self.records_field
    }

    /// Decode a response body into a page
    pub fn decode<R: DeserializeOwned>(&self, body: &[u8]) -> Result<Page<R>> {
        let value: Value = serde_json::from_slice(body)
            .map_err(|e| Error::decode(format!("Failed to parse JSON: {e}")))?;

        let mut object = match value {
            Value::Object(object) => object,
            other => {
                return Err(Error::decode(format!(
                    "Expected a JSON object, found {}",
                    type_name(&other)
                )))
            }
        };

        let records = match object.remove(&self.records_field) {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(items)) => items
                .into_iter()
                .enumerate()
                .map(|(index, item)| {
                    serde_json::from_value(item).map_err(|e| {
                        Error::decode(format!(
                            "Invalid entry {index} in '{}': {e}",
                            self.records_field
                        ))
                    })
                })
                .collect::<Result<Vec<R>>>()?,
            Some(other) => {
                return Err(Error::decode(format!(
                    "Expected '{}' to be an array, found {}",
                    self.records_field,
                    type_name(&other)
                )))
            }
        };

        let cursor = match object.remove(&self.cursor_field) {
            None | Some(Value::Null) => None,
            Some(Value::String(cursor)) => Some(cursor),
            Some(other) => {
                return Err(Error::decode(format!(
                    "Expected '{}' to be a string, found {}",
                    self.cursor_field,
                    type_name(&other)
                )))
            }
        };

        Ok(Page::new(records, cursor))
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
