//! JSON codec for stored records.
//!
//! Records are stored as the UTF-8 JSON text of a single object. Dates are
//! ISO-8601 calendar dates (`YYYY-MM-DD`), enumerations are their wire
//! names, and integers keep their integer encoding.

use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use thiserror::Error;

/// Errors raised while encoding or decoding a record.
#[derive(Debug, Error)]
pub enum CodecError {
    /// The bytes are not valid JSON.
    #[error("invalid JSON: {0}")]
    Syntax(#[source] serde_json::Error),

    /// The JSON is valid but is not an object.
    #[error("expected a JSON object, found {0}")]
    NotAnObject(&'static str),

    /// The object does not have the shape of the record.
    #[error("unexpected record shape: {0}")]
    Shape(#[source] serde_json::Error),

    /// The record could not be serialized.
    #[error("failed to serialize record: {0}")]
    Serialize(#[source] serde_json::Error),
}

const fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Encodes a record as JSON bytes.
///
/// # Errors
///
/// Fails if the record does not serialize to a JSON object.
pub fn encode<T: Serialize>(record: &T) -> Result<Vec<u8>, CodecError> {
    let value = serde_json::to_value(record).map_err(CodecError::Serialize)?;
    if !value.is_object() {
        return Err(CodecError::NotAnObject(json_type(&value)));
    }
    serde_json::to_vec(&value).map_err(CodecError::Serialize)
}

/// Decodes JSON bytes into a record.
///
/// # Errors
///
/// Fails on invalid JSON, on a non-object payload, and on an object whose
/// fields do not match the record.
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, CodecError> {
    let value: Value = serde_json::from_slice(bytes).map_err(CodecError::Syntax)?;
    if !value.is_object() {
        return Err(CodecError::NotAnObject(json_type(&value)));
    }
    serde_json::from_value(value).map_err(CodecError::Shape)
}
