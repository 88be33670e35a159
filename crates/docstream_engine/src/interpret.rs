use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Map, Value};

use crate::FrameError;

/// Value of the `message` field that ends a batch.
pub const COMPLETION_MESSAGE: &str = "Processing complete";

static JSON_FENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)^\s*```(?:json)?\s*(.*?)\s*```\s*$").expect("valid fence pattern")
});

/// A decoded stream event, classified once.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    /// The backend finished the batch.
    Completion,
    File(FileEvent),
    /// A payload that was not valid JSON.
    Malformed(FrameError),
    /// Valid JSON of an unknown shape.
    Unrecognized,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FileEvent {
    pub file_name: String,
    /// `None` when the event carried no `processedData`.
    pub data: Option<Result<Value, DataDecodeError>>,
    pub error: Option<String>,
    pub prompt: Option<String>,
}

/// `processedData` was a string that held no decodable JSON.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Failed to parse processed data: {reason}")]
pub struct DataDecodeError {
    pub raw: String,
    pub reason: String,
}

pub fn interpret(value: Value) -> StreamEvent {
    let Value::Object(mut fields) = value else {
        return StreamEvent::Unrecognized;
    };

    if fields.get("message").and_then(Value::as_str) == Some(COMPLETION_MESSAGE) {
        return StreamEvent::Completion;
    }

    let Some(file_name) = fields.get("fileName").and_then(Value::as_str) else {
        return StreamEvent::Unrecognized;
    };
    let file_name = file_name.to_string();

    StreamEvent::File(FileEvent {
        file_name,
        data: take_present(&mut fields, "processedData").map(decode_processed_data),
        error: take_present(&mut fields, "error").map(|value| match value {
            Value::String(text) => text,
            other => other.to_string(),
        }),
        prompt: take_present(&mut fields, "prompt").and_then(|value| match value {
            Value::String(text) => Some(text),
            _ => None,
        }),
    })
}

/// Removes a field unless it is absent, `null` or an empty string.
fn take_present(fields: &mut Map<String, Value>, key: &str) -> Option<Value> {
    match fields.remove(key)? {
        Value::Null => None,
        Value::String(text) if text.is_empty() => None,
        value => Some(value),
    }
}

/// Second-stage decoding of `processedData`.
///
/// Non-string values pass through. Strings are decoded from the inside of a
/// ```` ```json ```` fence when present, otherwise as a whole.
pub fn decode_processed_data(value: Value) -> Result<Value, DataDecodeError> {
    let Value::String(raw) = value else {
        return Ok(value);
    };

    let candidate = match JSON_FENCE.captures(&raw).and_then(|caps| caps.get(1)) {
        Some(inner) => inner.as_str(),
        None => raw.as_str(),
    };

    match serde_json::from_str(candidate) {
        Ok(decoded) => Ok(decoded),
        Err(err) => Err(DataDecodeError {
            reason: err.to_string(),
            raw,
        }),
    }
}
