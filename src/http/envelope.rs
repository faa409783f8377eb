//! Response Envelope
//!
//! The backend wraps payloads as `{code, message, data}` or, on older
//! endpoints, `{status, message, data}`.

use crate::error::{Error, Result};
use serde::de::DeserializeOwned;
use serde_json::Value;

const DEFAULT_FAILURE_MESSAGE: &str = "request failed";

/// Render a `code`/`status` value as text for comparison
fn code_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        other => Some(other.to_string()),
    }
}

/// Check the envelope of a response body
///
/// A body whose `code` (or `status`) differs from `success_code` is a failure.
/// Bodies without either field pass unchanged.
pub fn check_envelope(body: Value, success_code: &str) -> Result<Value> {
    let code = body
        .get("code")
        .and_then(code_text)
        .or_else(|| body.get("status").and_then(code_text));

    match code {
        Some(code) if code != success_code => {
            let message = body
                .get("message")
                .and_then(Value::as_str)
                .filter(|m| !m.is_empty())
                .unwrap_or(DEFAULT_FAILURE_MESSAGE)
                .to_string();
            Err(Error::Api { code, message })
        }
        _ => Ok(body),
    }
}

/// Decode the `data` field of a checked body
pub fn decode_data<T: DeserializeOwned>(body: Value) -> Result<T> {
    match body {
        Value::Object(mut map) => {
            let data = map
                .remove("data")
                .ok_or_else(|| Error::malformed("response has no data field"))?;
            Ok(serde_json::from_value(data)?)
        }
        _ => Err(Error::malformed("response body is not an object")),
    }
}
