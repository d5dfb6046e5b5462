//! Push-channel payloads.
//!
//! Each data event pushed by the inference service carries a small JSON
//! object. Two shapes are meaningful:
//!
//! - `{"token": "..."}`: a generated text fragment
//! - `{"event": "end"}`: the service finished the job
//!
//! Anything else that is still a JSON object (heartbeats, unknown events)
//! is [`StreamPayload::Ignored`]. Bodies that are not JSON objects are
//! malformed and reported as [`PayloadError`].

use crate::core::error::PayloadError;
use serde_json::Value;

/// Event name the service uses to signal the end of a job.
pub const END_EVENT: &str = "end";

/// A decoded push-channel data event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamPayload {
    /// A text fragment to append to the model placeholder.
    Token(String),
    /// The service signalled completion.
    End,
    /// Well-formed but carries nothing this client acts on.
    Ignored,
}

impl StreamPayload {
    pub fn is_end(&self) -> bool {
        matches!(self, StreamPayload::End)
    }
}

/// Decode the `data` field of one push-channel event.
///
/// A `token` field wins over an `event` field when both are present.
pub fn parse_stream_payload(data: &str) -> Result<StreamPayload, PayloadError> {
    let trimmed = data.trim();
    if trimmed.is_empty() {
        return Ok(StreamPayload::Ignored);
    }

    let value: Value =
        serde_json::from_str(trimmed).map_err(|e| PayloadError::InvalidJson(e.to_string()))?;
    let Value::Object(object) = value else {
        return Err(PayloadError::NotAnObject(trimmed.to_string()));
    };

    match object.get("token") {
        Some(Value::String(token)) => return Ok(StreamPayload::Token(token.clone())),
        Some(Value::Null) | None => {}
        Some(_) => return Err(PayloadError::UnexpectedFieldType { field: "token" }),
    }

    match object.get("event").and_then(Value::as_str) {
        Some(END_EVENT) => Ok(StreamPayload::End),
        _ => Ok(StreamPayload::Ignored),
    }
}
