//! Domain error types

use thiserror::Error;

/// Domain-level errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Session context cannot be empty")]
    EmptyContext,

    #[error("Session not found: {0}")]
    SessionNotFound(String),
}

/// Errors raised while interpreting a push-channel data event.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PayloadError {
    #[error("Payload is not valid JSON: {0}")]
    InvalidJson(String),

    #[error("Payload is not a JSON object: {0}")]
    NotAnObject(String),

    #[error("Field `{field}` has an unexpected type")]
    UnexpectedFieldType { field: &'static str },
}
