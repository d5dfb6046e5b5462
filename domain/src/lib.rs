//! Domain layer for distill-chat
//!
//! This crate contains the session/message model, the actions that change it,
//! and the pure reducer that folds actions into new state.
//! It has no dependencies on infrastructure or presentation concerns.
//!
//! # Core Concepts
//!
//! ## Sessions
//!
//! A [`Session`] is a conversation thread with its own background context.
//! Each exchange appends a user message followed by a model placeholder that
//! is filled token by token while the session is streaming.
//!
//! ## Reducer
//!
//! [`reduce`] is a total function from `(&AppState, &SessionAction)` to a new
//! [`AppState`]. Clocks and id generators are read when an action is
//! *constructed*, never inside the reducer.

pub mod core;
pub mod session;
pub mod util;

// Re-export commonly used types
pub use core::error::{DomainError, PayloadError};
pub use session::{
    action::SessionAction,
    entities::{AppState, Message, Role, Session},
    reducer::reduce,
    stream::{StreamPayload, parse_stream_payload},
    value_objects::{ClientId, MessageId, SessionId},
};
