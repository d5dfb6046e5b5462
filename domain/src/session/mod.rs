//! Chat session domain.
//!
//! - [`entities::Session`]: a conversation thread and its messages
//! - [`entities::AppState`]: every session plus the active selection
//! - [`action::SessionAction`]: the closed set of state transitions
//! - [`reducer::reduce`]: the pure transition function
//! - [`stream::parse_stream_payload`]: decoding of push-channel data events

pub mod action;
pub mod entities;
pub mod reducer;
pub mod stream;
pub mod value_objects;
