//! Port definitions (interfaces for external adapters)
//!
//! Ports define the contracts that infrastructure adapters must implement.

pub mod inference_gateway;
pub mod key_value_storage;
pub mod stream_event_log;
