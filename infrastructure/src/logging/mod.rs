//! Logging infrastructure: structured stream event logging.
//!
//! Provides [`JsonlStreamEventLog`], a JSONL file writer that implements
//! the [`StreamEventLog`](distill_application::StreamEventLog) port.

mod jsonl_logger;

pub use jsonl_logger::JsonlStreamEventLog;
