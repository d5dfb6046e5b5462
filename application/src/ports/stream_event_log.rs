//! Port for structured stream lifecycle logging.
//!
//! Defines the [`StreamEventLog`] trait for recording when streams start,
//! how they stop, and which payloads were rejected.
//!
//! This is separate from `tracing`-based operation logs: tracing handles
//! human-readable diagnostic messages, while this port captures stream
//! lifecycle records in a machine-readable format (JSONL).

use serde_json::Value;

/// Why a stream stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The service sent an end event or closed the connection.
    Completed,
    /// The user cancelled; the unanswered exchange was rolled back.
    Manual,
    /// A new stream for the same session replaced this one.
    Replaced,
    /// The job submission failed after the channel opened.
    SubmissionFailed,
    /// The channel could not be opened or failed while open.
    ChannelError,
    /// A caller stopped the stream without asking for rollback.
    Aborted,
    /// The owning session was deleted.
    SessionDeleted,
    /// The controller shut down.
    Shutdown,
}

impl StopReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            StopReason::Completed => "completed",
            StopReason::Manual => "manual",
            StopReason::Replaced => "replaced",
            StopReason::SubmissionFailed => "submission_failed",
            StopReason::ChannelError => "channel_error",
            StopReason::Aborted => "aborted",
            StopReason::SessionDeleted => "session_deleted",
            StopReason::Shutdown => "shutdown",
        }
    }

    /// Manual-style stops roll back the unanswered exchange.
    pub fn rolls_back(&self) -> bool {
        matches!(self, StopReason::Manual | StopReason::Replaced)
    }
}

impl std::fmt::Display for StopReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A structured stream lifecycle event.
pub struct StreamLogEvent {
    /// Event type identifier (e.g., "stream_started", "stream_stopped").
    pub event_type: &'static str,
    /// JSON payload with event-specific data.
    pub payload: Value,
}

impl StreamLogEvent {
    pub fn new(event_type: &'static str, payload: Value) -> Self {
        Self {
            event_type,
            payload,
        }
    }
}

/// Port for logging stream lifecycle events.
///
/// `log` is synchronous and infallible; implementations drop records they
/// cannot write.
pub trait StreamEventLog: Send + Sync {
    fn log(&self, event: StreamLogEvent);
}

/// No-op implementation for tests and when the event log is disabled.
pub struct NoStreamEventLog;

impl StreamEventLog for NoStreamEventLog {
    fn log(&self, _event: StreamLogEvent) {}
}
