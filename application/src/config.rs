//! Application-level configuration.
//!
//! Controls how the stream controller talks to the gateway.

use std::time::Duration;

/// Stream behavior configuration.
///
/// Timeouts bound the two request/response steps of a streaming attempt.
/// Once the channel is open and the job accepted, tokens may arrive for as
/// long as the service keeps generating.
#[derive(Debug, Clone, Default)]
pub struct StreamConfig {
    /// Maximum time to wait for the push channel to open.
    pub open_timeout: Option<Duration>,
    /// Maximum time to wait for the job submission to be accepted.
    pub submit_timeout: Option<Duration>,
}

impl StreamConfig {
    /// Applies the same timeout, in seconds, to both steps.
    pub fn with_timeout_seconds(seconds: u64) -> Self {
        Self::from_timeout_seconds(Some(seconds))
    }

    /// If `seconds` is `None`, no timeout is applied.
    pub fn from_timeout_seconds(seconds: Option<u64>) -> Self {
        let timeout = seconds.map(Duration::from_secs);
        Self {
            open_timeout: timeout,
            submit_timeout: timeout,
        }
    }
}
