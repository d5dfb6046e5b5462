//! Remote inference service adapter
//!
//! Talks to the text-generation service over HTTP: a server-sent-events
//! stream per client id, plus plain JSON requests for job submission and
//! health checks.

pub mod error;
pub mod gateway;
pub mod sse;
