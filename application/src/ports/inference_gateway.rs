//! Inference Gateway port
//!
//! Defines the two operations the remote text-generation service exposes:
//! opening a push channel addressed by a [`ClientId`], and submitting a
//! generation job that the service routes to that channel.

use async_trait::async_trait;
use distill_domain::ClientId;
use futures::stream::{BoxStream, Stream, StreamExt};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::mpsc;

/// Errors that can occur during gateway operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("Timeout")]
    Timeout,

    #[error("Channel closed")]
    ChannelClosed,
}

/// A generation request. `client_id` must match the open channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenerationJob {
    pub prompt: String,
    pub context: String,
    pub client_id: ClientId,
}

impl GenerationJob {
    pub fn new(prompt: impl Into<String>, context: impl Into<String>, client_id: ClientId) -> Self {
        Self {
            prompt: prompt.into(),
            context: context.into(),
            client_id,
        }
    }
}

/// Response body of the service health check.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HealthStatus {
    pub status: String,
}

impl HealthStatus {
    pub fn is_healthy(&self) -> bool {
        self.status == "healthy"
    }
}

/// One event delivered by an open push channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelEvent {
    /// The raw `data` of a pushed event, to be decoded with
    /// [`parse_stream_payload`](distill_domain::parse_stream_payload).
    Data(String),
    /// An explicit end-of-stream event at the transport level.
    End,
    /// A transport failure. Terminal for the channel.
    Error(String),
}

/// An open push channel.
///
/// Events are buffered from the moment the channel is open. Dropping the
/// channel closes the underlying connection.
pub struct PushChannel {
    events: BoxStream<'static, ChannelEvent>,
}

impl PushChannel {
    pub fn new(events: impl Stream<Item = ChannelEvent> + Send + 'static) -> Self {
        Self {
            events: events.boxed(),
        }
    }

    /// Wrap an `mpsc` receiver; the channel ends when every sender is dropped.
    pub fn from_receiver(receiver: mpsc::Receiver<ChannelEvent>) -> Self {
        Self::new(futures::stream::unfold(receiver, |mut rx| async move {
            rx.recv().await.map(|event| (event, rx))
        }))
    }

    /// Next event, or `None` once the connection has closed.
    pub async fn next_event(&mut self) -> Option<ChannelEvent> {
        self.events.next().await
    }
}

impl std::fmt::Debug for PushChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PushChannel").finish_non_exhaustive()
    }
}

/// Gateway to the remote inference service
///
/// Implementations (adapters) live in the infrastructure layer.
#[async_trait]
pub trait InferenceGateway: Send + Sync {
    /// Open a push channel for `client_id`.
    ///
    /// Returns once the service has confirmed the channel is open, so a job
    /// submitted afterwards cannot produce tokens nobody receives.
    async fn open_stream(&self, client_id: &ClientId) -> Result<PushChannel, GatewayError>;

    /// Submit a generation job. Any non-success response is an error.
    async fn submit_job(&self, job: &GenerationJob) -> Result<(), GatewayError>;

    /// Query the service health endpoint.
    async fn health_check(&self) -> Result<HealthStatus, GatewayError>;
}
