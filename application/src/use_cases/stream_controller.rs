//! Stream controller
//!
//! Owns every live push channel and turns channel events into
//! [`SessionAction`]s dispatched through the [`SessionStore`].
//!
//! # Invariants
//!
//! - A session has at most one open channel. [`start_stream`] stops the
//!   previous channel (with rollback) before registering a new one.
//! - The channel is opened and confirmed **before** the job is submitted,
//!   so the service always has a subscriber for the first token.
//! - Each connection is identified by a fresh [`ClientId`]. Events from a
//!   connection the controller no longer tracks are discarded: every
//!   dispatch from a connection task happens under the channel-map lock
//!   after checking the session still maps to that id.
//! - Lock order is channel map, then store. The store never calls back
//!   into the controller.
//!
//! Failures (open, submit, transport) are terminal for the exchange: no
//! retry, and whatever the placeholder already holds is kept.
//!
//! [`start_stream`]: StreamController::start_stream

use crate::config::StreamConfig;
use crate::ports::inference_gateway::{ChannelEvent, GatewayError, GenerationJob, InferenceGateway};
use crate::ports::stream_event_log::{NoStreamEventLog, StopReason, StreamEventLog, StreamLogEvent};
use crate::store::session_store::SessionStore;
use chrono::Utc;
use distill_domain::util::preview;
use distill_domain::{
    ClientId, DomainError, SessionAction, SessionId, StreamPayload, parse_stream_payload,
};
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;
use thiserror::Error;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

/// Errors that end a streaming attempt
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StreamError {
    #[error("Failed to open push channel: {0}")]
    Open(GatewayError),

    #[error("Job submission failed: {0}")]
    Submission(GatewayError),

    #[error("Channel error: {0}")]
    Channel(String),
}

impl StreamError {
    fn stop_reason(&self) -> StopReason {
        match self {
            StreamError::Submission(_) => StopReason::SubmissionFailed,
            StreamError::Open(_) | StreamError::Channel(_) => StopReason::ChannelError,
        }
    }
}

/// Options for [`StreamController::stop_stream`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StopOptions {
    /// User-initiated cancellation: also roll back the unanswered exchange.
    pub manual: bool,
}

impl StopOptions {
    pub fn manual() -> Self {
        Self { manual: true }
    }
}

struct ActiveStream {
    client_id: ClientId,
    cancel: CancellationToken,
}

/// Single owner of the session → channel map.
///
/// Create one per process and share it as `Arc<StreamController<G>>`.
pub struct StreamController<G: InferenceGateway + 'static> {
    gateway: Arc<G>,
    store: Arc<SessionStore>,
    config: StreamConfig,
    event_log: Arc<dyn StreamEventLog>,
    channels: Mutex<HashMap<SessionId, ActiveStream>>,
}

impl<G: InferenceGateway + 'static> StreamController<G> {
    pub fn new(gateway: Arc<G>, store: Arc<SessionStore>) -> Self {
        Self {
            gateway,
            store,
            config: StreamConfig::default(),
            event_log: Arc::new(NoStreamEventLog),
            channels: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_config(mut self, config: StreamConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_event_log(mut self, event_log: Arc<dyn StreamEventLog>) -> Self {
        self.event_log = event_log;
        self
    }

    pub fn store(&self) -> &Arc<SessionStore> {
        &self.store
    }

    /// Begin a new exchange on `session_id`.
    ///
    /// Returns as soon as the user message and placeholder are recorded;
    /// the channel is opened and the job submitted on a background task.
    /// Must be called from within a tokio runtime.
    pub fn start_stream(
        self: &Arc<Self>,
        session_id: &SessionId,
        prompt: impl Into<String>,
        context: impl Into<String>,
    ) -> Result<ClientId, DomainError> {
        let prompt = prompt.into();
        let context = context.into();

        let mut channels = self.lock_channels();
        if !self.store.state().contains(session_id) {
            return Err(DomainError::SessionNotFound(session_id.to_string()));
        }

        if let Some(previous) = channels.remove(session_id) {
            debug!(
                "Session {} already streaming on {}, stopping it first",
                session_id, previous.client_id
            );
            self.settle(session_id, previous, StopReason::Replaced);
        }

        self.store.dispatch(SessionAction::set_streaming_start_time(
            session_id.clone(),
            Some(Utc::now()),
        ));
        self.store
            .dispatch(SessionAction::add_user_message(session_id.clone(), prompt.clone()));
        self.store
            .dispatch(SessionAction::add_model_placeholder(session_id.clone()));
        self.store
            .dispatch(SessionAction::set_streaming_status(session_id.clone(), true));

        let client_id = ClientId::generate();
        let cancel = CancellationToken::new();
        channels.insert(
            session_id.clone(),
            ActiveStream {
                client_id: client_id.clone(),
                cancel: cancel.clone(),
            },
        );
        drop(channels);

        info!(
            "Starting stream {} for session {}: {}",
            client_id,
            session_id,
            preview(&prompt, 60)
        );
        self.event_log.log(StreamLogEvent::new(
            "stream_started",
            serde_json::json!({
                "session_id": session_id.as_str(),
                "client_id": client_id.as_str(),
                "prompt_bytes": prompt.len(),
            }),
        ));

        let job = GenerationJob::new(prompt, context, client_id.clone());
        tokio::spawn(Arc::clone(self).run_connection(session_id.clone(), job, cancel));

        Ok(client_id)
    }

    /// Close the channel for `session_id`, if any.
    ///
    /// With `manual`, the unanswered exchange is rolled back. Returns
    /// `false` (and does nothing) when no channel is open.
    pub fn stop_stream(&self, session_id: &SessionId, options: StopOptions) -> bool {
        let mut channels = self.lock_channels();
        let Some(active) = channels.remove(session_id) else {
            trace!("stop_stream: no open channel for session {}", session_id);
            return false;
        };

        let reason = if options.manual {
            StopReason::Manual
        } else {
            StopReason::Aborted
        };
        self.settle(session_id, active, reason);
        true
    }

    /// Close channels whose session no longer exists. Returns how many.
    ///
    /// These stops never roll back: the session record is gone.
    pub fn close_orphaned_channels(&self) -> usize {
        let mut channels = self.lock_channels();
        let state = self.store.state();
        let orphaned: Vec<SessionId> = channels
            .keys()
            .filter(|id| !state.contains(id))
            .cloned()
            .collect();

        for id in &orphaned {
            if let Some(active) = channels.remove(id) {
                self.settle(id, active, StopReason::SessionDeleted);
            }
        }
        orphaned.len()
    }

    /// Watch the store and close the channels of deleted sessions.
    ///
    /// The task ends when the store is dropped or the controller is.
    pub fn spawn_deletion_watcher(self: &Arc<Self>) -> JoinHandle<()> {
        let mut changes = self.store.subscribe();
        let controller: Weak<Self> = Arc::downgrade(self);

        tokio::spawn(async move {
            while changes.changed().await.is_ok() {
                let Some(controller) = controller.upgrade() else {
                    break;
                };
                let closed = controller.close_orphaned_channels();
                if closed > 0 {
                    debug!("Closed {} channel(s) of deleted sessions", closed);
                }
            }
        })
    }

    /// Stop every open channel without rollback.
    pub fn shutdown(&self) {
        let mut channels = self.lock_channels();
        let open: Vec<SessionId> = channels.keys().cloned().collect();
        for id in open {
            if let Some(active) = channels.remove(&id) {
                self.settle(&id, active, StopReason::Shutdown);
            }
        }
    }

    /// Whether a channel is open for `session_id`.
    pub fn is_streaming(&self, session_id: &SessionId) -> bool {
        self.lock_channels().contains_key(session_id)
    }

    pub fn client_id(&self, session_id: &SessionId) -> Option<ClientId> {
        self.lock_channels()
            .get(session_id)
            .map(|active| active.client_id.clone())
    }

    pub fn open_channel_count(&self) -> usize {
        self.lock_channels().len()
    }

    fn lock_channels(&self) -> MutexGuard<'_, HashMap<SessionId, ActiveStream>> {
        self.channels.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Cancel a removed channel and clear the session's streaming state.
    ///
    /// Callers hold the channel-map lock, so no new stream for the same
    /// session can interleave with these dispatches.
    fn settle(&self, session_id: &SessionId, active: ActiveStream, reason: StopReason) {
        active.cancel.cancel();

        self.store.dispatch(SessionAction::set_streaming_start_time(
            session_id.clone(),
            None,
        ));
        self.store
            .dispatch(SessionAction::set_streaming_status(session_id.clone(), false));
        if reason.rolls_back() {
            self.store
                .dispatch(SessionAction::rollback_last_exchange(session_id.clone()));
        }

        info!(
            "Stopped stream {} for session {} ({})",
            active.client_id, session_id, reason
        );
        self.event_log.log(StreamLogEvent::new(
            "stream_stopped",
            serde_json::json!({
                "session_id": session_id.as_str(),
                "client_id": active.client_id.as_str(),
                "reason": reason.as_str(),
            }),
        ));
    }

    /// Stop `session_id` only if it is still served by `client_id`.
    fn stop_connection(&self, session_id: &SessionId, client_id: &ClientId, reason: StopReason) {
        let mut channels = self.lock_channels();
        if !channels
            .get(session_id)
            .is_some_and(|active| &active.client_id == client_id)
        {
            trace!("Connection {} already discarded", client_id);
            return;
        }
        if let Some(active) = channels.remove(session_id) {
            self.settle(session_id, active, reason);
        }
    }

    /// Dispatch a token if `client_id` still serves the session.
    fn append_token(&self, session_id: &SessionId, client_id: &ClientId, token: String) -> bool {
        let channels = self.lock_channels();
        let current = channels
            .get(session_id)
            .is_some_and(|active| &active.client_id == client_id);
        if current {
            self.store
                .dispatch(SessionAction::append_stream_token(session_id.clone(), token));
        }
        current
    }

    async fn run_connection(
        self: Arc<Self>,
        session_id: SessionId,
        job: GenerationJob,
        cancel: CancellationToken,
    ) {
        let client_id = job.client_id.clone();
        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!("Connection {} cancelled", client_id);
                return;
            }
            outcome = self.drive(&session_id, &job) => outcome,
        };

        let reason = match outcome {
            Ok(()) => StopReason::Completed,
            Err(e) => {
                warn!("Stream {} for session {} failed: {}", client_id, session_id, e);
                e.stop_reason()
            }
        };
        self.stop_connection(&session_id, &client_id, reason);
    }

    async fn drive(&self, session_id: &SessionId, job: &GenerationJob) -> Result<(), StreamError> {
        let client_id = &job.client_id;

        let mut channel = with_timeout(self.config.open_timeout, self.gateway.open_stream(client_id))
            .await
            .map_err(StreamError::Open)?;
        debug!("Channel {} open, submitting job", client_id);

        with_timeout(self.config.submit_timeout, self.gateway.submit_job(job))
            .await
            .map_err(StreamError::Submission)?;
        debug!("Job {} accepted", client_id);

        while let Some(event) = channel.next_event().await {
            match event {
                ChannelEvent::Data(data) => match parse_stream_payload(&data) {
                    Ok(StreamPayload::Token(token)) => {
                        if !self.append_token(session_id, client_id, token) {
                            return Ok(());
                        }
                    }
                    Ok(StreamPayload::End) => return Ok(()),
                    Ok(StreamPayload::Ignored) => trace!("Ignoring event on {}", client_id),
                    Err(e) => {
                        warn!("Ignoring malformed payload on {}: {}", client_id, e);
                        self.event_log.log(StreamLogEvent::new(
                            "payload_rejected",
                            serde_json::json!({
                                "session_id": session_id.as_str(),
                                "client_id": client_id.as_str(),
                                "error": e.to_string(),
                            }),
                        ));
                    }
                },
                ChannelEvent::End => return Ok(()),
                ChannelEvent::Error(message) => return Err(StreamError::Channel(message)),
            }
        }

        debug!("Channel {} closed by the service", client_id);
        Ok(())
    }
}

async fn with_timeout<T>(
    limit: Option<Duration>,
    request: impl Future<Output = Result<T, GatewayError>>,
) -> Result<T, GatewayError> {
    match limit {
        Some(limit) => tokio::time::timeout(limit, request)
            .await
            .map_err(|_elapsed| GatewayError::Timeout)?,
        None => request.await,
    }
}
