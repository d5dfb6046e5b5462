//! Session store
//!
//! Holds the current [`AppState`], applies actions through the pure
//! [`reduce`] function, saves after every transition, and publishes each
//! new state on a `watch` channel.
//!
//! After every transition the store runs one reconciliation step: if
//! sessions exist but none is selected, it dispatches
//! `SetActiveSession(first)`. The rule lives here, not in the reducer, so the
//! reducer stays a plain function of its inputs.

use crate::ports::key_value_storage::KeyValueStorage;
use crate::store::persistence::{PersistenceAdapter, SESSIONS_STORAGE_KEY};
use chrono::Utc;
use distill_domain::{AppState, DomainError, Session, SessionAction, SessionId, reduce};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;
use tracing::{debug, info, trace};

/// Process-wide session state container.
///
/// All mutation goes through [`dispatch`](Self::dispatch); dispatches are
/// serialized by an internal mutex and applied synchronously.
pub struct SessionStore {
    state: Mutex<Arc<AppState>>,
    persistence: PersistenceAdapter,
    changes: watch::Sender<Arc<AppState>>,
}

impl SessionStore {
    /// Load the persisted state once and build the store around it.
    pub fn load(storage: Arc<dyn KeyValueStorage>) -> Self {
        let persistence = PersistenceAdapter::new(storage);
        let initial: AppState = persistence.load(SESSIONS_STORAGE_KEY);
        info!("Loaded {} session(s)", initial.sessions.len());

        let initial = Arc::new(initial);
        let (changes, _) = watch::channel(Arc::clone(&initial));
        let store = Self {
            state: Mutex::new(initial),
            persistence,
            changes,
        };

        let mut current = store.lock();
        store.recover_interrupted_streams(&mut current);
        store.reconcile(&mut current);
        drop(current);
        store
    }

    /// Apply `action`, persist, publish, then reconcile the selection.
    pub fn dispatch(&self, action: SessionAction) {
        let mut current = self.lock();
        self.apply(&mut current, &action);
        self.reconcile(&mut current);
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> Arc<AppState> {
        Arc::clone(&self.lock())
    }

    /// Receiver notified after every transition.
    ///
    /// Do not call back into the store while holding a `borrow()` of the
    /// receiver; clone the `Arc` out first.
    pub fn subscribe(&self) -> watch::Receiver<Arc<AppState>> {
        self.changes.subscribe()
    }

    pub fn active_session(&self) -> Option<Session> {
        self.state().active_session().cloned()
    }

    pub fn session(&self, id: &SessionId) -> Option<Session> {
        self.state().session(id).cloned()
    }

    /// Create a session and return its id. The context must not be blank.
    pub fn create_session(
        &self,
        context: impl Into<String>,
        title: impl Into<String>,
    ) -> Result<SessionId, DomainError> {
        let context = context.into();
        if context.trim().is_empty() {
            return Err(DomainError::EmptyContext);
        }

        let id = SessionId::generate();
        self.dispatch(SessionAction::CreateSession {
            id: id.clone(),
            context,
            title: title.into(),
            created_at: Utc::now(),
        });
        Ok(id)
    }

    pub fn delete_session(&self, id: &SessionId) {
        self.dispatch(SessionAction::delete_session(id.clone()));
    }

    /// Select an existing session.
    pub fn select_session(&self, id: &SessionId) -> Result<(), DomainError> {
        if !self.state().contains(id) {
            return Err(DomainError::SessionNotFound(id.to_string()));
        }
        self.dispatch(SessionAction::set_active_session(Some(id.clone())));
        Ok(())
    }

    pub fn update_draft(&self, id: &SessionId, text: impl Into<String>) {
        self.dispatch(SessionAction::update_draft(id.clone(), text));
    }

    fn lock(&self) -> MutexGuard<'_, Arc<AppState>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn apply(&self, current: &mut Arc<AppState>, action: &SessionAction) {
        let next = reduce(current.as_ref(), action);
        if next == **current {
            trace!("{} left state unchanged", action.name());
            return;
        }

        debug!(
            "Applied {} ({})",
            action.name(),
            action.session_id().map(SessionId::as_str).unwrap_or("-")
        );
        self.persistence.save(SESSIONS_STORAGE_KEY, &next);

        let next = Arc::new(next);
        *current = Arc::clone(&next);
        self.changes.send_replace(next);
    }

    /// No channel survives a restart, so a persisted streaming flag is stale.
    fn recover_interrupted_streams(&self, current: &mut Arc<AppState>) {
        let stale: Vec<SessionId> = current
            .sessions
            .iter()
            .filter(|s| s.is_streaming || s.streaming_start_time.is_some())
            .map(|s| s.id.clone())
            .collect();

        for id in stale {
            info!("Clearing interrupted stream state for session {}", id);
            self.apply(current, &SessionAction::set_streaming_start_time(id.clone(), None));
            self.apply(current, &SessionAction::set_streaming_status(id, false));
        }
    }

    fn reconcile(&self, current: &mut Arc<AppState>) {
        if let Some(first) = current.repair_target().cloned() {
            debug!("No active session, selecting {}", first);
            self.apply(current, &SessionAction::set_active_session(Some(first)));
        }
    }
}
