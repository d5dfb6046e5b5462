//! State transitions for the session model.
//!
//! Every value that depends on the clock or on a random source (new ids,
//! creation and arrival timestamps) is captured by the constructor functions
//! below, so [`reduce`](super::reducer::reduce) stays a pure function of its
//! inputs.

use super::value_objects::{MessageId, SessionId};
use chrono::{DateTime, Utc};

/// An action dispatched to the session store.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionAction {
    /// Insert a new session at the head and make it active.
    CreateSession {
        id: SessionId,
        context: String,
        title: String,
        created_at: DateTime<Utc>,
    },
    /// Remove a session.
    DeleteSession { id: SessionId },
    /// Replace the active selection unconditionally.
    SetActiveSession { id: Option<SessionId> },
    AddUserMessage {
        session_id: SessionId,
        message_id: MessageId,
        content: String,
    },
    AddModelPlaceholder {
        session_id: SessionId,
        message_id: MessageId,
    },
    /// Append a token to the trailing model message.
    AppendStreamToken {
        session_id: SessionId,
        token: String,
        received_at: DateTime<Utc>,
    },
    SetStreamingStatus {
        session_id: SessionId,
        is_streaming: bool,
    },
    SetStreamingStartTime {
        session_id: SessionId,
        time: Option<DateTime<Utc>>,
    },
    /// Drop the trailing user message and its model placeholder.
    RollbackLastExchange { session_id: SessionId },
    UpdateDraft { session_id: SessionId, text: String },
}

impl SessionAction {
    pub fn create_session(context: impl Into<String>, title: impl Into<String>) -> Self {
        Self::CreateSession {
            id: SessionId::generate(),
            context: context.into(),
            title: title.into(),
            created_at: Utc::now(),
        }
    }

    pub fn delete_session(id: SessionId) -> Self {
        Self::DeleteSession { id }
    }

    pub fn set_active_session(id: Option<SessionId>) -> Self {
        Self::SetActiveSession { id }
    }

    pub fn add_user_message(session_id: SessionId, content: impl Into<String>) -> Self {
        Self::AddUserMessage {
            session_id,
            message_id: MessageId::generate(),
            content: content.into(),
        }
    }

    pub fn add_model_placeholder(session_id: SessionId) -> Self {
        Self::AddModelPlaceholder {
            session_id,
            message_id: MessageId::generate(),
        }
    }

    pub fn append_stream_token(session_id: SessionId, token: impl Into<String>) -> Self {
        Self::AppendStreamToken {
            session_id,
            token: token.into(),
            received_at: Utc::now(),
        }
    }

    pub fn set_streaming_status(session_id: SessionId, is_streaming: bool) -> Self {
        Self::SetStreamingStatus {
            session_id,
            is_streaming,
        }
    }

    pub fn set_streaming_start_time(session_id: SessionId, time: Option<DateTime<Utc>>) -> Self {
        Self::SetStreamingStartTime { session_id, time }
    }

    pub fn rollback_last_exchange(session_id: SessionId) -> Self {
        Self::RollbackLastExchange { session_id }
    }

    pub fn update_draft(session_id: SessionId, text: impl Into<String>) -> Self {
        Self::UpdateDraft {
            session_id,
            text: text.into(),
        }
    }

    /// Short, stable name used in log lines.
    pub fn name(&self) -> &'static str {
        match self {
            Self::CreateSession { .. } => "create_session",
            Self::DeleteSession { .. } => "delete_session",
            Self::SetActiveSession { .. } => "set_active_session",
            Self::AddUserMessage { .. } => "add_user_message",
            Self::AddModelPlaceholder { .. } => "add_model_placeholder",
            Self::AppendStreamToken { .. } => "append_stream_token",
            Self::SetStreamingStatus { .. } => "set_streaming_status",
            Self::SetStreamingStartTime { .. } => "set_streaming_start_time",
            Self::RollbackLastExchange { .. } => "rollback_last_exchange",
            Self::UpdateDraft { .. } => "update_draft",
        }
    }

    /// The session this action targets, if it targets exactly one.
    pub fn session_id(&self) -> Option<&SessionId> {
        match self {
            Self::CreateSession { id, .. } | Self::DeleteSession { id } => Some(id),
            Self::SetActiveSession { id } => id.as_ref(),
            Self::AddUserMessage { session_id, .. }
            | Self::AddModelPlaceholder { session_id, .. }
            | Self::AppendStreamToken { session_id, .. }
            | Self::SetStreamingStatus { session_id, .. }
            | Self::SetStreamingStartTime { session_id, .. }
            | Self::RollbackLastExchange { session_id }
            | Self::UpdateDraft { session_id, .. } => Some(session_id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructors_stamp_fresh_ids() {
        let a = SessionAction::create_session("ctx", "");
        let b = SessionAction::create_session("ctx", "");
        assert_ne!(a.session_id(), b.session_id());
    }

    #[test]
    fn set_active_none_targets_no_session() {
        assert!(SessionAction::set_active_session(None).session_id().is_none());
        assert_eq!(
            SessionAction::set_active_session(None).name(),
            "set_active_session"
        );
    }
}
