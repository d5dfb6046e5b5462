//! Session domain entities

use super::value_objects::{MessageId, SessionId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Role of a message in a conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Model,
}

/// A message in a conversation (Entity)
///
/// `generation_time` is the number of seconds between the start of the
/// streaming turn and the first content received for this message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: MessageId,
    pub role: Role,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generation_time: Option<f64>,
}

impl Message {
    pub fn user(id: MessageId, content: impl Into<String>) -> Self {
        Self {
            id,
            role: Role::User,
            content: content.into(),
            generation_time: None,
        }
    }

    /// An empty model message, filled while the session streams.
    pub fn placeholder(id: MessageId) -> Self {
        Self {
            id,
            role: Role::Model,
            content: String::new(),
            generation_time: None,
        }
    }

    pub fn is_model(&self) -> bool {
        self.role == Role::Model
    }
}

/// A conversation thread (Entity)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: SessionId,
    pub title: String,
    /// Background text supplied at creation; never changes afterwards.
    pub context: String,
    #[serde(default)]
    pub messages: Vec<Message>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub is_streaming: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub streaming_start_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub draft_message: String,
}

impl Session {
    pub fn new(
        id: SessionId,
        context: impl Into<String>,
        title: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        let title = title.into();
        let title = if title.trim().is_empty() {
            default_title(created_at)
        } else {
            title
        };

        Self {
            id,
            title,
            context: context.into(),
            messages: Vec::new(),
            created_at,
            is_streaming: false,
            streaming_start_time: None,
            draft_message: String::new(),
        }
    }

    pub fn last_message(&self) -> Option<&Message> {
        self.messages.last()
    }
}

/// Label used when a session is created without a title.
pub fn default_title(created_at: DateTime<Utc>) -> String {
    format!("Chat {}", created_at.format("%Y-%m-%d %H:%M:%S"))
}

/// The whole client state: every session plus the active selection.
///
/// `sessions` is ordered most-recently-created first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppState {
    #[serde(default)]
    pub sessions: Vec<Session>,
    #[serde(default)]
    pub active_session_id: Option<SessionId>,
}

impl AppState {
    pub fn session(&self, id: &SessionId) -> Option<&Session> {
        self.sessions.iter().find(|s| &s.id == id)
    }

    pub fn contains(&self, id: &SessionId) -> bool {
        self.session(id).is_some()
    }

    pub fn active_session(&self) -> Option<&Session> {
        self.active_session_id
            .as_ref()
            .and_then(|id| self.session(id))
    }

    /// The selection the store should repair to, if any.
    ///
    /// Returns the head session when nothing is selected (or the selection
    /// points at a session that no longer exists) while sessions exist.
    pub fn repair_target(&self) -> Option<&SessionId> {
        if self.active_session().is_some() {
            return None;
        }
        self.sessions.first().map(|s| &s.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    #[test]
    fn blank_title_falls_back_to_timestamp_label() {
        let session = Session::new(SessionId::new("s1"), "ctx", "  ", at(0));
        assert_eq!(session.title, "Chat 1970-01-01 00:00:00");
    }

    #[test]
    fn explicit_title_is_kept() {
        let session = Session::new(SessionId::new("s1"), "ctx", "Physics", at(0));
        assert_eq!(session.title, "Physics");
    }

    #[test]
    fn state_serializes_with_camel_case_keys() {
        let mut state = AppState::default();
        state
            .sessions
            .push(Session::new(SessionId::new("s1"), "ctx", "t", at(0)));
        state.active_session_id = Some(SessionId::new("s1"));

        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json["activeSessionId"], "s1");
        assert_eq!(json["sessions"][0]["isStreaming"], false);
        assert_eq!(json["sessions"][0]["draftMessage"], "");
        assert!(json["sessions"][0].get("streamingStartTime").is_none());
    }

    #[test]
    fn default_state_round_trips_from_literal() {
        let state: AppState =
            serde_json::from_str(r#"{"sessions":[],"activeSessionId":null}"#).unwrap();
        assert_eq!(state, AppState::default());
    }

    #[test]
    fn repair_target_points_at_head_when_unselected() {
        let mut state = AppState::default();
        assert!(state.repair_target().is_none());

        state
            .sessions
            .push(Session::new(SessionId::new("a"), "ctx", "", at(0)));
        assert_eq!(state.repair_target(), Some(&SessionId::new("a")));

        state.active_session_id = Some(SessionId::new("a"));
        assert!(state.repair_target().is_none());

        state.active_session_id = Some(SessionId::new("gone"));
        assert_eq!(state.repair_target(), Some(&SessionId::new("a")));
    }

    #[test]
    fn roles_serialize_lowercase() {
        let message = Message::placeholder(MessageId::new("m"));
        let json = serde_json::to_value(&message).unwrap();
        assert_eq!(json["role"], "model");
        assert!(json.get("generationTime").is_none());
    }
}
