//! The session state reducer.
//!
//! [`reduce`] is total: every action yields a state, and actions that target
//! a session which does not exist yield a state equal to the input. The input
//! is never mutated; callers keep their previous snapshot intact.

use super::action::SessionAction;
use super::entities::{AppState, Message, Session};
use super::value_objects::SessionId;
use chrono::{DateTime, Utc};

/// Compute the state that follows `state` after `action`.
pub fn reduce(state: &AppState, action: &SessionAction) -> AppState {
    match action {
        SessionAction::CreateSession {
            id,
            context,
            title,
            created_at,
        } => {
            let mut next = state.clone();
            next.sessions
                .insert(0, Session::new(id.clone(), context.clone(), title.clone(), *created_at));
            next.active_session_id = Some(id.clone());
            next
        }

        SessionAction::DeleteSession { id } => {
            if !state.contains(id) {
                return state.clone();
            }
            let mut next = state.clone();
            next.sessions.retain(|s| &s.id != id);
            if next.active_session_id.as_ref() == Some(id) {
                next.active_session_id = next.sessions.first().map(|s| s.id.clone());
            }
            next
        }

        SessionAction::SetActiveSession { id } => AppState {
            sessions: state.sessions.clone(),
            active_session_id: id.clone(),
        },

        SessionAction::AddUserMessage {
            session_id,
            message_id,
            content,
        } => update_session(state, session_id, |session| {
            session
                .messages
                .push(Message::user(message_id.clone(), content.clone()));
        }),

        SessionAction::AddModelPlaceholder {
            session_id,
            message_id,
        } => update_session(state, session_id, |session| {
            session.messages.push(Message::placeholder(message_id.clone()));
        }),

        SessionAction::AppendStreamToken {
            session_id,
            token,
            received_at,
        } => {
            let targets_model = state
                .session(session_id)
                .and_then(Session::last_message)
                .is_some_and(Message::is_model);
            if !targets_model {
                return state.clone();
            }
            update_session(state, session_id, |session| {
                append_token(session, token, *received_at);
            })
        }

        SessionAction::SetStreamingStatus {
            session_id,
            is_streaming,
        } => update_session(state, session_id, |session| {
            session.is_streaming = *is_streaming;
        }),

        SessionAction::SetStreamingStartTime { session_id, time } => {
            update_session(state, session_id, |session| {
                session.streaming_start_time = *time;
            })
        }

        SessionAction::RollbackLastExchange { session_id } => {
            let len = state
                .session(session_id)
                .map_or(0, |session| session.messages.len());
            if len < 2 {
                return state.clone();
            }
            update_session(state, session_id, |session| {
                session.messages.truncate(len - 2);
            })
        }

        SessionAction::UpdateDraft { session_id, text } => {
            update_session(state, session_id, |session| {
                session.draft_message.clone_from(text);
            })
        }
    }
}

/// Copy `state`, applying `f` to the session with `id`. Missing ids are identity.
fn update_session(state: &AppState, id: &SessionId, f: impl FnOnce(&mut Session)) -> AppState {
    let mut next = state.clone();
    if let Some(session) = next.sessions.iter_mut().find(|s| &s.id == id) {
        f(session);
    }
    next
}

fn append_token(session: &mut Session, token: &str, received_at: DateTime<Utc>) {
    let start = session.streaming_start_time;
    let Some(message) = session.messages.last_mut() else {
        return;
    };

    let first_content = message.content.is_empty() && !token.is_empty();
    message.content.push_str(token);

    if first_content
        && message.generation_time.is_none()
        && let Some(start) = start
    {
        message.generation_time = Some(elapsed_seconds(start, received_at));
    }
}

fn elapsed_seconds(start: DateTime<Utc>, end: DateTime<Utc>) -> f64 {
    (end - start).num_milliseconds() as f64 / 1000.0
}
