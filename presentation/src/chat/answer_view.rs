//! Incremental rendering of a streaming answer.

use distill_domain::{MessageId, Session};

/// Tracks how much of one model message has been printed.
///
/// Content only ever grows while streaming, so the unprinted part is
/// always a suffix. A rolled-back message simply stops producing output.
#[derive(Debug, Clone)]
pub struct AnswerView {
    message_id: Option<MessageId>,
    printed: usize,
}

impl AnswerView {
    pub fn new(message_id: Option<MessageId>) -> Self {
        Self {
            message_id,
            printed: 0,
        }
    }

    /// Text appended since the last call, if any.
    pub fn advance<'a>(&mut self, session: Option<&'a Session>) -> Option<&'a str> {
        let id = self.message_id.as_ref()?;
        let message = session?.messages.iter().rev().find(|m| &m.id == id)?;
        let fresh = message.content.get(self.printed..)?;
        if fresh.is_empty() {
            return None;
        }
        self.printed = message.content.len();
        Some(fresh)
    }

    pub fn printed(&self) -> usize {
        self.printed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use distill_domain::{Message, SessionId};

    fn session_with(content: &str) -> Session {
        let mut session = Session::new(SessionId::new("s"), "ctx", "t", Utc::now());
        session.messages.push(Message::user(MessageId::new("u"), "hello"));
        let mut answer = Message::placeholder(MessageId::new("m"));
        answer.content = content.to_string();
        session.messages.push(answer);
        session
    }

    #[test]
    fn test_yields_only_new_suffix() {
        let mut view = AnswerView::new(Some(MessageId::new("m")));

        assert_eq!(view.advance(Some(&session_with(""))), None);
        assert_eq!(view.advance(Some(&session_with("Hi"))), Some("Hi"));
        assert_eq!(view.advance(Some(&session_with("Hi"))), None);
        assert_eq!(view.advance(Some(&session_with("Hi there!"))), Some(" there!"));
        assert_eq!(view.printed(), "Hi there!".len());
    }

    #[test]
    fn test_rolled_back_message_yields_nothing() {
        let mut view = AnswerView::new(Some(MessageId::new("m")));
        let mut session = session_with("partial");
        assert_eq!(view.advance(Some(&session)), Some("partial"));

        session.messages.clear();
        assert_eq!(view.advance(Some(&session)), None);
        assert_eq!(view.advance(None), None);
    }

    #[test]
    fn test_untracked_view_is_silent() {
        let mut view = AnswerView::new(None);
        assert_eq!(view.advance(Some(&session_with("text"))), None);
    }
}
