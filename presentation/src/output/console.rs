//! Console output formatting for sessions and answers

use colored::Colorize;
use distill_domain::util::preview;
use distill_domain::{AppState, Message, Role, Session};

/// Formats sessions and messages for console display
pub struct ConsoleFormatter;

impl ConsoleFormatter {
    /// Numbered session list; `*` marks the active session.
    ///
    /// Numbers are 1-based and match `/switch <n>`.
    pub fn format_session_list(state: &AppState) -> String {
        if state.sessions.is_empty() {
            return format!("{}\n", "No sessions yet. Start one with /new <context>.".dimmed());
        }

        let mut output = String::new();
        for (index, session) in state.sessions.iter().enumerate() {
            let active = state.active_session_id.as_ref() == Some(&session.id);
            let marker = if active { "*" } else { " " };
            output.push_str(&format!(
                "{} {:>2}. {}  {}\n",
                marker.green().bold(),
                index + 1,
                Self::session_line(session),
                format!("({} messages)", session.messages.len()).dimmed()
            ));
        }
        output
    }

    fn session_line(session: &Session) -> String {
        format!(
            "{} {}",
            session.title.bold(),
            format!("- {}", preview(&session.context, 40)).dimmed()
        )
    }

    /// Header printed when a session becomes active.
    pub fn format_session_header(session: &Session) -> String {
        format!(
            "{} {}\n{} {}\n",
            "Session:".cyan().bold(),
            session.title,
            "Context:".cyan().bold(),
            preview(&session.context, 72)
        )
    }

    /// A stored message, as replayed when switching sessions.
    pub fn format_message(message: &Message) -> String {
        match message.role {
            Role::User => format!("{} {}", ">>>".blue().bold(), message.content),
            Role::Model if message.content.is_empty() => format!("{}", "(no answer)".dimmed()),
            Role::Model => message.content.clone(),
        }
    }

    /// Footer printed after an answer finishes streaming.
    pub fn format_answer_footer(message: Option<&Message>) -> String {
        match message.and_then(|m| m.generation_time) {
            Some(seconds) => format!("{}", format!("first token after {seconds:.2}s").dimmed()),
            None => String::new(),
        }
    }

    pub fn format_stopped() -> String {
        format!("{}", "[stopped]".yellow())
    }

    pub fn format_error(message: &str) -> String {
        format!("{} {}", "Error:".red().bold(), message)
    }
}
