//! REPL (Read-Eval-Print Loop) for interactive chat

use super::answer_view::AnswerView;
use crate::ConsoleFormatter;
use distill_application::{InferenceGateway, SessionStore, StopOptions, StreamController};
use distill_domain::{DomainError, SessionId};
use std::collections::VecDeque;
use std::io::{self, Write};
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines};
use tracing::debug;

/// Lines typed while an answer is streaming.
///
/// `/stop` is acted on immediately; anything else waits until the answer
/// has finished.
struct TypeAhead<'a, R> {
    lines: &'a mut Lines<R>,
    queued: &'a mut VecDeque<String>,
    open: bool,
}

enum Wake {
    StateChanged,
    StoreClosed,
    Interrupted,
    Typed(Option<String>),
}

/// Interactive chat REPL
pub struct ChatRepl<G: InferenceGateway + 'static> {
    controller: Arc<StreamController<G>>,
}

impl<G: InferenceGateway + 'static> ChatRepl<G> {
    /// Create a new ChatRepl
    pub fn new(controller: Arc<StreamController<G>>) -> Self {
        Self { controller }
    }

    fn store(&self) -> &Arc<SessionStore> {
        self.controller.store()
    }

    /// Run the interactive REPL on stdin
    pub async fn run(&self) -> io::Result<()> {
        let stdin = BufReader::new(tokio::io::stdin());
        self.run_with_input(stdin.lines()).await
    }

    /// Run the REPL over any line source.
    pub async fn run_with_input<R: AsyncBufRead + Unpin>(
        &self,
        mut lines: Lines<R>,
    ) -> io::Result<()> {
        self.print_welcome();
        let mut queued = VecDeque::new();

        loop {
            let line = match queued.pop_front() {
                Some(line) => line,
                None => {
                    print!(">>> ");
                    io::stdout().flush()?;
                    tokio::select! {
                        line = lines.next_line() => match line? {
                            Some(line) => line,
                            None => {
                                println!("Bye!");
                                break;
                            }
                        },
                        _ = tokio::signal::ctrl_c() => {
                            println!("^C (type /quit to exit)");
                            continue;
                        }
                    }
                }
            };

            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            if line.starts_with('/') {
                if self.handle_command(line) {
                    break;
                }
                continue;
            }

            let Some(session) = self.store().active_session() else {
                println!("No active session. Start one with /new <context>.");
                continue;
            };

            let type_ahead = TypeAhead {
                lines: &mut lines,
                queued: &mut queued,
                open: true,
            };
            if let Err(e) = self.stream_answer(&session.id, line, Some(type_ahead)).await {
                eprintln!("{}", ConsoleFormatter::format_error(&e.to_string()));
            }
        }

        Ok(())
    }

    /// Stream one answer to stdout (one-shot mode). Ctrl-C stops it.
    pub async fn ask(&self, session_id: &SessionId, prompt: &str) -> Result<(), DomainError> {
        self.stream_answer::<tokio::io::Empty>(session_id, prompt, None)
            .await
    }

    async fn stream_answer<R: AsyncBufRead + Unpin>(
        &self,
        session_id: &SessionId,
        prompt: &str,
        mut input: Option<TypeAhead<'_, R>>,
    ) -> Result<(), DomainError> {
        let session = self
            .store()
            .session(session_id)
            .ok_or_else(|| DomainError::SessionNotFound(session_id.to_string()))?;

        let mut changes = self.store().subscribe();
        self.controller
            .start_stream(session_id, prompt, session.context.as_str())?;

        let placeholder = self
            .store()
            .session(session_id)
            .and_then(|s| s.last_message().map(|m| m.id.clone()));
        let mut view = AnswerView::new(placeholder.clone());
        let mut stopped = false;

        loop {
            let done = !self.controller.is_streaming(session_id);
            let state = Arc::clone(&changes.borrow_and_update());
            if let Some(fresh) = view.advance(state.session(session_id)) {
                print!("{fresh}");
                let _ = io::stdout().flush();
            }
            if done {
                break;
            }

            let wake = tokio::select! {
                changed = changes.changed() => {
                    if changed.is_ok() { Wake::StateChanged } else { Wake::StoreClosed }
                }
                _ = tokio::signal::ctrl_c() => Wake::Interrupted,
                line = next_typed_line(&mut input) => Wake::Typed(line),
            };

            match wake {
                Wake::StateChanged => {}
                Wake::StoreClosed => break,
                Wake::Interrupted => {
                    stopped |= self.controller.stop_stream(session_id, StopOptions::manual());
                }
                Wake::Typed(None) => {
                    if let Some(type_ahead) = input.as_mut() {
                        type_ahead.open = false;
                    }
                }
                Wake::Typed(Some(line)) if line.trim() == "/stop" => {
                    stopped |= self.controller.stop_stream(session_id, StopOptions::manual());
                }
                Wake::Typed(Some(line)) => {
                    debug!("Queued input typed during streaming");
                    if let Some(type_ahead) = input.as_mut() {
                        type_ahead.queued.push_back(line);
                    }
                }
            }
        }

        if view.printed() > 0 {
            println!();
        }
        if stopped {
            println!("{}", ConsoleFormatter::format_stopped());
        } else {
            let session = self.store().session(session_id);
            let answer = session
                .as_ref()
                .and_then(|s| s.messages.iter().find(|m| Some(&m.id) == placeholder.as_ref()));
            let footer = ConsoleFormatter::format_answer_footer(answer);
            if !footer.is_empty() {
                println!("{footer}");
            }
        }
        println!();
        Ok(())
    }

    fn print_welcome(&self) {
        println!();
        println!("╭─────────────────────────────────────────────╮");
        println!("│           distill-chat - Chat Mode          │");
        println!("╰─────────────────────────────────────────────╯");
        println!();
        match self.store().active_session() {
            Some(session) => print!("{}", ConsoleFormatter::format_session_header(&session)),
            None => println!("No sessions yet. Start one with /new <context>."),
        }
        println!();
        println!("Type /help for commands.");
        println!();
    }

    fn print_help(&self) {
        println!();
        println!("Commands:");
        println!("  /new <context>   - Start a session with this background context");
        println!("  /list            - List sessions");
        println!("  /switch <n>      - Switch to session number n");
        println!("  /delete          - Delete the active session");
        println!("  /stop            - Stop the answer being streamed");
        println!("  /help, /h, /?    - Show this help");
        println!("  /quit, /exit, /q - Exit chat");
        println!();
        println!("Anything else is sent as a prompt to the active session.");
        println!();
    }

    fn show_session(&self, id: &SessionId) {
        let Some(session) = self.store().session(id) else {
            return;
        };
        println!();
        print!("{}", ConsoleFormatter::format_session_header(&session));
        for message in &session.messages {
            println!("{}", ConsoleFormatter::format_message(message));
        }
        println!();
    }

    /// Handle slash commands. Returns true if should exit.
    fn handle_command(&self, cmd: &str) -> bool {
        let (name, arg) = cmd
            .split_once(char::is_whitespace)
            .map(|(name, arg)| (name, arg.trim()))
            .unwrap_or((cmd, ""));

        match name {
            "/quit" | "/exit" | "/q" => {
                println!("Bye!");
                return true;
            }
            "/help" | "/h" | "/?" => self.print_help(),
            "/new" => match self.store().create_session(arg, "") {
                Ok(id) => self.show_session(&id),
                Err(DomainError::EmptyContext) => println!("Usage: /new <context>"),
                Err(e) => eprintln!("{}", ConsoleFormatter::format_error(&e.to_string())),
            },
            "/list" => print!(
                "{}",
                ConsoleFormatter::format_session_list(&self.store().state())
            ),
            "/switch" => self.switch(arg),
            "/delete" => match self.store().active_session() {
                Some(session) => {
                    self.store().delete_session(&session.id);
                    println!("Deleted {}", session.title);
                    if let Some(next) = self.store().active_session() {
                        self.show_session(&next.id);
                    }
                }
                None => println!("No active session."),
            },
            "/stop" => {
                let stopped = self
                    .store()
                    .active_session()
                    .is_some_and(|s| self.controller.stop_stream(&s.id, StopOptions::manual()));
                if !stopped {
                    println!("Nothing is streaming.");
                }
            }
            _ => {
                println!("Unknown command: {}", cmd);
                println!("Type /help for available commands");
            }
        }
        false
    }

    fn switch(&self, arg: &str) {
        let state = self.store().state();
        let target = arg
            .parse::<usize>()
            .ok()
            .and_then(|n| n.checked_sub(1))
            .and_then(|index| state.sessions.get(index));

        let Some(session) = target else {
            println!("Usage: /switch <n> (1-{})", state.sessions.len());
            return;
        };

        match self.store().select_session(&session.id) {
            Ok(()) => self.show_session(&session.id),
            Err(e) => eprintln!("{}", ConsoleFormatter::format_error(&e.to_string())),
        }
    }
}

async fn next_typed_line<R: AsyncBufRead + Unpin>(
    input: &mut Option<TypeAhead<'_, R>>,
) -> Option<String> {
    match input {
        Some(type_ahead) if type_ahead.open => type_ahead.lines.next_line().await.ok().flatten(),
        _ => std::future::pending().await,
    }
}
