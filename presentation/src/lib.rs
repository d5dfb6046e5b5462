//! Presentation layer for distill-chat
//!
//! This crate contains CLI definitions, output formatters,
//! and the interactive chat interface.

pub mod chat;
pub mod cli;
pub mod output;

// Re-export commonly used types
pub use chat::{AnswerView, ChatRepl};
pub use cli::commands::Cli;
pub use output::console::ConsoleFormatter;
