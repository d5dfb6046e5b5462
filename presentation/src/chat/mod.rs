//! Interactive chat module
//!
//! Provides a line-based interactive chat interface with token-by-token
//! answer rendering.

mod answer_view;
mod repl;

pub use answer_view::AnswerView;
pub use repl::ChatRepl;
