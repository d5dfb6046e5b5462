//! CLI command definitions

use clap::Parser;
use std::path::PathBuf;

/// CLI arguments for distill-chat
#[derive(Parser, Debug)]
#[command(name = "distill-chat")]
#[command(author, version, about = "Streaming chat client for a text-generation service")]
#[command(long_about = r#"
distill-chat keeps context-scoped chat sessions and streams model answers
token by token from a remote text-generation service.

Each session carries a background context sent with every prompt. Sessions
are saved locally and restored on the next start.

Configuration files are loaded from (in priority order):
1. DISTILL_* environment variables (e.g. DISTILL_SERVER__BASE_URL)
2. --config <path>     Explicit config file
3. ./distill.toml      Project-level config
4. ~/.config/distill-chat/config.toml   Global config

Example:
  distill-chat --context "Newtonian mechanics" "What is inertia?"
  distill-chat --context "Rust ownership" --title "Borrowing"
  distill-chat
"#)]
pub struct Cli {
    /// Prompt to answer in the active session (starts the REPL when omitted)
    pub prompt: Option<String>,

    /// Start a new session with this background context
    #[arg(short, long, value_name = "TEXT")]
    pub context: Option<String>,

    /// Title for the new session (defaults to a timestamp)
    #[arg(short, long, value_name = "TEXT", requires = "context")]
    pub title: Option<String>,

    /// List saved sessions and exit
    #[arg(short, long)]
    pub list: bool,

    /// Query the service health endpoint and exit
    #[arg(long)]
    pub check: bool,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Disable loading of configuration files
    #[arg(long)]
    pub no_config: bool,

    /// Show configuration sources and the merged configuration, then exit
    #[arg(long)]
    pub show_config: bool,
}
