//! Configuration file loading for distill-chat
//!
//! This module handles file I/O and merging of configuration from multiple sources.
//! The priority order (highest to lowest):
//!
//! 1. `DISTILL_*` environment variables
//! 2. `--config <path>` specified file
//! 3. Project root: `./distill.toml` or `./.distill.toml`
//! 4. XDG config: `$XDG_CONFIG_HOME/distill-chat/config.toml`
//! 5. Default values

mod file_config;
mod loader;

pub use file_config::{
    ConfigValidationError, FileConfig, FileLoggingConfig, FileServerConfig, FileStorageConfig,
};
pub use loader::ConfigLoader;
