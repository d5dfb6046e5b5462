//! Infrastructure layer for distill-chat
//!
//! This crate contains adapters that implement the ports defined
//! in the application layer, including configuration file loading.

pub mod config;
pub mod logging;
pub mod remote;
pub mod storage;

// Re-export commonly used types
pub use config::{
    ConfigLoader, ConfigValidationError, FileConfig, FileLoggingConfig, FileServerConfig,
    FileStorageConfig,
};
pub use logging::JsonlStreamEventLog;
pub use remote::{
    error::{RemoteError, Result},
    gateway::{HttpInferenceGateway, ServiceEndpoints},
};
pub use storage::FileKeyValueStore;
