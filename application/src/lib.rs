//! Application layer for distill-chat
//!
//! This crate contains the session store, the stream controller, port
//! definitions, and application configuration.
//! It depends only on the domain layer.

pub mod config;
pub mod ports;
pub mod store;
pub mod use_cases;

// Re-export commonly used types
pub use config::StreamConfig;
pub use ports::{
    inference_gateway::{
        ChannelEvent, GatewayError, GenerationJob, HealthStatus, InferenceGateway, PushChannel,
    },
    key_value_storage::{KeyValueStorage, MemoryStorage, StorageError},
    stream_event_log::{NoStreamEventLog, StopReason, StreamEventLog, StreamLogEvent},
};
pub use store::persistence::{PersistenceAdapter, SESSIONS_STORAGE_KEY};
pub use store::session_store::SessionStore;
pub use use_cases::stream_controller::{StopOptions, StreamController, StreamError};
