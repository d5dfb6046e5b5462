//! Persistence adapter
//!
//! Wraps a [`KeyValueStorage`] with JSON (de)serialization. Failures never
//! reach the caller: a load that cannot produce a value yields the type's
//! default, and a save that fails is logged and dropped, leaving the
//! in-memory state authoritative.

use crate::ports::key_value_storage::KeyValueStorage;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tracing::{debug, warn};

/// Fixed key under which the whole application state is stored.
pub const SESSIONS_STORAGE_KEY: &str = "distill-chat.sessions";

/// JSON persistence over a key/value store.
#[derive(Clone)]
pub struct PersistenceAdapter {
    storage: Arc<dyn KeyValueStorage>,
}

impl PersistenceAdapter {
    pub fn new(storage: Arc<dyn KeyValueStorage>) -> Self {
        Self { storage }
    }

    /// Load the value under `key`, or `T::default()` if it is absent,
    /// unreadable or malformed.
    pub fn load<T>(&self, key: &str) -> T
    where
        T: DeserializeOwned + Default,
    {
        let raw = match self.storage.get(key) {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                debug!("No stored value for {}, using default", key);
                return T::default();
            }
            Err(e) => {
                warn!("Could not read {} from storage, using default: {}", key, e);
                return T::default();
            }
        };

        match serde_json::from_str(&raw) {
            Ok(value) => value,
            Err(e) => {
                warn!("Discarding malformed stored value for {}: {}", key, e);
                T::default()
            }
        }
    }

    /// Serialize `value` and store it under `key`. Errors are logged only.
    pub fn save<T>(&self, key: &str, value: &T)
    where
        T: Serialize,
    {
        let raw = match serde_json::to_string(value) {
            Ok(raw) => raw,
            Err(e) => {
                warn!("Could not serialize {}: {}", key, e);
                return;
            }
        };

        if let Err(e) = self.storage.set(key, &raw) {
            warn!("Could not persist {}: {}", key, e);
        }
    }
}
