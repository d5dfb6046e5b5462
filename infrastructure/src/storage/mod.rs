//! Durable key-value storage for persisted session state.

mod file_store;

pub use file_store::FileKeyValueStore;
