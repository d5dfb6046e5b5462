//! Process-wide state container.
//!
//! - [`persistence::PersistenceAdapter`]: tolerant load/save over a [`KeyValueStorage`](crate::ports::key_value_storage::KeyValueStorage)
//! - [`session_store::SessionStore`]: current state, dispatch, and change notification

pub mod persistence;
pub mod session_store;
