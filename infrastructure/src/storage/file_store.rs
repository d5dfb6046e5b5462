//! File-backed [`KeyValueStorage`]: one JSON file per key.
//!
//! Writes go to a temporary sibling first and are renamed into place, so a
//! crash mid-write leaves the previous value intact.

use distill_application::ports::key_value_storage::{KeyValueStorage, StorageError};
use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

pub struct FileKeyValueStore {
    dir: PathBuf,
}

impl FileKeyValueStore {
    /// Open (creating if needed) a store rooted at `dir`.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        debug!("Session storage at {}", dir.display());
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the file backing `key`.
    pub fn path_for(&self, key: &str) -> PathBuf {
        let name: String = key
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.dir.join(format!("{name}.json"))
    }
}

impl KeyValueStorage for FileKeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(raw) => Ok(Some(raw)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.path_for(key);
        let temp_path = path.with_extension("json.tmp");

        let mut file = File::create(&temp_path)?;
        file.write_all(value.as_bytes())?;
        file.sync_all()?;

        fs::rename(&temp_path, &path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use distill_application::{SESSIONS_STORAGE_KEY, SessionStore};
    use std::sync::Arc;
    use tempfile::tempdir;

    #[test]
    fn test_missing_key_is_none() {
        let temp = tempdir().unwrap();
        let store = FileKeyValueStore::open(temp.path()).unwrap();
        assert_eq!(store.get("absent").unwrap(), None);
    }

    #[test]
    fn test_set_then_get() {
        let temp = tempdir().unwrap();
        let store = FileKeyValueStore::open(temp.path().join("nested")).unwrap();

        store.set(SESSIONS_STORAGE_KEY, r#"{"sessions":[]}"#).unwrap();
        store.set(SESSIONS_STORAGE_KEY, r#"{"sessions":[],"x":1}"#).unwrap();

        assert_eq!(
            store.get(SESSIONS_STORAGE_KEY).unwrap().as_deref(),
            Some(r#"{"sessions":[],"x":1}"#)
        );
        assert!(!store.path_for(SESSIONS_STORAGE_KEY).with_extension("json.tmp").exists());
    }

    #[test]
    fn test_key_is_sanitized_into_dir() {
        let temp = tempdir().unwrap();
        let store = FileKeyValueStore::open(temp.path()).unwrap();
        let path = store.path_for("../escape/key");
        assert_eq!(path.parent(), Some(store.dir()));
        assert_eq!(path.file_name().unwrap(), ".._escape_key.json");
    }

    #[test]
    fn test_sessions_survive_restart() {
        let temp = tempdir().unwrap();
        let id = {
            let storage = Arc::new(FileKeyValueStore::open(temp.path()).unwrap());
            let store = SessionStore::load(storage);
            store.create_session("Newton's laws", "Physics").unwrap()
        };

        let storage = Arc::new(FileKeyValueStore::open(temp.path()).unwrap());
        let store = SessionStore::load(storage);
        let session = store.active_session().unwrap();
        assert_eq!(session.id, id);
        assert_eq!(session.context, "Newton's laws");
    }
}
