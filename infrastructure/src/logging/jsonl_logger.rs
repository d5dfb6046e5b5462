//! JSONL file writer for stream lifecycle events.
//!
//! Each [`StreamLogEvent`] is serialized as a single JSON line with a
//! `type` field and `timestamp`, appended to the file via a buffered writer.

use distill_application::ports::stream_event_log::{StreamEventLog, StreamLogEvent};
use serde_json::Value;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::warn;

/// JSONL stream event log that appends one JSON object per line.
///
/// Thread-safe via `Mutex<BufWriter<File>>`. Flushes on `Drop`.
pub struct JsonlStreamEventLog {
    writer: Mutex<BufWriter<File>>,
    path: PathBuf,
}

impl JsonlStreamEventLog {
    /// Open the log at the given path, appending to an existing file.
    ///
    /// Creates the file (and parent directories) if they don't exist.
    /// Returns `None` if the file cannot be opened.
    pub fn new(path: impl AsRef<Path>) -> Option<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent()
            && let Err(e) = std::fs::create_dir_all(parent)
        {
            warn!(
                "Could not create stream event log directory {}: {}",
                parent.display(),
                e
            );
            return None;
        }

        let file = match OpenOptions::new().create(true).append(true).open(path) {
            Ok(f) => f,
            Err(e) => {
                warn!(
                    "Could not open stream event log {}: {}",
                    path.display(),
                    e
                );
                return None;
            }
        };

        Some(Self {
            writer: Mutex::new(BufWriter::new(file)),
            path: path.to_path_buf(),
        })
    }

    /// Get the path to the log file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn to_record(event: StreamLogEvent, timestamp: String) -> Value {
    match event.payload {
        Value::Object(mut map) => {
            map.insert(
                "type".to_string(),
                Value::String(event.event_type.to_string()),
            );
            map.insert("timestamp".to_string(), Value::String(timestamp));
            Value::Object(map)
        }
        other => serde_json::json!({
            "type": event.event_type,
            "timestamp": timestamp,
            "data": other,
        }),
    }
}

impl StreamEventLog for JsonlStreamEventLog {
    fn log(&self, event: StreamLogEvent) {
        let timestamp = chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true);

        let Ok(line) = serde_json::to_string(&to_record(event, timestamp)) else {
            return;
        };

        if let Ok(mut writer) = self.writer.lock() {
            let _ = writeln!(writer, "{}", line);
            // Stream stops are rare; flush each record so a crash loses nothing
            let _ = writer.flush();
        }
    }
}

impl Drop for JsonlStreamEventLog {
    fn drop(&mut self) {
        if let Ok(mut writer) = self.writer.lock() {
            let _ = writer.flush();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read_lines(path: &Path) -> Vec<Value> {
        std::fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    #[test]
    fn test_writes_one_record_per_event() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs").join("stream.events.jsonl");
        let log = JsonlStreamEventLog::new(&path).unwrap();
        assert_eq!(log.path(), path);

        log.log(StreamLogEvent::new(
            "stream_started",
            serde_json::json!({"session_id": "s1", "client_id": "c1"}),
        ));
        log.log(StreamLogEvent::new(
            "stream_stopped",
            serde_json::json!({"session_id": "s1", "client_id": "c1", "reason": "completed"}),
        ));
        drop(log);

        let records = read_lines(&path);
        assert_eq!(records.len(), 2);
        for record in &records {
            assert!(record.get("timestamp").is_some());
        }
        assert_eq!(records[0]["type"], "stream_started");
        assert_eq!(records[0]["client_id"], "c1");
        assert_eq!(records[1]["type"], "stream_stopped");
        assert_eq!(records[1]["reason"], "completed");
    }

    #[test]
    fn test_appends_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stream.events.jsonl");

        for reason in ["manual", "replaced"] {
            let log = JsonlStreamEventLog::new(&path).unwrap();
            log.log(StreamLogEvent::new(
                "stream_stopped",
                serde_json::json!({"reason": reason}),
            ));
        }

        let records = read_lines(&path);
        assert_eq!(records.len(), 2);
        assert_eq!(records[1]["reason"], "replaced");
    }

    #[test]
    fn test_non_object_payload_is_wrapped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wrapped.jsonl");
        let log = JsonlStreamEventLog::new(&path).unwrap();

        log.log(StreamLogEvent::new(
            "payload_rejected",
            serde_json::json!("{oops"),
        ));
        drop(log);

        let records = read_lines(&path);
        assert_eq!(records[0]["type"], "payload_rejected");
        assert_eq!(records[0]["data"], "{oops");
    }

    #[test]
    fn test_directory_path_returns_none() {
        let dir = tempfile::tempdir().unwrap();
        assert!(JsonlStreamEventLog::new(dir.path()).is_none());
    }
}
