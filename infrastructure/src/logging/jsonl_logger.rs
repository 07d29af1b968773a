//! JSONL file writer for conversation events.
//!
//! Every [`ConversationEvent`] becomes one JSON line carrying `type`,
//! `timestamp` and a per-process `seq` number next to the payload fields.
//! The file is opened in append mode so successive runs of the same
//! conversation share one log.

use serde_json::{Map, Value};
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use toolhost_application::{ConversationEvent, ConversationLogger};
use tracing::warn;

/// Appends conversation events to a JSONL file.
pub struct JsonlConversationLogger {
    writer: Mutex<BufWriter<File>>,
    path: PathBuf,
    seq: AtomicU64,
}

impl JsonlConversationLogger {
    /// Open (or create) the log file, creating parent directories.
    ///
    /// Returns `None` when the file cannot be opened; conversation logging
    /// is then skipped.
    pub fn open(path: impl AsRef<Path>) -> Option<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && let Err(e) = std::fs::create_dir_all(parent)
        {
            warn!("Could not create conversation log directory {}: {}", parent.display(), e);
            return None;
        }

        let file = match OpenOptions::new().create(true).append(true).open(path) {
            Ok(f) => f,
            Err(e) => {
                warn!("Could not open conversation log {}: {}", path.display(), e);
                return None;
            }
        };

        Some(Self {
            writer: Mutex::new(BufWriter::new(file)),
            path: path.to_path_buf(),
            seq: AtomicU64::new(0),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn record(&self, event: ConversationEvent) -> Value {
        let mut record = match event.payload {
            Value::Object(map) => map,
            Value::Null => Map::new(),
            other => {
                let mut map = Map::new();
                map.insert("data".to_string(), other);
                map
            }
        };
        record.insert("type".to_string(), Value::from(event.event_type));
        record.insert(
            "timestamp".to_string(),
            Value::from(chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)),
        );
        record.insert(
            "seq".to_string(),
            Value::from(self.seq.fetch_add(1, Ordering::Relaxed)),
        );
        Value::Object(record)
    }
}

impl ConversationLogger for JsonlConversationLogger {
    fn log(&self, event: ConversationEvent) {
        let Ok(line) = serde_json::to_string(&self.record(event)) else {
            return;
        };

        if let Ok(mut writer) = self.writer.lock() {
            let _ = writeln!(writer, "{}", line);
            // One flush per event: a crashed host keeps every line it logged
            let _ = writer.flush();
        }
    }
}
