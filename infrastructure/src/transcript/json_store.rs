//! One JSON document per conversation.
//!
//! Layout: `{dir}/{name}.json`, a pretty-printed array of messages. Writes go
//! to `{name}.json.tmp` first, are synced to disk and are renamed into place.

use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use toolhost_application::{StoreError, TranscriptStore};
use toolhost_domain::Message;
use tracing::debug;

/// Transcript store keeping each conversation in its own JSON file.
#[derive(Debug, Clone)]
pub struct JsonTranscriptStore {
    dir: PathBuf,
}

impl JsonTranscriptStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the file holding `name`.
    pub fn path_for(&self, name: &str) -> Result<PathBuf, StoreError> {
        validate_name(name)?;
        Ok(self.dir.join(format!("{}.json", name)))
    }
}

fn validate_name(name: &str) -> Result<(), StoreError> {
    let bad = name.trim().is_empty()
        || name.contains('/')
        || name.contains('\\')
        || name.contains("..")
        || name.contains('\0');
    if bad {
        return Err(StoreError::InvalidName(name.to_string()));
    }
    Ok(())
}

fn io_error(name: &str, source: std::io::Error) -> StoreError {
    StoreError::Io {
        name: name.to_string(),
        source,
    }
}

#[async_trait]
impl TranscriptStore for JsonTranscriptStore {
    async fn load(&self, name: &str) -> Result<Vec<Message>, StoreError> {
        let path = self.path_for(name)?;
        let raw = match tokio::fs::read_to_string(&path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(conversation = name, "No stored transcript, starting empty");
                return Ok(Vec::new());
            }
            Err(e) => return Err(io_error(name, e)),
        };

        if raw.trim().is_empty() {
            return Ok(Vec::new());
        }

        serde_json::from_str(&raw).map_err(|e| StoreError::Corrupt {
            name: name.to_string(),
            message: e.to_string(),
        })
    }

    async fn persist(&self, name: &str, messages: &[Message]) -> Result<(), StoreError> {
        let path = self.path_for(name)?;
        let json = serde_json::to_string_pretty(messages).map_err(|e| StoreError::Corrupt {
            name: name.to_string(),
            message: e.to_string(),
        })?;

        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| io_error(name, e))?;

        let tmp_path = path.with_extension("json.tmp");
        if let Err(e) = write_synced(&tmp_path, json.as_bytes()).await {
            let _ = tokio::fs::remove_file(&tmp_path).await;
            return Err(io_error(name, e));
        }

        if let Err(e) = tokio::fs::rename(&tmp_path, &path).await {
            let _ = tokio::fs::remove_file(&tmp_path).await;
            return Err(io_error(name, e));
        }

        debug!(
            conversation = name,
            messages = messages.len(),
            path = %path.display(),
            "Transcript persisted"
        );
        Ok(())
    }
}

/// Write `bytes` and flush them to disk before returning.
async fn write_synced(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut file = tokio::fs::File::create(path).await?;
    file.write_all(bytes).await?;
    file.sync_all().await
}
