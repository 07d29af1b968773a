//! Transcript store port

use async_trait::async_trait;
use thiserror::Error;
use toolhost_domain::Message;

/// Errors raised by transcript storage
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Invalid conversation name '{0}'")]
    InvalidName(String),

    #[error("I/O error for conversation '{name}': {source}")]
    Io {
        name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Stored transcript '{name}' is corrupt: {message}")]
    Corrupt { name: String, message: String },
}

/// Durable storage of conversation transcripts, keyed by name
#[async_trait]
pub trait TranscriptStore: Send + Sync {
    /// Load the messages of a conversation. A conversation that was never
    /// persisted loads as an empty list.
    async fn load(&self, name: &str) -> Result<Vec<Message>, StoreError>;

    /// Replace the stored messages atomically: readers observe either the
    /// previous or the new list, never a partial write.
    async fn persist(&self, name: &str, messages: &[Message]) -> Result<(), StoreError>;
}
