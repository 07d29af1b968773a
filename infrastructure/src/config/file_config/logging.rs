//! Logging configuration from TOML (`[logging]` section)

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileLoggingConfig {
    /// JSONL file receiving conversation events (disabled when unset)
    pub conversation_log: Option<String>,
    /// Directory for daily rolling diagnostic logs (disabled when unset)
    pub log_dir: Option<String>,
}

impl FileLoggingConfig {
    pub fn conversation_log_path(&self) -> Option<PathBuf> {
        self.conversation_log.as_deref().map(super::expand_home)
    }

    pub fn log_dir_path(&self) -> Option<PathBuf> {
        self.log_dir.as_deref().map(super::expand_home)
    }
}
