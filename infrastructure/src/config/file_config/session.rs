//! Tool session timeouts (`[session]` section)

use crate::mcp::SessionOptions;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileSessionConfig {
    /// Limit for spawning a backend and completing the handshake
    pub startup_timeout_secs: u64,
    /// Limit for each request to a backend
    pub request_timeout_secs: u64,
    /// Time a backend gets to exit after its input is closed
    pub shutdown_grace_ms: u64,
}

impl Default for FileSessionConfig {
    fn default() -> Self {
        Self {
            startup_timeout_secs: 30,
            request_timeout_secs: 180,
            shutdown_grace_ms: 2000,
        }
    }
}

impl FileSessionConfig {
    pub fn to_session_options(&self) -> SessionOptions {
        SessionOptions {
            startup_timeout: Duration::from_secs(self.startup_timeout_secs),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            shutdown_grace: Duration::from_millis(self.shutdown_grace_ms),
            ..SessionOptions::default()
        }
    }
}
