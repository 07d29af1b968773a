//! Error types for the MCP adapter

use std::time::Duration;
use thiserror::Error;
use toolhost_application::ToolSessionError;

/// Result type alias for MCP operations
pub type Result<T> = std::result::Result<T, McpError>;

/// Errors that can occur when communicating with an MCP server
#[derive(Error, Debug)]
pub enum McpError {
    #[error("Failed to spawn '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("JSON-RPC error (code {code}): {message}")]
    Rpc { code: i64, message: String },

    #[error("Invalid response to '{method}': {message}")]
    InvalidResponse { method: String, message: String },

    #[error("Request '{method}' timed out after {timeout:?}")]
    Timeout { method: String, timeout: Duration },

    #[error("Transport closed")]
    TransportClosed,

    #[error("Session closed")]
    Closed,
}

impl McpError {
    /// Classification used while a session is being opened: every failure
    /// means the backend is not usable.
    pub fn into_connection_error(self) -> ToolSessionError {
        ToolSessionError::Connection(self.to_string())
    }

    /// Classification used for requests on an open session.
    pub fn into_session_error(self) -> ToolSessionError {
        match self {
            McpError::Spawn { .. } | McpError::TransportClosed | McpError::Closed => {
                ToolSessionError::Connection(self.to_string())
            }
            McpError::Io(_)
            | McpError::Serialization(_)
            | McpError::Rpc { .. }
            | McpError::InvalidResponse { .. }
            | McpError::Timeout { .. } => ToolSessionError::Protocol(self.to_string()),
        }
    }
}
