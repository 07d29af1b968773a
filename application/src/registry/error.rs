//! Session registry errors

use crate::ports::tool_session::ToolSessionError;
use thiserror::Error;
use toolhost_domain::{CatalogError, ToolCallResult};

/// Errors raised while opening or closing the registry
#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("Failed to start backend '{backend}': {source}")]
    Startup {
        backend: String,
        #[source]
        source: ToolSessionError,
    },

    #[error("Failed to list tools of backend '{backend}': {source}")]
    Catalog {
        backend: String,
        #[source]
        source: ToolSessionError,
    },

    #[error("Tool '{tool}' is registered by both '{first}' and '{second}'")]
    DuplicateTool {
        tool: String,
        first: String,
        second: String,
    },

    #[error("{} backend(s) failed to close: {}", .0.len(), format_failures(.0))]
    Shutdown(Vec<(String, ToolSessionError)>),
}

fn format_failures(failures: &[(String, ToolSessionError)]) -> String {
    failures
        .iter()
        .map(|(backend, error)| format!("{}: {}", backend, error))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Errors raised when dispatching a tool call
///
/// | Variant | Recoverable? |
/// |---------|--------------|
/// | `UnknownTool` | Yes, the model picked a name nobody registered |
/// | `InvalidArguments` | Yes, the model can resend |
/// | `ToolExecution` | Yes, the backend reported a failure |
/// | `Protocol` | No |
/// | `Connection` | No |
/// | `Closed` | No |
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    #[error("Unknown tool '{0}'")]
    UnknownTool(String),

    #[error("Invalid arguments for tool '{tool}': {message}")]
    InvalidArguments { tool: String, message: String },

    #[error("Tool '{tool}' failed: {message}")]
    ToolExecution { tool: String, message: String },

    #[error("Protocol error from backend '{backend}': {message}")]
    Protocol { backend: String, message: String },

    #[error("Connection to backend '{backend}' failed: {message}")]
    Connection { backend: String, message: String },

    #[error("Session registry is closed")]
    Closed,
}

impl DispatchError {
    /// Whether the error is reported back to the model instead of aborting
    /// the turn.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            DispatchError::UnknownTool(_)
                | DispatchError::InvalidArguments { .. }
                | DispatchError::ToolExecution { .. }
        )
    }

    /// Tool result describing this error to the model
    pub fn to_tool_result(&self) -> ToolCallResult {
        ToolCallResult::error(format!("Error: {}", self))
    }

    pub(crate) fn from_session(tool: &str, backend: &str, error: ToolSessionError) -> Self {
        match error {
            ToolSessionError::ToolExecution(message) => DispatchError::ToolExecution {
                tool: tool.to_string(),
                message,
            },
            ToolSessionError::Protocol(message) => DispatchError::Protocol {
                backend: backend.to_string(),
                message,
            },
            ToolSessionError::Connection(message) => DispatchError::Connection {
                backend: backend.to_string(),
                message,
            },
        }
    }
}

/// Errors raised when reading a resource through the registry
#[derive(Error, Debug)]
pub enum ResourceReadError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error("Backend '{backend}' failed to read resource: {source}")]
    Session {
        backend: String,
        #[source]
        source: ToolSessionError,
    },

    #[error("Session registry is closed")]
    Closed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recoverable_classification() {
        assert!(DispatchError::UnknownTool("x".into()).is_recoverable());
        assert!(
            DispatchError::ToolExecution {
                tool: "x".into(),
                message: "boom".into()
            }
            .is_recoverable()
        );
        assert!(
            !DispatchError::Protocol {
                backend: "b".into(),
                message: "eof".into()
            }
            .is_recoverable()
        );
        assert!(!DispatchError::Closed.is_recoverable());
    }

    #[test]
    fn test_unknown_tool_result_text() {
        let result = DispatchError::UnknownTool("doesNotExist".into()).to_tool_result();
        assert!(result.is_error);
        assert_eq!(result.render_text(), "Error: Unknown tool 'doesNotExist'");
    }

    #[test]
    fn test_shutdown_message_lists_failures() {
        let error = RegistryError::Shutdown(vec![
            ("a".into(), ToolSessionError::Protocol("broken pipe".into())),
            ("b".into(), ToolSessionError::Connection("gone".into())),
        ]);
        assert_eq!(
            error.to_string(),
            "2 backend(s) failed to close: a: Protocol error: broken pipe; b: Connection error: gone"
        );
    }
}
