//! Connector that launches MCP servers as child processes.

use super::session::{SessionOptions, StdioToolSession};
use async_trait::async_trait;
use std::sync::Arc;
use toolhost_application::{ToolSession, ToolSessionConnector, ToolSessionError};
use toolhost_domain::BackendSpec;
use tracing::warn;

/// Opens [`StdioToolSession`]s with shared options
#[derive(Debug, Clone, Default)]
pub struct StdioSessionConnector {
    options: SessionOptions,
}

impl StdioSessionConnector {
    pub fn new(options: SessionOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &SessionOptions {
        &self.options
    }
}

#[async_trait]
impl ToolSessionConnector for StdioSessionConnector {
    async fn open(
        &self,
        name: &str,
        spec: &BackendSpec,
    ) -> Result<Arc<dyn ToolSession>, ToolSessionError> {
        match StdioToolSession::spawn(name, spec, self.options.clone()).await {
            Ok(session) => Ok(Arc::new(session)),
            Err(error) => {
                warn!(backend = %name, command = %spec, error = %error, "Failed to open MCP session");
                Err(error.into_connection_error())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_command_is_connection_error() {
        let connector = StdioSessionConnector::default();
        let err = connector
            .open("ghost", &BackendSpec::new("/nonexistent/toolhost-ghost"))
            .await
            .err()
            .unwrap();
        assert!(matches!(err, ToolSessionError::Connection(ref m) if m.contains("toolhost-ghost")));
    }
}
