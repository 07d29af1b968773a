//! Tool session port
//!
//! Defines the interface to one tool backend: a long-lived channel that can
//! list tools, invoke them and optionally serve resources. Implementations
//! live in the infrastructure layer.

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;
use toolhost_domain::{
    BackendSpec, ResourceContents, ResourceDescriptor, ToolCallResult, ToolDescriptor,
};

/// Errors raised by a tool session
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ToolSessionError {
    /// The backend could not be started, the handshake failed or timed out
    #[error("Connection error: {0}")]
    Connection(String),

    /// The channel failed or the backend sent a malformed message
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// The backend ran the tool and reported a failure
    #[error("Tool execution failed: {0}")]
    ToolExecution(String),
}

/// One open channel to a tool backend
#[async_trait]
pub trait ToolSession: Send + Sync {
    /// Configured name of the backend
    fn name(&self) -> &str;

    async fn list_tools(&self) -> Result<Vec<ToolDescriptor>, ToolSessionError>;

    async fn invoke(
        &self,
        name: &str,
        arguments: serde_json::Value,
    ) -> Result<ToolCallResult, ToolSessionError>;

    /// Resources served by the backend. Backends without resource support
    /// return an empty list.
    async fn list_resources(&self) -> Result<Vec<ResourceDescriptor>, ToolSessionError> {
        Ok(Vec::new())
    }

    async fn read_resource(&self, uri: &str) -> Result<Vec<ResourceContents>, ToolSessionError> {
        Err(ToolSessionError::Protocol(format!(
            "backend '{}' does not serve resources ({})",
            self.name(),
            uri
        )))
    }

    /// Tear the channel down. Must be idempotent and must not fail when
    /// earlier operations failed.
    async fn close(&self) -> Result<(), ToolSessionError>;
}

/// Opens tool sessions from backend specifications
#[async_trait]
pub trait ToolSessionConnector: Send + Sync {
    /// Launch the backend, perform the handshake and return a ready session.
    async fn open(
        &self,
        name: &str,
        spec: &BackendSpec,
    ) -> Result<Arc<dyn ToolSession>, ToolSessionError>;
}
