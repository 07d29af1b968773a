//! Inference provider port
//!
//! Defines the interface to the language model. Given the transcript and the
//! tool catalog, a provider returns one assistant turn.

use async_trait::async_trait;
use thiserror::Error;
use toolhost_domain::{Message, ToolCallRequest, ToolDescriptor};

/// Errors that can occur while requesting an assistant turn
#[derive(Error, Debug, Clone)]
pub enum InferenceError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Request failed with status {status}: {message}")]
    RequestFailed { status: u16, message: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Timeout")]
    Timeout,
}

/// Input of one inference call
#[derive(Debug, Clone, Copy)]
pub struct InferenceRequest<'a> {
    pub messages: &'a [Message],
    pub tools: &'a [ToolDescriptor],
}

/// One assistant turn returned by the provider
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AssistantTurn {
    pub content: Option<String>,
    pub tool_calls: Vec<ToolCallRequest>,
}

impl AssistantTurn {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            tool_calls: Vec::new(),
        }
    }

    pub fn with_tool_calls(calls: Vec<ToolCallRequest>) -> Self {
        Self {
            content: None,
            tool_calls: calls,
        }
    }
}

/// Language model access
#[async_trait]
pub trait InferenceProvider: Send + Sync {
    /// Identifier of the model used, for display and logging
    fn model(&self) -> &str;

    async fn infer(&self, request: InferenceRequest<'_>) -> Result<AssistantTurn, InferenceError>;
}
