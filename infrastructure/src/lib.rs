//! Infrastructure layer for toolhost
//!
//! This crate contains adapters that implement the ports defined in the
//! application layer: MCP stdio tool sessions, the JSON transcript store,
//! the JSONL conversation logger, the OpenAI-compatible inference provider,
//! and configuration file loading.

pub mod config;
pub mod logging;
pub mod mcp;
#[cfg(feature = "openai")]
pub mod openai;
pub mod transcript;

// Re-export commonly used types
pub use config::{
    ConfigLoader, ConfigValidationError, FileConfig, FileHostConfig, FileInferenceConfig,
    FileLoggingConfig, FileReplConfig, FileServerConfig, FileSessionConfig, ResolvedInference,
};
pub use logging::JsonlConversationLogger;
pub use mcp::{McpError, SessionOptions, StdioSessionConnector, StdioToolSession};
#[cfg(feature = "openai")]
pub use openai::{AuthStyle, OpenAiInferenceProvider, OpenAiSettings};
pub use transcript::JsonTranscriptStore;
