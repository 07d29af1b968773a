//! Application layer for toolhost
//!
//! This crate contains the conversation use case, the session registry,
//! port definitions and application configuration. It depends only on the
//! domain layer.

pub mod config;
pub mod ports;
pub mod registry;
pub mod use_cases;

#[cfg(test)]
pub(crate) mod testing;

// Re-export commonly used types
pub use config::{ConversationParams, RegistryParams};
pub use ports::{
    conversation_logger::{ConversationEvent, ConversationLogger, NoConversationLogger},
    inference::{AssistantTurn, InferenceError, InferenceProvider, InferenceRequest},
    progress::{HostProgressNotifier, NoProgress},
    tool_session::{ToolSession, ToolSessionConnector, ToolSessionError},
    transcript_store::{StoreError, TranscriptStore},
};
pub use registry::{
    DispatchError, RegisteredResource, RegistryError, ResourceReadError, SessionRegistry,
};
pub use use_cases::run_conversation::{
    RunConversationError, RunConversationInput, RunConversationOutput, RunConversationUseCase,
    TurnOutcome,
};
