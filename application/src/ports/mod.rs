//! Port definitions (interfaces for external adapters)

pub mod conversation_logger;
pub mod inference;
pub mod progress;
pub mod tool_session;
pub mod transcript_store;
