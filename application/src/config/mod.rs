//! Application-level configuration.
//!
//! Parameters that control how the registry and the conversation loop behave.

pub mod conversation_params;

pub use conversation_params::{ConversationParams, RegistryParams};
