//! Domain layer for toolhost
//!
//! This crate contains the entities and value objects of a tool-augmented
//! conversation. It has no dependencies on infrastructure or presentation
//! concerns.
//!
//! # Core Concepts
//!
//! - **Transcript**: the named, append-only message history of one conversation
//! - **Tool**: a capability exposed by an external backend, described by a
//!   [`ToolDescriptor`] and invoked through a [`ToolCallRequest`]
//! - **Resource catalog**: structured [`ResourceKey`] lookup for resource URIs

pub mod backend;
pub mod catalog;
pub mod conversation;
pub mod tool;

// Re-export commonly used types
pub use backend::BackendSpec;
pub use catalog::{
    CatalogError, ResourceCatalog, ResourceContents, ResourceDescriptor, ResourceKey,
};
pub use conversation::{
    ContentBlock, DEFAULT_INPUT_REQUIRED_MARKER, ImageUrl, Message, MessageContent, Role,
    Transcript, TranscriptError, TurnState, strip_input_marker,
};
pub use tool::{CollisionPolicy, ToolCallRequest, ToolCallResult, ToolContent, ToolDescriptor};
