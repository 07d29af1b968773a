//! Tool domain: descriptors, call requests, typed results
//!
//! Tools are provided by external backends. The host only knows their
//! descriptors and routes [`ToolCallRequest`]s to them; every invocation
//! yields a [`ToolCallResult`] made of [`ToolContent`] items that are
//! rendered into the `tool` message returned to the model.

pub mod content;
pub mod entities;
pub mod policy;
pub mod value_objects;

pub use content::ToolContent;
pub use entities::{ToolCallRequest, ToolDescriptor};
pub use policy::CollisionPolicy;
pub use value_objects::ToolCallResult;
