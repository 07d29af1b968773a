//! OpenAI-compatible chat completions adapter.
//!
//! Speaks the `/chat/completions` wire format, either against a plain
//! OpenAI-style endpoint or an Azure OpenAI deployment.

mod provider;
mod wire;

pub use provider::{AuthStyle, OpenAiInferenceProvider, OpenAiSettings};
