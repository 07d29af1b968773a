//! Conversation domain: messages, transcripts and turn states

pub mod entities;
pub mod marker;
pub mod state;

pub use entities::{ContentBlock, ImageUrl, Message, MessageContent, Role, Transcript, TranscriptError};
pub use marker::{DEFAULT_INPUT_REQUIRED_MARKER, strip_input_marker};
pub use state::TurnState;
