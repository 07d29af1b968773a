//! Conversation parameters: loop control for the conversation use case.

use serde::{Deserialize, Serialize};
use toolhost_domain::{CollisionPolicy, DEFAULT_INPUT_REQUIRED_MARKER};

/// Static parameters of the conversation loop.
///
/// `max_tool_rounds` of `None` lets the model call tools until it answers
/// with plain text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationParams {
    /// Maximum number of dispatch rounds within one turn.
    pub max_tool_rounds: Option<usize>,
    /// Suffix the model appends when it needs more user input.
    pub input_required_marker: String,
}

impl Default for ConversationParams {
    fn default() -> Self {
        Self {
            max_tool_rounds: None,
            input_required_marker: DEFAULT_INPUT_REQUIRED_MARKER.to_string(),
        }
    }
}

impl ConversationParams {
    pub fn with_max_tool_rounds(mut self, max: Option<usize>) -> Self {
        self.max_tool_rounds = max;
        self
    }

    pub fn with_input_required_marker(mut self, marker: impl Into<String>) -> Self {
        self.input_required_marker = marker.into();
        self
    }
}

/// Parameters of the session registry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryParams {
    pub collision_policy: CollisionPolicy,
}

impl RegistryParams {
    pub fn with_collision_policy(mut self, policy: CollisionPolicy) -> Self {
        self.collision_policy = policy;
        self
    }
}
