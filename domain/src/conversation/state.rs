//! Orchestrator turn states

use serde::{Deserialize, Serialize};

/// State of the conversation loop
///
/// ```text
/// AwaitingUserInput -> Inferring -> (DispatchingTools -> Inferring)* -> AwaitingUserInput
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnState {
    AwaitingUserInput,
    Inferring,
    DispatchingTools,
}

impl TurnState {
    pub fn as_str(&self) -> &'static str {
        match self {
            TurnState::AwaitingUserInput => "awaiting_user_input",
            TurnState::Inferring => "inferring",
            TurnState::DispatchingTools => "dispatching_tools",
        }
    }
}

impl std::fmt::Display for TurnState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
