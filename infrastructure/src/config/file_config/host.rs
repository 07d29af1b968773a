//! Host configuration from TOML (`[host]` section)

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use toolhost_application::{ConversationParams, RegistryParams};
use toolhost_domain::{CollisionPolicy, DEFAULT_INPUT_REQUIRED_MARKER};

/// Raw host configuration from TOML
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileHostConfig {
    /// Name of the conversation to resume (file stem in `sessions_dir`)
    pub conversation: String,
    /// Directory holding transcripts (default: `<data dir>/toolhost/sessions`)
    pub sessions_dir: Option<String>,
    /// Suffix the model appends when it needs user input
    pub input_required_marker: String,
    /// "last-wins" | "first-wins" | "reject"
    pub collision_policy: CollisionPolicy,
    /// Cap on tool rounds per turn (unset = unlimited)
    pub max_tool_rounds: Option<usize>,
}

impl Default for FileHostConfig {
    fn default() -> Self {
        Self {
            conversation: "host".to_string(),
            sessions_dir: None,
            input_required_marker: DEFAULT_INPUT_REQUIRED_MARKER.to_string(),
            collision_policy: CollisionPolicy::default(),
            max_tool_rounds: None,
        }
    }
}

impl FileHostConfig {
    pub fn to_conversation_params(&self) -> ConversationParams {
        ConversationParams::default()
            .with_max_tool_rounds(self.max_tool_rounds)
            .with_input_required_marker(self.input_required_marker.clone())
    }

    pub fn to_registry_params(&self) -> RegistryParams {
        RegistryParams::default().with_collision_policy(self.collision_policy)
    }

    /// Transcript directory with `~` expanded, falling back to the data dir.
    pub fn sessions_dir(&self) -> Option<PathBuf> {
        match &self.sessions_dir {
            Some(dir) => Some(super::expand_home(dir)),
            None => dirs::data_dir().map(|d| d.join("toolhost").join("sessions")),
        }
    }
}
