//! Raw TOML configuration data types
//!
//! These structs represent the exact structure of the TOML config file.
//! They are deserialized directly and use domain types where appropriate.

mod host;
mod inference;
mod logging;
mod repl;
mod servers;
mod session;

pub use host::FileHostConfig;
pub use inference::{FileInferenceConfig, ResolvedInference};
pub use logging::FileLoggingConfig;
pub use repl::FileReplConfig;
pub use servers::FileServerConfig;
pub use session::FileSessionConfig;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use thiserror::Error;
use toolhost_domain::BackendSpec;

/// Configuration validation errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigValidationError {
    #[error("{0} cannot be 0")]
    ZeroTimeout(&'static str),

    #[error("server '{0}' has an empty command")]
    EmptyCommand(String),

    #[error("host.conversation cannot be empty")]
    EmptyConversationName,

    #[error("host.conversation '{0}' must not contain path separators or '..'")]
    InvalidConversationName(String),

    #[error("host.input_required_marker cannot be empty")]
    EmptyMarker,

    #[error("host.max_tool_rounds cannot be 0")]
    ZeroToolRounds,

    #[error("unknown inference provider '{0}' (expected \"openai\" or \"azure\")")]
    UnknownProvider(String),

    #[error("inference.provider = \"azure\" requires azure_deployment or OPENAI_DEPLOYMENT_ID")]
    MissingAzureDeployment,
}

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// Conversation and registry settings
    pub host: FileHostConfig,
    /// Tool backends by name
    pub servers: BTreeMap<String, FileServerConfig>,
    /// Tool session timeouts
    pub session: FileSessionConfig,
    /// Language model endpoint
    pub inference: FileInferenceConfig,
    pub logging: FileLoggingConfig,
    pub repl: FileReplConfig,
}

impl FileConfig {
    /// Validate the configuration, stopping at the first problem.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        let timeouts = [
            ("session.startup_timeout_secs", self.session.startup_timeout_secs),
            ("session.request_timeout_secs", self.session.request_timeout_secs),
            ("inference.timeout_secs", self.inference.timeout_secs),
        ];
        for (field, value) in timeouts {
            if value == 0 {
                return Err(ConfigValidationError::ZeroTimeout(field));
            }
        }

        for (name, server) in &self.servers {
            if server.command.trim().is_empty() {
                return Err(ConfigValidationError::EmptyCommand(name.clone()));
            }
        }

        let conversation = &self.host.conversation;
        if conversation.trim().is_empty() {
            return Err(ConfigValidationError::EmptyConversationName);
        }
        if conversation.contains(['/', '\\']) || conversation.contains("..") {
            return Err(ConfigValidationError::InvalidConversationName(
                conversation.clone(),
            ));
        }

        if self.host.input_required_marker.is_empty() {
            return Err(ConfigValidationError::EmptyMarker);
        }
        if self.host.max_tool_rounds == Some(0) {
            return Err(ConfigValidationError::ZeroToolRounds);
        }

        Ok(())
    }

    /// Render the effective configuration as TOML, with secrets masked.
    pub fn to_toml_masked(&self) -> Result<String, toml::ser::Error> {
        let mut shown = self.clone();
        if shown.inference.api_key.is_some() {
            shown.inference.api_key = Some("********".to_string());
        }
        toml::to_string_pretty(&shown)
    }

    /// Specs of the enabled servers, keyed by name.
    pub fn to_backends(&self) -> BTreeMap<String, BackendSpec> {
        self.servers
            .iter()
            .filter(|(_, server)| server.enabled)
            .map(|(name, server)| (name.clone(), server.to_backend_spec()))
            .collect()
    }
}

/// Expand a leading `~/` to the home directory.
pub(crate) fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/")
        && let Some(home) = dirs::home_dir()
    {
        return home.join(rest);
    }
    PathBuf::from(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use toolhost_domain::CollisionPolicy;

    #[test]
    fn test_deserialize_full_config() {
        let toml_str = r#"
[host]
conversation = "storybook"
collision_policy = "first-wins"
max_tool_rounds = 8

[servers.storybook]
command = "uv"
args = ["run", "storybook_server.py"]
env = { STORYBOOK_URL = "http://localhost:6006" }

[servers.files]
command = "python"
args = ["files_server.py"]
enabled = false

[session]
request_timeout_secs = 60

[inference]
provider = "azure"
azure_deployment = "gpt4o-prod"

[repl]
show_progress = false
"#;

        let config: FileConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.host.conversation, "storybook");
        assert_eq!(config.host.collision_policy, CollisionPolicy::FirstWins);
        assert_eq!(config.host.max_tool_rounds, Some(8));
        assert_eq!(config.session.request_timeout_secs, 60);
        assert_eq!(config.session.startup_timeout_secs, 30);
        assert_eq!(config.inference.provider, "azure");
        assert!(!config.repl.show_progress);

        let backends = config.to_backends();
        assert_eq!(backends.len(), 1);
        let storybook = &backends["storybook"];
        assert_eq!(storybook.command, "uv");
        assert_eq!(storybook.args, vec!["run", "storybook_server.py"]);
        assert_eq!(storybook.env["STORYBOOK_URL"], "http://localhost:6006");
    }

    #[test]
    fn test_default_config_is_valid() {
        let config = FileConfig::default();
        assert_eq!(config.host.conversation, "host");
        assert_eq!(config.host.input_required_marker, "<INPUT_REQUIRED>");
        assert!(config.servers.is_empty());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_timeout() {
        let config: FileConfig = toml::from_str("[session]\nrequest_timeout_secs = 0").unwrap();
        assert_eq!(
            config.validate(),
            Err(ConfigValidationError::ZeroTimeout("session.request_timeout_secs"))
        );
    }

    #[test]
    fn test_validate_rejects_empty_command() {
        let config: FileConfig =
            toml::from_str("[servers.broken]\ncommand = \"  \"").unwrap();
        assert_eq!(
            config.validate(),
            Err(ConfigValidationError::EmptyCommand("broken".into()))
        );
    }

    #[test]
    fn test_validate_conversation_and_marker() {
        let mut config = FileConfig::default();
        config.host.conversation = String::new();
        assert_eq!(
            config.validate(),
            Err(ConfigValidationError::EmptyConversationName)
        );

        config.host.conversation = "../escape".into();
        assert!(matches!(
            config.validate(),
            Err(ConfigValidationError::InvalidConversationName(_))
        ));

        config.host.conversation = "host".into();
        config.host.input_required_marker = String::new();
        assert_eq!(config.validate(), Err(ConfigValidationError::EmptyMarker));
    }

    #[test]
    fn test_rendered_config_masks_api_key() {
        let mut config = FileConfig::default();
        config.inference.api_key = Some("sk-live-123".into());
        config.servers.insert(
            "storybook".into(),
            toml::from_str("command = \"uv\"").unwrap(),
        );

        let rendered = config.to_toml_masked().unwrap();
        assert!(!rendered.contains("sk-live-123"));
        assert!(rendered.contains("[servers.storybook]"));

        let reparsed: FileConfig = toml::from_str(&rendered).unwrap();
        assert_eq!(reparsed.servers, config.servers);
    }

    #[test]
    fn test_expand_home_leaves_other_paths() {
        assert_eq!(expand_home("/tmp/x.jsonl"), PathBuf::from("/tmp/x.jsonl"));
        assert_eq!(expand_home("rel/x"), PathBuf::from("rel/x"));
    }
}
