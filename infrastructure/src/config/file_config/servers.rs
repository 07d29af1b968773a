//! Tool backend configuration (`[servers.<name>]` tables)

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use toolhost_domain::BackendSpec;

/// One tool backend launched as a child process
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileServerConfig {
    /// Executable to start
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
    /// Extra environment variables, added to the inherited environment
    #[serde(default)]
    pub env: BTreeMap<String, String>,
    /// Disabled servers stay in the file but are not started
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

impl FileServerConfig {
    pub fn to_backend_spec(&self) -> BackendSpec {
        self.env.iter().fold(
            BackendSpec::new(self.command.clone()).with_args(self.args.iter().cloned()),
            |spec, (key, value)| spec.with_env(key.clone(), value.clone()),
        )
    }
}
