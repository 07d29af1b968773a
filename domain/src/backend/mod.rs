//! Tool backend launch specification

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// How to start one tool backend process
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BackendSpec {
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default)]
    pub env: BTreeMap<String, String>,
}

impl BackendSpec {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            ..Default::default()
        }
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }
}

impl std::fmt::Display for BackendSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.command)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_joins_args() {
        let spec = BackendSpec::new("uv").with_args(["run", "server.py"]);
        assert_eq!(spec.to_string(), "uv run server.py");
    }

    #[test]
    fn test_deserialize_with_defaults() {
        let spec: BackendSpec = serde_json::from_str(r#"{"command": "node"}"#).unwrap();
        assert_eq!(spec, BackendSpec::new("node"));
    }
}
