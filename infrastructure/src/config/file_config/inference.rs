//! Inference configuration from TOML (`[inference]` section)
//!
//! Empty fields fall back to the `OPENAI_API_BASE`, `OPENAI_API_VERSION`,
//! `OPENAI_DEPLOYMENT_ID` and `OPENAI_API_KEY` environment variables.

use super::ConfigValidationError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = "gpt-4o";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileInferenceConfig {
    /// "openai" or "azure"
    pub provider: String,
    pub model: Option<String>,
    pub base_url: Option<String>,
    /// Direct API key (prefer `api_key_env`)
    pub api_key: Option<String>,
    /// Environment variable holding the API key
    pub api_key_env: String,
    pub azure_deployment: Option<String>,
    pub api_version: Option<String>,
    pub timeout_secs: u64,
}

impl Default for FileInferenceConfig {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            model: None,
            base_url: None,
            api_key: None,
            api_key_env: "OPENAI_API_KEY".to_string(),
            azure_deployment: None,
            api_version: None,
            timeout_secs: 120,
        }
    }
}

/// Inference settings after applying environment fallbacks
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedInference {
    pub base_url: String,
    pub model: String,
    pub api_key: Option<String>,
    pub azure_deployment: Option<String>,
    pub api_version: Option<String>,
    pub timeout: Duration,
}

impl FileInferenceConfig {
    /// Resolve against the process environment.
    pub fn resolve(&self) -> Result<ResolvedInference, ConfigValidationError> {
        self.resolve_with(|key| std::env::var(key).ok())
    }

    /// Resolve against an arbitrary variable lookup.
    pub fn resolve_with(
        &self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<ResolvedInference, ConfigValidationError> {
        let non_empty = |v: Option<String>| v.filter(|s| !s.trim().is_empty());
        let pick = |configured: &Option<String>, var: &str| {
            non_empty(configured.clone()).or_else(|| non_empty(lookup(var)))
        };

        let azure_deployment = pick(&self.azure_deployment, "OPENAI_DEPLOYMENT_ID");
        match self.provider.as_str() {
            "openai" => {}
            "azure" if azure_deployment.is_none() => {
                return Err(ConfigValidationError::MissingAzureDeployment);
            }
            "azure" => {}
            other => return Err(ConfigValidationError::UnknownProvider(other.to_string())),
        }

        let base_url = pick(&self.base_url, "OPENAI_API_BASE")
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let api_key = non_empty(self.api_key.clone()).or_else(|| non_empty(lookup(&self.api_key_env)));
        let model = non_empty(self.model.clone())
            .or_else(|| azure_deployment.clone())
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());

        Ok(ResolvedInference {
            base_url,
            model,
            api_key,
            api_version: pick(&self.api_version, "OPENAI_API_VERSION"),
            azure_deployment,
            timeout: Duration::from_secs(self.timeout_secs),
        })
    }
}

#[cfg(feature = "openai")]
impl From<ResolvedInference> for crate::openai::OpenAiSettings {
    fn from(r: ResolvedInference) -> Self {
        Self {
            base_url: r.base_url,
            model: r.model,
            api_key: r.api_key,
            azure_deployment: r.azure_deployment,
            api_version: r.api_version,
            timeout: r.timeout,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_without_environment() {
        let resolved = FileInferenceConfig::default().resolve_with(env(&[])).unwrap();
        assert_eq!(resolved.base_url, DEFAULT_BASE_URL);
        assert_eq!(resolved.model, DEFAULT_MODEL);
        assert!(resolved.api_key.is_none());
        assert!(resolved.azure_deployment.is_none());
    }

    #[test]
    fn test_openai_environment_fallbacks() {
        let resolved = FileInferenceConfig::default()
            .resolve_with(env(&[
                ("OPENAI_API_BASE", "https://res.openai.azure.com"),
                ("OPENAI_API_VERSION", "2024-06-01"),
                ("OPENAI_DEPLOYMENT_ID", "gpt4o-prod"),
                ("OPENAI_API_KEY", "k"),
            ]))
            .unwrap();
        assert_eq!(resolved.base_url, "https://res.openai.azure.com");
        assert_eq!(resolved.azure_deployment.as_deref(), Some("gpt4o-prod"));
        assert_eq!(resolved.model, "gpt4o-prod");
        assert_eq!(resolved.api_key.as_deref(), Some("k"));
        assert_eq!(resolved.api_version.as_deref(), Some("2024-06-01"));
    }

    #[test]
    fn test_configured_values_win_over_environment() {
        let config = FileInferenceConfig {
            model: Some("gpt-4.1".into()),
            base_url: Some("http://localhost:8080/v1".into()),
            api_key_env: "LOCAL_KEY".into(),
            ..Default::default()
        };
        let resolved = config
            .resolve_with(env(&[
                ("OPENAI_API_BASE", "https://ignored"),
                ("LOCAL_KEY", "local"),
                ("OPENAI_API_KEY", "ignored"),
            ]))
            .unwrap();
        assert_eq!(resolved.base_url, "http://localhost:8080/v1");
        assert_eq!(resolved.model, "gpt-4.1");
        assert_eq!(resolved.api_key.as_deref(), Some("local"));
    }

    #[test]
    fn test_azure_requires_deployment() {
        let config = FileInferenceConfig {
            provider: "azure".into(),
            ..Default::default()
        };
        assert_eq!(
            config.resolve_with(env(&[])),
            Err(ConfigValidationError::MissingAzureDeployment)
        );
    }

    #[test]
    fn test_unknown_provider() {
        let config = FileInferenceConfig {
            provider: "bedrock".into(),
            ..Default::default()
        };
        assert!(matches!(
            config.resolve_with(env(&[])),
            Err(ConfigValidationError::UnknownProvider(p)) if p == "bedrock"
        ));
    }
}
