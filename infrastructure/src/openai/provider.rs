//! HTTP client for chat completions.

use super::wire;
use async_trait::async_trait;
use serde_json::{Value, json};
use std::time::Duration;
use toolhost_application::{AssistantTurn, InferenceError, InferenceProvider, InferenceRequest};
use tracing::{debug, trace};

/// How the API key is attached to requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthStyle {
    /// `Authorization: Bearer <key>`
    Bearer,
    /// `api-key: <key>` (Azure OpenAI)
    ApiKeyHeader,
    /// Local servers without authentication
    None,
}

/// Resolved connection settings for [`OpenAiInferenceProvider`].
#[derive(Debug, Clone, PartialEq)]
pub struct OpenAiSettings {
    /// API base ending before `/chat/completions` (or the Azure resource endpoint)
    pub base_url: String,
    pub model: String,
    pub api_key: Option<String>,
    /// Azure deployment id; switches the provider to Azure URLs and `api-key` auth
    pub azure_deployment: Option<String>,
    pub api_version: Option<String>,
    pub timeout: Duration,
}

impl OpenAiSettings {
    pub fn chat_url(&self) -> String {
        let base = self.base_url.trim_end_matches('/');
        match &self.azure_deployment {
            Some(deployment) => {
                let mut url = format!("{base}/openai/deployments/{deployment}/chat/completions");
                if let Some(version) = &self.api_version {
                    url.push_str("?api-version=");
                    url.push_str(version);
                }
                url
            }
            None => format!("{base}/chat/completions"),
        }
    }

    pub fn auth_style(&self) -> AuthStyle {
        match (&self.api_key, &self.azure_deployment) {
            (None, _) => AuthStyle::None,
            (Some(_), Some(_)) => AuthStyle::ApiKeyHeader,
            (Some(_), None) => AuthStyle::Bearer,
        }
    }
}

/// Inference provider backed by an OpenAI-compatible endpoint.
pub struct OpenAiInferenceProvider {
    model: String,
    api_key: Option<String>,
    chat_url: String,
    auth_style: AuthStyle,
    client: reqwest::Client,
}

impl OpenAiInferenceProvider {
    pub fn new(settings: OpenAiSettings) -> Result<Self, InferenceError> {
        let client = reqwest::Client::builder()
            .timeout(settings.timeout)
            .build()
            .map_err(|e| InferenceError::Connection(e.to_string()))?;

        Ok(Self {
            chat_url: settings.chat_url(),
            auth_style: settings.auth_style(),
            model: settings.model,
            api_key: settings.api_key,
            client,
        })
    }

    pub fn chat_url(&self) -> &str {
        &self.chat_url
    }

    fn request_body(&self, request: &InferenceRequest<'_>) -> Value {
        let mut body = json!({
            "model": self.model,
            "messages": wire::build_messages(request.messages),
        });
        if !request.tools.is_empty() {
            body["tools"] = Value::Array(wire::build_tools(request.tools));
        }
        body
    }
}

fn map_send_error(e: reqwest::Error) -> InferenceError {
    if e.is_timeout() {
        InferenceError::Timeout
    } else {
        InferenceError::Connection(e.to_string())
    }
}

#[async_trait]
impl InferenceProvider for OpenAiInferenceProvider {
    fn model(&self) -> &str {
        &self.model
    }

    async fn infer(&self, request: InferenceRequest<'_>) -> Result<AssistantTurn, InferenceError> {
        let body = self.request_body(&request);
        debug!(
            model = %self.model,
            message_count = request.messages.len(),
            tool_count = request.tools.len(),
            "Sending chat completion request"
        );
        trace!(request_body = %body, "Full chat completion request");

        let mut http = self.client.post(&self.chat_url).json(&body);
        http = match (self.auth_style, &self.api_key) {
            (AuthStyle::Bearer, Some(key)) => http.bearer_auth(key),
            (AuthStyle::ApiKeyHeader, Some(key)) => http.header("api-key", key),
            _ => http,
        };

        let response = http.send().await.map_err(map_send_error)?;
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(match status.as_u16() {
                401 | 403 => InferenceError::Authentication(text),
                code => InferenceError::RequestFailed {
                    status: code,
                    message: text,
                },
            });
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| InferenceError::InvalidResponse(e.to_string()))?;
        let turn = wire::parse_response(&body)?;

        debug!(
            has_content = turn.content.is_some(),
            tool_calls = turn.tool_calls.len(),
            "Chat completion received"
        );
        Ok(turn)
    }
}
