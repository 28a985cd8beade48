//! HTTP oracle backends.
//!
//! Two wire formats are supported: the OpenAI-style chat-completions
//! endpoint (also served by Groq) and the workspace-chat endpoint used by
//! self-hosted AnythingLLM-style services. Both are synchronous; blocking
//! for the duration of network I/O is part of the oracle contract.

use super::TextGenerator;
use crate::error::{FormFillError, FormFillResult};
use serde::Deserialize;
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(90);

/// Substrings that mark a transport failure as a rate limit.
const RATE_LIMIT_INDICATORS: &[&str] = &["rate limit", "429", "too many requests", "quota"];

fn looks_rate_limited(message: &str) -> bool {
    let lower = message.to_lowercase();
    RATE_LIMIT_INDICATORS.iter().any(|ind| lower.contains(ind))
}

fn transport_error(provider: &str, message: String) -> FormFillError {
    let rate_limited = looks_rate_limited(&message);
    FormFillError::OracleTransport {
        provider: provider.to_string(),
        message,
        rate_limited,
    }
}

fn build_http_client() -> FormFillResult<reqwest::blocking::Client> {
    reqwest::blocking::Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .build()
        .map_err(|e| FormFillError::InvalidInput {
            parameter: "http_client".to_string(),
            reason: e.to_string(),
        })
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

/// OpenAI-compatible chat-completions backend.
pub struct ChatCompletionsBackend {
    provider: String,
    http: reqwest::blocking::Client,
    url: String,
    api_key: String,
    model: String,
}

impl ChatCompletionsBackend {
    /// Creates a backend for a chat-completions endpoint.
    pub fn new(provider: &str, base_url: &str, api_key: &str, model: &str) -> FormFillResult<Self> {
        Ok(Self {
            provider: provider.to_string(),
            http: build_http_client()?,
            url: format!("{}/chat/completions", base_url.trim_end_matches('/')),
            api_key: api_key.to_string(),
            model: model.to_string(),
        })
    }
}

impl TextGenerator for ChatCompletionsBackend {
    fn generate(&self, prompt: &str) -> FormFillResult<String> {
        let body = serde_json::json!({
            "model": self.model,
            "messages": [{"role": "user", "content": prompt}],
        });

        let response = self
            .http
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .map_err(|e| transport_error(&self.provider, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().unwrap_or_default();
            return Err(FormFillError::OracleTransport {
                provider: self.provider.clone(),
                message: format!("HTTP {}: {}", status, detail),
                rate_limited: status.as_u16() == 429 || looks_rate_limited(&detail),
            });
        }

        let parsed: ChatResponse = response
            .json()
            .map_err(|e| transport_error(&self.provider, format!("invalid response body: {}", e)))?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content);
        match content {
            Some(text) => Ok(text),
            None => {
                log::warn!("{} returned an empty completion", self.provider);
                Ok(String::new())
            }
        }
    }

    fn name(&self) -> &str {
        &self.provider
    }
}

#[derive(Deserialize)]
struct WorkspaceResponse {
    #[serde(rename = "textResponse")]
    text_response: Option<String>,
}

/// Workspace-chat backend for self-hosted services.
pub struct WorkspaceChatBackend {
    http: reqwest::blocking::Client,
    chat_url: String,
    api_key: String,
}

impl WorkspaceChatBackend {
    /// Creates a backend for `<base_url>/workspace/<slug>/chat`.
    pub fn new(base_url: &str, workspace: &str, api_key: &str) -> FormFillResult<Self> {
        Ok(Self {
            http: build_http_client()?,
            chat_url: format!(
                "{}/workspace/{}/chat",
                base_url.trim_end_matches('/'),
                workspace
            ),
            api_key: api_key.to_string(),
        })
    }
}

impl TextGenerator for WorkspaceChatBackend {
    fn generate(&self, prompt: &str) -> FormFillResult<String> {
        let body = serde_json::json!({
            "message": prompt,
            "mode": "chat",
            "sessionId": "formfill-session",
            "attachments": [],
        });

        let response = self
            .http
            .post(&self.chat_url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .map_err(|e| transport_error("workspace", e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().unwrap_or_default();
            return Err(FormFillError::OracleTransport {
                provider: "workspace".to_string(),
                message: format!("HTTP {}: {}", status, detail),
                rate_limited: status.as_u16() == 429 || looks_rate_limited(&detail),
            });
        }

        let parsed: WorkspaceResponse = response
            .json()
            .map_err(|e| transport_error("workspace", format!("invalid response body: {}", e)))?;
        Ok(parsed.text_response.unwrap_or_default())
    }

    fn name(&self) -> &str {
        "workspace"
    }
}
