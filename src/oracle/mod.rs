//! Oracle access: the text-generation capability and its client wrapper.
//!
//! Every oracle call in the pipeline goes through [`OracleClient`], which
//! owns the process-wide rate-limit state and the retry/backoff policy. The
//! backend itself is a capability object ([`TextGenerator`]) selected by
//! configuration at construction time; call sites never branch on provider
//! names.

pub mod backend;
pub mod parse;
pub mod prompts;

pub use backend::{ChatCompletionsBackend, WorkspaceChatBackend};

use crate::error::{FormFillError, FormFillResult};
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// A black-box text-generation capability: prompt in, text out.
///
/// Implementations are unreliable by contract; callers must expect
/// transport failures and malformed output. One implementation exists per
/// backend kind.
pub trait TextGenerator: Send + Sync {
    /// Sends a prompt and returns the generated text.
    fn generate(&self, prompt: &str) -> FormFillResult<String>;

    /// Human-readable backend name for logs and errors.
    fn name(&self) -> &str;
}

/// Oracle backend selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    /// OpenAI chat-completions API
    OpenAi,

    /// Groq's OpenAI-compatible chat-completions API
    Groq,

    /// A workspace-chat service (AnythingLLM-style endpoint)
    Workspace,
}

impl Provider {
    fn default_model(&self) -> &'static str {
        match self {
            Self::OpenAi => "gpt-4.1-mini",
            Self::Groq => "meta-llama/llama-4-scout-17b-16e-instruct",
            Self::Workspace => "",
        }
    }

    fn default_base_url(&self) -> &'static str {
        match self {
            Self::OpenAi => "https://api.openai.com/v1",
            Self::Groq => "https://api.groq.com/openai/v1",
            Self::Workspace => "",
        }
    }

    /// Minimum delay between consecutive requests.
    ///
    /// Groq's free tier throttles aggressively, so it gets a much wider
    /// spacing than the paid endpoints.
    fn min_interval(&self) -> Duration {
        match self {
            Self::Groq => Duration::from_millis(2000),
            _ => Duration::from_millis(200),
        }
    }
}

/// Configuration used to construct an [`OracleClient`].
#[derive(Debug, Clone)]
pub struct OracleConfig {
    pub provider: Provider,
    pub model: Option<String>,
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    /// Workspace slug for the workspace-chat backend
    pub workspace: Option<String>,
}

impl OracleConfig {
    /// Reads provider credentials from the environment.
    ///
    /// `OPENAI_API_KEY` / `GROQ_API_KEY` / `WORKSPACE_API_KEY` supply the
    /// key; `WORKSPACE_BASE_URL` and `WORKSPACE_SLUG` complete the
    /// workspace backend.
    pub fn from_env(provider: Provider) -> Self {
        let api_key = match provider {
            Provider::OpenAi => std::env::var("OPENAI_API_KEY").ok(),
            Provider::Groq => std::env::var("GROQ_API_KEY").ok(),
            Provider::Workspace => std::env::var("WORKSPACE_API_KEY").ok(),
        };
        let (base_url, workspace) = if provider == Provider::Workspace {
            (
                std::env::var("WORKSPACE_BASE_URL").ok(),
                std::env::var("WORKSPACE_SLUG").ok(),
            )
        } else {
            (None, None)
        };
        Self {
            provider,
            model: None,
            api_key,
            base_url,
            workspace,
        }
    }

    /// Builds the client for the configured backend.
    pub fn build(self) -> FormFillResult<OracleClient> {
        let api_key = self.api_key.ok_or_else(|| FormFillError::InvalidInput {
            parameter: "api_key".to_string(),
            reason: format!("no API key configured for {:?}", self.provider),
        })?;
        let model = self
            .model
            .unwrap_or_else(|| self.provider.default_model().to_string());

        let backend: Box<dyn TextGenerator> = match self.provider {
            Provider::OpenAi | Provider::Groq => {
                let base_url = self
                    .base_url
                    .unwrap_or_else(|| self.provider.default_base_url().to_string());
                let name = if self.provider == Provider::OpenAi {
                    "openai"
                } else {
                    "groq"
                };
                Box::new(ChatCompletionsBackend::new(name, &base_url, &api_key, &model)?)
            }
            Provider::Workspace => {
                let base_url = self.base_url.ok_or_else(|| FormFillError::InvalidInput {
                    parameter: "base_url".to_string(),
                    reason: "workspace backend requires WORKSPACE_BASE_URL".to_string(),
                })?;
                let workspace = self.workspace.ok_or_else(|| FormFillError::InvalidInput {
                    parameter: "workspace".to_string(),
                    reason: "workspace backend requires WORKSPACE_SLUG".to_string(),
                })?;
                Box::new(WorkspaceChatBackend::new(&base_url, &workspace, &api_key)?)
            }
        };

        Ok(OracleClient::new(backend).with_min_interval(self.provider.min_interval()))
    }
}

struct RateState {
    last_request: Option<Instant>,
}

/// Serializing wrapper around a [`TextGenerator`].
///
/// All oracle calls process-wide are mutually exclusive: the rate state and
/// the in-flight request share one lock, so a second caller blocks until
/// the first request (including any enforced rate-limit sleeps) completes.
pub struct OracleClient {
    backend: Box<dyn TextGenerator>,
    state: Mutex<RateState>,
    min_interval: Duration,
    max_retries: u32,
    backoff_base: Duration,
    backoff_factor: f64,
}

impl OracleClient {
    /// Wraps a backend with default retry and spacing settings.
    pub fn new(backend: Box<dyn TextGenerator>) -> Self {
        Self {
            backend,
            state: Mutex::new(RateState { last_request: None }),
            min_interval: Duration::from_millis(200),
            max_retries: 5,
            backoff_base: Duration::from_secs(2),
            backoff_factor: 2.0,
        }
    }

    /// Sets the minimum delay between consecutive requests.
    pub fn with_min_interval(mut self, interval: Duration) -> Self {
        self.min_interval = interval;
        self
    }

    /// Sets the transport retry budget.
    pub fn with_max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries.max(1);
        self
    }

    /// Sets the initial backoff delay for rate-limited retries.
    pub fn with_backoff_base(mut self, base: Duration) -> Self {
        self.backoff_base = base;
        self
    }

    /// Backend name, for logs.
    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    /// Sends a prompt, enforcing request spacing and retrying rate-limited
    /// failures with exponential backoff.
    ///
    /// Non-rate-limit transport errors propagate immediately. Exhausting
    /// the retry budget surfaces as a transport error.
    pub fn generate(&self, prompt: &str) -> FormFillResult<String> {
        let mut state = self
            .state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        log::debug!(
            "oracle request to {} ({} chars)",
            self.backend.name(),
            prompt.len()
        );

        for retry in 0..self.max_retries {
            if let Some(last) = state.last_request {
                let elapsed = last.elapsed();
                if elapsed < self.min_interval {
                    std::thread::sleep(self.min_interval - elapsed);
                }
            }
            state.last_request = Some(Instant::now());

            match self.backend.generate(prompt) {
                Ok(text) => return Ok(text.trim().to_string()),
                Err(err) if err.is_rate_limited() && retry + 1 < self.max_retries => {
                    let wait = self
                        .backoff_base
                        .mul_f64(self.backoff_factor.powi(retry as i32));
                    log::warn!(
                        "{} rate limited, retrying in {:.1}s (attempt {}/{})",
                        self.backend.name(),
                        wait.as_secs_f64(),
                        retry + 1,
                        self.max_retries
                    );
                    std::thread::sleep(wait);
                    state.last_request = Some(Instant::now());
                }
                Err(err) => return Err(err),
            }
        }

        Err(FormFillError::OracleTransport {
            provider: self.backend.name().to_string(),
            message: format!("retry budget of {} exhausted", self.max_retries),
            rate_limited: true,
        })
    }
}
