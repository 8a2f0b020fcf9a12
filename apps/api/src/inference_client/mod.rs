//! Client for the AI Core chat-completion service. No other module talks to the
//! inference backend over HTTP.
//!
//! The wire format is the OpenAI-compatible chat-completion shape. Failures are
//! never retried here; callers decide what to surface.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::InferenceConfig;

const COMPLETIONS_PATH: &str = "/v1/chat/completions";
const HEALTH_PATH: &str = "/health";

#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("inference backend timed out after {after:?}")]
    Timeout { after: Duration },

    #[error("inference backend returned status {status}: {body}")]
    Http { status: u16, body: String },

    #[error("inference backend unreachable: {0}")]
    Transport(String),

    #[error("inference backend returned a malformed completion: {0}")]
    MalformedResponse(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PromptRole {
    System,
    User,
    Assistant,
}

/// One entry of the ordered prompt sent to the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptMessage {
    pub role: PromptRole,
    pub content: String,
}

impl PromptMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: PromptRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: PromptRole::User,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SamplingParams {
    pub temperature: f32,
    pub max_tokens: u32,
    pub top_p: f32,
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [PromptMessage],
    temperature: f32,
    max_tokens: u32,
    top_p: f32,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

/// Something that can turn a prompt into assistant text.
///
/// Carried in `AppState` as `Arc<dyn CompletionBackend>` so the conversation
/// pipeline can run against a scripted backend in tests.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    async fn complete(
        &self,
        model: &str,
        prompt: &[PromptMessage],
        params: &SamplingParams,
    ) -> Result<String, InferenceError>;

    /// Liveness check. Never fails; any problem reads as "unhealthy".
    async fn health(&self) -> bool;
}

/// HTTP client for the AI Core chat-completion endpoint.
#[derive(Clone)]
pub struct InferenceClient {
    client: Client,
    base_url: String,
    request_timeout: Duration,
    health_timeout: Duration,
}

impl InferenceClient {
    pub fn new(config: &InferenceConfig) -> Result<Self> {
        let client = Client::builder()
            .build()
            .context("Failed to build inference HTTP client")?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            request_timeout: config.request_timeout,
            health_timeout: config.health_timeout,
        })
    }

    fn classify(&self, err: reqwest::Error) -> InferenceError {
        if err.is_timeout() {
            InferenceError::Timeout {
                after: self.request_timeout,
            }
        } else if err.is_decode() {
            InferenceError::MalformedResponse(err.to_string())
        } else {
            InferenceError::Transport(err.to_string())
        }
    }
}

#[async_trait]
impl CompletionBackend for InferenceClient {
    async fn complete(
        &self,
        model: &str,
        prompt: &[PromptMessage],
        params: &SamplingParams,
    ) -> Result<String, InferenceError> {
        let request_body = ChatCompletionRequest {
            model,
            messages: prompt,
            temperature: params.temperature,
            max_tokens: params.max_tokens,
            top_p: params.top_p,
            stream: false,
        };

        let response = self
            .client
            .post(format!("{}{}", self.base_url, COMPLETIONS_PATH))
            .timeout(self.request_timeout)
            .json(&request_body)
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("Inference backend returned {status}: {body}");
            return Err(InferenceError::Http {
                status: status.as_u16(),
                body,
            });
        }

        let completion: ChatCompletionResponse =
            response.json().await.map_err(|e| self.classify(e))?;

        let text = completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| {
                InferenceError::MalformedResponse("completion carried no content".to_string())
            })?;

        debug!(
            "Inference call succeeded: model={model}, prompt_messages={}, reply_chars={}",
            prompt.len(),
            text.chars().count()
        );
        Ok(text)
    }

    async fn health(&self) -> bool {
        let check = self
            .client
            .get(format!("{}{}", self.base_url, HEALTH_PATH))
            .timeout(self.health_timeout)
            .send()
            .await;

        match check {
            Ok(response) => response.status() == reqwest::StatusCode::OK,
            Err(e) => {
                debug!("Inference health check failed: {e}");
                false
            }
        }
    }
}
