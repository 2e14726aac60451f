// src/core/completion_client.rs
//! HTTP client for the chat-completions endpoint.
//!
//! One outbound call per pipeline stage, no internal retries; retry policy
//! belongs to the caller. The provider requires an origin and application
//! title on every request, so both are attached as fixed headers.

use anyhow::Context;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, info};

use crate::config::CompletionSettings;

const CHAT_COMPLETIONS_PATH: &str = "/chat/completions";

/// One stage's completion call: model, instruction, rendered prompt, and the
/// sampling parameters appropriate to the stage.
#[derive(Debug, Clone)]
pub struct StageRequest {
    pub model: String,
    pub system: String,
    pub prompt: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

#[derive(Debug, Error)]
pub enum CompletionError {
    #[error("completion request failed: {0}")]
    Transport(String),
    #[error("completion service returned status {status}: {message}")]
    Server { status: u16, message: String },
    #[error("completion response is missing the expected content")]
    MalformedResponse,
}

impl CompletionError {
    /// HTTP status of the failure, when the request got far enough to have one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Server { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Capability interface the pipeline depends on; the production client talks
/// to the real endpoint, tests substitute their own.
#[async_trait]
pub trait CompletionService: Send + Sync {
    async fn complete(&self, request: StageRequest) -> Result<String, CompletionError>;
}

pub struct CompletionClient {
    client: Client,
    settings: CompletionSettings,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

impl CompletionClient {
    pub fn new(settings: CompletionSettings) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(settings.timeout_seconds))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client, settings })
    }
}

#[async_trait]
impl CompletionService for CompletionClient {
    async fn complete(&self, request: StageRequest) -> Result<String, CompletionError> {
        let url = format!("{}{}", self.settings.base_url, CHAT_COMPLETIONS_PATH);

        let body = ChatRequest {
            model: &request.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &request.system,
                },
                ChatMessage {
                    role: "user",
                    content: &request.prompt,
                },
            ],
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        };

        info!("Sending completion request to {} ({})", url, request.model);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.settings.api_key)
            .header("HTTP-Referer", &self.settings.referer)
            .header("X-Title", &self.settings.app_title)
            .json(&body)
            .send()
            .await
            .map_err(|e| CompletionError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            error!("Completion endpoint error {}: {}", status, message);
            return Err(CompletionError::Server {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|_| CompletionError::MalformedResponse)?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or(CompletionError::MalformedResponse)?;

        info!("Completion received ({} chars)", content.len());
        Ok(content)
    }
}
