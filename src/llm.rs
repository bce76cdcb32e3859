//! Inference client for OpenAI-compatible chat-completion endpoints
//!
//! One prompt in, the first choice's text out. No retries, no backoff and no
//! request timeout: a hung endpoint blocks the caller.

use crate::config::AssistantConfig;
use crate::error::{AssistantError, Result};
use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, warn};

/// Seam between the pipeline and whatever produces completions
#[async_trait]
pub trait ChatCompletion: Send + Sync {
    /// Send `prompt` as a single user message and return the reply text, trimmed
    async fn complete(&self, prompt: &str, temperature: f32) -> Result<String>;
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Clone, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    temperature: f32,
}

#[derive(Clone)]
pub struct LlmClient {
    api_key: String,
    base_url: String,
    model: String,
    http: reqwest::Client,
}

impl LlmClient {
    pub fn new(api_key: String, model: String, base_url: String) -> Self {
        Self {
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
            http: reqwest::Client::new(),
        }
    }

    pub fn from_config(config: &AssistantConfig) -> Self {
        Self::new(
            config.api_key.clone(),
            config.model.clone(),
            config.base_url.clone(),
        )
    }

    pub async fn call_llm(&self, prompt: &str, temperature: f32) -> Result<String> {
        let body = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
            temperature,
        };

        debug!(model = %self.model, temperature, "Calling chat completions");
        let response = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| AssistantError::Llm(format!("LLM API call failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AssistantError::Llm(format!(
                "LLM API error ({}): {}",
                status, error_text
            )));
        }

        let response_json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| AssistantError::Llm(format!("Failed to parse LLM response: {}", e)))?;

        extract_content(&response_json)
    }
}

#[async_trait]
impl ChatCompletion for LlmClient {
    async fn complete(&self, prompt: &str, temperature: f32) -> Result<String> {
        self.call_llm(prompt, temperature).await
    }
}

/// Pull the first choice's message content out of a chat-completions response
fn extract_content(response_json: &serde_json::Value) -> Result<String> {
    if let Some(error) = response_json.get("error") {
        return Err(AssistantError::Llm(format!("LLM API error: {}", error)));
    }

    let choices = response_json
        .get("choices")
        .and_then(|c| c.as_array())
        .ok_or_else(|| {
            AssistantError::Llm(format!("No choices array in LLM response: {}", response_json))
        })?;

    let first = choices
        .first()
        .ok_or_else(|| AssistantError::Llm("Empty choices array in LLM response".to_string()))?;

    if first.get("finish_reason").and_then(|r| r.as_str()) == Some("length") {
        warn!("LLM response was truncated due to length limit");
    }

    let content = first["message"]["content"]
        .as_str()
        .ok_or_else(|| AssistantError::Llm(format!("No content in LLM response: {}", first)))?
        .trim();

    if content.is_empty() {
        return Err(AssistantError::Llm("Empty content in LLM response".to_string()));
    }

    Ok(content.to_string())
}
