//! Ollama API client
//!
//! Talks to a local Ollama server through `/api/chat`. No API key is
//! needed.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info};

use super::{ChatMessage, LlmClient, LlmError};
use crate::config::ResolvedProviderConfig;

const TEMPERATURE: f64 = 0.1;

/// Ollama chat API client
pub struct OllamaClient {
    model: String,
    base_url: String,
    http: Client,
    max_tokens: u32,
}

impl OllamaClient {
    pub fn from_config(config: &ResolvedProviderConfig) -> Result<Self, LlmError> {
        debug!(?config, "from_config: called");
        let timeout = Duration::from_millis(config.timeout_ms);
        let http = Client::builder().timeout(timeout).build().map_err(LlmError::Network)?;

        Ok(Self {
            model: config.model.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            http,
            max_tokens: config.max_tokens,
        })
    }

    fn build_request_body(&self, messages: &[ChatMessage], system_prompt: &str) -> serde_json::Value {
        debug!(%self.model, message_count = messages.len(), "build_request_body: called");
        let mut turns = Vec::with_capacity(messages.len() + 1);
        if !system_prompt.is_empty() {
            turns.push(serde_json::json!({
                "role": "system",
                "content": system_prompt,
            }));
        }
        turns.extend(messages.iter().map(|m| serde_json::json!(m)));

        serde_json::json!({
            "model": self.model,
            "messages": turns,
            "stream": false,
            "options": {
                "temperature": TEMPERATURE,
                "num_predict": self.max_tokens,
            },
        })
    }
}

#[async_trait]
impl LlmClient for OllamaClient {
    fn provider(&self) -> &'static str {
        "ollama"
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    async fn call(&self, messages: &[ChatMessage], system_prompt: &str) -> Result<String, LlmError> {
        debug!(%self.model, "call: called");
        let url = format!("{}/api/chat", self.base_url);
        let body = self.build_request_body(messages, system_prompt);

        let response = self.http.post(url).json(&body).send().await?;

        let status = response.status().as_u16();
        if !response.status().is_success() {
            debug!(%status, "call: API error");
            let text = response.text().await.unwrap_or_default();
            return Err(LlmError::ApiError { status, message: text });
        }

        let api_response: OllamaChatResponse = response.json().await?;
        info!(
            model = %self.model,
            prompt_eval_count = api_response.prompt_eval_count,
            eval_count = api_response.eval_count,
            done_reason = ?api_response.done_reason,
            "call: complete"
        );

        let text = api_response.message.map(|m| m.content).unwrap_or_default();
        if text.trim().is_empty() {
            return Err(LlmError::EmptyResponse(self.provider().to_string()));
        }
        Ok(text)
    }
}

#[derive(Debug, Deserialize)]
struct OllamaChatResponse {
    message: Option<OllamaMessage>,
    #[serde(default)]
    prompt_eval_count: u64,
    #[serde(default)]
    eval_count: u64,
    done_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OllamaMessage {
    content: String,
}
