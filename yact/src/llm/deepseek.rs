//! DeepSeek API client
//!
//! DeepSeek speaks the OpenAI Chat Completions protocol, so the same body
//! shape works against any OpenAI-compatible endpoint set as `base-url`.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info};

use super::{ChatMessage, LlmClient, LlmError};
use crate::config::ResolvedProviderConfig;

/// Sampling temperature sent with every request
const TEMPERATURE: f64 = 0.1;

/// DeepSeek (OpenAI-compatible) API client
pub struct DeepSeekClient {
    model: String,
    api_key: String,
    base_url: String,
    http: Client,
    max_tokens: u32,
}

impl DeepSeekClient {
    /// Create a new client from resolved configuration
    pub fn from_config(config: &ResolvedProviderConfig) -> Result<Self, LlmError> {
        debug!(?config, "from_config: called");
        let api_key = config
            .get_api_key()
            .map_err(|e| LlmError::MissingApiKey(e.to_string()))?;

        let timeout = Duration::from_millis(config.timeout_ms);
        let http = Client::builder().timeout(timeout).build().map_err(LlmError::Network)?;

        Ok(Self {
            model: config.model.clone(),
            api_key,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            http,
            max_tokens: config.max_tokens,
        })
    }

    /// Build the request body; the system prompt goes first as a system turn
    fn build_request_body(&self, messages: &[ChatMessage], system_prompt: &str) -> serde_json::Value {
        debug!(%self.model, message_count = messages.len(), "build_request_body: called");
        let mut turns = vec![serde_json::json!({
            "role": "system",
            "content": system_prompt,
        })];
        turns.extend(messages.iter().map(|m| serde_json::json!(m)));

        serde_json::json!({
            "model": self.model,
            "messages": turns,
            "max_tokens": self.max_tokens,
            "temperature": TEMPERATURE,
            "stream": false,
        })
    }
}

#[async_trait]
impl LlmClient for DeepSeekClient {
    fn provider(&self) -> &'static str {
        "deepseek"
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    async fn call(&self, messages: &[ChatMessage], system_prompt: &str) -> Result<String, LlmError> {
        debug!(%self.model, "call: called");
        let url = format!("{}/chat/completions", self.base_url);
        let body = self.build_request_body(messages, system_prompt);

        let response = self
            .http
            .post(url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = response.status().as_u16();
        if !response.status().is_success() {
            debug!(%status, "call: API error");
            let text = response.text().await.unwrap_or_default();
            return Err(LlmError::ApiError { status, message: text });
        }

        let api_response: ChatCompletionResponse = response.json().await?;
        if let Some(usage) = &api_response.usage {
            info!(
                model = %self.model,
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                "call: complete"
            );
        }

        let text = api_response.text();
        if text.trim().is_empty() {
            return Err(LlmError::EmptyResponse(self.provider().to_string()));
        }
        Ok(text)
    }
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
    usage: Option<ChatUsage>,
}

impl ChatCompletionResponse {
    fn text(&self) -> String {
        self.choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .unwrap_or_default()
    }
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatUsage {
    prompt_tokens: u64,
    completion_tokens: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, Provider};

    fn client() -> DeepSeekClient {
        let mut config = Config::default();
        config.set("providers.deepseek.api-key", "sk-test").unwrap();
        config.set("providers.deepseek.api-key-env", "YACT_TEST_UNSET_DEEPSEEK_KEY").unwrap();
        DeepSeekClient::from_config(&config.resolve(Provider::Deepseek)).unwrap()
    }

    #[test]
    fn test_build_request_body() {
        let client = client();
        let body = client.build_request_body(&[ChatMessage::user("hello")], "system rules");

        assert_eq!(body["model"], "deepseek-chat");
        assert_eq!(body["stream"], false);
        assert_eq!(body["max_tokens"], 8192);
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][0]["content"], "system rules");
        assert_eq!(body["messages"][1]["role"], "user");
        assert_eq!(body["messages"][1]["content"], "hello");
    }

    #[test]
    fn test_response_text() {
        let json = r#"{
            "choices": [{"index": 0, "message": {"role": "assistant", "content": "answer"}}],
            "usage": {"prompt_tokens": 3, "completion_tokens": 1, "total_tokens": 4}
        }"#;
        let response: ChatCompletionResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.text(), "answer");

        let empty: ChatCompletionResponse = serde_json::from_str(r#"{"choices": []}"#).unwrap();
        assert_eq!(empty.text(), "");
    }
}
