//! LlmClient trait definition

use async_trait::async_trait;

use super::{ChatMessage, LlmError};

/// Stateless model client; each call carries the whole conversation
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Provider name used in messages, e.g. "anthropic"
    fn provider(&self) -> &'static str;

    /// Model identifier sent with each request
    fn model_name(&self) -> &str;

    /// Send the conversation and return the reply text
    async fn call(&self, messages: &[ChatMessage], system_prompt: &str) -> Result<String, LlmError>;
}
