//! Model provider clients
//!
//! Every provider sits behind [`LlmClient`]; commands only ever see the
//! trait object returned by [`create_client`].

use std::sync::Arc;

use tracing::debug;

mod anthropic;
pub mod client;
mod deepseek;
mod error;
mod ollama;
mod types;

pub use anthropic::AnthropicClient;
pub use client::LlmClient;
pub use deepseek::DeepSeekClient;
pub use error::LlmError;
pub use ollama::OllamaClient;
pub use types::{ChatMessage, Role, to_chat_messages};

use crate::config::{Config, Provider};

/// Create a model client for `provider` from config
pub fn create_client(config: &Config, provider: Provider) -> Result<Arc<dyn LlmClient>, LlmError> {
    let resolved = config.resolve(provider);
    debug!(%provider, model = %resolved.model, "create_client: called");
    match provider {
        Provider::Anthropic => Ok(Arc::new(AnthropicClient::from_config(&resolved)?)),
        Provider::Deepseek => Ok(Arc::new(DeepSeekClient::from_config(&resolved)?)),
        Provider::Ollama => Ok(Arc::new(OllamaClient::from_config(&resolved)?)),
    }
}
