//! LLM module - Language Model integrations
//!
//! Provides abstractions for different LLM backends with OpenAI as the default.

pub mod completion;
pub mod ollama;
pub mod openai;
pub mod traits;

use std::sync::Arc;

use crate::core::{Config, ProviderType, Result};

pub use completion::{CompletionClient, CompletionResult, StopReason};
pub use ollama::OllamaClient;
pub use openai::OpenAiClient;
pub use traits::{GenerateOptions, LLMProvider, LLMResponse, TokenUsage};

/// Create a new LLM provider based on configuration
pub fn create_provider(config: &Config) -> Result<Arc<dyn LLMProvider>> {
    let provider: Arc<dyn LLMProvider> = match config.provider {
        ProviderType::OpenAi => Arc::new(OpenAiClient::from_config(config)?),
        ProviderType::Ollama => Arc::new(OllamaClient::from_config(config)?),
    };
    Ok(provider)
}
