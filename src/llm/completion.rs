//! Completion client - one round trip to the model service
//!
//! Wraps an [`LLMProvider`] with the configured model, sampling options and a
//! per-call timeout, and classifies each response as final or tool-requesting.

use std::sync::Arc;
use std::time::Duration;

use crate::core::{Config, Message, Result, StockBotError, ToolDefinition, ToolInvocation};
use crate::llm::traits::{GenerateOptions, LLMProvider, TokenUsage};

/// Whether the model wants another round
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The model requested tool invocations
    Continue,
    /// The model produced its final answer
    Stop,
}

/// Normalized result of one completion call
#[derive(Debug, Clone)]
pub struct CompletionResult {
    pub content: Option<String>,
    pub tool_invocations: Vec<ToolInvocation>,
    pub stop_reason: StopReason,
    pub usage: Option<TokenUsage>,
    /// Model that produced the response, as reported by the provider
    pub model: String,
}

impl CompletionResult {
    /// Build a result, deriving the stop reason from the invocations.
    ///
    /// Providers disagree on finish reasons ("stop" with tool calls from
    /// Ollama, "tool_calls" from OpenAI), so presence of invocations decides.
    pub fn new(content: Option<String>, tool_invocations: Vec<ToolInvocation>) -> Self {
        let stop_reason = if tool_invocations.is_empty() {
            StopReason::Stop
        } else {
            StopReason::Continue
        };
        Self {
            content,
            tool_invocations,
            stop_reason,
            usage: None,
            model: String::new(),
        }
    }

    pub fn with_usage(mut self, usage: Option<TokenUsage>) -> Self {
        self.usage = usage;
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }
}

/// Client that sends a transcript plus capability descriptors to the model
#[derive(Clone)]
pub struct CompletionClient {
    provider: Arc<dyn LLMProvider>,
    model: String,
    temperature: f32,
    timeout: Duration,
}

impl CompletionClient {
    pub fn new(
        provider: Arc<dyn LLMProvider>,
        model: impl Into<String>,
        temperature: f32,
        timeout: Duration,
    ) -> Self {
        Self {
            provider,
            model: model.into(),
            temperature,
            timeout,
        }
    }

    /// Create a client using the model and timeout settings in `config`
    pub fn from_config(provider: Arc<dyn LLMProvider>, config: &Config) -> Self {
        Self::new(
            provider,
            config.model.name.clone(),
            config.model.temperature,
            Duration::from_secs(config.agent.completion_timeout_secs),
        )
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn set_model(&mut self, model: impl Into<String>) {
        self.model = model.into();
    }

    pub fn provider(&self) -> &Arc<dyn LLMProvider> {
        &self.provider
    }

    /// Send the transcript and return the model's next move.
    ///
    /// Any provider error becomes `CompletionFailure`; exceeding the timeout
    /// becomes `CompletionTimeout`.
    pub async fn complete(
        &self,
        transcript: &[Message],
        capabilities: &[ToolDefinition],
    ) -> Result<CompletionResult> {
        let options = GenerateOptions {
            temperature: Some(self.temperature),
            max_tokens: None,
        };

        let call = self
            .provider
            .chat_with_tools(&self.model, transcript, capabilities, Some(options));

        let response = match tokio::time::timeout(self.timeout, call).await {
            Err(_) => return Err(StockBotError::CompletionTimeout(self.timeout)),
            Ok(Err(e @ StockBotError::CompletionFailure(_))) => return Err(e),
            Ok(Err(other)) => return Err(StockBotError::completion(other.to_string())),
            Ok(Ok(response)) => response,
        };

        if let Some(reason @ ("length" | "content_filter")) = response.finish_reason.as_deref() {
            tracing::warn!(model = %self.model, reason, "Completion was cut short");
        }

        tracing::debug!(
            model = %self.model,
            invocations = response.tool_calls.len(),
            has_content = response.content.is_some(),
            "Completion received"
        );

        let model = if response.model.is_empty() {
            self.model.clone()
        } else {
            response.model
        };

        Ok(CompletionResult::new(response.content, response.tool_calls)
            .with_usage(response.usage)
            .with_model(model))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::traits::LLMResponse;
    use async_trait::async_trait;
    use serde_json::json;

    struct FixedProvider {
        response: Option<LLMResponse>,
        delay: Duration,
    }

    #[async_trait]
    impl LLMProvider for FixedProvider {
        async fn chat_with_tools(
            &self,
            _model: &str,
            _messages: &[Message],
            _tools: &[ToolDefinition],
            _options: Option<GenerateOptions>,
        ) -> Result<LLMResponse> {
            tokio::time::sleep(self.delay).await;
            self.response
                .clone()
                .ok_or_else(|| StockBotError::Other("service down".into()))
        }

        fn name(&self) -> &str {
            "fixed"
        }
    }

    fn client(response: Option<LLMResponse>, delay: Duration) -> CompletionClient {
        CompletionClient::new(
            Arc::new(FixedProvider { response, delay }),
            "test-model",
            0.0,
            Duration::from_millis(50),
        )
    }

    #[tokio::test]
    async fn test_tool_calls_mean_continue() {
        let response = LLMResponse {
            tool_calls: vec![ToolInvocation::new("c1", "get_symbol", json!({"company": "Nvidia"}))],
            finish_reason: Some("stop".into()),
            ..Default::default()
        };
        let result = client(Some(response), Duration::ZERO)
            .complete(&[Message::user("hi")], &[])
            .await
            .unwrap();
        assert_eq!(result.stop_reason, StopReason::Continue);
        assert_eq!(result.tool_invocations.len(), 1);
    }

    #[tokio::test]
    async fn test_plain_text_means_stop() {
        let response = LLMResponse {
            content: Some("Hello!".into()),
            finish_reason: Some("length".into()),
            ..Default::default()
        };
        let result = client(Some(response), Duration::ZERO)
            .complete(&[Message::user("hi")], &[])
            .await
            .unwrap();
        assert_eq!(result.stop_reason, StopReason::Stop);
        assert_eq!(result.content.as_deref(), Some("Hello!"));
    }

    #[tokio::test]
    async fn test_provider_errors_become_completion_failures() {
        let err = client(None, Duration::ZERO)
            .complete(&[Message::user("hi")], &[])
            .await
            .unwrap_err();
        assert!(matches!(err, StockBotError::CompletionFailure(ref m) if m.contains("service down")));
    }

    #[tokio::test]
    async fn test_slow_provider_times_out() {
        let err = client(Some(LLMResponse::default()), Duration::from_secs(5))
            .complete(&[Message::user("hi")], &[])
            .await
            .unwrap_err();
        assert!(matches!(err, StockBotError::CompletionTimeout(_)));
    }
}
