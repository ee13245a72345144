//! Ollama client implementation
//!
//! Async HTTP client for the Ollama `/api/chat` endpoint with tool calling.

use async_trait::async_trait;
use rand::distr::{Alphanumeric, SampleString};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::core::{Config, Message, Result, Role, StockBotError, ToolDefinition, ToolInvocation};
use crate::llm::traits::{GenerateOptions, LLMProvider, LLMResponse, TokenUsage};

/// Ollama API client
#[derive(Clone)]
pub struct OllamaClient {
    client: Client,
    base_url: String,
}

/// Ollama chat request
#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<OllamaMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<&'a [ToolDefinition]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<OllamaOptions>,
    stream: bool,
}

/// Ollama message format
#[derive(Debug, Serialize, Deserialize)]
struct OllamaMessage {
    role: String,
    #[serde(default)]
    content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<OllamaToolCall>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tool_name: Option<String>,
}

/// Ollama tool call format
#[derive(Debug, Clone, Serialize, Deserialize)]
struct OllamaToolCall {
    function: OllamaFunction,
}

/// Ollama function in tool call
#[derive(Debug, Clone, Serialize, Deserialize)]
struct OllamaFunction {
    name: String,
    #[serde(default)]
    arguments: serde_json::Value,
}

/// Ollama generation options
#[derive(Debug, Serialize)]
struct OllamaOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<u32>,
}

/// Ollama chat response (non-streaming)
#[derive(Debug, Deserialize)]
struct ChatResponse {
    message: OllamaMessage,
    model: String,
    #[serde(default)]
    done_reason: Option<String>,
    #[serde(default)]
    prompt_eval_count: Option<u32>,
    #[serde(default)]
    eval_count: Option<u32>,
}

/// Ollama models list response
#[derive(Debug, Deserialize)]
struct ModelsResponse {
    models: Vec<ModelInfo>,
}

/// Model information
#[derive(Debug, Deserialize)]
struct ModelInfo {
    name: String,
}

/// Ollama does not id its tool calls, so correlation ids are minted here
fn new_call_id() -> String {
    format!("call_{}", Alphanumeric.sample_string(&mut rand::rng(), 16))
}

impl OllamaClient {
    /// Create a new Ollama client from configuration
    pub fn from_config(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.ollama.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.ollama_url(),
        })
    }

    /// Convert internal Message to Ollama format
    fn to_ollama_message(msg: &Message) -> OllamaMessage {
        OllamaMessage {
            role: msg.role.as_str().to_string(),
            content: msg.text().to_string(),
            tool_calls: msg.tool_invocations.as_ref().map(|calls| {
                calls
                    .iter()
                    .map(|tc| OllamaToolCall {
                        function: OllamaFunction {
                            name: tc.name.clone(),
                            arguments: tc.arguments.clone(),
                        },
                    })
                    .collect()
            }),
            tool_name: match msg.role {
                Role::Tool => msg.name.clone(),
                _ => None,
            },
        }
    }

    /// Convert Ollama response to LLMResponse
    fn to_llm_response(response: ChatResponse) -> LLMResponse {
        let tool_calls = response
            .message
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .map(|tc| ToolInvocation::new(new_call_id(), tc.function.name, tc.function.arguments))
            .collect();

        let usage = match (response.prompt_eval_count, response.eval_count) {
            (Some(prompt), Some(completion)) => Some(TokenUsage::new(prompt, completion)),
            _ => None,
        };

        let content = response.message.content;
        LLMResponse {
            content: (!content.is_empty()).then_some(content),
            tool_calls,
            finish_reason: response.done_reason,
            usage,
            model: response.model,
        }
    }

    fn connect_error(&self, e: reqwest::Error) -> StockBotError {
        if e.is_connect() {
            StockBotError::completion(format!(
                "Cannot connect to Ollama at {}. Is it running?",
                self.base_url
            ))
        } else {
            StockBotError::completion(e.to_string())
        }
    }
}

#[async_trait]
impl LLMProvider for OllamaClient {
    async fn chat_with_tools(
        &self,
        model: &str,
        messages: &[Message],
        tools: &[ToolDefinition],
        options: Option<GenerateOptions>,
    ) -> Result<LLMResponse> {
        let request = ChatRequest {
            model,
            messages: messages.iter().map(Self::to_ollama_message).collect(),
            tools: (!tools.is_empty()).then_some(tools),
            options: options.map(|opts| OllamaOptions {
                temperature: opts.temperature,
                num_predict: opts.max_tokens,
            }),
            stream: false,
        };

        tracing::debug!(model, messages = request.messages.len(), "Sending Ollama chat request");

        let response = self
            .client
            .post(format!("{}/api/chat", self.base_url))
            .json(&request)
            .send()
            .await
            .map_err(|e| self.connect_error(e))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();

            if status.as_u16() == 404 && error_text.contains("not found") {
                return Err(StockBotError::completion(format!(
                    "Model '{}' not available in Ollama. Run: ollama pull {}",
                    model, model
                )));
            }

            return Err(StockBotError::completion(format!(
                "Ollama API error ({}): {}",
                status, error_text
            )));
        }

        let response_text = response
            .text()
            .await
            .map_err(|e| StockBotError::completion(e.to_string()))?;

        let chat_response: ChatResponse = serde_json::from_str(&response_text)
            .map_err(|e| StockBotError::completion(format!("Failed to parse response: {}", e)))?;

        Ok(Self::to_llm_response(chat_response))
    }

    async fn is_model_available(&self, model: &str) -> Result<bool> {
        let response = self
            .client
            .get(format!("{}/api/tags", self.base_url))
            .send()
            .await
            .map_err(|e| self.connect_error(e))?;

        if !response.status().is_success() {
            return Err(StockBotError::completion("Failed to list Ollama models"));
        }

        let models: ModelsResponse = response.json().await?;
        Ok(models
            .models
            .iter()
            .any(|m| m.name == model || m.name.split(':').next() == model.split(':').next()))
    }

    fn name(&self) -> &str {
        "ollama"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_client_creation() {
        let mut config = Config::default();
        config.ollama.host = "localhost".into();
        config.ollama.port = 11434;
        let client = OllamaClient::from_config(&config).unwrap();
        assert_eq!(client.base_url, "http://localhost:11434");
    }

    #[test]
    fn test_message_conversion() {
        let msg = Message::user("Hello");
        let ollama_msg = OllamaClient::to_ollama_message(&msg);
        assert_eq!(ollama_msg.role, "user");
        assert_eq!(ollama_msg.content, "Hello");

        let tool = Message::tool_result("call_1", "get_symbol", r#"{"result":"NVDA"}"#);
        let ollama_tool = OllamaClient::to_ollama_message(&tool);
        assert_eq!(ollama_tool.role, "tool");
        assert_eq!(ollama_tool.tool_name.as_deref(), Some("get_symbol"));
    }

    #[test]
    fn test_tool_calls_get_unique_ids() {
        let response: ChatResponse = serde_json::from_value(json!({
            "model": "qwen3:8b",
            "message": {
                "role": "assistant",
                "content": "",
                "tool_calls": [
                    { "function": { "name": "get_symbol", "arguments": { "company": "Nvidia" } } },
                    { "function": { "name": "get_symbol", "arguments": { "company": "AMD" } } }
                ]
            },
            "done_reason": "stop",
            "prompt_eval_count": 50,
            "eval_count": 10
        }))
        .unwrap();

        let llm = OllamaClient::to_llm_response(response);
        assert!(llm.content.is_none());
        assert_eq!(llm.tool_calls.len(), 2);
        assert!(llm.tool_calls[0].id.starts_with("call_"));
        assert_ne!(llm.tool_calls[0].id, llm.tool_calls[1].id);
        assert_eq!(llm.tool_calls[1].arguments, json!({"company": "AMD"}));
        assert_eq!(llm.usage.unwrap().total_tokens, 60);
    }
}
