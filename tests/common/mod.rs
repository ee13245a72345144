//! Shared test doubles: scripted model providers and mock stock capabilities

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use futures::FutureExt;
use serde_json::{json, Value};

use stockbot::core::{Message, Role, ToolDefinition, ToolInvocation};
use stockbot::llm::{GenerateOptions, LLMProvider, LLMResponse};
use stockbot::tools::{schema, CapabilityRegistry};
use stockbot::{Agent, Config, ProviderType, Result, StockBotError};

type Responder = Box<dyn Fn(&[Message]) -> String + Send + Sync>;

/// One scripted model response
pub enum Step {
    /// Final text answer
    Text(String),
    /// Final answer computed from the transcript the model was sent
    Reply(Responder),
    /// Request these tool invocations
    Calls(Vec<ToolInvocation>),
    /// Fail the completion call
    Fail(String),
    /// Never answer
    Hang,
}

pub fn text(content: &str) -> Step {
    Step::Text(content.to_string())
}

pub fn reply(f: impl Fn(&[Message]) -> String + Send + Sync + 'static) -> Step {
    Step::Reply(Box::new(f))
}

pub fn call(id: &str, name: &str, arguments: Value) -> Step {
    Step::Calls(vec![ToolInvocation::new(id, name, arguments)])
}

pub fn calls(invocations: &[(&str, &str, Value)]) -> Step {
    Step::Calls(
        invocations
            .iter()
            .map(|(id, name, args)| ToolInvocation::new(*id, *name, args.clone()))
            .collect(),
    )
}

/// Provider that plays back a fixed script and records every request
#[derive(Default)]
pub struct ScriptedProvider {
    script: Mutex<VecDeque<Step>>,
    requests: Mutex<Vec<Vec<Message>>>,
    tool_counts: Mutex<Vec<usize>>,
}

impl ScriptedProvider {
    pub fn new(steps: Vec<Step>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(steps.into()),
            ..Default::default()
        })
    }

    /// Transcripts sent to the model, one per completion call
    pub fn requests(&self) -> Vec<Vec<Message>> {
        self.requests.lock().unwrap().clone()
    }

    /// Number of capability descriptors sent with each call
    pub fn tool_counts(&self) -> Vec<usize> {
        self.tool_counts.lock().unwrap().clone()
    }

    pub fn calls_made(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl LLMProvider for ScriptedProvider {
    async fn chat_with_tools(
        &self,
        _model: &str,
        messages: &[Message],
        tools: &[ToolDefinition],
        _options: Option<GenerateOptions>,
    ) -> Result<LLMResponse> {
        self.requests.lock().unwrap().push(messages.to_vec());
        self.tool_counts.lock().unwrap().push(tools.len());

        let step = self.script.lock().unwrap().pop_front();
        match step {
            Some(Step::Text(content)) => Ok(LLMResponse {
                content: Some(content),
                finish_reason: Some("stop".into()),
                ..Default::default()
            }),
            Some(Step::Reply(f)) => Ok(LLMResponse {
                content: Some(f(messages)),
                finish_reason: Some("stop".into()),
                ..Default::default()
            }),
            Some(Step::Calls(invocations)) => Ok(LLMResponse {
                tool_calls: invocations,
                finish_reason: Some("tool_calls".into()),
                ..Default::default()
            }),
            Some(Step::Fail(reason)) => Err(StockBotError::completion(reason)),
            Some(Step::Hang) => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Err(StockBotError::completion("unreachable"))
            }
            None => Err(StockBotError::completion("script exhausted")),
        }
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

/// Provider that answers every turn by echoing the latest user message
pub struct EchoProvider;

#[async_trait]
impl LLMProvider for EchoProvider {
    async fn chat_with_tools(
        &self,
        _model: &str,
        messages: &[Message],
        _tools: &[ToolDefinition],
        _options: Option<GenerateOptions>,
    ) -> Result<LLMResponse> {
        tokio::time::sleep(Duration::from_millis(20)).await;
        let last_user = messages
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .map(|m| m.text().to_string())
            .unwrap_or_default();
        Ok(LLMResponse {
            content: Some(format!("echo: {}", last_user)),
            ..Default::default()
        })
    }

    fn name(&self) -> &str {
        "echo"
    }
}

/// Invocation counters for the mock stock capabilities
#[derive(Clone, Default)]
pub struct Counters {
    pub symbol: Arc<AtomicUsize>,
    pub price: Arc<AtomicUsize>,
}

impl Counters {
    pub fn symbol_calls(&self) -> usize {
        self.symbol.load(Ordering::SeqCst)
    }

    pub fn price_calls(&self) -> usize {
        self.price.load(Ordering::SeqCst)
    }

    pub fn total(&self) -> usize {
        self.symbol_calls() + self.price_calls()
    }
}

/// Offline stand-ins for `get_symbol` and `get_stock_price`.
///
/// Known companies: Nvidia (NVDA, slow to resolve) and AMD. Only NVDA has
/// price data.
pub fn mock_stock_registry() -> (CapabilityRegistry, Counters) {
    let counters = Counters::default();
    let mut registry = CapabilityRegistry::new();

    let symbol_calls = counters.symbol.clone();
    registry
        .register_fn(
            "get_symbol",
            "Resolve a company name to its ticker symbol",
            schema::string_fields(&[("company", "Company name")]),
            move |args| {
                symbol_calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    let company = args["company"].as_str().unwrap_or_default().to_string();
                    match company.as_str() {
                        "Nvidia" => {
                            tokio::time::sleep(Duration::from_millis(100)).await;
                            Ok(json!("NVDA"))
                        }
                        "AMD" => Ok(json!("AMD")),
                        _ => Err(StockBotError::LookupNotFound(company)),
                    }
                }
                .boxed()
            },
        )
        .unwrap();

    let price_calls = counters.price.clone();
    registry
        .register_fn(
            "get_stock_price",
            "Latest price bar for a ticker symbol",
            schema::string_fields(&[("symbol", "Ticker symbol")]),
            move |args| {
                price_calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    let symbol = args["symbol"].as_str().unwrap_or_default().to_string();
                    if symbol == "NVDA" {
                        Ok(json!({
                            "timestamp": "2024-06-12T15:59:00-04:00",
                            "open": 120.1,
                            "high": 120.9,
                            "low": 119.8,
                            "close": 120.5,
                            "volume": 1_234_567
                        }))
                    } else {
                        Err(StockBotError::data_unavailable(symbol, "no bars for today"))
                    }
                }
                .boxed()
            },
        )
        .unwrap();

    (registry, counters)
}

/// Configuration that needs no network or credentials
pub fn test_config() -> Config {
    let mut config = Config::default();
    config.provider = ProviderType::OpenAi;
    config.openai.api_key = Some("sk-test".into());
    config.model.name = "test-model".into();
    config.agent.max_iterations = 5;
    config.agent.completion_timeout_secs = 1;
    config.agent.tool_timeout_secs = 1;
    config.agent.parallel_tools = true;
    config
}

pub fn build_agent(
    config: Config,
    provider: Arc<dyn LLMProvider>,
    registry: CapabilityRegistry,
) -> Agent {
    Agent::builder()
        .config(config)
        .provider(provider)
        .registry(registry)
        .build()
        .unwrap()
}

/// Parsed payload of the latest tool message
pub fn last_tool_payload(messages: &[Message]) -> Value {
    messages
        .iter()
        .rev()
        .find(|m| m.role == Role::Tool)
        .and_then(|m| serde_json::from_str(m.text()).ok())
        .unwrap_or(Value::Null)
}

/// Tool messages, in transcript order
pub fn tool_messages(messages: &[Message]) -> Vec<&Message> {
    messages.iter().filter(|m| m.role == Role::Tool).collect()
}
