//! Agent orchestrator
//!
//! Main agent that coordinates between the model, capabilities, and session
//! transcripts. Each turn runs a small state machine:
//! `AwaitingModel` → `ExecutingTools` → `AwaitingModel` … → `Done`.

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;

use crate::agent::conversation::Transcript;
use crate::agent::loop_state::{ToolOutcome, TurnLoopState, TurnState};
use crate::agent::session::SessionManager;
use crate::core::{Config, Message, Result, StockBotError, ToolDefinition, ToolInvocation};
use crate::llm::{create_provider, CompletionClient, LLMProvider, StopReason, TokenUsage};
use crate::tools::CapabilityRegistry;

/// Shown to the user when a turn fails
pub const APOLOGY: &str = "Sorry, I couldn't get an answer for that right now. Please try again.";

/// Used when the model stops without any text
pub const EMPTY_ANSWER: &str = "I'm sorry, I don't have an answer for that.";

/// Result of one successful turn
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnOutcome {
    /// Final answer shown to the user
    pub answer: String,
    /// Completion calls made during the turn
    pub completion_calls: usize,
    /// Capability invocations resolved during the turn
    pub tool_invocations: usize,
    /// Tokens summed over every completion call that reported usage
    pub usage: TokenUsage,
}

/// Builder for [`Agent`]
#[derive(Default)]
pub struct AgentBuilder {
    config: Option<Config>,
    provider: Option<Arc<dyn LLMProvider>>,
    registry: Option<CapabilityRegistry>,
}

impl AgentBuilder {
    /// Set the configuration
    pub fn config(mut self, config: Config) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the model provider
    pub fn provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Set the capability registry
    pub fn registry(mut self, registry: CapabilityRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Build the agent.
    ///
    /// Missing pieces come from the configuration: the configured provider
    /// and the Yahoo Finance capabilities. A zero iteration limit is rejected
    /// since no turn could ever finish.
    pub fn build(self) -> Result<Agent> {
        let config = self.config.unwrap_or_default();
        if config.agent.max_iterations == 0 {
            return Err(StockBotError::config(
                "agent.max_iterations must be at least 1",
            ));
        }

        let provider = match self.provider {
            Some(provider) => provider,
            None => create_provider(&config)?,
        };

        let registry = match self.registry {
            Some(registry) => registry,
            None => CapabilityRegistry::with_stock_tools(&config.finance)?,
        };

        let completion = CompletionClient::from_config(provider, &config);
        let capabilities = registry.describe_all();
        let sessions = SessionManager::new(Some(config.system_prompt().to_string()));

        Ok(Agent {
            config,
            completion,
            registry: Arc::new(registry),
            capabilities,
            sessions,
        })
    }
}

/// Main agent that orchestrates the model and capabilities
pub struct Agent {
    /// Configuration
    config: Config,
    /// Model client
    completion: CompletionClient,
    /// Capability registry (wrapped in Arc for sharing across turns)
    registry: Arc<CapabilityRegistry>,
    /// Descriptors sent with every completion call
    capabilities: Vec<ToolDefinition>,
    /// Transcripts by session id
    sessions: SessionManager,
}

impl Agent {
    /// Create a builder
    pub fn builder() -> AgentBuilder {
        AgentBuilder::default()
    }

    /// Create an agent with the configured provider and stock capabilities
    pub fn from_config(config: Config) -> Result<Self> {
        Self::builder().config(config).build()
    }

    /// Check configuration and that the model can be reached
    pub async fn initialize(&self) -> Result<()> {
        self.config.validate()?;

        if self.registry.is_empty() {
            return Err(StockBotError::config("no capabilities are registered"));
        }

        let model = self.completion.model();
        if !self.completion.provider().is_model_available(model).await? {
            return Err(StockBotError::config(format!(
                "model '{}' is not available from {}",
                model,
                self.completion.provider().name()
            )));
        }

        tracing::info!(
            provider = self.completion.provider().name(),
            model,
            capabilities = self.registry.len(),
            "Agent initialized"
        );
        Ok(())
    }

    /// Run one turn for `session_id`, propagating failures.
    ///
    /// On failure the session's transcript is left as it was before the turn.
    pub async fn chat(&self, session_id: &str, text: &str) -> Result<TurnOutcome> {
        let handle = self.sessions.start_or_resume(session_id);
        let mut transcript = handle.lock().await;

        tracing::info!(session = session_id, "Turn started");
        let outcome = self.run_turn(&mut transcript, text).await;

        match &outcome {
            Ok(turn) => tracing::info!(
                session = session_id,
                completion_calls = turn.completion_calls,
                tool_invocations = turn.tool_invocations,
                total_tokens = turn.usage.total_tokens,
                "Turn complete"
            ),
            Err(e) => tracing::warn!(session = session_id, error = %e, "Turn failed"),
        }
        outcome
    }

    /// Run one turn and return text for the user, apologizing on failure
    pub async fn reply(&self, session_id: &str, text: &str) -> String {
        match self.chat(session_id, text).await {
            Ok(turn) => turn.answer,
            Err(e) => {
                tracing::error!(session = session_id, error = %e, "Could not answer");
                APOLOGY.to_string()
            }
        }
    }

    /// Drive `transcript` through one turn, rolling back on failure
    pub async fn run_turn(&self, transcript: &mut Transcript, text: &str) -> Result<TurnOutcome> {
        let checkpoint = transcript.checkpoint();
        transcript.add_user(text);

        let result = self.resolve(transcript).await;
        if result.is_err() {
            transcript.rollback(checkpoint);
        }
        result
    }

    async fn resolve(&self, transcript: &mut Transcript) -> Result<TurnOutcome> {
        let mut state = TurnLoopState::new(self.config.agent.max_iterations);
        let mut current = TurnState::AwaitingModel;
        let mut usage = TokenUsage::default();

        loop {
            current = match current {
                TurnState::AwaitingModel => {
                    debug_assert!(transcript.pending_invocations().is_empty());
                    state.next_call();
                    let completion = self
                        .completion
                        .complete(transcript.messages(), &self.capabilities)
                        .await?;
                    if let Some(reported) = completion.usage {
                        usage += reported;
                    }
                    tracing::debug!(
                        call = state.completion_calls,
                        model = %completion.model,
                        "Model responded"
                    );

                    match completion.stop_reason {
                        StopReason::Stop => {
                            let answer = completion
                                .content
                                .filter(|c| !c.trim().is_empty())
                                .unwrap_or_else(|| EMPTY_ANSWER.to_string());
                            transcript.add_assistant(answer.clone());
                            TurnState::Done(answer)
                        }
                        StopReason::Continue if state.at_limit() => {
                            tracing::warn!(
                                max_calls = state.max_calls,
                                pending = completion.tool_invocations.len(),
                                "Model still requesting tools at iteration limit"
                            );
                            return Err(StockBotError::LoopLimitExceeded(state.max_calls));
                        }
                        StopReason::Continue => {
                            transcript.push(Message::assistant_tool_request(
                                completion.content,
                                completion.tool_invocations.clone(),
                            ));
                            TurnState::ExecutingTools(completion.tool_invocations)
                        }
                    }
                }
                TurnState::ExecutingTools(pending) => {
                    let outcomes = self.execute_tools(&pending).await;
                    state.record_invocations(outcomes.len());
                    for outcome in outcomes {
                        transcript.push(outcome.into_message());
                    }
                    TurnState::AwaitingModel
                }
                TurnState::Done(answer) => {
                    return Ok(TurnOutcome {
                        answer,
                        completion_calls: state.completion_calls,
                        tool_invocations: state.tool_invocations,
                        usage,
                    });
                }
            };
        }
    }

    /// Resolve every pending invocation, results in emission order
    async fn execute_tools(&self, pending: &[ToolInvocation]) -> Vec<ToolOutcome> {
        if self.config.agent.parallel_tools && pending.len() > 1 {
            return join_all(pending.iter().map(|inv| self.execute_tool(inv))).await;
        }

        let mut outcomes = Vec::with_capacity(pending.len());
        for invocation in pending {
            outcomes.push(self.execute_tool(invocation).await);
        }
        outcomes
    }

    async fn execute_tool(&self, invocation: &ToolInvocation) -> ToolOutcome {
        let limit = Duration::from_secs(self.config.agent.tool_timeout_secs);
        let call = self.registry.invoke(&invocation.name, &invocation.arguments);

        let result = match tokio::time::timeout(limit, call).await {
            Ok(result) => result,
            Err(_) => Err(StockBotError::execution(
                &invocation.name,
                format!("timed out after {}s", limit.as_secs()),
            )),
        };

        match result {
            Ok(value) => {
                tracing::debug!(capability = %invocation.name, id = %invocation.id, "Capability succeeded");
                ToolOutcome::success(invocation, value)
            }
            Err(e) => {
                tracing::warn!(capability = %invocation.name, id = %invocation.id, error = %e, "Capability failed");
                ToolOutcome::failure(invocation, &e)
            }
        }
    }

    /// Clear a session's history, keeping the system prompt
    pub async fn clear_session(&self, session_id: &str) -> bool {
        self.sessions.clear(session_id).await
    }

    /// Messages of a session, empty if it does not exist
    pub async fn history(&self, session_id: &str) -> Vec<Message> {
        self.sessions
            .snapshot(session_id)
            .await
            .map(|t| t.messages().to_vec())
            .unwrap_or_default()
    }

    /// Session transcripts
    pub fn sessions(&self) -> &SessionManager {
        &self.sessions
    }

    /// Descriptors of the registered capabilities
    pub fn capabilities(&self) -> &[ToolDefinition] {
        &self.capabilities
    }

    /// Get current configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Name of the model provider
    pub fn provider_name(&self) -> &str {
        self.completion.provider().name()
    }

    /// Current model
    pub fn model(&self) -> &str {
        self.completion.model()
    }

    /// Switch model for subsequent turns
    pub fn set_model(&mut self, model: impl Into<String>) {
        let model = model.into();
        self.config.model.name = model.clone();
        self.completion.set_model(model);
    }

    /// Enable debug mode
    pub fn set_debug(&mut self, debug: bool) {
        self.config.agent.debug = debug;
    }

    pub fn is_debug(&self) -> bool {
        self.config.agent.debug
    }
}
