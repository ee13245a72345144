//! Turn loop state management
//!
//! Tracks where a turn is in the model/tool cycle and folds capability
//! results into tool messages.

use serde_json::{json, Value};

use crate::core::{Message, StockBotError, ToolInvocation};

/// Where a turn currently is
#[derive(Debug, Clone, PartialEq)]
pub enum TurnState {
    /// Waiting for the next completion
    AwaitingModel,
    /// Invocations from the last completion that still need results
    ExecutingTools(Vec<ToolInvocation>),
    /// Final answer produced
    Done(String),
}

/// Counters for one turn, bounded by the iteration limit
#[derive(Debug, Clone)]
pub struct TurnLoopState {
    /// Completion calls made so far
    pub completion_calls: usize,
    /// Maximum completion calls allowed
    pub max_calls: usize,
    /// Capability invocations resolved so far
    pub tool_invocations: usize,
}

impl TurnLoopState {
    /// Create a new loop state with the given call limit
    pub fn new(max_calls: usize) -> Self {
        Self {
            completion_calls: 0,
            max_calls,
            tool_invocations: 0,
        }
    }

    /// Count a completion call
    pub fn next_call(&mut self) {
        self.completion_calls += 1;
    }

    /// True once the last allowed completion call has been made
    pub fn at_limit(&self) -> bool {
        self.completion_calls >= self.max_calls
    }

    pub fn record_invocations(&mut self, count: usize) {
        self.tool_invocations += count;
    }
}

/// Result of one capability invocation, ready for the transcript
#[derive(Debug, Clone, PartialEq)]
pub struct ToolOutcome {
    pub invocation_id: String,
    pub capability: String,
    pub success: bool,
    pub payload: Value,
}

impl ToolOutcome {
    /// Wrap a successful result as `{"result": value}`
    pub fn success(invocation: &ToolInvocation, value: Value) -> Self {
        Self {
            invocation_id: invocation.id.clone(),
            capability: invocation.name.clone(),
            success: true,
            payload: json!({ "result": value }),
        }
    }

    /// Wrap an error as `{"error": {"kind", "message"}}`
    pub fn failure(invocation: &ToolInvocation, error: &StockBotError) -> Self {
        Self {
            invocation_id: invocation.id.clone(),
            capability: invocation.name.clone(),
            success: false,
            payload: json!({
                "error": {
                    "kind": error.kind(),
                    "message": error.to_string(),
                }
            }),
        }
    }

    /// Tool message answering the invocation
    pub fn into_message(self) -> Message {
        Message::tool_result(self.invocation_id, self.capability, self.payload.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_loop_state_new() {
        let state = TurnLoopState::new(10);
        assert_eq!(state.completion_calls, 0);
        assert_eq!(state.max_calls, 10);
        assert_eq!(state.tool_invocations, 0);
    }

    #[test]
    fn test_at_limit() {
        let mut state = TurnLoopState::new(2);
        state.next_call();
        assert!(!state.at_limit());

        state.next_call();
        assert!(state.at_limit());
    }

    #[test]
    fn test_outcome_payloads() {
        let invocation = ToolInvocation::new("c7", "get_stock_price", json!({"symbol": "NVDA"}));

        let ok = ToolOutcome::success(&invocation, json!({"close": 120.5}));
        assert!(ok.success);
        assert_eq!(ok.payload, json!({"result": {"close": 120.5}}));

        let err = StockBotError::data_unavailable("NVDA", "market closed");
        let failed = ToolOutcome::failure(&invocation, &err);
        assert!(!failed.success);
        assert_eq!(failed.payload["error"]["kind"], "data_unavailable");
        assert!(failed.payload["error"]["message"]
            .as_str()
            .unwrap()
            .contains("NVDA"));

        let message = failed.into_message();
        assert_eq!(message.tool_result_id.as_deref(), Some("c7"));
        assert_eq!(message.name.as_deref(), Some("get_stock_price"));
    }
}
