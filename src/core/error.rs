//! Custom error types for StockBot
//!
//! Provides a unified error handling system across all modules.

use std::time::Duration;

use thiserror::Error;

/// Main error type for StockBot operations
#[derive(Error, Debug)]
pub enum StockBotError {
    /// The model asked for a capability that is not registered
    #[error("Unknown capability: {0}")]
    UnknownCapability(String),

    /// Arguments did not match the capability's input schema
    #[error("Invalid arguments for '{capability}': {reason}")]
    InvalidArguments { capability: String, reason: String },

    /// The capability ran but failed
    #[error("Capability '{capability}' failed: {message}")]
    ExecutionFailure { capability: String, message: String },

    /// A capability with this name is already registered
    #[error("Capability '{0}' is already registered")]
    DuplicateCapability(String),

    /// Symbol search returned nothing for the company
    #[error("No ticker symbol found for '{0}'")]
    LookupNotFound(String),

    /// Price data could not be retrieved for the symbol
    #[error("Price data unavailable for '{symbol}': {reason}")]
    DataUnavailable { symbol: String, reason: String },

    /// The model service failed to produce a completion
    #[error("Completion failed: {0}")]
    CompletionFailure(String),

    /// The model service did not answer in time
    #[error("Completion timed out after {0:?}")]
    CompletionTimeout(Duration),

    /// The model kept requesting tools past the iteration limit
    #[error("Tool-calling loop exceeded {0} model calls")]
    LoopLimitExceeded(usize),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON parsing errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP request errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error for other cases
    #[error("{0}")]
    Other(String),
}

/// Convenience Result type for StockBot operations
pub type Result<T> = std::result::Result<T, StockBotError>;

impl StockBotError {
    /// Create an invalid-arguments error
    pub fn invalid_arguments(capability: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidArguments {
            capability: capability.into(),
            reason: reason.into(),
        }
    }

    /// Create an execution failure
    pub fn execution(capability: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ExecutionFailure {
            capability: capability.into(),
            message: message.into(),
        }
    }

    /// Create a data-unavailable error
    pub fn data_unavailable(symbol: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::DataUnavailable {
            symbol: symbol.into(),
            reason: reason.into(),
        }
    }

    /// Create a completion failure
    pub fn completion(msg: impl Into<String>) -> Self {
        Self::CompletionFailure(msg.into())
    }

    /// Create a config error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Stable snake_case code, used in tool error payloads sent to the model
    pub fn kind(&self) -> &'static str {
        match self {
            Self::UnknownCapability(_) => "unknown_capability",
            Self::InvalidArguments { .. } => "invalid_arguments",
            Self::ExecutionFailure { .. } => "execution_failure",
            Self::DuplicateCapability(_) => "duplicate_capability",
            Self::LookupNotFound(_) => "lookup_not_found",
            Self::DataUnavailable { .. } => "data_unavailable",
            Self::CompletionFailure(_) => "completion_failure",
            Self::CompletionTimeout(_) => "completion_timeout",
            Self::LoopLimitExceeded(_) => "loop_limit_exceeded",
            Self::Config(_) => "config",
            Self::Json(_) => "json",
            Self::Http(_) => "http",
            Self::Io(_) => "io",
            Self::Other(_) => "other",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_codes() {
        assert_eq!(
            StockBotError::UnknownCapability("x".into()).kind(),
            "unknown_capability"
        );
        assert_eq!(
            StockBotError::invalid_arguments("get_symbol", "missing company").kind(),
            "invalid_arguments"
        );
        assert_eq!(StockBotError::LoopLimitExceeded(3).kind(), "loop_limit_exceeded");
    }

    #[test]
    fn test_display() {
        let err = StockBotError::invalid_arguments("get_symbol", "missing required field 'company'");
        assert_eq!(
            err.to_string(),
            "Invalid arguments for 'get_symbol': missing required field 'company'"
        );
    }
}
