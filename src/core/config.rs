//! Configuration management for StockBot
//!
//! Supports environment variables, config files, and runtime overrides.
//!
//! Config file location: ~/.config/stockbot/config.toml

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::core::error::{Result, StockBotError};

/// Default system prompt for the assistant
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a friendly, witty and analytical stock market \
assistant. Use the supplied tools to look up ticker symbols and the latest prices before \
answering questions about a company's stock. Answer in the same language as the user.";

/// Main configuration for StockBot
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Which LLM backend to use
    #[serde(default)]
    pub provider: ProviderType,
    /// OpenAI configuration
    #[serde(default)]
    pub openai: OpenAiConfig,
    /// Ollama configuration
    #[serde(default)]
    pub ollama: OllamaConfig,
    /// Model configuration
    #[serde(default)]
    pub model: ModelConfig,
    /// Agent configuration
    #[serde(default)]
    pub agent: AgentConfig,
    /// Finance data source configuration
    #[serde(default)]
    pub finance: FinanceConfig,
}

/// Supported LLM backends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderType {
    OpenAi,
    Ollama,
}

impl Default for ProviderType {
    fn default() -> Self {
        env::var("STOCKBOT_PROVIDER")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(ProviderType::OpenAi)
    }
}

impl std::str::FromStr for ProviderType {
    type Err = StockBotError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "openai" => Ok(ProviderType::OpenAi),
            "ollama" => Ok(ProviderType::Ollama),
            other => Err(StockBotError::config(format!(
                "Unknown provider '{}'. Available: openai, ollama",
                other
            ))),
        }
    }
}

impl std::fmt::Display for ProviderType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderType::OpenAi => write!(f, "openai"),
            ProviderType::Ollama => write!(f, "ollama"),
        }
    }
}

/// OpenAI API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OpenAiConfig {
    /// API key, only ever read from the environment
    #[serde(skip)]
    pub api_key: Option<String>,
    /// Base URL of the chat completions API
    pub base_url: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

/// Ollama server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OllamaConfig {
    /// Host address (default: localhost)
    pub host: String,
    /// Port number (default: 11434)
    pub port: u16,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

/// Model configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Model used for the conversation and tool selection
    /// Default: gpt-4o-mini
    pub name: String,
    /// Sampling temperature, 0.0 for deterministic tool selection
    pub temperature: f32,
}

/// Agent behavior configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Maximum model calls per turn before giving up
    /// Default: 10
    pub max_iterations: usize,
    /// Timeout for a single completion call in seconds
    pub completion_timeout_secs: u64,
    /// Timeout for a single capability invocation in seconds
    pub tool_timeout_secs: u64,
    /// Run the invocations of one model response concurrently
    pub parallel_tools: bool,
    /// Whether to show debug output
    pub debug: bool,
    /// System prompt override
    pub system_prompt: Option<String>,
}

/// Yahoo Finance endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FinanceConfig {
    /// Symbol search endpoint
    pub search_url: String,
    /// Chart endpoint, the symbol is appended as a path segment
    pub chart_url: String,
    /// Market passed to the symbol search
    pub country: String,
    /// User-Agent header, Yahoo rejects requests without a browser-like one
    pub user_agent: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

fn env_flag(key: &str, default: bool) -> bool {
    env::var(key)
        .map(|v| v == "true" || v == "1")
        .unwrap_or(default)
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: env::var("OPENAI_API_KEY").ok().filter(|k| !k.is_empty()),
            base_url: env::var("OPENAI_BASE_URL")
                .unwrap_or_else(|_| "https://api.openai.com/v1".to_string()),
            timeout_secs: 60,
        }
    }
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            host: env::var("OLLAMA_HOST").unwrap_or_else(|_| "localhost".to_string()),
            port: env::var("OLLAMA_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(11434),
            timeout_secs: 120,
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            name: env::var("STOCKBOT_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string()),
            temperature: 0.0,
        }
    }
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_iterations: env::var("STOCKBOT_MAX_ITERATIONS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(10),
            completion_timeout_secs: 90,
            tool_timeout_secs: 20,
            parallel_tools: true,
            debug: env_flag("STOCKBOT_DEBUG", false),
            system_prompt: None,
        }
    }
}

impl Default for FinanceConfig {
    fn default() -> Self {
        Self {
            search_url: "https://query2.finance.yahoo.com/v1/finance/search".to_string(),
            chart_url: "https://query1.finance.yahoo.com/v8/finance/chart".to_string(),
            country: "United States".to_string(),
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                         (KHTML, like Gecko) Chrome/124.0 Safari/537.36"
                .to_string(),
            timeout_secs: 15,
        }
    }
}

impl Config {
    /// Get the config directory path
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("stockbot")
    }

    /// Get the config file path
    pub fn config_file() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    /// Load configuration from file, environment, and defaults
    /// Priority: CLI args > config file > env vars > defaults
    pub fn load() -> Self {
        // Try to load .env file if it exists
        let _ = dotenvy::dotenv();

        Self::load_or_default(&Self::config_file())
    }

    /// Load `path` if it exists, otherwise defaults (which respect env vars).
    ///
    /// A file that exists but cannot be read or parsed is reported and
    /// ignored.
    pub fn load_or_default(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }

        match Self::load_from(path) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "Ignoring unreadable config file, using defaults"
                );
                Self::default()
            }
        }
    }

    /// Load configuration from a specific file
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(StockBotError::config("Config file not found"));
        }

        let content = fs::read_to_string(path)
            .map_err(|e| StockBotError::config(format!("Failed to read config: {}", e)))?;

        toml::from_str(&content)
            .map_err(|e| StockBotError::config(format!("Failed to parse config: {}", e)))
    }

    /// Check that the configuration can drive a session
    pub fn validate(&self) -> Result<()> {
        if self.agent.max_iterations == 0 {
            return Err(StockBotError::config("agent.max_iterations must be at least 1"));
        }
        if self.provider == ProviderType::OpenAi && self.openai.api_key.is_none() {
            return Err(StockBotError::config(
                "OPENAI_API_KEY is not set. Export it or add it to a .env file",
            ));
        }
        if self.model.name.trim().is_empty() {
            return Err(StockBotError::config("model.name must not be empty"));
        }
        Ok(())
    }

    /// Get the full Ollama API URL
    pub fn ollama_url(&self) -> String {
        format!("http://{}:{}", self.ollama.host, self.ollama.port)
    }

    /// The system prompt in effect
    pub fn system_prompt(&self) -> &str {
        self.agent
            .system_prompt
            .as_deref()
            .unwrap_or(DEFAULT_SYSTEM_PROMPT)
    }
}
