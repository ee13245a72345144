//! StockBot - conversational stock price assistant
//!
//! A tool-calling chat agent: a language model decides when to look up a
//! company's ticker symbol and its latest share price, the agent runs those
//! lookups against Yahoo Finance, and the model answers from the results.
//!
//! # Architecture
//!
//! - **Core**: Shared types, configuration, and error handling
//! - **LLM**: Provider abstraction (OpenAI, Ollama) and the completion client
//! - **Tools**: Capability registry, argument validation, finance lookups
//! - **Agent**: Turn loop, transcripts, and sessions
//! - **CLI**: Command-line interface and REPL
//!
//! # Usage
//!
//! ```rust,no_run
//! use stockbot::{Agent, Config};
//!
//! #[tokio::main]
//! async fn main() -> stockbot::Result<()> {
//!     let agent = Agent::from_config(Config::load())?;
//!     agent.initialize().await?;
//!
//!     let answer = agent.reply("default", "How is Nvidia trading today?").await;
//!     println!("{}", answer);
//!     Ok(())
//! }
//! ```

pub mod agent;
pub mod cli;
pub mod core;
pub mod llm;
pub mod tools;

// Re-export commonly used items
pub use agent::{Agent, TurnOutcome};
pub use cli::Repl;
pub use crate::core::{Config, ProviderType, Result, StockBotError};
