//! Interactive REPL for StockBot
//!
//! Provides the main user interaction loop.

use std::io::{self, BufRead, Write};

use crate::agent::{Agent, APOLOGY};
use crate::cli::commands::{handle_command, CommandResult};
use crate::core::{Config, Result};

/// Session id used when none is given
pub const DEFAULT_SESSION: &str = "default";

/// Interactive REPL (Read-Eval-Print Loop)
pub struct Repl {
    agent: Agent,
    session_id: String,
}

impl Repl {
    /// Create a REPL around an existing agent
    pub fn new(agent: Agent, session_id: impl Into<String>) -> Self {
        Self {
            agent,
            session_id: session_id.into(),
        }
    }

    /// Create a REPL with custom configuration
    pub fn with_config(config: Config, session_id: impl Into<String>) -> Result<Self> {
        Ok(Self::new(Agent::from_config(config)?, session_id))
    }

    /// Run the REPL
    pub async fn run(&mut self) -> Result<()> {
        self.print_banner();

        print!("Initializing...");
        io::stdout().flush()?;

        match self.agent.initialize().await {
            Ok(()) => println!(" Ready!\n"),
            Err(e) => {
                println!("\n\nInitialization Error: {}\n", e);
                return Ok(());
            }
        }

        let stdin = io::stdin();
        let mut stdout = io::stdout();

        loop {
            print!("You: ");
            stdout.flush()?;

            let mut input = String::new();
            match stdin.lock().read_line(&mut input) {
                Ok(0) => {
                    // EOF (Ctrl+D)
                    println!("\nGoodbye!");
                    break;
                }
                Ok(_) => {}
                Err(e) => {
                    eprintln!("Error reading input: {}", e);
                    continue;
                }
            }

            let input = input.trim();

            if input.is_empty() {
                continue;
            }

            match handle_command(input, &mut self.agent, &self.session_id).await {
                Ok(CommandResult::Exit) => {
                    println!("\nGoodbye!");
                    break;
                }
                Ok(CommandResult::Clear) => {
                    println!("Conversation cleared.\n");
                }
                Ok(CommandResult::Handled(output)) => {
                    println!("{}\n", output);
                }
                Ok(CommandResult::Continue(input)) => self.ask(&input).await,
                Err(e) => {
                    eprintln!("Command error: {}\n", e);
                }
            }
        }

        Ok(())
    }

    async fn ask(&self, input: &str) {
        match self.agent.chat(&self.session_id, input).await {
            Ok(turn) => {
                println!("\nAssistant:\n{}\n", turn.answer);
                if self.agent.is_debug() {
                    println!(
                        "[{} model call(s), {} tool call(s), {} tokens]\n",
                        turn.completion_calls, turn.tool_invocations, turn.usage.total_tokens
                    );
                }
            }
            Err(e) => {
                println!("\nAssistant:\n{}\n", APOLOGY);
                if self.agent.is_debug() {
                    eprintln!("[error: {}]\n", e);
                }
            }
        }
    }

    /// Print the startup banner
    fn print_banner(&self) {
        let config = self.agent.config();

        println!(
            r#"
+-----------------------------------------------------------+
|                                                           |
|   StockBot                                                |
|   Ask about a company, get its latest share price         |
|                                                           |
+-----------------------------------------------------------+
"#
        );
        println!("Provider:   {}", self.agent.provider_name());
        if self.agent.provider_name() == "ollama" {
            println!("Ollama:     {}", config.ollama_url());
        }
        println!("Model:      {}", self.agent.model());
        println!("Session:    {}", self.session_id);
        println!();
        println!("Commands: help, clear, history, tools, status, exit");
        println!("-----------------------------------------------------------");
    }
}
