//! CLI commands
//!
//! Special commands that can be executed in the REPL.

use crate::agent::Agent;
use crate::core::{Result, Role};

/// Result of parsing a command
#[derive(Debug, PartialEq, Eq)]
pub enum CommandResult {
    /// Continue processing as normal input
    Continue(String),
    /// Command was handled, show output
    Handled(String),
    /// Exit the REPL
    Exit,
    /// Clear history
    Clear,
}

/// Parse and handle special commands.
///
/// A command is its bare keyword (`history`, `status`, ...) or `set` followed
/// by a known setting. Anything else, including questions that merely start
/// with a command word, goes to the model.
pub async fn handle_command(
    input: &str,
    agent: &mut Agent,
    session_id: &str,
) -> Result<CommandResult> {
    let input = input.trim();
    let parts: Vec<&str> = input.splitn(2, ' ').collect();
    let cmd = parts[0].to_lowercase();
    let args = parts.get(1).map(|s| s.trim()).unwrap_or("");

    match cmd.as_str() {
        "set" => Ok(handle_set_command(args, agent).unwrap_or_else(|| not_a_command(input, &cmd))),

        _ if !args.is_empty() => Ok(not_a_command(input, &cmd)),

        "exit" | "quit" | "q" => Ok(CommandResult::Exit),

        "clear" | "reset" => {
            agent.clear_session(session_id).await;
            Ok(CommandResult::Clear)
        }

        "help" | "?" => Ok(CommandResult::Handled(help_text())),

        "status" => {
            let history = agent.history(session_id).await;
            let status = format!(
                "StockBot Status:\n\
                 ─────────────────────────────\n\
                 Provider:       {}\n\
                 Model:          {}\n\
                 Session:        {}\n\
                 History:        {} messages\n\
                 Max iterations: {}\n\
                 Debug:          {}",
                agent.provider_name(),
                agent.model(),
                session_id,
                history.len(),
                agent.config().agent.max_iterations,
                if agent.is_debug() { "on" } else { "off" }
            );
            Ok(CommandResult::Handled(status))
        }

        "history" => {
            let lines: Vec<String> = agent
                .history(session_id)
                .await
                .iter()
                .filter(|m| matches!(m.role, Role::User | Role::Assistant) && m.content.is_some())
                .map(|m| format!("  {:>9}: {}", m.role.as_str(), m.text()))
                .collect();

            if lines.is_empty() {
                Ok(CommandResult::Handled("No messages yet.".to_string()))
            } else {
                Ok(CommandResult::Handled(lines.join("\n")))
            }
        }

        "tools" => {
            let output = agent
                .capabilities()
                .iter()
                .map(|def| format!("  {:<16} {}", def.name(), def.function.description))
                .collect::<Vec<_>>()
                .join("\n");
            Ok(CommandResult::Handled(format!("Available tools:\n{}", output)))
        }

        _ => Ok(not_a_command(input, &cmd)),
    }
}

/// Normal input, unless it looks like a mistyped `/command`
fn not_a_command(input: &str, cmd: &str) -> CommandResult {
    if input.starts_with('/') {
        CommandResult::Handled(format!(
            "Unknown command: {}. Type 'help' for available commands.",
            cmd
        ))
    } else {
        CommandResult::Continue(input.to_string())
    }
}

/// Handle 'set' subcommands, `None` if `args` names no known setting
fn handle_set_command(args: &str, agent: &mut Agent) -> Option<CommandResult> {
    let parts: Vec<&str> = args.splitn(2, ' ').collect();

    if parts[0].is_empty() {
        return Some(CommandResult::Handled(
            "Usage: set <model|debug> <value>\n\
             Examples:\n\
               set model gpt-4o\n\
               set debug on"
                .to_string(),
        ));
    }

    let key = parts[0].to_lowercase();
    let value = parts.get(1).map(|s| s.trim()).unwrap_or("");

    match key.as_str() {
        "model" => {
            if value.is_empty() {
                return Some(CommandResult::Handled(format!("Current model: {}", agent.model())));
            }
            agent.set_model(value);
            Some(CommandResult::Handled(format!("Model set to: {}", value)))
        }

        "debug" => {
            let enabled = matches!(value.to_lowercase().as_str(), "on" | "true" | "1" | "yes");
            agent.set_debug(enabled);
            Some(CommandResult::Handled(format!(
                "Debug mode: {}",
                if enabled { "ON" } else { "OFF" }
            )))
        }

        _ => None,
    }
}

/// Generate help text
fn help_text() -> String {
    r#"StockBot Commands:
─────────────────────────────────────────────
  help, ?          Show this help message
  exit, quit, q    Exit StockBot
  clear, reset     Clear conversation history
  status           Show current configuration
  history          Show this session's conversation
  tools            List the tools the model can call

  set model <name>       Switch the model
  set debug <on|off>     Show per-turn call counts and errors

Keyboard Shortcuts:
  Ctrl+D           Exit StockBot

Tips:
  - Ask about any listed company, e.g. "How is Nvidia doing today?"
  - Prices are the latest one-minute bar from Yahoo Finance
─────────────────────────────────────────────"#
        .to_string()
}
