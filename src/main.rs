//! StockBot - conversational stock price assistant
//!
//! Main entry point for the CLI application.

use clap::Parser;
use stockbot::cli::DEFAULT_SESSION;
use stockbot::{Agent, Config, ProviderType, Repl};
use tracing_subscriber::EnvFilter;

/// StockBot - ask about a company, get its latest share price
#[derive(Parser, Debug)]
#[command(name = "stockbot")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Model backend (openai or ollama)
    #[arg(long)]
    provider: Option<ProviderType>,

    /// Model name
    #[arg(long, short = 'm')]
    model: Option<String>,

    /// Session id for the conversation
    #[arg(long, default_value = DEFAULT_SESSION)]
    session: String,

    /// Maximum model calls per question
    #[arg(long)]
    max_iterations: Option<usize>,

    /// Enable debug output
    #[arg(long, short = 'd')]
    debug: bool,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Single prompt mode (non-interactive)
    #[arg(long, short = 'p')]
    prompt: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Build configuration
    let mut config = Config::load();

    // Apply CLI overrides
    if let Some(provider) = args.provider {
        config.provider = provider;
    }

    if let Some(ref model) = args.model {
        config.model.name = model.clone();
    }

    if let Some(max_iterations) = args.max_iterations {
        config.agent.max_iterations = max_iterations;
    }

    if args.debug {
        config.agent.debug = true;
    }

    let verbosity = if config.agent.debug {
        args.verbose.max(2)
    } else {
        args.verbose
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| match verbosity {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("stockbot=info"),
        2 => EnvFilter::new("stockbot=debug"),
        _ => EnvFilter::new("trace"),
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    // Single prompt mode
    if let Some(prompt) = args.prompt {
        let agent = Agent::from_config(config)?;
        agent.initialize().await?;

        let answer = agent.reply(&args.session, &prompt).await;
        println!("{}", answer);
        return Ok(());
    }

    // Interactive REPL mode
    let mut repl = Repl::with_config(config, args.session)?;
    repl.run().await?;

    Ok(())
}
