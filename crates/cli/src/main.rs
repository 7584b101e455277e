//! TrendPost CLI, the main entry point.
//!
//! Commands:
//! - `bot`       Run the Telegram bot
//! - `chat`      Interactive or single-message chat in the terminal
//! - `trends`    Collect product trends once and print them as JSON
//! - `validate`  Score how timely a topic is
//! - `sources`   List the configured feeds and communities

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "trendpost",
    about = "TrendPost: LinkedIn posts from current product trends",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file (defaults to ~/.trendpost/config.toml)
    #[arg(short, long, global = true, env = "TRENDPOST_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the Telegram bot (long polling)
    Bot,

    /// Chat with the agent in the terminal
    Chat {
        /// Send a single message instead of entering interactive mode
        #[arg(short, long)]
        message: Option<String>,
    },

    /// Collect trends from every product source and print the report
    Trends,

    /// Score how timely a topic is for the target audience
    Validate {
        topic: String,

        /// Override the configured target audience
        #[arg(short, long)]
        audience: Option<String>,
    },

    /// List the configured trend sources
    Sources,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config = commands::load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Bot => commands::bot::run(config).await?,
        Commands::Chat { message } => commands::chat::run(config, message).await?,
        Commands::Trends => commands::trends::run(config).await?,
        Commands::Validate { topic, audience } => commands::validate::run(&config, &topic, audience.as_deref())?,
        Commands::Sources => commands::sources::run(&config),
    }

    Ok(())
}
