//! `trendpost chat`: interactive or single-message chat in the terminal.
//!
//! Goes through the same router as the bot, so commands like `/trends`
//! and `/reset` work here too.

use std::io::Write;

use trendpost_channels::CliChannel;
use trendpost_channels::cli::local_message;
use trendpost_config::AppConfig;
use trendpost_core::channel::Channel;

use super::{CommandResult, Runtime};

pub async fn run(config: AppConfig, message: Option<String>) -> CommandResult {
    let runtime = Runtime::build(&config)?;
    let router = runtime.router(&config);
    let channel = CliChannel::new();

    if let Some(msg) = message {
        router.handle(&channel, &local_message(msg)).await?;
        return Ok(());
    }

    println!();
    println!("  ╔══════════════════════════════════════════════╗");
    println!("  ║          TrendPost Agent: Interactive        ║");
    println!("  ╚══════════════════════════════════════════════╝");
    println!();
    println!("  Model:     {}", config.agent.model);
    println!("  Industry:  {}", config.agent.industry);
    println!("  Audience:  {}", config.agent.target_audience);
    println!(
        "  Publish:   {}",
        if runtime.dry_run { "dry run (posts are shown, not sent)" } else { "LinkedIn" }
    );
    println!();
    println!("  Type a message or a command (/help) and press Enter.");
    println!("  Type 'exit' or Ctrl+D to quit.");
    println!();

    let mut rx = channel.start().await.map_err(|e| format!("Channel error: {e}"))?;

    print!("  You > ");
    std::io::stdout().flush()?;

    while let Some(result) = rx.recv().await {
        match result {
            Ok(chan_msg) => {
                if let Err(e) = router.handle(&channel, &chan_msg).await {
                    eprintln!("  [Error] {e}");
                }
                print!("\n  You > ");
                std::io::stdout().flush()?;
            }
            Err(e) => {
                eprintln!("  [Channel Error] {e}");
                break;
            }
        }
    }

    println!();
    println!("  Goodbye!");
    println!();
    Ok(())
}
