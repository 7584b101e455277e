//! `trendpost bot`: the Telegram bot.

use std::sync::Arc;

use tracing::{debug, info, warn};
use trendpost_channels::{TelegramChannel, serve};
use trendpost_config::AppConfig;
use trendpost_core::channel::Channel;
use trendpost_core::event::EventBus;

use super::{CommandResult, Runtime};

pub async fn run(config: AppConfig) -> CommandResult {
    if config.telegram.bot_token.is_none() {
        eprintln!();
        eprintln!("  ERROR: No Telegram bot token configured!");
        eprintln!();
        eprintln!("  Set TELEGRAM_BOT_TOKEN or add bot_token under [telegram] in");
        eprintln!("    {}", AppConfig::config_dir().join("config.toml").display());
        eprintln!();
        return Err("No Telegram bot token found.".into());
    }

    let runtime = Runtime::build(&config)?;
    let channel = TelegramChannel::new(&config.telegram)?;
    if channel.allow_list().is_open() {
        warn!("The bot is open to every Telegram user");
    }
    let channel: Arc<dyn Channel> = Arc::new(channel);
    let router = Arc::new(runtime.router(&config));

    let events = log_events(&runtime.event_bus);

    info!(
        model = %config.agent.model,
        dry_run = runtime.dry_run,
        "TrendPost bot starting"
    );

    tokio::select! {
        served = serve(Arc::clone(&channel), router) => served?,
        _ = tokio::signal::ctrl_c() => {
            info!("Shutting down");
            channel.stop().await?;
        }
    }

    events.abort();
    Ok(())
}

/// Mirror turn events into the debug log.
fn log_events(bus: &EventBus) -> tokio::task::JoinHandle<()> {
    let mut rx = bus.subscribe();
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(event) => debug!(
                    kind = event.kind(),
                    at = %event.timestamp(),
                    details = ?event,
                    "Turn event"
                ),
                Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                    debug!(skipped, "Event log lagged");
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            }
        }
    })
}
