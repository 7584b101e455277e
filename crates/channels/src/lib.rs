//! Chat transports for TrendPost.
//!
//! - **Telegram**: Bot API long polling
//! - **CLI**: interactive terminal chat
//!
//! Both feed the same [`BotRouter`], which applies the allow-list, handles
//! bot commands and runs agent turns per chat.

pub mod access;
pub mod cli;
pub mod commands;
pub mod router;
pub mod telegram;

pub use access::{AccessCheck, AllowList};
pub use cli::CliChannel;
pub use commands::BotCommand;
pub use router::{BotRouter, serve};
pub use telegram::TelegramChannel;
