//! Terminal channel: one local user on stdin/stdout.

use async_trait::async_trait;
use tokio::io::{self, AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use trendpost_core::channel::{Channel, ChannelId, ChannelMessage};
use trendpost_core::error::ChannelError;

pub const CLI_CHAT_ID: &str = "cli_session";

/// Lines that end an interactive session.
pub fn is_exit(line: &str) -> bool {
    matches!(line, "exit" | "quit" | "/exit" | "/quit" | ":q")
}

pub fn local_message(content: impl Into<String>) -> ChannelMessage {
    ChannelMessage {
        channel_id: ChannelId("cli".into()),
        sender_id: "local_user".into(),
        sender_name: None,
        content: content.into(),
        chat_id: CLI_CHAT_ID.into(),
        message_id: None,
    }
}

pub struct CliChannel {
    id: ChannelId,
}

impl CliChannel {
    pub fn new() -> Self {
        Self {
            id: ChannelId("cli".into()),
        }
    }
}

impl Default for CliChannel {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Channel for CliChannel {
    fn name(&self) -> &str {
        "cli"
    }

    fn id(&self) -> &ChannelId {
        &self.id
    }

    async fn start(&self) -> Result<mpsc::Receiver<Result<ChannelMessage, ChannelError>>, ChannelError> {
        let (tx, rx) = mpsc::channel(32);

        tokio::spawn(async move {
            let mut lines = BufReader::new(io::stdin()).lines();
            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => {
                        let line = line.trim();
                        if line.is_empty() {
                            continue;
                        }
                        if is_exit(line) {
                            break;
                        }
                        if tx.send(Ok(local_message(line))).await.is_err() {
                            break;
                        }
                    }
                    // EOF (Ctrl+D)
                    Ok(None) => break,
                    Err(e) => {
                        let _ = tx.send(Err(ChannelError::ConnectionLost(e.to_string()))).await;
                        break;
                    }
                }
            }
        });

        Ok(rx)
    }

    async fn send(&self, _chat_id: &str, content: &str, _reply_to: Option<&str>) -> Result<(), ChannelError> {
        let mut stdout = io::stdout();
        let line = format!("\n{content}\n");
        stdout
            .write_all(line.as_bytes())
            .await
            .map_err(|e| ChannelError::DeliveryFailed {
                channel: "cli".into(),
                reason: e.to_string(),
            })?;
        stdout.flush().await.map_err(|e| ChannelError::ConnectionLost(e.to_string()))
    }

    fn is_allowed(&self, _sender_id: &str) -> bool {
        true
    }
}
