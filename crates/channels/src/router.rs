//! Routes inbound chat messages to commands or agent turns.
//!
//! Each chat has its own agent session. Messages from different chats are
//! handled concurrently; a chat's turns are serialized by its session lock.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, error, info, warn};
use trendpost_agent::{AgentLoop, SessionStore};
use trendpost_config::SourcesConfig;
use trendpost_core::channel::{Channel, ChannelMessage};
use trendpost_core::error::ChannelError;
use trendpost_core::event::{DomainEvent, EventBus};

use crate::commands::{self, BotCommand, MAX_MESSAGE_CHARS};

const EMPTY_ANSWER: &str = "I have no answer for that. Try rephrasing the request.";

pub struct BotRouter {
    agent: Arc<AgentLoop>,
    sessions: Arc<SessionStore>,
    event_bus: Arc<EventBus>,
    dry_run: bool,
    max_message_chars: usize,
    sources_text: String,
}

impl BotRouter {
    pub fn new(agent: Arc<AgentLoop>, sessions: Arc<SessionStore>, event_bus: Arc<EventBus>) -> Self {
        Self {
            agent,
            sessions,
            event_bus,
            dry_run: true,
            max_message_chars: MAX_MESSAGE_CHARS,
            sources_text: commands::sources_text(&SourcesConfig::default()),
        }
    }

    /// Whether publishing only pretends; changes texts and prompts.
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn with_max_message_chars(mut self, max: usize) -> Self {
        self.max_message_chars = max.clamp(1, MAX_MESSAGE_CHARS);
        self
    }

    pub fn with_sources(mut self, config: &SourcesConfig) -> Self {
        self.sources_text = commands::sources_text(config);
        self
    }

    /// Handle one inbound message, sending every reply through `channel`.
    pub async fn handle(&self, channel: &dyn Channel, message: &ChannelMessage) -> Result<(), ChannelError> {
        self.event_bus.publish(DomainEvent::MessageReceived {
            channel: channel.name().to_string(),
            sender_id: message.sender_id.clone(),
            content_preview: message.content.chars().take(50).collect(),
            timestamp: Utc::now(),
        });

        if !channel.is_allowed(&message.sender_id) {
            warn!(channel = channel.name(), sender = %message.sender_id, "Sender not allowed");
            return self.reply(channel, message, &commands::denied_text(&message.sender_id)).await;
        }

        let command = BotCommand::parse(&message.content);
        debug!(chat = %message.chat_id, command = ?command, "Routing message");

        match &command {
            BotCommand::Start => {
                let text = commands::welcome_text(message.sender_name.as_deref(), self.dry_run);
                self.reply(channel, message, &text).await
            }
            BotCommand::Help => self.reply(channel, message, &commands::help_text(self.dry_run)).await,
            BotCommand::Sources => self.reply(channel, message, &self.sources_text).await,
            BotCommand::Reset => {
                self.sessions.reset(&message.chat_id).await;
                info!(chat = %message.chat_id, "Conversation reset");
                self.reply(channel, message, commands::RESET_REPLY).await
            }
            BotCommand::Analyze(None) => self.reply(channel, message, commands::ANALYZE_USAGE).await,
            BotCommand::Unknown(name) => {
                self.reply(channel, message, &commands::unknown_command_text(name)).await
            }
            BotCommand::Trends => {
                self.reply(channel, message, commands::TRENDS_STATUS).await?;
                self.run_turn(channel, message, &command).await.map(|_| ())
            }
            BotCommand::Create => {
                self.reply(channel, message, commands::create_status(self.dry_run)).await?;
                if self.run_turn(channel, message, &command).await? && self.dry_run {
                    self.reply(channel, message, commands::CREATE_DRY_RUN_FOLLOW_UP).await?;
                }
                Ok(())
            }
            BotCommand::Analyze(Some(topic)) => {
                self.reply(channel, message, &commands::analyze_status(topic)).await?;
                self.run_turn(channel, message, &command).await.map(|_| ())
            }
            BotCommand::Text(text) => {
                if self.run_turn(channel, message, &command).await?
                    && commands::wants_publish_reminder(text, self.dry_run)
                {
                    self.reply(channel, message, commands::PUBLISH_REMINDER).await?;
                }
                Ok(())
            }
        }
    }

    /// Run an agent turn for `command` and send its answer.
    /// Returns whether the turn succeeded.
    async fn run_turn(
        &self,
        channel: &dyn Channel,
        message: &ChannelMessage,
        command: &BotCommand,
    ) -> Result<bool, ChannelError> {
        let Some(prompt) = commands::agent_prompt(command, self.dry_run) else {
            return Ok(false);
        };

        if let Err(e) = channel.send_typing(&message.chat_id).await {
            debug!(error = %e, "Typing indicator failed");
        }

        let session = self.sessions.get_or_create(&message.chat_id).await;
        let outcome = {
            let mut session = session.lock().await;
            self.agent.run_turn(&mut session, &prompt).await
        };

        match outcome {
            Ok(outcome) => {
                info!(
                    chat = %message.chat_id,
                    rounds = outcome.rounds,
                    ceiling = outcome.terminated_by_ceiling,
                    answer_chars = outcome.answer.chars().count(),
                    "Agent answered"
                );
                let answer = if outcome.answer.trim().is_empty() {
                    EMPTY_ANSWER
                } else {
                    outcome.answer.as_str()
                };
                self.reply(channel, message, answer).await?;
                Ok(true)
            }
            Err(e) => {
                error!(chat = %message.chat_id, error = %e, "Agent turn failed");
                self.reply(channel, message, &commands::error_text(&e.to_string())).await?;
                Ok(false)
            }
        }
    }

    async fn reply(&self, channel: &dyn Channel, message: &ChannelMessage, text: &str) -> Result<(), ChannelError> {
        for chunk in commands::split_message(text, self.max_message_chars) {
            channel.send(&message.chat_id, &chunk, None).await?;
        }
        Ok(())
    }
}

/// Start `channel` and handle its messages until it closes.
pub async fn serve(channel: Arc<dyn Channel>, router: Arc<BotRouter>) -> Result<(), ChannelError> {
    let mut inbound = channel.start().await?;
    info!(channel = channel.name(), "Serving");

    while let Some(item) = inbound.recv().await {
        match item {
            Ok(message) => {
                let channel = Arc::clone(&channel);
                let router = Arc::clone(&router);
                tokio::spawn(async move {
                    if let Err(e) = router.handle(channel.as_ref(), &message).await {
                        error!(chat = %message.chat_id, error = %e, "Failed to reply");
                    }
                });
            }
            Err(e) => warn!(channel = channel.name(), error = %e, "Inbound error"),
        }
    }

    channel.stop().await?;
    info!(channel = channel.name(), "Channel closed");
    Ok(())
}
