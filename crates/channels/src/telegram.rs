//! Telegram Bot API channel (long polling).
//!
//! `getUpdates` is polled in a background task; text messages are turned
//! into [`ChannelMessage`]s. Replies go out through `sendMessage`, the typing
//! indicator through `sendChatAction`.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::sync::{Mutex, mpsc, watch};
use tracing::{debug, info, warn};
use trendpost_config::TelegramSettings;
use trendpost_core::channel::{Channel, ChannelId, ChannelMessage};
use trendpost_core::error::ChannelError;

use crate::access::AllowList;

const API_BASE: &str = "https://api.telegram.org";

/// Pause after a failed poll before trying again.
const POLL_BACKOFF: Duration = Duration::from_secs(3);

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Update {
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<IncomingMessage>,
}

#[derive(Debug, Deserialize)]
pub struct IncomingMessage {
    pub message_id: i64,
    #[serde(default)]
    pub from: Option<User>,
    pub chat: Chat,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct User {
    pub id: i64,
    #[serde(default)]
    pub first_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Chat {
    pub id: i64,
}

/// The message inside `update`, if it is a text message with a sender.
pub fn to_channel_message(update: &Update) -> Option<ChannelMessage> {
    let message = update.message.as_ref()?;
    let text = message.text.as_ref()?;
    let from = message.from.as_ref()?;
    Some(ChannelMessage {
        channel_id: ChannelId("telegram".into()),
        sender_id: from.id.to_string(),
        sender_name: from.first_name.clone(),
        content: text.clone(),
        chat_id: message.chat.id.to_string(),
        message_id: Some(message.message_id.to_string()),
    })
}

#[derive(Clone)]
struct BotApi {
    client: reqwest::Client,
    base: String,
}

impl BotApi {
    async fn call<T: serde::de::DeserializeOwned>(
        &self,
        method: &str,
        body: &serde_json::Value,
    ) -> Result<T, ChannelError> {
        let response = self
            .client
            .post(format!("{}/{method}", self.base))
            .json(body)
            .send()
            .await
            .map_err(|e| ChannelError::ConnectionLost(format!("{method}: {}", e.without_url())))?;

        let status = response.status().as_u16();
        let parsed: ApiResponse<T> = response
            .json()
            .await
            .map_err(|e| ChannelError::ConnectionLost(format!("{method}: HTTP {status}: {}", e.without_url())))?;

        match (parsed.ok, parsed.result) {
            (true, Some(result)) => Ok(result),
            _ => Err(ChannelError::DeliveryFailed {
                channel: "telegram".into(),
                reason: format!(
                    "{method}: {}",
                    parsed.description.unwrap_or_else(|| format!("HTTP {status}"))
                ),
            }),
        }
    }
}

pub struct TelegramChannel {
    api: BotApi,
    channel_id: ChannelId,
    allow_list: AllowList,
    poll_timeout_secs: u64,
    shutdown: Mutex<Option<watch::Sender<bool>>>,
}

impl TelegramChannel {
    pub fn new(settings: &TelegramSettings) -> Result<Self, ChannelError> {
        let token = settings
            .bot_token
            .as_deref()
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ChannelError::NotConfigured("TELEGRAM_BOT_TOKEN is not set".into()))?;

        // Long polls hold the request open for poll_timeout_secs
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.poll_timeout_secs + 10))
            .build()
            .map_err(|e| ChannelError::NotConfigured(e.to_string()))?;

        Ok(Self {
            api: BotApi {
                client,
                base: format!("{API_BASE}/bot{token}"),
            },
            channel_id: ChannelId("telegram".into()),
            allow_list: AllowList::new(settings.allowed_users.clone()),
            poll_timeout_secs: settings.poll_timeout_secs,
            shutdown: Mutex::new(None),
        })
    }

    /// Point the channel at another Bot API root (the token path is kept).
    pub fn with_api_base(mut self, api_base: &str) -> Self {
        if let Some(path) = self.api.base.strip_prefix(API_BASE) {
            self.api.base = format!("{}{path}", api_base.trim_end_matches('/'));
        }
        self
    }

    pub fn allow_list(&self) -> &AllowList {
        &self.allow_list
    }
}

async fn poll(
    api: BotApi,
    timeout_secs: u64,
    tx: mpsc::Sender<Result<ChannelMessage, ChannelError>>,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut offset: i64 = 0;
    loop {
        let body = serde_json::json!({
            "offset": offset,
            "timeout": timeout_secs,
            "allowed_updates": ["message"],
        });

        let batch = tokio::select! {
            _ = shutdown.changed() => break,
            batch = api.call::<Vec<Update>>("getUpdates", &body) => batch,
        };

        match batch {
            Ok(updates) => {
                for update in updates {
                    offset = offset.max(update.update_id + 1);
                    let Some(message) = to_channel_message(&update) else {
                        debug!(update_id = update.update_id, "Skipping non-text update");
                        continue;
                    };
                    if tx.send(Ok(message)).await.is_err() {
                        return;
                    }
                }
            }
            Err(e) => {
                warn!(error = %e, "getUpdates failed, retrying");
                tokio::select! {
                    _ = shutdown.changed() => break,
                    _ = tokio::time::sleep(POLL_BACKOFF) => {}
                }
            }
        }
    }
    info!("Telegram polling stopped");
}

#[async_trait]
impl Channel for TelegramChannel {
    fn name(&self) -> &str {
        "telegram"
    }

    fn id(&self) -> &ChannelId {
        &self.channel_id
    }

    async fn start(&self) -> Result<mpsc::Receiver<Result<ChannelMessage, ChannelError>>, ChannelError> {
        let (tx, rx) = mpsc::channel(64);
        let (stop_tx, stop_rx) = watch::channel(false);
        *self.shutdown.lock().await = Some(stop_tx);

        info!(poll_timeout_secs = self.poll_timeout_secs, "Telegram long polling started");
        tokio::spawn(poll(self.api.clone(), self.poll_timeout_secs, tx, stop_rx));
        Ok(rx)
    }

    async fn send(&self, chat_id: &str, content: &str, reply_to: Option<&str>) -> Result<(), ChannelError> {
        let mut body = serde_json::json!({ "chat_id": chat_id, "text": content });
        if let Some(id) = reply_to.and_then(|id| id.parse::<i64>().ok()) {
            body["reply_to_message_id"] = id.into();
        }
        self.api.call::<serde_json::Value>("sendMessage", &body).await?;
        debug!(chat = chat_id, chars = content.chars().count(), "Telegram message sent");
        Ok(())
    }

    async fn send_typing(&self, chat_id: &str) -> Result<(), ChannelError> {
        let body = serde_json::json!({ "chat_id": chat_id, "action": "typing" });
        self.api.call::<bool>("sendChatAction", &body).await.map(|_| ())
    }

    fn is_allowed(&self, sender_id: &str) -> bool {
        self.allow_list.is_allowed(sender_id)
    }

    async fn stop(&self) -> Result<(), ChannelError> {
        if let Some(stop) = self.shutdown.lock().await.take() {
            let _ = stop.send(true);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex as StdMutex};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Canned responses keyed by method name; request bodies are recorded.
    async fn serve(routes: HashMap<&'static str, &'static str>) -> (String, Arc<StdMutex<Vec<String>>>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        let seen = Arc::new(StdMutex::new(Vec::new()));
        let recorded = Arc::clone(&seen);

        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                let mut buf = Vec::new();
                let mut chunk = [0u8; 4096];
                let (head, body) = loop {
                    let n = socket.read(&mut chunk).await.unwrap_or(0);
                    buf.extend_from_slice(&chunk[..n]);
                    let text = String::from_utf8_lossy(&buf).to_string();
                    let Some(end) = text.find("\r\n\r\n") else {
                        if n == 0 {
                            break (String::new(), String::new());
                        }
                        continue;
                    };
                    let head = text[..end].to_string();
                    let length = head
                        .lines()
                        .find_map(|l| {
                            let (k, v) = l.split_once(':')?;
                            k.eq_ignore_ascii_case("content-length").then(|| v.trim().parse::<usize>().ok())?
                        })
                        .unwrap_or(0);
                    if buf.len() >= end + 4 + length || n == 0 {
                        break (head, text[end + 4..].to_string());
                    }
                };

                let path = head.split_whitespace().nth(1).unwrap_or("").to_string();
                let method = path.rsplit('/').next().unwrap_or("").to_string();
                recorded.lock().unwrap().push(format!("{path} {body}"));
                let reply = routes.get(method.as_str()).copied().unwrap_or(r#"{"ok":false,"description":"Not Found"}"#);
                let response = format!(
                    "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{reply}",
                    reply.len()
                );
                socket.write_all(response.as_bytes()).await.unwrap();
            }
        });

        (base, seen)
    }

    fn settings(allowed: &[&str]) -> TelegramSettings {
        TelegramSettings {
            bot_token: Some("123:abc".into()),
            allowed_users: allowed.iter().map(|s| s.to_string()).collect(),
            poll_timeout_secs: 1,
            ..TelegramSettings::default()
        }
    }

    #[test]
    fn missing_token_is_not_configured() {
        let err = TelegramChannel::new(&TelegramSettings::default()).err().unwrap();
        assert!(err.to_string().contains("TELEGRAM_BOT_TOKEN"));
    }

    #[test]
    fn allow_list_is_applied() {
        let ch = TelegramChannel::new(&settings(&["7"])).unwrap();
        assert!(ch.is_allowed("7"));
        assert!(!ch.is_allowed("8"));
        assert!(TelegramChannel::new(&settings(&[])).unwrap().is_allowed("8"));
    }

    #[test]
    fn text_updates_become_messages() {
        let update: Update = serde_json::from_value(serde_json::json!({
            "update_id": 10,
            "message": {
                "message_id": 5,
                "from": {"id": 42, "first_name": "Ada", "is_bot": false},
                "chat": {"id": -100, "type": "group"},
                "text": "/trends"
            }
        }))
        .unwrap();
        let msg = to_channel_message(&update).unwrap();
        assert_eq!(msg.sender_id, "42");
        assert_eq!(msg.chat_id, "-100");
        assert_eq!(msg.sender_name.as_deref(), Some("Ada"));
        assert_eq!(msg.message_id.as_deref(), Some("5"));

        let sticker: Update = serde_json::from_value(serde_json::json!({
            "update_id": 11,
            "message": {"message_id": 6, "from": {"id": 42}, "chat": {"id": 42}}
        }))
        .unwrap();
        assert!(to_channel_message(&sticker).is_none());
    }

    #[tokio::test]
    async fn send_posts_to_bot_path() {
        let (base, seen) = serve(HashMap::from([
            ("sendMessage", r#"{"ok":true,"result":{"message_id":1}}"#),
            ("sendChatAction", r#"{"ok":true,"result":true}"#),
        ]))
        .await;
        let ch = TelegramChannel::new(&settings(&[])).unwrap().with_api_base(&base);

        ch.send_typing("42").await.unwrap();
        ch.send("42", "Привет", None).await.unwrap();

        let seen = seen.lock().unwrap();
        assert!(seen[0].starts_with("/bot123:abc/sendChatAction"));
        assert!(seen[0].contains("typing"));
        assert!(seen[1].starts_with("/bot123:abc/sendMessage"));
        assert!(seen[1].contains("Привет"));
    }

    #[tokio::test]
    async fn api_error_is_delivery_failure() {
        let (base, _) = serve(HashMap::from([(
            "sendMessage",
            r#"{"ok":false,"description":"Bad Request: chat not found"}"#,
        )]))
        .await;
        let ch = TelegramChannel::new(&settings(&[])).unwrap().with_api_base(&base);
        let err = ch.send("1", "hi", None).await.unwrap_err();
        assert!(err.to_string().contains("chat not found"));
    }

    #[tokio::test]
    async fn transport_errors_hide_the_token() {
        let ch = TelegramChannel::new(&settings(&[]))
            .unwrap()
            .with_api_base("http://127.0.0.1:1");
        let err = ch.send("1", "hi", None).await.unwrap_err().to_string();
        assert!(err.contains("sendMessage"));
        assert!(!err.contains("123:abc"));
    }

    #[tokio::test]
    async fn unreadable_replies_hide_the_token() {
        let (base, _) = serve(HashMap::from([("sendMessage", "not json")])).await;
        let ch = TelegramChannel::new(&settings(&[])).unwrap().with_api_base(&base);
        let err = ch.send("1", "hi", None).await.unwrap_err().to_string();
        assert!(err.contains("HTTP 200"));
        assert!(!err.contains("123:abc"));
    }

    #[tokio::test]
    async fn polling_delivers_text_messages() {
        let (base, _) = serve(HashMap::from([(
            "getUpdates",
            r#"{"ok":true,"result":[
                {"update_id":1,"message":{"message_id":1,"from":{"id":9},"chat":{"id":9}}},
                {"update_id":2,"message":{"message_id":2,"from":{"id":9,"first_name":"Bo"},"chat":{"id":9},"text":"hi"}}
            ]}"#,
        )]))
        .await;
        let ch = TelegramChannel::new(&settings(&[])).unwrap().with_api_base(&base);

        let mut rx = ch.start().await.unwrap();
        let msg = rx.recv().await.unwrap().unwrap();
        assert_eq!(msg.content, "hi");
        assert_eq!(msg.sender_name.as_deref(), Some("Bo"));
        ch.stop().await.unwrap();
    }
}
