//! LinkedIn UGC posts API.
//!
//! Publishing is two calls with the same bearer token: resolve the member id
//! (`GET /v2/userinfo`, field `sub`), then submit the share
//! (`POST /v2/ugcPosts`). Neither call is retried.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, info, warn};
use trendpost_core::error::PublishError;
use trendpost_core::publish::{PublishReceipt, Publisher, Visibility};

pub struct LinkedInPublisher {
    client: reqwest::Client,
    api_base: String,
    token: String,
}

#[derive(Debug, Deserialize)]
struct UserInfo {
    sub: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CreatedPost {
    id: Option<String>,
}

impl LinkedInPublisher {
    pub fn new(token: impl Into<String>, api_base: &str, timeout: Duration) -> Result<Self, PublishError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| PublishError::Network(e.to_string()))?;
        Ok(Self {
            client,
            api_base: api_base.trim_end_matches('/').to_string(),
            token: token.into(),
        })
    }

    /// The member URN the post is authored by.
    pub async fn resolve_identity(&self) -> Result<String, PublishError> {
        let response = self
            .client
            .get(format!("{}/v2/userinfo", self.api_base))
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| PublishError::Network(e.to_string()))?;

        let status = response.status().as_u16();
        if status == 401 || status == 403 {
            return Err(PublishError::Unauthorized { status_code: status });
        }
        if !response.status().is_success() {
            return Err(PublishError::Identity(format!("userinfo returned HTTP {status}")));
        }

        let info: UserInfo = response
            .json()
            .await
            .map_err(|e| PublishError::Identity(e.to_string()))?;
        match info.sub {
            Some(sub) if !sub.is_empty() => Ok(format!("urn:li:person:{sub}")),
            _ => Err(PublishError::Identity("userinfo has no 'sub'".into())),
        }
    }
}

/// Request body for a text-only share.
pub fn share_body(author: &str, content: &str, visibility: Visibility) -> serde_json::Value {
    serde_json::json!({
        "author": author,
        "lifecycleState": "PUBLISHED",
        "specificContent": {
            "com.linkedin.ugc.ShareContent": {
                "shareCommentary": { "text": content },
                "shareMediaCategory": "NONE"
            }
        },
        "visibility": {
            "com.linkedin.ugc.MemberNetworkVisibility": visibility.as_str()
        }
    })
}

#[async_trait]
impl Publisher for LinkedInPublisher {
    fn name(&self) -> &str {
        "linkedin"
    }

    async fn publish(&self, content: &str, visibility: Visibility) -> Result<PublishReceipt, PublishError> {
        let author = self.resolve_identity().await?;
        debug!(author = %author, "Resolved publishing identity");

        let response = self
            .client
            .post(format!("{}/v2/ugcPosts", self.api_base))
            .bearer_auth(&self.token)
            .header("X-Restli-Protocol-Version", "2.0.0")
            .json(&share_body(&author, content, visibility))
            .send()
            .await
            .map_err(|e| PublishError::Network(e.to_string()))?;

        let status = response.status().as_u16();
        if status == 401 || status == 403 {
            return Err(PublishError::Unauthorized { status_code: status });
        }
        if !response.status().is_success() {
            let message = response.text().await.unwrap_or_default();
            warn!(status, body = %message, "LinkedIn rejected the post");
            return Err(PublishError::Rejected { status_code: status, message });
        }

        // The id comes back in the body and in `x-restli-id`
        let header_id = response
            .headers()
            .get("x-restli-id")
            .and_then(|v| v.to_str().ok())
            .map(String::from);
        let body_id = response.json::<CreatedPost>().await.ok().and_then(|p| p.id);

        // Any 2xx means the post is live, id or not
        let post_id = body_id.or(header_id);
        if post_id.is_none() {
            warn!(status, "LinkedIn accepted the post without returning an id");
        }

        info!(post_id = ?post_id, visibility = visibility.as_str(), "Post published");
        Ok(PublishReceipt { post_id, dry_run: false })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Canned responses keyed by "METHOD /path"; request bodies are recorded.
    async fn serve(
        routes: HashMap<&'static str, (u16, &'static str)>,
    ) -> (String, Arc<Mutex<Vec<String>>>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        let seen = Arc::new(Mutex::new(Vec::new()));
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

                let mut parts = head.split_whitespace();
                let key = format!("{} {}", parts.next().unwrap_or(""), parts.next().unwrap_or(""));
                recorded.lock().unwrap().push(format!("{key} {body}"));
                let (status, reply) = routes.get(key.as_str()).copied().unwrap_or((404, "{}"));
                let response = format!(
                    "HTTP/1.1 {status} X\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{reply}",
                    reply.len()
                );
                socket.write_all(response.as_bytes()).await.unwrap();
            }
        });

        (base, seen)
    }

    #[test]
    fn share_body_shape() {
        let body = share_body("urn:li:person:abc", "Hello PMs", Visibility::Public);
        assert_eq!(body["author"], "urn:li:person:abc");
        assert_eq!(body["lifecycleState"], "PUBLISHED");
        assert_eq!(
            body["specificContent"]["com.linkedin.ugc.ShareContent"]["shareCommentary"]["text"],
            "Hello PMs"
        );
        assert_eq!(
            body["specificContent"]["com.linkedin.ugc.ShareContent"]["shareMediaCategory"],
            "NONE"
        );
        assert_eq!(body["visibility"]["com.linkedin.ugc.MemberNetworkVisibility"], "PUBLIC");
    }

    #[tokio::test]
    async fn publishes_as_resolved_member() {
        let (base, seen) = serve(HashMap::from([
            ("GET /v2/userinfo", (200, r#"{"sub": "m-42", "name": "Ada"}"#)),
            ("POST /v2/ugcPosts", (201, r#"{"id": "urn:li:share:7001"}"#)),
        ]))
        .await;

        let publisher = LinkedInPublisher::new("tok", &base, Duration::from_secs(5)).unwrap();
        let receipt = publisher.publish("Ship smaller", Visibility::Connections).await.unwrap();

        assert_eq!(receipt.post_id.as_deref(), Some("urn:li:share:7001"));
        assert!(!receipt.dry_run);

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert!(seen[1].contains("urn:li:person:m-42"));
        assert!(seen[1].contains("CONNECTIONS"));
    }

    #[tokio::test]
    async fn accepted_post_without_id_still_succeeds() {
        let (base, seen) = serve(HashMap::from([
            ("GET /v2/userinfo", (200, r#"{"sub": "m-42"}"#)),
            ("POST /v2/ugcPosts", (201, "{}")),
        ]))
        .await;
        let publisher = LinkedInPublisher::new("tok", &base, Duration::from_secs(5)).unwrap();

        let receipt = publisher.publish("Ship smaller", Visibility::Public).await.unwrap();
        assert_eq!(receipt.post_id, None);
        assert!(!receipt.dry_run);
        assert_eq!(seen.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn expired_token_is_unauthorized() {
        let (base, seen) = serve(HashMap::from([("GET /v2/userinfo", (401, "{}"))])).await;
        let publisher = LinkedInPublisher::new("expired", &base, Duration::from_secs(5)).unwrap();

        let err = publisher.publish("x", Visibility::Public).await.unwrap_err();
        assert!(matches!(err, PublishError::Unauthorized { status_code: 401 }));
        // Nothing was submitted
        assert_eq!(seen.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn rejected_post_carries_message() {
        let (base, _) = serve(HashMap::from([
            ("GET /v2/userinfo", (200, r#"{"sub": "m-42"}"#)),
            ("POST /v2/ugcPosts", (422, r#"{"message": "duplicate"}"#)),
        ]))
        .await;
        let publisher = LinkedInPublisher::new("tok", &base, Duration::from_secs(5)).unwrap();

        let err = publisher.publish("x", Visibility::Public).await.unwrap_err();
        match err {
            PublishError::Rejected { status_code, message } => {
                assert_eq!(status_code, 422);
                assert!(message.contains("duplicate"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn missing_sub_is_an_identity_error() {
        let (base, _) = serve(HashMap::from([("GET /v2/userinfo", (200, r#"{"name": "Ada"}"#))])).await;
        let publisher = LinkedInPublisher::new("tok", &base, Duration::from_secs(5)).unwrap();
        let err = publisher.resolve_identity().await.unwrap_err();
        assert!(matches!(err, PublishError::Identity(_)));
    }
}
