//! Shared HTTP plumbing for the adapters.

use std::time::Duration;

use trendpost_core::error::SourceError;

/// Build the client every adapter uses. `timeout` is the default per request.
pub(crate) fn build_client(user_agent: &str, timeout: Duration) -> Result<reqwest::Client, SourceError> {
    reqwest::Client::builder()
        .user_agent(user_agent)
        .timeout(timeout)
        .build()
        .map_err(|e| SourceError::Request {
            source_name: "http".into(),
            reason: e.to_string(),
        })
}

/// GET `url`, failing on transport errors and non-2xx statuses.
pub(crate) async fn get(
    client: &reqwest::Client,
    url: &str,
    source_name: &str,
    timeout: Duration,
) -> Result<reqwest::Response, SourceError> {
    let response = client
        .get(url)
        .timeout(timeout)
        .send()
        .await
        .map_err(|e| map_reqwest(e, source_name, timeout))?;

    let status = response.status();
    if !status.is_success() {
        return Err(SourceError::Status {
            source_name: source_name.to_string(),
            status: status.as_u16(),
        });
    }
    Ok(response)
}

pub(crate) async fn get_text(
    client: &reqwest::Client,
    url: &str,
    source_name: &str,
    timeout: Duration,
) -> Result<String, SourceError> {
    get(client, url, source_name, timeout)
        .await?
        .text()
        .await
        .map_err(|e| map_reqwest(e, source_name, timeout))
}

pub(crate) async fn get_json<T: serde::de::DeserializeOwned>(
    client: &reqwest::Client,
    url: &str,
    source_name: &str,
    timeout: Duration,
) -> Result<T, SourceError> {
    let body = get_text(client, url, source_name, timeout).await?;
    serde_json::from_str(&body).map_err(|e| SourceError::Malformed {
        source_name: source_name.to_string(),
        reason: e.to_string(),
    })
}

fn map_reqwest(e: reqwest::Error, source_name: &str, timeout: Duration) -> SourceError {
    if e.is_timeout() {
        SourceError::Timeout {
            source_name: source_name.to_string(),
            timeout_secs: timeout.as_secs(),
        }
    } else {
        SourceError::Request {
            source_name: source_name.to_string(),
            reason: e.to_string(),
        }
    }
}

/// Truncate to at most `max` characters, on a char boundary.
pub(crate) fn truncate_chars(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => s[..idx].to_string(),
        None => s.to_string(),
    }
}
