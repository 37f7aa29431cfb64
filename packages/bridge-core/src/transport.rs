//! Cloud Transport — one reusable HTTPS client carrying the auth, device,
//! and per-request identity headers the radio API requires on every call.

use std::time::Duration;

use chrono::Local;
use reqwest::Client;
use serde_json::Value;

use crate::config::Config;
use crate::error::{BridgeError, BridgeResult};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(20);
const ERROR_BODY_SNIPPET_LEN: usize = 400;

/// Thin wrapper around a `reqwest::Client` pre-configured with the radio
/// API's base URL and static headers. Built once at bootstrap and shared by
/// every collaborator that talks to the cloud.
pub struct CloudTransport {
    client: Client,
    base_url: String,
    device_id: String,
    oauth_token: String,
}

impl CloudTransport {
    /// Builds the transport's static header set from configuration. Returns
    /// an error only if the HTTP client itself fails to construct (never in
    /// practice, but kept a `Result` to match the rest of the crate's
    /// fallible-construction idiom).
    pub fn new(config: &Config) -> BridgeResult<Self> {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert("Accept", "application/json".parse().unwrap());
        headers.insert(
            "Accept-Language",
            config.accept_language.parse().unwrap_or_else(|_| "en".parse().unwrap()),
        );
        headers.insert(
            "User-Agent",
            config
                .user_agent
                .parse()
                .unwrap_or_else(|_| "ym-bridge/0.1".parse().unwrap()),
        );
        headers.insert(
            "X-Yandex-Music-Client",
            config.music_client.parse().unwrap_or_else(|_| "".parse().unwrap()),
        );
        headers.insert(
            "X-Yandex-Music-Content-Type",
            config.content_type.parse().unwrap_or_else(|_| "".parse().unwrap()),
        );
        headers.insert(
            "X-Yandex-Music-Device",
            config.device_header.parse().unwrap_or_else(|_| "".parse().unwrap()),
        );
        if !config.oauth_token.is_empty() {
            headers.insert(
                "Authorization",
                format!("OAuth {}", config.oauth_token)
                    .parse()
                    .unwrap_or_else(|_| "".parse().unwrap()),
            );
        }

        let client = Client::builder()
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(BridgeError::TransportRequest)?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            device_id: config.device_id.clone(),
            oauth_token: config.oauth_token.clone(),
        })
    }

    #[must_use]
    pub fn has_oauth_token(&self) -> bool {
        !self.oauth_token.is_empty()
    }

    /// Shared underlying client, for collaborators (the stream resolver's
    /// download-info XML fetch) that need to issue requests outside the
    /// `base_url`-scoped API surface.
    #[must_use]
    pub fn http_client(&self) -> &Client {
        &self.client
    }

    /// Issues a JSON request against an endpoint relative to `base_url`,
    /// attaching the per-request `X-Request-Id` and
    /// `X-Yandex-Music-Client-Now` headers and the `device-id` query
    /// parameter. Returns the decoded JSON body, or an empty object for an
    /// empty response.
    pub async fn request_json(
        &self,
        method: reqwest::Method,
        endpoint: &str,
        body: Option<&Value>,
        extra_query: &[(&str, String)],
    ) -> BridgeResult<Value> {
        let url = format!("{}{}", self.base_url, endpoint);
        let mut req = self
            .client
            .request(method, &url)
            .header("X-Request-Id", uuid::Uuid::new_v4().to_string())
            .header(
                "X-Yandex-Music-Client-Now",
                Local::now().format("%Y-%m-%dT%H:%M:%S%:z").to_string(),
            );

        let mut query: Vec<(&str, String)> = Vec::new();
        if !self.device_id.is_empty() {
            query.push(("device-id", self.device_id.clone()));
        }
        query.extend(extra_query.iter().cloned());
        if !query.is_empty() {
            req = req.query(&query);
        }
        if let Some(body) = body {
            req = req.json(body);
        }

        let response = req.send().await.map_err(BridgeError::TransportRequest)?;
        let status = response.status();
        let text = response.text().await.map_err(BridgeError::TransportRequest)?;

        if !status.is_success() {
            return Err(BridgeError::Transport {
                status: Some(status.as_u16()),
                body: truncate_body_snippet(&text, ERROR_BODY_SNIPPET_LEN),
            });
        }

        if text.is_empty() {
            return Ok(Value::Object(serde_json::Map::new()));
        }
        serde_json::from_str(&text).map_err(BridgeError::Json)
    }
}

/// Truncates `body` to at most `max_bytes` bytes, rounding down to the
/// nearest char boundary so multi-byte (e.g. Cyrillic) error bodies never
/// split a character mid-codepoint.
fn truncate_body_snippet(body: &str, max_bytes: usize) -> String {
    let boundary = body
        .char_indices()
        .map(|(i, c)| i + c.len_utf8())
        .take_while(|&end| end <= max_bytes)
        .last()
        .unwrap_or(0);
    body[..boundary].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_body_snippet_respects_char_boundaries() {
        let body = "оши".repeat(200); // multi-byte repeating text, well past 400 bytes
        let snippet = truncate_body_snippet(&body, 400);
        assert!(snippet.len() <= 400);
        assert!(body.starts_with(&snippet));
    }

    #[test]
    fn truncate_body_snippet_is_a_no_op_under_the_limit() {
        assert_eq!(truncate_body_snippet("short body", 400), "short body");
    }

    #[test]
    fn has_oauth_token_reflects_config() {
        let mut config = Config::default();
        let transport = CloudTransport::new(&config).unwrap();
        assert!(!transport.has_oauth_token());

        config.oauth_token = "token123".to_string();
        let transport = CloudTransport::new(&config).unwrap();
        assert!(transport.has_oauth_token());
    }
}
