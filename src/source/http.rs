//! HTTP Entry Source
//!
//! Fetches entries from a remote backend:
//!
//! ```text
//! GET {base_url}/users/{user_id}/emotions  ->  [EmotionEntry, ...]
//! ```
//!
//! There is no retry here; a failed request is returned as-is and the
//! calling layer decides what to do with it.

use super::*;
use reqwest::{Client, StatusCode};
use std::time::Duration;

/// Configuration for the HTTP source
#[derive(Debug, Clone)]
pub struct HttpSourceConfig {
    /// Base URL of the backend (e.g., "http://localhost:8090")
    pub base_url: String,
    /// Bearer token sent with every request
    pub token: Option<String>,
    /// Request timeout in milliseconds
    pub request_timeout_ms: u64,
}

impl Default for HttpSourceConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8090".to_string(),
            token: None,
            request_timeout_ms: 5000,
        }
    }
}

/// Entry source backed by a REST API
pub struct HttpSource {
    client: Client,
    config: HttpSourceConfig,
}

impl HttpSource {
    pub fn new(config: HttpSourceConfig) -> Result<Self, SourceError> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &HttpSourceConfig {
        &self.config
    }

    /// The user id is percent-encoded so it stays a single path segment
    fn entries_url(&self, user_id: &UserId) -> String {
        format!(
            "{}/users/{}/emotions",
            self.config.base_url.trim_end_matches('/'),
            urlencoding::encode(user_id.as_str())
        )
    }
}

fn map_request_error(e: reqwest::Error) -> SourceError {
    if e.is_timeout() {
        SourceError::Timeout
    } else if e.is_connect() {
        SourceError::Unavailable
    } else {
        SourceError::Request(e)
    }
}

#[async_trait]
impl EntrySource for HttpSource {
    fn name(&self) -> &str {
        "http"
    }

    async fn fetch_entries(&self, user_id: &UserId) -> Result<Vec<EmotionEntry>, SourceError> {
        let url = self.entries_url(user_id);

        let mut request = self.client.get(&url);
        if let Some(token) = &self.config.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(map_request_error)?;

        match response.status() {
            status if status.is_success() => {
                let entries: Vec<EmotionEntry> = response
                    .json()
                    .await
                    .map_err(|e| SourceError::Parse(e.to_string()))?;

                // Drop records that break entry invariants instead of failing the whole fetch
                let total = entries.len();
                let entries: Vec<EmotionEntry> = entries
                    .into_iter()
                    .filter(|e| e.validate().is_ok() && &e.owner_id == user_id)
                    .collect();
                if entries.len() < total {
                    tracing::warn!(
                        user = %user_id,
                        dropped = total - entries.len(),
                        "Dropped malformed entries from backend"
                    );
                }

                tracing::debug!(user = %user_id, count = entries.len(), "Fetched entries");
                Ok(entries)
            }
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                Err(SourceError::Unauthorized(user_id.to_string()))
            }
            status => {
                let message = match response.text().await {
                    Ok(body) => body,
                    Err(e) => {
                        tracing::debug!(user = %user_id, status = %status, error = %e, "Could not read error body");
                        String::new()
                    }
                };
                Err(SourceError::Api {
                    status: status.as_u16(),
                    message,
                })
            }
        }
    }
}
