//! Notion REST client with retry.
//!
//! Every request goes through [`NotionClient::send_with_retry`]. Rate limits
//! (429) wait for `Retry-After`; 5xx responses and transport failures back
//! off exponentially; any other error status fails immediately.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, RETRY_AFTER};
use reqwest::{RequestBuilder, StatusCode};
use serde_json::{json, Value};

use crate::config::NotionConfig;
use crate::mapping::StreamRecord;

/// First backoff delay; doubles with every attempt.
const BASE_BACKOFF: Duration = Duration::from_millis(500);

/// Upper bound on a single backoff delay.
const MAX_BACKOFF: Duration = Duration::from_secs(8);

/// Wait used for a 429 without a usable `Retry-After` header.
const DEFAULT_RETRY_AFTER: Duration = Duration::from_secs(1);

/// Notion's maximum page size for database queries.
const PAGE_SIZE: u32 = 100;

/// Stop following `next_cursor` after this many pages.
const MAX_QUERY_PAGES: usize = 20;

#[derive(Debug, thiserror::Error)]
pub enum NotionError {
    #[error("Invalid Notion client configuration: {0}")]
    Config(String),

    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Notion answered with a non-retryable error status.
    #[error("Notion API error ({status}): {body}")]
    Api { status: u16, body: String },

    #[error("Notion request failed after {attempts} attempts: {last}")]
    RetriesExhausted { attempts: u32, last: String },

    #[error("Unexpected Notion response: {0}")]
    Decode(String),
}

/// Backoff before retry number `attempt + 1`: 500 ms, 1 s, 2 s, ... capped
/// at 8 s.
pub fn backoff_delay(attempt: u32) -> Duration {
    BASE_BACKOFF
        .checked_mul(2u32.saturating_pow(attempt))
        .map_or(MAX_BACKOFF, |d| d.min(MAX_BACKOFF))
}

/// Parse a `Retry-After` header given in seconds.
pub fn retry_after_delay(header: Option<&str>) -> Duration {
    header
        .and_then(|v| v.trim().parse::<f64>().ok())
        .filter(|secs| secs.is_finite() && *secs >= 0.0)
        .map_or(DEFAULT_RETRY_AFTER, Duration::from_secs_f64)
}

/// How long to wait before retrying a failed attempt, or `None` when the
/// failure is final. `status` is `None` for transport errors.
pub fn retry_delay(status: Option<StatusCode>, retry_after: Option<&str>, attempt: u32) -> Option<Duration> {
    match status {
        None => Some(backoff_delay(attempt)),
        Some(StatusCode::TOO_MANY_REQUESTS) => Some(retry_after_delay(retry_after)),
        Some(s) if s.is_server_error() => Some(backoff_delay(attempt)),
        Some(_) => None,
    }
}

/// Whether `id` looks like a Notion page id (32 hex digits, dashes optional).
pub fn is_page_id(id: &str) -> bool {
    let hex: Vec<char> = id.chars().filter(|c| *c != '-').collect();
    hex.len() == 32 && hex.iter().all(char::is_ascii_hexdigit)
}

/// Client for one Notion database.
pub struct NotionClient {
    http: reqwest::Client,
    api_url: String,
    database_id: String,
    max_retries: u32,
}

impl NotionClient {
    pub fn new(config: &NotionConfig) -> Result<Self, NotionError> {
        let mut headers = HeaderMap::new();
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", config.token))
            .map_err(|_| NotionError::Config("NOTION_TOKEN is not a valid header value".into()))?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);
        headers.insert(
            "Notion-Version",
            HeaderValue::from_str(&config.api_version)
                .map_err(|_| NotionError::Config("NOTION_API_VERSION is not a valid header value".into()))?,
        );

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self {
            http,
            api_url: config.api_url.clone(),
            database_id: config.database_id.clone(),
            max_retries: config.max_retries,
        })
    }

    /// Send a request built by `build`, retrying per the module rules, and
    /// decode the JSON body of the first successful response.
    async fn send_with_retry<F>(&self, operation: &'static str, build: F) -> Result<Value, NotionError>
    where
        F: Fn() -> RequestBuilder,
    {
        let mut attempt = 0;
        loop {
            let (delay, last) = match build().send().await {
                Ok(response) if response.status().is_success() => {
                    return Ok(response.json::<Value>().await?);
                }
                Ok(response) => {
                    let status = response.status();
                    let retry_after = response
                        .headers()
                        .get(RETRY_AFTER)
                        .and_then(|v| v.to_str().ok())
                        .map(str::to_string);
                    let body = response.text().await.unwrap_or_default();
                    match retry_delay(Some(status), retry_after.as_deref(), attempt) {
                        Some(delay) => (delay, format!("HTTP {}", status.as_u16())),
                        None => {
                            tracing::error!(operation, status = status.as_u16(), "Notion request rejected");
                            return Err(NotionError::Api {
                                status: status.as_u16(),
                                body,
                            });
                        }
                    }
                }
                Err(e) => (backoff_delay(attempt), e.to_string()),
            };

            if attempt >= self.max_retries {
                tracing::error!(operation, attempts = attempt + 1, last = %last, "Notion retries exhausted");
                return Err(NotionError::RetriesExhausted {
                    attempts: attempt + 1,
                    last,
                });
            }

            tracing::warn!(
                operation,
                attempt = attempt + 1,
                delay_ms = delay.as_millis() as u64,
                reason = %last,
                "Notion request failed, retrying"
            );
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }

    /// All non-archived pages of the database, most recently edited first.
    pub async fn query_database(&self) -> Result<Vec<StreamRecord>, NotionError> {
        let url = format!("{}/databases/{}/query", self.api_url, self.database_id);
        let mut records = Vec::new();
        let mut cursor: Option<String> = None;

        for _ in 0..MAX_QUERY_PAGES {
            let mut body = json!({
                "page_size": PAGE_SIZE,
                "sorts": [{ "timestamp": "last_edited_time", "direction": "descending" }],
            });
            if let Some(c) = &cursor {
                body["start_cursor"] = Value::String(c.clone());
            }

            let page = self
                .send_with_retry("query_database", || self.http.post(&url).json(&body))
                .await?;
            let results = page
                .get("results")
                .and_then(Value::as_array)
                .ok_or_else(|| NotionError::Decode("query response has no results".into()))?;
            records.extend(results.iter().filter_map(StreamRecord::from_page));

            cursor = match (page.get("has_more"), page.get("next_cursor")) {
                (Some(Value::Bool(true)), Some(Value::String(next))) => Some(next.clone()),
                _ => return Ok(records),
            };
        }

        tracing::warn!(pages = MAX_QUERY_PAGES, "Notion query truncated");
        Ok(records)
    }

    /// Set page properties and return the updated record.
    pub async fn update_page(&self, page_id: &str, properties: &Value) -> Result<StreamRecord, NotionError> {
        let body = json!({ "properties": properties });
        self.patch_page("update_page", page_id, &body).await
    }

    /// Move a page to the Notion trash.
    pub async fn archive_page(&self, page_id: &str) -> Result<StreamRecord, NotionError> {
        self.patch_page("archive_page", page_id, &json!({ "archived": true }))
            .await
    }

    async fn patch_page(
        &self,
        operation: &'static str,
        page_id: &str,
        body: &Value,
    ) -> Result<StreamRecord, NotionError> {
        let url = format!("{}/pages/{}", self.api_url, page_id);
        let page = self
            .send_with_retry(operation, || self.http.patch(&url).json(body))
            .await?;
        StreamRecord::from_page(&page)
            .ok_or_else(|| NotionError::Decode("page response has no id".into()))
    }
}
