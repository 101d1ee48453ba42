use std::time::Duration;

use anyhow::Context;

/// Default `Notion-Version` header value.
pub const DEFAULT_API_VERSION: &str = "2022-06-28";

const DEFAULT_API_URL: &str = "https://api.notion.com/v1";

/// Proxy configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct NotionConfig {
    pub host: String,
    pub port: u16,
    pub token: String,
    pub database_id: String,
    /// Base URL of the Notion REST API, without a trailing slash.
    pub api_url: String,
    pub api_version: String,
    pub cache_ttl: Duration,
    /// Retries after the first attempt.
    pub max_retries: u32,
    pub request_timeout: Duration,
}

impl NotionConfig {
    /// Load configuration from environment variables.
    ///
    /// | Env var                  | Default                     |
    /// |--------------------------|-----------------------------|
    /// | `NOTION_TOKEN`           | required                    |
    /// | `NOTION_DATABASE_ID`     | required                    |
    /// | `NOTION_HOST`            | `0.0.0.0`                   |
    /// | `NOTION_PORT`            | `8787`                      |
    /// | `NOTION_API_URL`         | `https://api.notion.com/v1` |
    /// | `NOTION_API_VERSION`     | `2022-06-28`                |
    /// | `NOTION_CACHE_TTL_SECS`  | `60`                        |
    /// | `NOTION_MAX_RETRIES`     | `3`                         |
    /// | `NOTION_TIMEOUT_SECS`    | `15`                        |
    pub fn from_env() -> anyhow::Result<Self> {
        let token = std::env::var("NOTION_TOKEN").context("NOTION_TOKEN must be set")?;
        let database_id =
            std::env::var("NOTION_DATABASE_ID").context("NOTION_DATABASE_ID must be set")?;

        Ok(Self {
            host: std::env::var("NOTION_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: parse_var("NOTION_PORT", 8787)?,
            token,
            database_id,
            api_url: std::env::var("NOTION_API_URL")
                .map(|u| u.trim_end_matches('/').to_string())
                .unwrap_or_else(|_| DEFAULT_API_URL.into()),
            api_version: std::env::var("NOTION_API_VERSION")
                .unwrap_or_else(|_| DEFAULT_API_VERSION.into()),
            cache_ttl: Duration::from_secs(parse_var("NOTION_CACHE_TTL_SECS", 60)?),
            max_retries: parse_var("NOTION_MAX_RETRIES", 3)?,
            request_timeout: Duration::from_secs(parse_var("NOTION_TIMEOUT_SECS", 15)?),
        })
    }
}

fn parse_var<T>(name: &str, default: T) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(name) {
        Ok(raw) => raw
            .parse()
            .with_context(|| format!("{name} must be a valid number, got '{raw}'")),
        Err(_) => Ok(default),
    }
}
