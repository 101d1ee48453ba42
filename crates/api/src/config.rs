use crate::auth::jwt::JwtConfig;

/// Server configuration loaded from environment variables.
///
/// All fields except the JWT secret have defaults suitable for local
/// development.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS`.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// How long shutdown waits for background jobs (default: `30`).
    pub shutdown_timeout_secs: u64,
    /// Lifetime of a collaborative cell lock (default: `30`).
    pub cell_edit_timeout_secs: i64,
    /// Streams unchecked for this long are auto-archived (default: `24`).
    pub stream_archive_after_hours: i64,
    /// JWT token configuration (secret, expiry durations).
    pub jwt: JwtConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                      | Default                 |
    /// |------------------------------|-------------------------|
    /// | `HOST`                       | `0.0.0.0`               |
    /// | `PORT`                       | `3000`                  |
    /// | `CORS_ORIGINS`               | `http://localhost:5173` |
    /// | `REQUEST_TIMEOUT_SECS`       | `30`                    |
    /// | `SHUTDOWN_TIMEOUT_SECS`      | `30`                    |
    /// | `CELL_EDIT_TIMEOUT_SECS`     | `30`                    |
    /// | `STREAM_ARCHIVE_AFTER_HOURS` | `24`                    |
    ///
    /// # Panics
    ///
    /// Panics on unparsable values or a missing `JWT_SECRET`.
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = env_or("PORT", "3000")
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = env_or("CORS_ORIGINS", "http://localhost:5173")
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = env_or("REQUEST_TIMEOUT_SECS", "30")
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let shutdown_timeout_secs: u64 = env_or("SHUTDOWN_TIMEOUT_SECS", "30")
            .parse()
            .expect("SHUTDOWN_TIMEOUT_SECS must be a valid u64");

        let cell_edit_timeout_secs: i64 = env_or("CELL_EDIT_TIMEOUT_SECS", "30")
            .parse()
            .expect("CELL_EDIT_TIMEOUT_SECS must be a valid i64");
        assert!(
            cell_edit_timeout_secs > 0,
            "CELL_EDIT_TIMEOUT_SECS must be positive"
        );

        let stream_archive_after_hours: i64 = env_or("STREAM_ARCHIVE_AFTER_HOURS", "24")
            .parse()
            .expect("STREAM_ARCHIVE_AFTER_HOURS must be a valid i64");

        let jwt = JwtConfig::from_env();

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            shutdown_timeout_secs,
            cell_edit_timeout_secs,
            stream_archive_after_hours,
            jwt,
        }
    }
}

pub(crate) fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
