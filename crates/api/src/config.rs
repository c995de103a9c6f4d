use std::time::Duration;

use carehub_core::calendar::DayCalendar;
use carehub_upstream::retry::RetryConfig;
use carehub_upstream::UpstreamConfig;

/// Server configuration loaded from environment variables.
///
/// All fields have defaults suitable for local development against an
/// upstream API on `localhost:4000`.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Base URL of the upstream REST API.
    pub upstream_base_url: String,
    /// Per-call upstream timeout in seconds (default: `15`).
    pub upstream_timeout_secs: u64,
    /// Extra attempts for idempotent upstream reads (default: `2`).
    pub upstream_max_retries: u32,
    /// Whether the session cookie carries the `Secure` attribute.
    pub session_cookie_secure: bool,
    /// Wall clock used to derive an assignment's calendar day.
    pub calendar: DayCalendar,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                 | Default                 |
    /// |-------------------------|-------------------------|
    /// | `HOST`                  | `0.0.0.0`               |
    /// | `PORT`                  | `3000`                  |
    /// | `CORS_ORIGINS`          | `http://localhost:5173` |
    /// | `REQUEST_TIMEOUT_SECS`  | `30`                    |
    /// | `UPSTREAM_BASE_URL`     | `http://localhost:4000` |
    /// | `UPSTREAM_TIMEOUT_SECS` | `15`                    |
    /// | `UPSTREAM_MAX_RETRIES`  | `2`                     |
    /// | `SESSION_COOKIE_SECURE` | `true`                  |
    /// | `APP_TIMEZONE_OFFSET`   | `local`                 |
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins = parse_origins(
            &std::env::var("CORS_ORIGINS").unwrap_or_else(|_| "http://localhost:5173".into()),
        );

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let upstream_base_url = std::env::var("UPSTREAM_BASE_URL")
            .unwrap_or_else(|_| "http://localhost:4000".into());

        let upstream_timeout_secs: u64 = std::env::var("UPSTREAM_TIMEOUT_SECS")
            .unwrap_or_else(|_| "15".into())
            .parse()
            .expect("UPSTREAM_TIMEOUT_SECS must be a valid u64");

        let upstream_max_retries: u32 = std::env::var("UPSTREAM_MAX_RETRIES")
            .unwrap_or_else(|_| "2".into())
            .parse()
            .expect("UPSTREAM_MAX_RETRIES must be a valid u32");

        let session_cookie_secure = parse_bool(
            &std::env::var("SESSION_COOKIE_SECURE").unwrap_or_else(|_| "true".into()),
        )
        .expect("SESSION_COOKIE_SECURE must be true or false");

        let calendar = DayCalendar::parse(
            &std::env::var("APP_TIMEZONE_OFFSET").unwrap_or_else(|_| "local".into()),
        )
        .unwrap_or_else(|e| panic!("APP_TIMEZONE_OFFSET: {e}"));

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            upstream_base_url,
            upstream_timeout_secs,
            upstream_max_retries,
            session_cookie_secure,
            calendar,
        }
    }

    /// Client settings for [`carehub_upstream::UpstreamApi`].
    pub fn upstream(&self) -> UpstreamConfig {
        UpstreamConfig {
            base_url: self.upstream_base_url.clone(),
            timeout: Duration::from_secs(self.upstream_timeout_secs),
            retry: RetryConfig {
                max_retries: self.upstream_max_retries,
                ..RetryConfig::default()
            },
        }
    }
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}
