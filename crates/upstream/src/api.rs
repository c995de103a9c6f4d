//! HTTP client for the upstream REST API.
//!
//! Wraps the endpoints behind the proxy using [`reqwest`]. Every call takes
//! the caller's [`RequestContext`], sends `Authorization: Bearer <token>`
//! and `Cache-Control: no-store`, and parses bodies leniently so empty or
//! non-JSON responses never surface as parse errors.

use std::time::Duration;

use carehub_core::entities::CurrentUser;
use carehub_core::lenient;
use reqwest::header::{ACCEPT, AUTHORIZATION, CACHE_CONTROL};
use reqwest::Method;
use serde::Serialize;
use serde_json::Value;

use crate::context::RequestContext;
use crate::error::UpstreamError;
use crate::retry::{next_delay, RetryConfig};

/// Query string pairs forwarded to the upstream API.
pub type Query = [(String, String)];

/// Connection settings for [`UpstreamApi`].
#[derive(Debug, Clone)]
pub struct UpstreamConfig {
    /// Base URL, e.g. `http://api.internal:4000`.
    pub base_url: String,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Backoff for idempotent reads.
    pub retry: RetryConfig,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:4000".to_string(),
            timeout: Duration::from_secs(15),
            retry: RetryConfig::default(),
        }
    }
}

/// HTTP client for the upstream API. Cheap to clone (shared connection pool).
#[derive(Debug, Clone)]
pub struct UpstreamApi {
    client: reqwest::Client,
    base_url: String,
    retry: RetryConfig,
}

impl UpstreamApi {
    pub fn new(config: UpstreamConfig) -> Result<Self, UpstreamError> {
        let base_url = config.base_url.trim().trim_end_matches('/').to_string();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(UpstreamError::Config(format!(
                "UPSTREAM_BASE_URL must start with http:// or https://, got '{base_url}'"
            )));
        }
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            client,
            base_url,
            retry: config.retry,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    // ---- verbs ----

    /// `GET`, retried with backoff on transport errors and gateway statuses.
    pub async fn get(
        &self,
        ctx: &RequestContext,
        path: &str,
        query: &Query,
    ) -> Result<Value, UpstreamError> {
        let mut delay = self.retry.initial_delay;
        let mut attempt = 0u32;

        loop {
            attempt += 1;
            match self.execute(Method::GET, Some(ctx), path, query, None).await {
                Ok(value) => return Ok(value),
                Err(err) if err.is_retryable() && attempt <= self.retry.max_retries => {
                    tracing::warn!(
                        path,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "Retrying upstream read",
                    );
                    tokio::time::sleep(delay).await;
                    delay = next_delay(delay, &self.retry);
                }
                Err(err) => return Err(err),
            }
        }
    }

    pub async fn post<B: Serialize + ?Sized>(
        &self,
        ctx: &RequestContext,
        path: &str,
        body: &B,
    ) -> Result<Value, UpstreamError> {
        let body = to_value(body)?;
        self.execute(Method::POST, Some(ctx), path, &[], Some(&body))
            .await
    }

    pub async fn patch<B: Serialize + ?Sized>(
        &self,
        ctx: &RequestContext,
        path: &str,
        body: &B,
    ) -> Result<Value, UpstreamError> {
        let body = to_value(body)?;
        self.execute(Method::PATCH, Some(ctx), path, &[], Some(&body))
            .await
    }

    /// `PATCH` without a body (deactivate / reactivate toggles).
    pub async fn patch_empty(
        &self,
        ctx: &RequestContext,
        path: &str,
    ) -> Result<Value, UpstreamError> {
        self.execute(Method::PATCH, Some(ctx), path, &[], None).await
    }

    pub async fn delete(
        &self,
        ctx: &RequestContext,
        path: &str,
        query: &Query,
    ) -> Result<Value, UpstreamError> {
        self.execute(Method::DELETE, Some(ctx), path, query, None)
            .await
    }

    // ---- typed endpoints ----

    /// `POST /auth/login` -- the only unauthenticated call.
    pub async fn login(&self, email: &str, password: &str) -> Result<Value, UpstreamError> {
        let body = serde_json::json!({ "email": email, "password": password });
        self.execute(Method::POST, None, "/auth/login", &[], Some(&body))
            .await
    }

    /// `GET /users/me` -- caller identity and role.
    pub async fn current_user(&self, ctx: &RequestContext) -> Result<CurrentUser, UpstreamError> {
        let value = lenient::unwrap_data(self.get(ctx, "/users/me", &[]).await?);
        Ok(lenient::decode(value))
    }

    // ---- private helpers ----

    fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    async fn execute(
        &self,
        method: Method,
        ctx: Option<&RequestContext>,
        path: &str,
        query: &Query,
        body: Option<&Value>,
    ) -> Result<Value, UpstreamError> {
        let mut request = self
            .client
            .request(method.clone(), self.url(path))
            .header(ACCEPT, "application/json")
            .header(CACHE_CONTROL, "no-store");
        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(ctx) = ctx {
            request = request.header(AUTHORIZATION, ctx.bearer());
            if let Some(request_id) = ctx.request_id() {
                request = request.header("x-request-id", request_id);
            }
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        tracing::debug!(%method, path, "Upstream request");

        let response = request.send().await.map_err(|err| {
            tracing::error!(%method, path, error = %err, "Upstream request failed");
            UpstreamError::Request(err)
        })?;

        let status = response.status();
        let bytes = response.bytes().await?;
        let value = lenient::parse_body(&bytes);

        if status.is_success() {
            return Ok(value);
        }

        let err = UpstreamError::api(status.as_u16(), value);
        if status.is_server_error() {
            tracing::error!(%method, path, status = status.as_u16(), error = %err, "Upstream error");
        } else {
            tracing::warn!(%method, path, status = status.as_u16(), error = %err, "Upstream rejected request");
        }
        Err(err)
    }
}

fn to_value<B: Serialize + ?Sized>(body: &B) -> Result<Value, UpstreamError> {
    serde_json::to_value(body)
        .map_err(|e| UpstreamError::Config(format!("Unserializable request body: {e}")))
}

/// Percent-encode an id for use as a single path segment.
///
/// Ids come from browser-controlled route parameters; encoding keeps a
/// value such as `../users` from changing the upstream path.
pub fn path_segment(id: &str) -> String {
    let mut out = String::with_capacity(id.len());
    for byte in id.bytes() {
        if byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'.' | b'_' | b'~') {
            out.push(byte as char);
        } else {
            out.push_str(&format!("%{byte:02X}"));
        }
    }
    out
}
