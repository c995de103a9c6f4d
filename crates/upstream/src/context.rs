//! Per-request caller context.
//!
//! The bearer token never lives in shared state: each BFF request builds a
//! [`RequestContext`] from its session cookie and passes it into every
//! upstream call it makes.

/// Credentials and correlation data for one browser request.
#[derive(Clone)]
pub struct RequestContext {
    token: String,
    request_id: Option<String>,
}

impl RequestContext {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            request_id: None,
        }
    }

    /// Attach the inbound `x-request-id` so upstream logs can be correlated.
    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn request_id(&self) -> Option<&str> {
        self.request_id.as_deref()
    }

    /// `Authorization` header value.
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.token)
    }
}

impl std::fmt::Debug for RequestContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestContext")
            .field("token", &"<redacted>")
            .field("request_id", &self.request_id)
            .finish()
    }
}
