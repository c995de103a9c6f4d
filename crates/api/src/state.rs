use std::sync::Arc;

use carehub_upstream::UpstreamApi;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Holds no per-user data: the caller's token travels in each request's
/// [`RequestContext`](carehub_upstream::RequestContext).
#[derive(Clone)]
pub struct AppState {
    /// Upstream REST client (shared connection pool).
    pub upstream: Arc<UpstreamApi>,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
}
