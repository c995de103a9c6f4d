//! REST client for the upstream CareHub API.
//!
//! Provides the explicit per-request [`RequestContext`], typed wrappers for
//! the endpoints the proxy and screen models use, retry with backoff for
//! idempotent reads, and the async client traits the screen models are
//! generic over.

pub mod api;
pub mod context;
pub mod error;
pub mod retry;
pub mod traits;

pub use api::{UpstreamApi, UpstreamConfig};
pub use context::RequestContext;
pub use error::UpstreamError;
