//! CareHub browser-facing API server library.
//!
//! A backend-for-frontend in front of the upstream REST API: it owns the
//! session cookie, enforces the assignment lifecycle and day-lock rules
//! before forwarding writes, and shapes responses for the browser. Exposes
//! config, state, error handling, routes and the screen models so
//! integration tests and the binary entrypoint share them.

pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod response;
pub mod router;
pub mod routes;
pub mod screens;
pub mod session;
pub mod state;
