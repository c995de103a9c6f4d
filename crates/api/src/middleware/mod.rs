//! Session and authorization extractors.
//!
//! - [`auth::Session`] -- Builds the caller's upstream request context from the
//!   `be_access` cookie.
//! - [`rbac::RequireAdmin`] -- Requires the `ADMIN` role, resolved upstream.
//! - [`rbac::RequireEmployee`] -- Requires the `EMPLOYEE` role.

pub mod auth;
pub mod rbac;
