//! Domain logic shared by the CareHub proxy and its screen models.
//!
//! Nothing in this crate performs I/O. The lifecycle, lock, signature and
//! ledger rules live here once so every route and screen derives them the
//! same way.

pub mod calendar;
pub mod concurrency;
pub mod day_lock;
pub mod entities;
pub mod entries;
pub mod error;
pub mod failure;
pub mod ledger;
pub mod lenient;
pub mod lifecycle;
pub mod roles;
pub mod signature;
pub mod types;
