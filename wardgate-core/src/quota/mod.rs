//! Quota primitives shared between the gateway engine and its backends.
//!
//! A request is classified into zero or more [`RateLimitTarget`]s, each naming
//! one configured limiter and the per-entity key to charge. The actual
//! counting lives behind the [`RateLimiter`] trait so the storage/algorithm
//! can be swapped without touching classification.

pub mod backend;
pub mod target;

pub use backend::{LimiterRegistry, QuotaDecision, RateLimiter, RegistryError};
pub use target::{keys, LimiterName, RateLimitTarget};
