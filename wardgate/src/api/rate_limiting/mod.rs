//! Rate limiting for the gateway.
//!
//! Two layers of quotas apply to every `/api/*` request:
//! - endpoint-specific buckets (sign-in, two-factor flows, registration,
//!   token exchange, user reads and mutations), consumed in a fixed order
//!   with short-circuit on the first rejection
//! - a global per-IP bucket, split into anonymous and authenticated tiers,
//!   consumed only after every endpoint bucket admitted
//!
//! Classification lives in [`matcher`] and [`auth_targets`]; enforcement in
//! [`gate`]; the default in-process token-bucket backend in
//! [`governor_backend`].

pub mod auth_targets;
pub mod gate;
pub mod governor_backend;
pub mod matcher;

pub use auth_targets::AuthTargetResolver;
pub use governor_backend::build_registry;
