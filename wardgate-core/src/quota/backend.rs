use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use super::target::LimiterName;

/// Result of consuming permits from one limiter.
///
/// `retry_after_unix` is only meaningful for rejected decisions and carries
/// the unix timestamp at which the bucket is expected to admit the caller
/// again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotaDecision {
    pub accepted: bool,
    pub retry_after_unix: i64,
}

impl QuotaDecision {
    pub fn accept() -> Self {
        Self {
            accepted: true,
            retry_after_unix: 0,
        }
    }

    pub fn reject_until(retry_after_unix: i64) -> Self {
        Self {
            accepted: false,
            retry_after_unix,
        }
    }

    /// Seconds a rejected caller should wait, measured against `now_unix` and
    /// clamped to at least one second so `Retry-After` is always positive.
    pub fn retry_after_secs(&self, now_unix: i64) -> u64 {
        (self.retry_after_unix - now_unix).max(1) as u64
    }
}

/// Contract the gateway requires from a quota backend: an atomically
/// linearizable consume per key. Concurrent requests with the same key must
/// never both be accepted past the configured limit.
#[async_trait]
pub trait RateLimiter: Send + Sync {
    async fn consume(&self, key: &str, permits: u32) -> anyhow::Result<QuotaDecision>;
}

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("no limiter configured for '{0}'")]
    MissingLimiter(LimiterName),
}

/// Read-only lookup table from limiter name to backend, validated complete at
/// construction. A missing name is a deployment defect and surfaces here, at
/// startup, not inside request handling.
pub struct LimiterRegistry {
    limiters: HashMap<LimiterName, Arc<dyn RateLimiter>>,
}

impl std::fmt::Debug for LimiterRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LimiterRegistry")
            .field("limiters", &self.limiters.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl LimiterRegistry {
    pub fn new(limiters: HashMap<LimiterName, Arc<dyn RateLimiter>>) -> Result<Self, RegistryError> {
        for name in LimiterName::ALL {
            if !limiters.contains_key(&name) {
                return Err(RegistryError::MissingLimiter(name));
            }
        }
        Ok(Self { limiters })
    }

    pub fn get(&self, name: LimiterName) -> &Arc<dyn RateLimiter> {
        self.limiters
            .get(&name)
            .expect("limiter registry is validated complete at construction")
    }
}
