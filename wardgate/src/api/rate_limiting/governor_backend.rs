//! Default in-process quota backend built on governor's keyed token buckets.
//!
//! One keyed limiter per configured tier; the key partitions the bucket per
//! entity (`ip:...`, `user:...`, ...). Governor's state store is linearizable
//! per key, which is exactly the contract the gate requires.

use std::collections::HashMap;
use std::num::NonZeroU32;
use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use chrono::Utc;
use governor::clock::{Clock, DefaultClock};
use governor::state::keyed::DefaultKeyedStateStore;
use governor::{Quota, RateLimiter as KeyedLimiter};
use wardgate_core::quota::{LimiterName, LimiterRegistry, QuotaDecision, RateLimiter};
use wardgate_core::settings::rate_limiting::{RateLimitingConfig, TierConfig};

pub struct GovernorLimiter {
    limiter: KeyedLimiter<String, DefaultKeyedStateStore<String>, DefaultClock>,
    clock: DefaultClock,
}

impl GovernorLimiter {
    pub fn new(tier: &TierConfig) -> anyhow::Result<Self> {
        let per_minute = NonZeroU32::new(tier.requests_per_minute)
            .context("requests_per_minute must be greater than 0")?;
        let burst = NonZeroU32::new(tier.burst_size).context("burst_size must be greater than 0")?;
        let quota = Quota::per_minute(per_minute).allow_burst(burst);
        let clock = DefaultClock::default();
        let limiter = KeyedLimiter::new(quota, DefaultKeyedStateStore::default(), clock.clone());
        Ok(Self { limiter, clock })
    }
}

#[async_trait]
impl RateLimiter for GovernorLimiter {
    async fn consume(&self, key: &str, permits: u32) -> anyhow::Result<QuotaDecision> {
        let permits = NonZeroU32::new(permits).context("permits must be greater than 0")?;
        match self.limiter.check_key_n(&key.to_string(), permits) {
            Ok(Ok(())) => Ok(QuotaDecision::accept()),
            Ok(Err(not_until)) => {
                let wait = not_until.wait_time_from(self.clock.now());
                let seconds = (wait.as_secs() as i64).max(1);
                Ok(QuotaDecision::reject_until(Utc::now().timestamp() + seconds))
            }
            // More permits requested than the bucket can ever hold.
            Err(_) => Ok(QuotaDecision::reject_until(Utc::now().timestamp() + 60)),
        }
    }
}

/// Backend for disabled tiers and the global kill switch.
struct Unlimited;

#[async_trait]
impl RateLimiter for Unlimited {
    async fn consume(&self, _key: &str, _permits: u32) -> anyhow::Result<QuotaDecision> {
        Ok(QuotaDecision::accept())
    }
}

/// Build the full registry from configuration. Fails on an incomplete or
/// inconsistent limiter map, which is a deployment defect surfaced at startup.
pub fn build_registry(config: &RateLimitingConfig) -> anyhow::Result<LimiterRegistry> {
    config.validate()?;

    let mut limiters: HashMap<LimiterName, Arc<dyn RateLimiter>> = HashMap::new();
    for name in LimiterName::ALL {
        let tier = config
            .tier(name)
            .with_context(|| format!("no rate limit tier configured for '{name}'"))?;
        let limiter: Arc<dyn RateLimiter> = if config.enabled && tier.is_enabled() {
            Arc::new(GovernorLimiter::new(tier)?)
        } else {
            Arc::new(Unlimited)
        };
        limiters.insert(name, limiter);
    }
    Ok(LimiterRegistry::new(limiters)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_burst_is_admitted_then_rejected() {
        let limiter = GovernorLimiter::new(&TierConfig::new(60, 2)).unwrap();
        assert!(limiter.consume("ip:1.2.3.4", 1).await.unwrap().accepted);
        assert!(limiter.consume("ip:1.2.3.4", 1).await.unwrap().accepted);
        let decision = limiter.consume("ip:1.2.3.4", 1).await.unwrap();
        assert!(!decision.accepted);
        assert!(decision.retry_after_unix > Utc::now().timestamp() - 1);
    }

    #[tokio::test]
    async fn test_keys_are_independent_buckets() {
        let limiter = GovernorLimiter::new(&TierConfig::new(60, 1)).unwrap();
        assert!(limiter.consume("ip:1.1.1.1", 1).await.unwrap().accepted);
        assert!(!limiter.consume("ip:1.1.1.1", 1).await.unwrap().accepted);
        assert!(limiter.consume("ip:2.2.2.2", 1).await.unwrap().accepted);
    }

    #[tokio::test]
    async fn test_rejected_decision_yields_positive_retry_after() {
        let limiter = GovernorLimiter::new(&TierConfig::new(60, 1)).unwrap();
        limiter.consume("user:u1", 1).await.unwrap();
        let decision = limiter.consume("user:u1", 1).await.unwrap();
        assert!(decision.retry_after_secs(Utc::now().timestamp()) >= 1);
    }

    #[tokio::test]
    async fn test_disabled_tier_always_admits() {
        let mut config = RateLimitingConfig::default();
        config
            .limiters
            .insert(LimiterName::UserCollection, TierConfig::new(0, 0));
        let registry = build_registry(&config).unwrap();
        let limiter = registry.get(LimiterName::UserCollection);
        for _ in 0..100 {
            assert!(limiter.consume("ip:1.2.3.4", 1).await.unwrap().accepted);
        }
    }

    #[test]
    fn test_build_registry_rejects_invalid_tier() {
        let mut config = RateLimitingConfig::default();
        config
            .limiters
            .insert(LimiterName::SigninIp, TierConfig::new(10, 20));
        assert!(build_registry(&config).is_err());
    }

    #[test]
    fn test_build_registry_from_defaults() {
        assert!(build_registry(&RateLimitingConfig::default()).is_ok());
    }
}
