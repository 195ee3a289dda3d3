use std::collections::HashMap;

use serde::Deserialize;
use thiserror::Error;

use crate::quota::LimiterName;

#[derive(Debug, Error)]
#[error("Rate limiting configuration error: {message}")]
pub struct RateLimitingValidationError {
    pub message: String,
}

/// Rate limiting configuration for the gateway.
///
/// Every limiter name the engine can charge must carry a tier here; a missing
/// entry fails startup validation rather than surfacing as a request-time
/// branch.
#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitingConfig {
    /// Global enable/disable switch for all rate limiting
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Per-limiter quota tiers, keyed by limiter name
    #[serde(default = "default_limiters")]
    pub limiters: HashMap<LimiterName, TierConfig>,
}

fn default_enabled() -> bool {
    true
}

impl Default for RateLimitingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            limiters: default_limiters(),
        }
    }
}

impl RateLimitingConfig {
    pub fn tier(&self, name: LimiterName) -> Option<&TierConfig> {
        self.limiters.get(&name)
    }

    /// Validate the configuration: every limiter name present, every tier
    /// internally consistent.
    pub fn validate(&self) -> Result<(), RateLimitingValidationError> {
        for name in LimiterName::ALL {
            let tier = self
                .limiters
                .get(&name)
                .ok_or_else(|| RateLimitingValidationError {
                    message: format!("no tier configured for limiter '{name}'"),
                })?;
            tier.validate().map_err(|e| RateLimitingValidationError {
                message: format!("{name}: {}", e.message),
            })?;
        }
        Ok(())
    }
}

/// Configuration for a single limiter tier. A tier with
/// `requests_per_minute: 0` is disabled and always admits.
#[derive(Debug, Clone, Copy, Deserialize, Default)]
pub struct TierConfig {
    #[serde(default)]
    pub requests_per_minute: u32,

    /// Maximum requests admitted in a short burst
    #[serde(default)]
    pub burst_size: u32,
}

impl TierConfig {
    pub fn new(requests_per_minute: u32, burst_size: u32) -> Self {
        Self {
            requests_per_minute,
            burst_size,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.requests_per_minute > 0
    }

    pub fn validate(&self) -> Result<(), RateLimitingValidationError> {
        if self.requests_per_minute == 0 && self.burst_size > 0 {
            return Err(RateLimitingValidationError {
                message: "burst_size must be 0 when requests_per_minute is 0".to_string(),
            });
        }

        if self.requests_per_minute > 0 && self.burst_size == 0 {
            return Err(RateLimitingValidationError {
                message: "burst_size must be greater than 0 when the tier is enabled".to_string(),
            });
        }

        if self.burst_size > self.requests_per_minute {
            return Err(RateLimitingValidationError {
                message: format!(
                    "burst_size ({}) should not exceed requests_per_minute ({})",
                    self.burst_size, self.requests_per_minute
                ),
            });
        }

        Ok(())
    }
}

/// Default tiers, tuned the way the front-end service ships them: tight
/// buckets on the credential-sensitive flows, generous ones on reads and the
/// global catch-alls.
fn default_limiters() -> HashMap<LimiterName, TierConfig> {
    use LimiterName::*;

    [
        (GlobalApiAuthenticated, TierConfig::new(600, 100)),
        (GlobalApiAnonymous, TierConfig::new(120, 30)),
        (SigninIp, TierConfig::new(10, 5)),
        (SigninEmail, TierConfig::new(5, 3)),
        (TwofaVerificationIp, TierConfig::new(10, 5)),
        (TwofaVerificationUser, TierConfig::new(5, 3)),
        (TwofaSetup, TierConfig::new(6, 3)),
        (TwofaConfirm, TierConfig::new(6, 3)),
        (TwofaDisable, TierConfig::new(6, 3)),
        (Registration, TierConfig::new(10, 5)),
        (OauthToken, TierConfig::new(30, 10)),
        (EmailConfirmation, TierConfig::new(10, 5)),
        (UserCollection, TierConfig::new(60, 20)),
        (UserUpdate, TierConfig::new(30, 10)),
        (UserDelete, TierConfig::new(10, 5)),
        (ResendConfirmation, TierConfig::new(6, 3)),
        (ResendConfirmationTarget, TierConfig::new(3, 2)),
    ]
    .into_iter()
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_config_valid() {
        assert!(TierConfig::new(60, 10).validate().is_ok());
    }

    #[test]
    fn test_tier_config_disabled_valid() {
        assert!(TierConfig::new(0, 0).validate().is_ok());
    }

    #[test]
    fn test_tier_config_burst_without_rate_invalid() {
        assert!(TierConfig::new(0, 10).validate().is_err());
    }

    #[test]
    fn test_tier_config_rate_without_burst_invalid() {
        assert!(TierConfig::new(60, 0).validate().is_err());
    }

    #[test]
    fn test_tier_config_burst_exceeds_rate_invalid() {
        assert!(TierConfig::new(10, 20).validate().is_err());
    }

    #[test]
    fn test_default_config_is_complete_and_valid() {
        let config = RateLimitingConfig::default();
        assert!(config.validate().is_ok());
        for name in LimiterName::ALL {
            assert!(config.tier(name).is_some(), "missing default for {name}");
        }
    }

    #[test]
    fn test_validate_flags_missing_limiter() {
        let mut config = RateLimitingConfig::default();
        config.limiters.remove(&LimiterName::OauthToken);
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("oauth_token"));
    }

    #[test]
    fn test_validate_names_offending_tier() {
        let mut config = RateLimitingConfig::default();
        config
            .limiters
            .insert(LimiterName::SigninIp, TierConfig::new(10, 20));
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("signin_ip"));
    }
}
