//! Shared test utilities for API tests
//!
//! Counting mock backends for short-circuit assertions, a static
//! pending-session repository and helpers to wire a gateway test stack.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use wardgate_core::quota::{LimiterName, LimiterRegistry, QuotaDecision, RateLimiter};
use wardgate_core::twofactor::{PendingTwoFactorRepository, PendingTwoFactorSession};

use crate::app_state::{AppState, SharedAppState};
use crate::settings::config::Settings;

/// Counts consume calls and rejects the configured keys.
pub struct ScriptedLimiter {
    calls: AtomicUsize,
    rejected_keys: Vec<String>,
    retry_after_secs: i64,
}

impl ScriptedLimiter {
    pub fn accepting() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            rejected_keys: Vec::new(),
            retry_after_secs: 30,
        }
    }

    pub fn rejecting_key(key: &str) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            rejected_keys: vec![key.to_string()],
            retry_after_secs: 30,
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RateLimiter for ScriptedLimiter {
    async fn consume(&self, key: &str, _permits: u32) -> anyhow::Result<QuotaDecision> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.rejected_keys.iter().any(|k| k == key) {
            Ok(QuotaDecision::reject_until(
                Utc::now().timestamp() + self.retry_after_secs,
            ))
        } else {
            Ok(QuotaDecision::accept())
        }
    }
}

/// One scripted limiter per name, with the handles kept around so tests can
/// assert call counts after the stack ran.
pub struct MockBackends {
    limiters: HashMap<LimiterName, Arc<ScriptedLimiter>>,
}

impl MockBackends {
    pub fn accepting() -> Self {
        let limiters = LimiterName::ALL
            .into_iter()
            .map(|name| (name, Arc::new(ScriptedLimiter::accepting())))
            .collect();
        Self { limiters }
    }

    /// All limiters accept except `name`, which rejects `key`.
    pub fn rejecting(name: LimiterName, key: &str) -> Self {
        let mut backends = Self::accepting();
        backends
            .limiters
            .insert(name, Arc::new(ScriptedLimiter::rejecting_key(key)));
        backends
    }

    pub fn registry(&self) -> LimiterRegistry {
        let map = self
            .limiters
            .iter()
            .map(|(name, limiter)| (*name, limiter.clone() as Arc<dyn RateLimiter>))
            .collect();
        LimiterRegistry::new(map).expect("mock backends cover every limiter name")
    }

    pub fn calls(&self, name: LimiterName) -> usize {
        self.limiters[&name].call_count()
    }
}

pub struct StaticPendingRepo {
    pub session: Option<PendingTwoFactorSession>,
}

#[async_trait]
impl PendingTwoFactorRepository for StaticPendingRepo {
    async fn find_by_id(&self, _id: &str) -> anyhow::Result<Option<PendingTwoFactorSession>> {
        Ok(self.session.clone())
    }
}

pub fn pending_session(user_id: &str) -> PendingTwoFactorSession {
    PendingTwoFactorSession {
        id: "psn-1".to_string(),
        user_id: user_id.to_string(),
        created_at: Utc::now(),
        expires_at: Utc::now() + chrono::Duration::minutes(5),
    }
}

/// Gateway state over mock backends, with the upstream pointed at
/// `upstream_url` (usually a wiremock server).
pub fn test_state(
    backends: &MockBackends,
    pending: Arc<dyn PendingTwoFactorRepository>,
    upstream_url: &str,
) -> SharedAppState {
    let mut settings = Settings::default();
    settings.api.upstream_url = upstream_url.to_string();
    AppState::assemble_with_limiters(settings, pending, backends.registry())
        .expect("test state wiring failed")
}
