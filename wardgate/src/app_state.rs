use std::sync::Arc;
use std::time::Duration;

use wardgate_core::quota::LimiterRegistry;
use wardgate_core::twofactor::PendingTwoFactorRepository;

use crate::api::auth::PublicRoutes;
use crate::api::pending::HttpPendingTwoFactorRepository;
use crate::api::rate_limiting::{build_registry, AuthTargetResolver};
use crate::settings::config::Settings;

pub struct AppState {
    pub settings: Settings,
    pub limiters: LimiterRegistry,
    pub auth_targets: AuthTargetResolver,
    pub public_routes: PublicRoutes,
    pub upstream: reqwest::Client,
}

pub type SharedAppState = Arc<AppState>;

impl AppState {
    pub fn new() -> anyhow::Result<SharedAppState> {
        let settings = Settings::new()?;
        let pending = Arc::new(HttpPendingTwoFactorRepository::new(
            &settings.api.upstream_url,
            Duration::from_millis(settings.api.pending_session_timeout_ms),
        )?);
        Self::assemble(settings, pending)
    }

    /// Wire the state from settings and an injected pending-session
    /// repository; the limiter registry is built from configuration.
    pub fn assemble(
        settings: Settings,
        pending: Arc<dyn PendingTwoFactorRepository>,
    ) -> anyhow::Result<SharedAppState> {
        let limiters = build_registry(&settings.api.rate_limiting)?;
        Self::assemble_with_limiters(settings, pending, limiters)
    }

    /// Fully injected variant, used by tests to swap in counting backends.
    pub fn assemble_with_limiters(
        settings: Settings,
        pending: Arc<dyn PendingTwoFactorRepository>,
        limiters: LimiterRegistry,
    ) -> anyhow::Result<SharedAppState> {
        let public_routes = PublicRoutes::from_settings(&settings.api.public_paths)?;
        let auth_targets = AuthTargetResolver::new(
            pending,
            Duration::from_millis(settings.api.pending_session_timeout_ms),
        );
        let upstream = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Arc::new(AppState {
            settings,
            limiters,
            auth_targets,
            public_routes,
            upstream,
        }))
    }
}
