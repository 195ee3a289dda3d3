use axum::middleware;
use axum::routing::get;
use axum::Router;

use crate::api::auth::require_auth;
use crate::api::batch_guard::batch_guard;
use crate::api::handlers::health_handler;
use crate::api::proxy::proxy_handler;
use crate::api::rate_limiting::gate::rate_limit_gate;
use crate::app_state::SharedAppState;

pub struct ApiRoutes;

impl ApiRoutes {
    /// Assemble the pipeline. Layer order matters: the batch guard is the
    /// outermost layer so array-shaped GraphQL probes are rejected before
    /// authentication and before any quota is spent; the rate-limit gate is
    /// innermost and runs only for requests that passed both.
    pub fn create(state: SharedAppState) -> Router {
        Router::new()
            .route("/health", get(health_handler))
            .fallback(proxy_handler)
            .layer(middleware::from_fn_with_state(
                state.clone(),
                rate_limit_gate,
            ))
            .layer(middleware::from_fn_with_state(state.clone(), require_auth))
            .layer(middleware::from_fn_with_state(state.clone(), batch_guard))
            .with_state(state)
    }
}
