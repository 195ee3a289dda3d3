//! The enforcement middleware.
//!
//! Per request: buffer the body once, classify, then consume one unit from
//! every endpoint target in order. The first rejection short-circuits into a
//! 429 and no later limiter is touched, the global one included. Only
//! when every endpoint target admits is the global per-IP bucket charged.

use axum::body::Body;
use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;
use chrono::Utc;
use tracing::{debug, warn};
use wardgate_core::problem::Problem;
use wardgate_core::quota::{QuotaDecision, RateLimitTarget};

use crate::api::error::AppError;
use crate::api::identity::{self, ClientIdentity};
use crate::api::rate_limiting::matcher;
use crate::app_state::SharedAppState;

pub async fn rate_limit_gate(
    State(state): State<SharedAppState>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    if !matcher::supports(req.uri().path()) {
        return Ok(next.run(req).await);
    }

    let (req, identity) = snapshot(&state, req).await?;
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    let mut targets = matcher::endpoint_targets(&method, &path, &identity);
    targets.extend(state.auth_targets.resolve(&method, &path, &identity).await);

    for target in &targets {
        let decision = consume(&state, target).await?;
        if !decision.accepted {
            warn!(
                "Rate limit exceeded | {} {} | limiter: {} | key: {}",
                method, path, target.name, target.key
            );
            return Ok(too_many_requests(&decision));
        }
        debug!("Quota consumed | limiter: {} | key: {}", target.name, target.key);
    }

    let global = matcher::resolve_global(&identity);
    let decision = consume(&state, &global).await?;
    if !decision.accepted {
        warn!(
            "Global rate limit exceeded | {} {} | limiter: {} | key: {}",
            method, path, global.name, global.key
        );
        return Ok(too_many_requests(&decision));
    }

    Ok(next.run(req).await)
}

/// Buffer the body and take the identity snapshot, handing back a request
/// whose body can still be consumed downstream.
async fn snapshot(
    state: &SharedAppState,
    req: Request,
) -> Result<(Request, ClientIdentity), AppError> {
    let client_ip = identity::resolve_client_ip(req.headers(), req.extensions());
    let (parts, body) = req.into_parts();
    let bytes = axum::body::to_bytes(body, state.settings.api.request_body_limit)
        .await
        .map_err(|err| AppError::BodyRead(err.to_string()))?;
    let identity = ClientIdentity::new(
        &parts.headers,
        bytes.clone(),
        client_ip,
        &state.settings.api.auth_cookie,
    );
    Ok((Request::from_parts(parts, Body::from(bytes)), identity))
}

async fn consume(state: &SharedAppState, target: &RateLimitTarget) -> Result<QuotaDecision, AppError> {
    state
        .limiters
        .get(target.name)
        .consume(&target.key, 1)
        .await
        .map_err(|err| AppError::QuotaBackend(format!("{}: {err:#}", target.name)))
}

fn too_many_requests(decision: &QuotaDecision) -> Response {
    let seconds = decision.retry_after_secs(Utc::now().timestamp());
    Problem::too_many_requests().into_response_with_retry_after(seconds)
}
