//! Guard against GraphQL batch requests.
//!
//! A JSON array posted to the multiplexable endpoint multiplies effective
//! request volume under a single quota check, so array-shaped bodies are
//! rejected outright. The guard runs before authentication and before the
//! rate-limit gate: batch probes get their 400 even when fully anonymous.
//! It judges shape only: a body that fails to decode passes through for the
//! normal error handling downstream.

use axum::body::Body;
use axum::extract::{Request, State};
use axum::http::Method;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use tracing::warn;
use wardgate_core::problem::Problem;

use crate::api::error::AppError;
use crate::app_state::SharedAppState;

pub async fn batch_guard(
    State(state): State<SharedAppState>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    if req.method() != Method::POST || req.uri().path() != state.settings.api.graphql_path {
        return Ok(next.run(req).await);
    }

    let (parts, body) = req.into_parts();
    let bytes = axum::body::to_bytes(body, state.settings.api.request_body_limit)
        .await
        .map_err(|err| AppError::BodyRead(err.to_string()))?;

    if !bytes.is_empty() {
        if let Ok(value) = serde_json::from_slice::<serde_json::Value>(&bytes) {
            if let Some(batch) = value.as_array() {
                warn!(
                    "Rejected GraphQL batch request with {} operations",
                    batch.len()
                );
                return Ok(Problem::graphql_batch_rejected().into_response());
            }
        }
    }

    Ok(next.run(Request::from_parts(parts, Body::from(bytes))).await)
}
