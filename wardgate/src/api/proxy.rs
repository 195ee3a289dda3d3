//! Pass-through to the user-management service.
//!
//! Everything the guards and the gate admit is forwarded verbatim: method,
//! path and query, headers (hop-by-hop stripped) and body. The gateway adds
//! nothing to the response on the way back.

use axum::body::Body;
use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::response::Response;

use crate::api::error::AppError;
use crate::app_state::SharedAppState;

const HOP_BY_HOP_HEADERS: &[&str] = &[
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
    "host",
    "content-length",
];

fn is_hop_by_hop(name: &str) -> bool {
    HOP_BY_HOP_HEADERS.contains(&name)
}

pub async fn proxy_handler(
    State(state): State<SharedAppState>,
    req: Request,
) -> Result<Response, AppError> {
    let (parts, body) = req.into_parts();
    let bytes = axum::body::to_bytes(body, state.settings.api.request_body_limit)
        .await
        .map_err(|err| AppError::BodyRead(err.to_string()))?;

    let mut url = format!(
        "{}{}",
        state.settings.api.upstream_url.trim_end_matches('/'),
        parts.uri.path()
    );
    if let Some(query) = parts.uri.query() {
        url.push('?');
        url.push_str(query);
    }

    let method = reqwest::Method::from_bytes(parts.method.as_str().as_bytes())
        .map_err(|err| AppError::InternalServerError(err.to_string()))?;
    let mut builder = state.upstream.request(method, &url).body(bytes.to_vec());
    for (name, value) in parts.headers.iter() {
        if is_hop_by_hop(name.as_str()) {
            continue;
        }
        builder = builder.header(name.as_str(), value.as_bytes());
    }

    let upstream = builder
        .send()
        .await
        .map_err(|err| AppError::Upstream(err.to_string()))?;

    let status =
        StatusCode::from_u16(upstream.status().as_u16()).unwrap_or(StatusCode::BAD_GATEWAY);
    let mut response = Response::builder().status(status);
    for (name, value) in upstream.headers() {
        if is_hop_by_hop(name.as_str()) {
            continue;
        }
        response = response.header(name.as_str(), value.as_bytes());
    }

    let body = upstream
        .bytes()
        .await
        .map_err(|err| AppError::Upstream(err.to_string()))?;
    response
        .body(Body::from(body))
        .map_err(|err| AppError::InternalServerError(err.to_string()))
}
