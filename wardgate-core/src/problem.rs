//! RFC 7807 problem responses.
//!
//! Every user-facing rejection the gateway produces (401, 429, batch 400,
//! upstream failures) is shaped as `application/problem+json`.

use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

pub const CONTENT_TYPE_PROBLEM_JSON: &str = "application/problem+json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Problem {
    #[serde(rename = "type")]
    pub kind: String,
    pub title: String,
    pub status: u16,
    pub detail: String,
}

impl Problem {
    pub fn new(
        status: StatusCode,
        kind: impl Into<String>,
        title: impl Into<String>,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            kind: kind.into(),
            title: title.into(),
            status: status.as_u16(),
            detail: detail.into(),
        }
    }

    pub fn too_many_requests() -> Self {
        Self::new(
            StatusCode::TOO_MANY_REQUESTS,
            "/errors/429",
            "Too Many Requests",
            "Rate limit exceeded. Please try again later.",
        )
    }

    pub fn graphql_batch_rejected() -> Self {
        Self::new(
            StatusCode::BAD_REQUEST,
            "about:blank",
            "Bad Request",
            "GraphQL batch requests (JSON arrays) are not allowed. \
             Send individual requests instead to prevent rate limit bypass.",
        )
    }

    pub fn unauthorized() -> Self {
        Self::new(
            StatusCode::UNAUTHORIZED,
            "about:blank",
            "Unauthorized",
            "Authentication is required to access this resource.",
        )
    }

    pub fn bad_gateway(detail: impl Into<String>) -> Self {
        Self::new(
            StatusCode::BAD_GATEWAY,
            "about:blank",
            "Bad Gateway",
            detail,
        )
    }

    pub fn internal_server_error(detail: impl Into<String>) -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "about:blank",
            "Internal Server Error",
            detail,
        )
    }

    pub fn payload_too_large(detail: impl Into<String>) -> Self {
        Self::new(
            StatusCode::PAYLOAD_TOO_LARGE,
            "about:blank",
            "Payload Too Large",
            detail,
        )
    }

    fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    /// Response carrying a `Retry-After` header, used for 429 rejections.
    pub fn into_response_with_retry_after(self, seconds: u64) -> Response {
        (
            self.status_code(),
            [
                (
                    header::CONTENT_TYPE,
                    CONTENT_TYPE_PROBLEM_JSON.to_string(),
                ),
                (header::RETRY_AFTER, seconds.to_string()),
            ],
            Json(self),
        )
            .into_response()
    }
}

impl IntoResponse for Problem {
    fn into_response(self) -> Response {
        (
            self.status_code(),
            [(
                header::CONTENT_TYPE,
                CONTENT_TYPE_PROBLEM_JSON.to_string(),
            )],
            Json(self),
        )
            .into_response()
    }
}
