use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tracing::error;
use wardgate_core::problem::Problem;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("quota backend failure: {0}")]
    QuotaBackend(String),

    #[error("request body could not be buffered: {0}")]
    BodyRead(String),

    #[error("upstream request failed: {0}")]
    Upstream(String),

    #[error("internal server error: {0}")]
    InternalServerError(String),
}

impl From<anyhow::Error> for AppError {
    fn from(e: anyhow::Error) -> Self {
        AppError::InternalServerError(e.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Full detail goes to the log; the problem body stays generic so
        // backend internals never leak to clients.
        let problem = match &self {
            AppError::QuotaBackend(detail) => {
                error!("Quota backend failure: {detail}");
                Problem::internal_server_error("Request could not be processed.")
            }
            AppError::BodyRead(detail) => {
                error!("Failed to buffer request body: {detail}");
                Problem::payload_too_large("Request body exceeds the configured limit.")
            }
            AppError::Upstream(detail) => {
                error!("Upstream request failed: {detail}");
                Problem::bad_gateway("The upstream service could not be reached.")
            }
            AppError::InternalServerError(detail) => {
                error!("Internal server error: {detail}");
                Problem::internal_server_error("Request could not be processed.")
            }
        };
        problem.into_response()
    }
}
