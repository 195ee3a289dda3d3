//! Credential-presence middleware.
//!
//! The gateway does not validate tokens; that is the upstream
//! authenticator's job. It only refuses obviously unauthenticated requests
//! to protected `/api/*` endpoints so they never consume upstream capacity.
//! The sign-in and account-bootstrap flows are served without credentials and
//! are declared as `METHOD <regex>` entries in configuration.

use anyhow::Context;
use axum::body::Bytes;
use axum::extract::{Request, State};
use axum::http::Method;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use regex::Regex;
use tracing::warn;
use wardgate_core::problem::Problem;

use crate::api::identity::ClientIdentity;
use crate::app_state::SharedAppState;

/// Compiled set of endpoints reachable without credentials.
pub struct PublicRoutes {
    rules: Vec<(Method, Regex)>,
}

impl PublicRoutes {
    /// Parse `METHOD <regex>` entries. Invalid entries fail startup.
    pub fn from_settings(patterns: &[String]) -> anyhow::Result<Self> {
        let mut rules = Vec::with_capacity(patterns.len());
        for entry in patterns {
            let (method, pattern) = entry
                .split_once(' ')
                .with_context(|| format!("public path entry '{entry}' is missing a method"))?;
            let method = Method::from_bytes(method.as_bytes())
                .with_context(|| format!("public path entry '{entry}' has an invalid method"))?;
            let pattern = Regex::new(pattern.trim())
                .with_context(|| format!("public path entry '{entry}' has an invalid pattern"))?;
            rules.push((method, pattern));
        }
        Ok(Self { rules })
    }

    pub fn is_public(&self, method: &Method, path: &str) -> bool {
        self.rules
            .iter()
            .any(|(m, pattern)| m == method && pattern.is_match(path))
    }
}

pub async fn require_auth(
    State(state): State<SharedAppState>,
    req: Request,
    next: Next,
) -> Response {
    let path = req.uri().path();
    if !path.starts_with("/api/") || state.public_routes.is_public(req.method(), path) {
        return next.run(req).await;
    }

    let identity = ClientIdentity::new(
        req.headers(),
        Bytes::new(),
        None,
        &state.settings.api.auth_cookie,
    );
    if identity.is_authenticated() {
        next.run(req).await
    } else {
        warn!(
            "Rejecting unauthenticated request | {} {} | user_agent: {:?}",
            req.method(),
            req.uri(),
            req.headers()
                .get("user-agent")
                .and_then(|h| h.to_str().ok())
                .unwrap_or("unknown")
        );
        Problem::unauthorized().into_response()
    }
}
