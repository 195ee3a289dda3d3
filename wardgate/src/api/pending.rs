//! Pending two-factor session lookup against the upstream service.

use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use chrono::Utc;
use tracing::debug;
use wardgate_core::twofactor::{PendingTwoFactorRepository, PendingTwoFactorSession};

/// Reads pending sessions from the user-management service's internal
/// endpoint. Expired sessions are reported as absent so the verification
/// flow falls back to its IP bucket.
pub struct HttpPendingTwoFactorRepository {
    client: reqwest::Client,
    base_url: String,
}

impl HttpPendingTwoFactorRepository {
    pub fn new(base_url: &str, timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build pending-session HTTP client")?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl PendingTwoFactorRepository for HttpPendingTwoFactorRepository {
    async fn find_by_id(&self, id: &str) -> anyhow::Result<Option<PendingTwoFactorSession>> {
        let url = format!(
            "{}/internal/2fa/sessions/{}",
            self.base_url,
            urlencoding::encode(id)
        );
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .context("pending two-factor session lookup failed")?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let response = response
            .error_for_status()
            .context("pending two-factor session lookup returned an error status")?;
        let session: PendingTwoFactorSession = response
            .json()
            .await
            .context("pending two-factor session payload could not be decoded")?;

        if session.is_expired(Utc::now()) {
            debug!("Pending two-factor session {} is expired", session.id);
            return Ok(None);
        }
        Ok(Some(session))
    }
}
