//! Rate-limit targets for the authentication flows.
//!
//! The IP-keyed buckets always fire so a single source cannot stuff
//! credentials unthrottled; the identity-keyed buckets (email, pending user,
//! bearer subject) fire only once identity is resolvable, closing the gap
//! where an attacker rotates IPs but reuses one account.

use std::sync::Arc;
use std::time::Duration;

use axum::http::Method;
use tracing::{debug, warn};
use wardgate_core::quota::{keys, LimiterName, RateLimitTarget};
use wardgate_core::twofactor::PendingTwoFactorRepository;

use crate::api::identity::ClientIdentity;

pub struct AuthTargetResolver {
    pending: Arc<dyn PendingTwoFactorRepository>,
    lookup_timeout: Duration,
}

impl AuthTargetResolver {
    pub fn new(pending: Arc<dyn PendingTwoFactorRepository>, lookup_timeout: Duration) -> Self {
        Self {
            pending,
            lookup_timeout,
        }
    }

    /// Targets for the auth-flow endpoint this request addresses, if any.
    /// A request matches at most one flow by path and method.
    pub async fn resolve(
        &self,
        method: &Method,
        path: &str,
        identity: &ClientIdentity,
    ) -> Vec<RateLimitTarget> {
        if method != Method::POST {
            return Vec::new();
        }
        match path {
            "/api/signin" => self.signin_targets(identity),
            "/api/signin/2fa" => self.twofa_verification_targets(identity).await,
            "/api/users/2fa/setup" => Self::twofa_management_target(LimiterName::TwofaSetup, identity),
            "/api/users/2fa/confirm" => {
                Self::twofa_management_target(LimiterName::TwofaConfirm, identity)
            }
            "/api/users/2fa/disable" => {
                Self::twofa_management_target(LimiterName::TwofaDisable, identity)
            }
            _ => Vec::new(),
        }
    }

    fn signin_targets(&self, identity: &ClientIdentity) -> Vec<RateLimitTarget> {
        let mut targets = vec![RateLimitTarget::new(
            LimiterName::SigninIp,
            identity.ip_key(),
        )];
        if let Some(email) = identity.sign_in_email() {
            targets.push(RateLimitTarget::new(
                LimiterName::SigninEmail,
                keys::email(&email),
            ));
        }
        targets
    }

    async fn twofa_verification_targets(&self, identity: &ClientIdentity) -> Vec<RateLimitTarget> {
        let mut targets = vec![RateLimitTarget::new(
            LimiterName::TwofaVerificationIp,
            identity.ip_key(),
        )];
        let Some(session_id) = identity.pending_session_id() else {
            return targets;
        };
        let lookup = self.pending.find_by_id(&session_id);
        match tokio::time::timeout(self.lookup_timeout, lookup).await {
            Ok(Ok(Some(session))) if !session.user_id.is_empty() => {
                targets.push(RateLimitTarget::new(
                    LimiterName::TwofaVerificationUser,
                    keys::user(&session.user_id),
                ));
            }
            Ok(Ok(_)) => {
                debug!("No pending two-factor session for the supplied id");
            }
            Ok(Err(err)) => {
                warn!(
                    "Pending two-factor session lookup failed, degrading to the IP bucket: {err:#}"
                );
            }
            Err(_) => {
                warn!(
                    "Pending two-factor session lookup timed out after {:?}, degrading to the IP bucket",
                    self.lookup_timeout
                );
            }
        }
        targets
    }

    fn twofa_management_target(
        name: LimiterName,
        identity: &ClientIdentity,
    ) -> Vec<RateLimitTarget> {
        match identity.user_subject() {
            Some(subject) => vec![RateLimitTarget::new(name, keys::user(&subject))],
            None => Vec::new(),
        }
    }
}
