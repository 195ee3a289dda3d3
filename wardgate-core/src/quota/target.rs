use std::fmt;
use std::net::IpAddr;

use serde::{Deserialize, Serialize};

/// Every limiter the gateway can charge. The set is closed on purpose: a
/// target name that is not configured is a deployment defect, caught when the
/// registry is built, never at request time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LimiterName {
    GlobalApiAuthenticated,
    GlobalApiAnonymous,
    SigninIp,
    SigninEmail,
    TwofaVerificationIp,
    TwofaVerificationUser,
    TwofaSetup,
    TwofaConfirm,
    TwofaDisable,
    Registration,
    OauthToken,
    EmailConfirmation,
    UserCollection,
    UserUpdate,
    UserDelete,
    ResendConfirmation,
    ResendConfirmationTarget,
}

impl LimiterName {
    pub const ALL: [LimiterName; 17] = [
        LimiterName::GlobalApiAuthenticated,
        LimiterName::GlobalApiAnonymous,
        LimiterName::SigninIp,
        LimiterName::SigninEmail,
        LimiterName::TwofaVerificationIp,
        LimiterName::TwofaVerificationUser,
        LimiterName::TwofaSetup,
        LimiterName::TwofaConfirm,
        LimiterName::TwofaDisable,
        LimiterName::Registration,
        LimiterName::OauthToken,
        LimiterName::EmailConfirmation,
        LimiterName::UserCollection,
        LimiterName::UserUpdate,
        LimiterName::UserDelete,
        LimiterName::ResendConfirmation,
        LimiterName::ResendConfirmationTarget,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LimiterName::GlobalApiAuthenticated => "global_api_authenticated",
            LimiterName::GlobalApiAnonymous => "global_api_anonymous",
            LimiterName::SigninIp => "signin_ip",
            LimiterName::SigninEmail => "signin_email",
            LimiterName::TwofaVerificationIp => "twofa_verification_ip",
            LimiterName::TwofaVerificationUser => "twofa_verification_user",
            LimiterName::TwofaSetup => "twofa_setup",
            LimiterName::TwofaConfirm => "twofa_confirm",
            LimiterName::TwofaDisable => "twofa_disable",
            LimiterName::Registration => "registration",
            LimiterName::OauthToken => "oauth_token",
            LimiterName::EmailConfirmation => "email_confirmation",
            LimiterName::UserCollection => "user_collection",
            LimiterName::UserUpdate => "user_update",
            LimiterName::UserDelete => "user_delete",
            LimiterName::ResendConfirmation => "resend_confirmation",
            LimiterName::ResendConfirmationTarget => "resend_confirmation_target",
        }
    }
}

impl fmt::Display for LimiterName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One quota bucket instance: which limiter to use and the per-entity
/// partition to charge. Created fresh per request, never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitTarget {
    pub name: LimiterName,
    pub key: String,
}

impl RateLimitTarget {
    pub fn new(name: LimiterName, key: impl Into<String>) -> Self {
        Self {
            name,
            key: key.into(),
        }
    }
}

/// Key builders. Keys must be non-empty and deterministic for identical
/// identity inputs; the IP dimension fails open to `0.0.0.0` when no address
/// is resolvable.
pub mod keys {
    use super::IpAddr;

    pub const UNRESOLVED_IP: &str = "0.0.0.0";

    pub fn ip(addr: Option<IpAddr>) -> String {
        match addr {
            Some(addr) => format!("ip:{addr}"),
            None => format!("ip:{UNRESOLVED_IP}"),
        }
    }

    pub fn user(id: &str) -> String {
        format!("user:{id}")
    }

    pub fn email(addr: &str) -> String {
        format!("email:{addr}")
    }

    pub fn client(id: &str) -> String {
        format!("client:{id}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_limiter_names_serialize_to_snake_case() {
        let json = serde_json::to_string(&LimiterName::SigninEmail).unwrap();
        assert_eq!(json, "\"signin_email\"");
        let json = serde_json::to_string(&LimiterName::GlobalApiAnonymous).unwrap();
        assert_eq!(json, "\"global_api_anonymous\"");
    }

    #[test]
    fn test_limiter_name_round_trip_matches_as_str() {
        for name in LimiterName::ALL {
            let json = serde_json::to_string(&name).unwrap();
            assert_eq!(json, format!("\"{}\"", name.as_str()));
            let parsed: LimiterName = serde_json::from_str(&json).unwrap();
            assert_eq!(parsed, name);
        }
    }

    #[test]
    fn test_all_contains_every_name_once() {
        let mut seen = std::collections::HashSet::new();
        for name in LimiterName::ALL {
            assert!(seen.insert(name.as_str()), "duplicate: {name}");
        }
        assert_eq!(seen.len(), 17);
    }

    #[test]
    fn test_ip_key_shape() {
        let addr: IpAddr = "1.2.3.4".parse().unwrap();
        assert_eq!(keys::ip(Some(addr)), "ip:1.2.3.4");
    }

    #[test]
    fn test_unresolved_ip_falls_back_to_zero_address() {
        assert_eq!(keys::ip(None), "ip:0.0.0.0");
    }

    #[test]
    fn test_entity_key_shapes() {
        assert_eq!(keys::user("8be90127"), "user:8be90127");
        assert_eq!(keys::email("a@b.com"), "email:a@b.com");
        assert_eq!(keys::client("cli-1"), "client:cli-1");
    }
}
