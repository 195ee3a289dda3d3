//! Endpoint-to-limiter classification.
//!
//! The route table is an ordered list of declarative matchers (method set,
//! path pattern, target builder) evaluated top-to-bottom; the first matching
//! entry decides the endpoint targets. The auth-flow targets (sign-in and
//! two-factor endpoints) are resolved separately because they need the
//! pending-session repository; their paths are disjoint from this table.

use axum::http::Method;
use once_cell::sync::Lazy;
use regex::Regex;
use wardgate_core::quota::{keys, LimiterName, RateLimitTarget};

use crate::api::identity::ClientIdentity;

/// `/api/users/{segment}` values that never denote a user id.
const RESERVED_USER_SEGMENTS: &[&str] = &["batch", "confirm"];

/// Whether the engine applies to this request at all. Everything outside
/// `/api/` passes through untouched.
pub fn supports(path: &str) -> bool {
    path.starts_with("/api/")
}

/// The catch-all per-IP bucket, split by whether credentials are present.
pub fn resolve_global(identity: &ClientIdentity) -> RateLimitTarget {
    let name = if identity.is_authenticated() {
        LimiterName::GlobalApiAuthenticated
    } else {
        LimiterName::GlobalApiAnonymous
    };
    RateLimitTarget::new(name, identity.ip_key())
}

type TargetBuilder = fn(&Method, Option<&str>, &ClientIdentity) -> Vec<RateLimitTarget>;

struct Route {
    methods: Vec<Method>,
    pattern: Regex,
    build: TargetBuilder,
}

impl Route {
    fn new(methods: &[Method], pattern: &str, build: TargetBuilder) -> Self {
        Self {
            methods: methods.to_vec(),
            pattern: Regex::new(pattern).expect("route patterns are compile-time constants"),
            build,
        }
    }
}

static ROUTES: Lazy<Vec<Route>> = Lazy::new(|| {
    vec![
        Route::new(
            &[Method::POST],
            r"^/api/users(?:\.[a-z0-9]+)?$",
            |_, _, identity| {
                vec![RateLimitTarget::new(
                    LimiterName::Registration,
                    identity.ip_key(),
                )]
            },
        ),
        Route::new(
            &[Method::POST],
            r"^/api/(?:oauth/)?token$",
            |_, _, identity| {
                vec![RateLimitTarget::new(
                    LimiterName::OauthToken,
                    keys::client(&identity.client_id()),
                )]
            },
        ),
        Route::new(
            &[Method::PATCH],
            r"^/api/users/confirm$",
            |_, _, identity| {
                vec![RateLimitTarget::new(
                    LimiterName::EmailConfirmation,
                    identity.ip_key(),
                )]
            },
        ),
        Route::new(
            &[Method::GET],
            r"^/api/users(?:\.[a-z0-9]+)?$",
            |_, _, identity| {
                vec![RateLimitTarget::new(
                    LimiterName::UserCollection,
                    identity.ip_key(),
                )]
            },
        ),
        Route::new(
            &[Method::PATCH, Method::PUT, Method::DELETE],
            r"^/api/users/([^/]+)$",
            build_user_mutation,
        ),
        Route::new(
            &[Method::POST],
            r"^/api/users/([^/]+)/resend-confirmation-email$",
            build_resend_confirmation,
        ),
    ]
});

/// Endpoint-specific targets for groups outside the auth flows, in the order
/// the gate consumes them. Pure: identical inputs yield identical lists.
pub fn endpoint_targets(
    method: &Method,
    path: &str,
    identity: &ClientIdentity,
) -> Vec<RateLimitTarget> {
    for route in ROUTES.iter() {
        if !route.methods.contains(method) {
            continue;
        }
        if let Some(captures) = route.pattern.captures(path) {
            let id_segment = captures.get(1).map(|m| m.as_str());
            return (route.build)(method, id_segment, identity);
        }
    }
    Vec::new()
}

fn build_user_mutation(
    method: &Method,
    id_segment: Option<&str>,
    _identity: &ClientIdentity,
) -> Vec<RateLimitTarget> {
    let Some(user_id) = id_segment else {
        return Vec::new();
    };
    if RESERVED_USER_SEGMENTS.contains(&user_id) {
        return Vec::new();
    }
    let name = if method == Method::DELETE {
        LimiterName::UserDelete
    } else {
        LimiterName::UserUpdate
    };
    vec![RateLimitTarget::new(name, keys::user(user_id))]
}

fn build_resend_confirmation(
    _method: &Method,
    id_segment: Option<&str>,
    identity: &ClientIdentity,
) -> Vec<RateLimitTarget> {
    let Some(user_id) = id_segment else {
        return Vec::new();
    };
    if RESERVED_USER_SEGMENTS.contains(&user_id) {
        return Vec::new();
    }
    vec![
        RateLimitTarget::new(LimiterName::ResendConfirmation, identity.ip_key()),
        RateLimitTarget::new(LimiterName::ResendConfirmationTarget, keys::user(user_id)),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Bytes;
    use axum::http::HeaderMap;

    fn anonymous_identity() -> ClientIdentity {
        ClientIdentity::new(
            &HeaderMap::new(),
            Bytes::new(),
            Some("127.0.0.1".parse().unwrap()),
            "auth_session",
        )
    }

    fn identity_with_body(body: &str) -> ClientIdentity {
        ClientIdentity::new(
            &HeaderMap::new(),
            Bytes::from(body.to_string()),
            Some("127.0.0.1".parse().unwrap()),
            "auth_session",
        )
    }

    #[test]
    fn test_supports_only_api_paths() {
        assert!(supports("/api/users"));
        assert!(!supports("/health"));
        assert!(!supports("/apiary"));
    }

    #[test]
    fn test_global_target_splits_on_credentials() {
        let id = anonymous_identity();
        let target = resolve_global(&id);
        assert_eq!(target.name, LimiterName::GlobalApiAnonymous);
        assert_eq!(target.key, "ip:127.0.0.1");

        let mut headers = HeaderMap::new();
        headers.insert("authorization", "Bearer tok".parse().unwrap());
        let id = ClientIdentity::new(
            &headers,
            Bytes::new(),
            Some("127.0.0.1".parse().unwrap()),
            "auth_session",
        );
        assert_eq!(
            resolve_global(&id).name,
            LimiterName::GlobalApiAuthenticated
        );
    }

    #[test]
    fn test_registration_matches_with_format_suffix() {
        let id = anonymous_identity();
        for path in ["/api/users", "/api/users.json"] {
            let targets = endpoint_targets(&Method::POST, path, &id);
            assert_eq!(targets.len(), 1, "path: {path}");
            assert_eq!(targets[0].name, LimiterName::Registration);
            assert_eq!(targets[0].key, "ip:127.0.0.1");
        }
    }

    #[test]
    fn test_token_exchange_keyed_by_client_id() {
        let id = identity_with_body(r#"{"client_id":"cli-1"}"#);
        for path in ["/api/token", "/api/oauth/token"] {
            let targets = endpoint_targets(&Method::POST, path, &id);
            assert_eq!(targets.len(), 1, "path: {path}");
            assert_eq!(targets[0].name, LimiterName::OauthToken);
            assert_eq!(targets[0].key, "client:cli-1");
        }
    }

    #[test]
    fn test_token_exchange_anonymous_client() {
        let id = anonymous_identity();
        let targets = endpoint_targets(&Method::POST, "/api/token", &id);
        assert_eq!(targets[0].key, "client:anonymous");
    }

    #[test]
    fn test_email_confirmation_before_user_mutation() {
        // PATCH /api/users/confirm must hit the confirmation bucket, not a
        // user mutation keyed `user:confirm`.
        let id = anonymous_identity();
        let targets = endpoint_targets(&Method::PATCH, "/api/users/confirm", &id);
        assert_eq!(targets.len(), 1);
        assert_eq!(targets[0].name, LimiterName::EmailConfirmation);
    }

    #[test]
    fn test_user_collection_on_get() {
        let id = anonymous_identity();
        let targets = endpoint_targets(&Method::GET, "/api/users.json", &id);
        assert_eq!(targets[0].name, LimiterName::UserCollection);
        assert_eq!(targets[0].key, "ip:127.0.0.1");
    }

    #[test]
    fn test_user_mutation_update_and_delete_share_the_key() {
        let id = anonymous_identity();
        let path = "/api/users/8be90127-5d18-4b69-966c-3a82f4e29d52";
        let update = endpoint_targets(&Method::PATCH, path, &id);
        assert_eq!(update[0].name, LimiterName::UserUpdate);
        assert_eq!(update[0].key, "user:8be90127-5d18-4b69-966c-3a82f4e29d52");

        let put = endpoint_targets(&Method::PUT, path, &id);
        assert_eq!(put[0].name, LimiterName::UserUpdate);

        let delete = endpoint_targets(&Method::DELETE, path, &id);
        assert_eq!(delete[0].name, LimiterName::UserDelete);
        assert_eq!(delete[0].key, update[0].key);
    }

    #[test]
    fn test_reserved_segments_are_not_user_ids() {
        let id = anonymous_identity();
        assert!(endpoint_targets(&Method::DELETE, "/api/users/batch", &id).is_empty());
        assert!(endpoint_targets(&Method::DELETE, "/api/users/confirm", &id).is_empty());
        assert!(endpoint_targets(&Method::GET, "/api/users/batch", &id).is_empty());
        assert!(endpoint_targets(
            &Method::POST,
            "/api/users/batch/resend-confirmation-email",
            &id
        )
        .is_empty());
    }

    #[test]
    fn test_resend_confirmation_yields_both_targets_in_order() {
        let id = anonymous_identity();
        let targets = endpoint_targets(
            &Method::POST,
            "/api/users/user-9/resend-confirmation-email",
            &id,
        );
        assert_eq!(targets.len(), 2);
        assert_eq!(targets[0].name, LimiterName::ResendConfirmation);
        assert_eq!(targets[0].key, "ip:127.0.0.1");
        assert_eq!(targets[1].name, LimiterName::ResendConfirmationTarget);
        assert_eq!(targets[1].key, "user:user-9");
    }

    #[test]
    fn test_unmatched_paths_yield_no_endpoint_targets() {
        let id = anonymous_identity();
        assert!(endpoint_targets(&Method::GET, "/api/profile", &id).is_empty());
        assert!(endpoint_targets(&Method::POST, "/api/users/1/other", &id).is_empty());
    }

    #[test]
    fn test_classification_is_idempotent() {
        let id = identity_with_body(r#"{"client_id":"cli-1"}"#);
        let first = endpoint_targets(&Method::POST, "/api/oauth/token", &id);
        let second = endpoint_targets(&Method::POST, "/api/oauth/token", &id);
        assert_eq!(first, second);
    }
}
