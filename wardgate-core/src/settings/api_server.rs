use serde::{Deserialize, Deserializer};

use super::rate_limiting::RateLimitingConfig;

#[derive(Debug, Deserialize, Clone)]
#[allow(unused)]
pub struct ApiServer {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// Base URL of the user-management service this gateway fronts
    #[serde(default = "default_upstream_url")]
    pub upstream_url: String,

    /// Name of the HTTP-only cookie carrying the session token
    #[serde(default = "default_auth_cookie")]
    pub auth_cookie: String,

    /// Path of the multiplexable GraphQL endpoint guarded against batching
    #[serde(default = "default_graphql_path")]
    pub graphql_path: String,

    /// `METHOD <regex>` entries describing endpoints served without
    /// credentials (the sign-in and account-bootstrap flows)
    #[serde(default = "default_public_paths")]
    pub public_paths: Vec<String>,

    /// Deadline for the pending two-factor session lookup before the
    /// verification flow degrades to its IP-only bucket
    #[serde(default = "default_pending_session_timeout_ms")]
    pub pending_session_timeout_ms: u64,

    #[serde(
        default = "default_request_body_limit",
        deserialize_with = "deserialize_bytes"
    )]
    pub request_body_limit: usize,

    #[serde(default)]
    pub rate_limiting: RateLimitingConfig,
}

fn default_bind_address() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_upstream_url() -> String {
    "http://127.0.0.1:9000".to_string()
}

fn default_auth_cookie() -> String {
    "auth_session".to_string()
}

fn default_graphql_path() -> String {
    "/api/graphql".to_string()
}

fn default_public_paths() -> Vec<String> {
    [
        r"POST ^/api/signin$",
        r"POST ^/api/signin/2fa$",
        r"POST ^/api/(?:oauth/)?token$",
        r"POST ^/api/users(?:\.[a-z0-9]+)?$",
        r"PATCH ^/api/users/confirm$",
        r"POST ^/api/users/[^/]+/resend-confirmation-email$",
    ]
    .into_iter()
    .map(str::to_string)
    .collect()
}

fn default_pending_session_timeout_ms() -> u64 {
    500
}

fn default_request_body_limit() -> usize {
    2 * 1024 * 1024
}

impl Default for ApiServer {
    fn default() -> Self {
        ApiServer {
            bind_address: default_bind_address(),
            upstream_url: default_upstream_url(),
            auth_cookie: default_auth_cookie(),
            graphql_path: default_graphql_path(),
            public_paths: default_public_paths(),
            pending_session_timeout_ms: default_pending_session_timeout_ms(),
            request_body_limit: default_request_body_limit(),
            rate_limiting: RateLimitingConfig::default(),
        }
    }
}

fn deserialize_bytes<'de, D>(deserializer: D) -> Result<usize, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    let s = s.trim().to_uppercase();

    let (num_part, suffix) = s.split_at(s.len().saturating_sub(1));
    let multiplier = match suffix {
        "G" => 1_024 * 1_024 * 1_024,
        "M" => 1_024 * 1_024,
        "K" => 1_024,
        _ => return s.parse().map_err(serde::de::Error::custom),
    };

    let num: usize = num_part.parse().map_err(serde::de::Error::custom)?;
    Ok(num * multiplier)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Deserialize)]
    struct Wrapper {
        #[serde(deserialize_with = "deserialize_bytes")]
        size: usize,
    }

    #[test]
    fn test_deserialize_bytes_suffixes() {
        let w: Wrapper = serde_json::from_str(r#"{"size": "2M"}"#).unwrap();
        assert_eq!(w.size, 2 * 1024 * 1024);
        let w: Wrapper = serde_json::from_str(r#"{"size": "512K"}"#).unwrap();
        assert_eq!(w.size, 512 * 1024);
        let w: Wrapper = serde_json::from_str(r#"{"size": "4096"}"#).unwrap();
        assert_eq!(w.size, 4096);
    }

    #[test]
    fn test_default_public_paths_cover_the_auth_flows() {
        let defaults = default_public_paths();
        assert!(defaults.iter().any(|p| p.contains("/api/signin$")));
        assert!(defaults.iter().any(|p| p.contains("resend-confirmation")));
        // GraphQL is not public: the batch guard runs before auth anyway.
        assert!(!defaults.iter().any(|p| p.contains("graphql")));
    }
}
