use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Short-lived server-side record linking a partially-authenticated sign-in
/// attempt to a user, awaiting the second factor. The gateway only ever reads
/// these; the user-management service owns their lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingTwoFactorSession {
    pub id: String,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl PendingTwoFactorSession {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

#[async_trait]
pub trait PendingTwoFactorRepository: Send + Sync {
    async fn find_by_id(&self, id: &str) -> anyhow::Result<Option<PendingTwoFactorSession>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_expiry_is_inclusive_of_the_deadline() {
        let session = PendingTwoFactorSession {
            id: "psn-1".to_string(),
            user_id: "user-1".to_string(),
            created_at: Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0).unwrap(),
            expires_at: Utc.with_ymd_and_hms(2026, 1, 1, 12, 5, 0).unwrap(),
        };
        let before = Utc.with_ymd_and_hms(2026, 1, 1, 12, 4, 59).unwrap();
        let at = session.expires_at;
        assert!(!session.is_expired(before));
        assert!(session.is_expired(at));
    }

    #[test]
    fn test_wire_format_is_camel_case() {
        let json = r#"{
            "id": "psn-2",
            "userId": "user-9",
            "createdAt": "2026-01-01T12:00:00Z",
            "expiresAt": "2026-01-01T12:05:00Z"
        }"#;
        let session: PendingTwoFactorSession = serde_json::from_str(json).unwrap();
        assert_eq!(session.user_id, "user-9");
    }
}
