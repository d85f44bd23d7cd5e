use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Opaque identity handed out by the record store's auth subsystem.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// An authenticated session.
///
/// Returned by sign-in and passed explicitly to every store call that needs
/// an identity; nothing in this crate keeps a "current user" around.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub user_id: UserId,
    pub email: String,
    pub access_token: String,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn is_expired_at(
        &self,
        now: DateTime<Utc>,
    ) -> bool {
        now >= self.expires_at
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};

    use super::*;

    fn session_expiring_at(expires_at: DateTime<Utc>) -> Session {
        Session {
            user_id: UserId::new("u-1"),
            email: "a@example.com".to_string(),
            access_token: "token".to_string(),
            expires_at,
        }
    }

    #[test]
    fn session_is_live_before_expiry() {
        let expiry = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
        let session = session_expiring_at(expiry);

        assert!(!session.is_expired_at(expiry - Duration::seconds(1)));
    }

    #[test]
    fn session_is_expired_at_and_after_expiry() {
        let expiry = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
        let session = session_expiring_at(expiry);

        assert!(session.is_expired_at(expiry));
        assert!(session.is_expired_at(expiry + Duration::hours(1)));
    }

    #[test]
    fn user_id_displays_raw_value() {
        assert_eq!(UserId::new("abc-123").to_string(), "abc-123");
    }
}
