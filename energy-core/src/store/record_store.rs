use async_trait::async_trait;
use thiserror::Error;

use crate::models::{EnergyRecord, NewEnergyRecord, Session, UserId};

/// Minimum password length accepted at sign-up.
pub const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("Invalid email or password. Please try again.")]
    InvalidCredentials,

    #[error("An account with email '{0}' already exists")]
    EmailTaken(String),

    #[error("'{0}' is not a valid email address")]
    InvalidEmail(String),

    #[error("Password must be at least {MIN_PASSWORD_LEN} characters")]
    WeakPassword,

    #[error("Session expired, please sign in again")]
    SessionExpired,

    #[error("Authentication backend error: {0}")]
    Backend(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("Session is not allowed to access records of user '{0}'")]
    Unauthorized(UserId),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

/// Identity management plus one energy record per identity.
///
/// Every record operation takes the caller's [`Session`] explicitly. A store
/// must refuse to read or write a record whose `user_id` differs from the
/// session's.
#[async_trait]
pub trait RecordStore: Send + Sync {
    // Authentication
    async fn sign_up(
        &self,
        email: &str,
        password: &str,
    ) -> Result<(), AuthError>;

    async fn sign_in(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Session, AuthError>;

    /// Resolve a previously issued access token. `Ok(None)` when the token is
    /// unknown, expired or signed out.
    async fn get_session(
        &self,
        access_token: &str,
    ) -> Result<Option<Session>, AuthError>;

    async fn sign_out(
        &self,
        session: &Session,
    ) -> Result<(), AuthError>;

    // Energy records
    async fn fetch_record(
        &self,
        session: &Session,
        user_id: &UserId,
    ) -> Result<Option<EnergyRecord>, StoreError>;

    /// Insert or replace the record keyed by `record.user_id` (last write wins).
    async fn upsert_record(
        &self,
        session: &Session,
        record: NewEnergyRecord,
    ) -> Result<EnergyRecord, StoreError>;
}

/// Shared guard for store implementations.
pub fn ensure_owner(
    session: &Session,
    user_id: &UserId,
) -> Result<(), StoreError> {
    if &session.user_id == user_id {
        Ok(())
    } else {
        Err(StoreError::Unauthorized(user_id.clone()))
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn session_for(id: &str) -> Session {
        Session {
            user_id: UserId::new(id),
            email: format!("{id}@example.com"),
            access_token: "t".to_string(),
            expires_at: Utc::now(),
        }
    }

    #[test]
    fn ensure_owner_accepts_own_identity() {
        assert_eq!(ensure_owner(&session_for("a"), &UserId::new("a")), Ok(()));
    }

    #[test]
    fn ensure_owner_rejects_other_identity() {
        assert_eq!(
            ensure_owner(&session_for("a"), &UserId::new("b")),
            Err(StoreError::Unauthorized(UserId::new("b")))
        );
    }

    #[test]
    fn invalid_credentials_message_is_user_facing() {
        assert_eq!(
            AuthError::InvalidCredentials.to_string(),
            "Invalid email or password. Please try again."
        );
    }

    #[test]
    fn weak_password_message_names_minimum() {
        assert!(AuthError::WeakPassword.to_string().contains('6'));
    }
}
