use std::collections::BTreeSet;
use std::str::FromStr;
use std::sync::LazyLock;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use energy_core::store::{MIN_PASSWORD_LEN, ensure_owner};
use energy_core::{
    Appliance, AuthError, EnergyRecord, EnergySource, NewEnergyRecord, PeakUsageTime, RecordStore,
    Season, Session, StoreError, UserId, UserType,
};
use regex::Regex;
use sha2::{Digest, Sha256};
use sqlx::Row;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::decimal::{decimal_to_text, get_decimal};

/// How long an access token stays valid after sign-in.
pub const DEFAULT_SESSION_TTL_DAYS: i64 = 7;

static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is a valid regex")
});

pub struct SqliteRecordStore {
    pool: SqlitePool,
    session_ttl: Duration,
}

impl SqliteRecordStore {
    /// Open a database from a bare file path, `:memory:`, or a `sqlite:` URL.
    /// Files are created if missing.
    pub async fn new(connection_string: &str) -> Result<Self> {
        let in_memory = connection_string.contains(":memory:");
        let options = if connection_string == ":memory:" {
            SqliteConnectOptions::from_str("sqlite::memory:")?
        } else if connection_string.starts_with("sqlite:") {
            SqliteConnectOptions::from_str(connection_string)
                .with_context(|| format!("Invalid SQLite URL: {}", connection_string))?
        } else {
            SqliteConnectOptions::new().filename(connection_string)
        };
        let options = options.create_if_missing(true);

        // Every connection to an in-memory database sees its own empty
        // database, so keep exactly one alive.
        let pool_options = if in_memory {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new()
        };

        let pool = pool_options
            .connect_with(options)
            .await
            .with_context(|| format!("Failed to connect to database: {}", connection_string))?;
        Ok(Self::new_with_pool(pool))
    }

    pub fn new_with_pool(pool: SqlitePool) -> Self {
        Self {
            pool,
            session_ttl: Duration::days(DEFAULT_SESSION_TTL_DAYS),
        }
    }

    pub fn with_session_ttl(
        mut self,
        session_ttl: Duration,
    ) -> Self {
        self.session_ttl = session_ttl;
        self
    }

    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .context("Failed to run database migrations")?;
        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// The session must belong to `user_id` and still be live in the store.
    async fn authorize(
        &self,
        session: &Session,
        user_id: &UserId,
    ) -> Result<(), StoreError> {
        ensure_owner(session, user_id)?;

        let active = self
            .get_session(&session.access_token)
            .await
            .map_err(|e| StoreError::Database(e.to_string()))?;
        match active {
            Some(active) if &active.user_id == user_id => Ok(()),
            _ => {
                warn!(user_id = %user_id, "record access with inactive session");
                Err(StoreError::Unauthorized(user_id.clone()))
            }
        }
    }

    async fn load_record(
        &self,
        user_id: &UserId,
    ) -> Result<Option<EnergyRecord>, StoreError> {
        let Some(row) = sqlx::query(
            "SELECT user_id, user_type, location, building_size, occupants,
                    energy_sources, energy_provider, peak_usage_time,
                    high_consumption_season, monthly_bill, created_at, updated_at
             FROM energy_consumption WHERE user_id = ?",
        )
        .bind(user_id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?
        else {
            return Ok(None);
        };

        let appliance_rows = sqlx::query(
            "SELECT name, power_watts, usage_hours_per_day
             FROM appliances WHERE user_id = ? ORDER BY position",
        )
        .bind(user_id.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        let appliances = appliance_rows
            .iter()
            .map(row_to_appliance)
            .collect::<Result<Vec<_>, _>>()?;

        row_to_record(&row, appliances).map(Some)
    }
}

fn db_err(e: sqlx::Error) -> StoreError {
    StoreError::Database(e.to_string())
}

fn auth_err(e: sqlx::Error) -> AuthError {
    AuthError::Backend(e.to_string())
}

fn get_text(
    row: &SqliteRow,
    column: &str,
) -> Result<String, StoreError> {
    row.try_get(column)
        .map_err(|e| StoreError::Database(format!("Failed to get {}: {}", column, e)))
}

fn parse_column<T>(
    row: &SqliteRow,
    column: &str,
    parse: impl Fn(&str) -> Option<T>,
) -> Result<T, StoreError> {
    let raw = get_text(row, column)?;
    parse(&raw).ok_or_else(|| {
        StoreError::Database(format!("Invalid value '{}' in column '{}'", raw, column))
    })
}

fn encode_sources(sources: &BTreeSet<EnergySource>) -> String {
    sources
        .iter()
        .map(|source| source.as_str())
        .collect::<Vec<_>>()
        .join(",")
}

fn decode_sources(raw: &str) -> Option<BTreeSet<EnergySource>> {
    raw.split(',')
        .filter(|part| !part.is_empty())
        .map(EnergySource::parse)
        .collect()
}

fn row_to_appliance(row: &SqliteRow) -> Result<Appliance, StoreError> {
    Ok(Appliance {
        name: get_text(row, "name")?,
        power_watts: get_decimal(row, "power_watts")?,
        usage_hours_per_day: get_decimal(row, "usage_hours_per_day")?,
    })
}

fn row_to_record(
    row: &SqliteRow,
    appliances: Vec<Appliance>,
) -> Result<EnergyRecord, StoreError> {
    let occupants: i64 = row.try_get("occupants").map_err(db_err)?;

    Ok(EnergyRecord {
        user_id: UserId::new(get_text(row, "user_id")?),
        user_type: parse_column(row, "user_type", UserType::parse)?,
        location: get_text(row, "location")?,
        building_size: get_decimal(row, "building_size")?,
        occupants: u32::try_from(occupants).map_err(|e| {
            StoreError::Database(format!("Invalid occupants {}: {}", occupants, e))
        })?,
        energy_sources: parse_column(row, "energy_sources", decode_sources)?,
        energy_provider: get_text(row, "energy_provider")?,
        appliances,
        peak_usage_time: parse_column(row, "peak_usage_time", PeakUsageTime::parse)?,
        high_consumption_season: parse_column(row, "high_consumption_season", Season::parse)?,
        monthly_bill: get_decimal(row, "monthly_bill")?,
        created_at: row
            .try_get::<DateTime<Utc>, _>("created_at")
            .map_err(|e| StoreError::Database(format!("Failed to get created_at: {}", e)))?,
        updated_at: row
            .try_get::<DateTime<Utc>, _>("updated_at")
            .map_err(|e| StoreError::Database(format!("Failed to get updated_at: {}", e)))?,
    })
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// One round of salted SHA-256. Adequate for a local single-user store; not a
/// production password KDF.
fn hash_password(
    salt: &str,
    password: &str,
) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[async_trait]
impl RecordStore for SqliteRecordStore {
    async fn sign_up(
        &self,
        email: &str,
        password: &str,
    ) -> Result<(), AuthError> {
        let email = normalize_email(email);
        if !EMAIL_PATTERN.is_match(&email) {
            return Err(AuthError::InvalidEmail(email));
        }
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AuthError::WeakPassword);
        }

        let salt = Uuid::new_v4().simple().to_string();
        let user_id = Uuid::new_v4().to_string();

        let result = sqlx::query(
            "INSERT INTO users (id, email, password_hash, password_salt, created_at)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&user_id)
        .bind(&email)
        .bind(hash_password(&salt, password))
        .bind(&salt)
        .bind(Utc::now())
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => {
                info!(%user_id, "account created");
                Ok(())
            }
            Err(e)
                if e
                    .as_database_error()
                    .is_some_and(|db| db.is_unique_violation()) =>
            {
                Err(AuthError::EmailTaken(email))
            }
            Err(e) => Err(auth_err(e)),
        }
    }

    async fn sign_in(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Session, AuthError> {
        let email = normalize_email(email);
        let row = sqlx::query("SELECT id, password_hash, password_salt FROM users WHERE email = ?")
            .bind(&email)
            .fetch_optional(&self.pool)
            .await
            .map_err(auth_err)?
            .ok_or(AuthError::InvalidCredentials)?;

        let stored_hash: String = row.try_get("password_hash").map_err(auth_err)?;
        let salt: String = row.try_get("password_salt").map_err(auth_err)?;
        // Plain comparison, not constant-time.
        if hash_password(&salt, password) != stored_hash {
            debug!("password mismatch");
            return Err(AuthError::InvalidCredentials);
        }

        let user_id: String = row.try_get("id").map_err(auth_err)?;
        let now = Utc::now();

        let purged = sqlx::query("DELETE FROM sessions WHERE user_id = ? AND expires_at <= ?")
            .bind(&user_id)
            .bind(now)
            .execute(&self.pool)
            .await
            .map_err(auth_err)?
            .rows_affected();
        if purged > 0 {
            debug!(%user_id, purged, "removed expired sessions");
        }

        let access_token = Uuid::new_v4().to_string();
        let expires_at = now + self.session_ttl;

        sqlx::query("INSERT INTO sessions (access_token, user_id, expires_at) VALUES (?, ?, ?)")
            .bind(&access_token)
            .bind(&user_id)
            .bind(expires_at)
            .execute(&self.pool)
            .await
            .map_err(auth_err)?;

        info!(%user_id, "signed in");
        Ok(Session {
            user_id: UserId::new(user_id),
            email,
            access_token,
            expires_at,
        })
    }

    async fn get_session(
        &self,
        access_token: &str,
    ) -> Result<Option<Session>, AuthError> {
        let Some(row) = sqlx::query(
            "SELECT s.access_token, s.user_id, s.expires_at, u.email
             FROM sessions s JOIN users u ON u.id = s.user_id
             WHERE s.access_token = ?",
        )
        .bind(access_token)
        .fetch_optional(&self.pool)
        .await
        .map_err(auth_err)?
        else {
            return Ok(None);
        };

        let session = Session {
            user_id: UserId::new(row.try_get::<String, _>("user_id").map_err(auth_err)?),
            email: row.try_get("email").map_err(auth_err)?,
            access_token: row.try_get("access_token").map_err(auth_err)?,
            expires_at: row.try_get("expires_at").map_err(auth_err)?,
        };

        if session.is_expired_at(Utc::now()) {
            debug!(user_id = %session.user_id, "dropping expired session");
            sqlx::query("DELETE FROM sessions WHERE access_token = ?")
                .bind(access_token)
                .execute(&self.pool)
                .await
                .map_err(auth_err)?;
            return Ok(None);
        }

        Ok(Some(session))
    }

    async fn sign_out(
        &self,
        session: &Session,
    ) -> Result<(), AuthError> {
        sqlx::query("DELETE FROM sessions WHERE access_token = ?")
            .bind(&session.access_token)
            .execute(&self.pool)
            .await
            .map_err(auth_err)?;
        info!(user_id = %session.user_id, "signed out");
        Ok(())
    }

    async fn fetch_record(
        &self,
        session: &Session,
        user_id: &UserId,
    ) -> Result<Option<EnergyRecord>, StoreError> {
        self.authorize(session, user_id).await?;
        self.load_record(user_id).await
    }

    async fn upsert_record(
        &self,
        session: &Session,
        record: NewEnergyRecord,
    ) -> Result<EnergyRecord, StoreError> {
        self.authorize(session, &record.user_id).await?;

        let now = Utc::now();
        let mut tx = self.pool.begin().await.map_err(db_err)?;

        sqlx::query(
            "INSERT INTO energy_consumption (
                user_id, user_type, location, building_size, occupants,
                energy_sources, energy_provider, peak_usage_time,
                high_consumption_season, monthly_bill, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(user_id) DO UPDATE SET
                user_type = excluded.user_type,
                location = excluded.location,
                building_size = excluded.building_size,
                occupants = excluded.occupants,
                energy_sources = excluded.energy_sources,
                energy_provider = excluded.energy_provider,
                peak_usage_time = excluded.peak_usage_time,
                high_consumption_season = excluded.high_consumption_season,
                monthly_bill = excluded.monthly_bill,
                updated_at = excluded.updated_at",
        )
        .bind(record.user_id.as_str())
        .bind(record.user_type.as_str())
        .bind(&record.location)
        .bind(decimal_to_text(record.building_size))
        .bind(i64::from(record.occupants))
        .bind(encode_sources(&record.energy_sources))
        .bind(&record.energy_provider)
        .bind(record.peak_usage_time.as_str())
        .bind(record.high_consumption_season.as_str())
        .bind(decimal_to_text(record.monthly_bill))
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(db_err)?;

        sqlx::query("DELETE FROM appliances WHERE user_id = ?")
            .bind(record.user_id.as_str())
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;

        for (position, appliance) in record.appliances.iter().enumerate() {
            sqlx::query(
                "INSERT INTO appliances (user_id, position, name, power_watts, usage_hours_per_day)
                 VALUES (?, ?, ?, ?, ?)",
            )
            .bind(record.user_id.as_str())
            .bind(position as i64)
            .bind(&appliance.name)
            .bind(decimal_to_text(appliance.power_watts))
            .bind(decimal_to_text(appliance.usage_hours_per_day))
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;
        }

        tx.commit().await.map_err(db_err)?;
        debug!(user_id = %record.user_id, appliances = record.appliances.len(), "energy record upserted");

        self.load_record(&record.user_id).await?.ok_or_else(|| {
            StoreError::Database(format!("Record for '{}' missing after upsert", record.user_id))
        })
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    async fn setup_test_store() -> SqliteRecordStore {
        let store = SqliteRecordStore::new(":memory:")
            .await
            .expect("Failed to create in-memory database");
        store
            .run_migrations()
            .await
            .expect("Failed to run migrations");
        store
    }

    async fn signed_in(
        store: &SqliteRecordStore,
        email: &str,
    ) -> Session {
        store
            .sign_up(email, "secret-pass")
            .await
            .expect("Failed to sign up");
        store
            .sign_in(email, "secret-pass")
            .await
            .expect("Failed to sign in")
    }

    fn create_test_record(user_id: &UserId) -> NewEnergyRecord {
        NewEnergyRecord {
            user_id: user_id.clone(),
            user_type: UserType::Household,
            location: "Pune".to_string(),
            building_size: dec!(1000),
            occupants: 4,
            energy_sources: [EnergySource::Electricity, EnergySource::Solar].into(),
            energy_provider: "MSEDCL".to_string(),
            appliances: vec![
                Appliance {
                    name: "Refrigerator".to_string(),
                    power_watts: dec!(150),
                    usage_hours_per_day: dec!(24),
                },
                Appliance {
                    name: "Air conditioner".to_string(),
                    power_watts: dec!(1500),
                    usage_hours_per_day: dec!(6.5),
                },
            ],
            peak_usage_time: PeakUsageTime::AllDay,
            high_consumption_season: Season::Summer,
            monthly_bill: dec!(2400.75),
        }
    }

    // =========================================================================
    // authentication
    // =========================================================================

    #[tokio::test]
    async fn test_sign_up_and_sign_in() {
        let store = setup_test_store().await;

        let session = signed_in(&store, "Asha@Example.com ").await;

        assert_eq!(session.email, "asha@example.com");
        assert!(!session.is_expired_at(Utc::now()));
    }

    #[tokio::test]
    async fn test_sign_up_rejects_duplicate_email() {
        let store = setup_test_store().await;
        store.sign_up("asha@example.com", "secret-pass").await.unwrap();

        let result = store.sign_up("ASHA@example.com", "other-pass").await;

        assert_eq!(result, Err(AuthError::EmailTaken("asha@example.com".to_string())));
    }

    #[tokio::test]
    async fn test_sign_up_rejects_short_password() {
        let store = setup_test_store().await;

        let result = store.sign_up("asha@example.com", "12345").await;

        assert_eq!(result, Err(AuthError::WeakPassword));
    }

    #[tokio::test]
    async fn test_sign_up_rejects_malformed_email() {
        let store = setup_test_store().await;

        let result = store.sign_up("not-an-email", "secret-pass").await;

        assert_eq!(result, Err(AuthError::InvalidEmail("not-an-email".to_string())));
    }

    #[tokio::test]
    async fn test_sign_in_wrong_password() {
        let store = setup_test_store().await;
        store.sign_up("asha@example.com", "secret-pass").await.unwrap();

        let result = store.sign_in("asha@example.com", "wrong-pass").await;

        assert_eq!(result, Err(AuthError::InvalidCredentials));
    }

    #[tokio::test]
    async fn test_sign_in_unknown_email() {
        let store = setup_test_store().await;

        let result = store.sign_in("nobody@example.com", "secret-pass").await;

        assert_eq!(result, Err(AuthError::InvalidCredentials));
    }

    #[tokio::test]
    async fn test_get_session_round_trip() {
        let store = setup_test_store().await;
        let session = signed_in(&store, "asha@example.com").await;

        let found = store.get_session(&session.access_token).await.unwrap();

        assert_eq!(found.map(|s| s.user_id), Some(session.user_id));
    }

    #[tokio::test]
    async fn test_sign_in_purges_expired_sessions() {
        let store = setup_test_store().await.with_session_ttl(Duration::zero());
        signed_in(&store, "asha@example.com").await;
        store.sign_in("asha@example.com", "secret-pass").await.unwrap();

        let remaining: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sessions")
            .fetch_one(store.pool())
            .await
            .unwrap();

        assert_eq!(remaining, 1);
    }

    #[tokio::test]
    async fn test_get_session_unknown_token() {
        let store = setup_test_store().await;

        assert_eq!(store.get_session("no-such-token").await, Ok(None));
    }

    #[tokio::test]
    async fn test_expired_session_is_not_returned() {
        let store = setup_test_store().await.with_session_ttl(Duration::zero());
        let session = signed_in(&store, "asha@example.com").await;

        assert_eq!(store.get_session(&session.access_token).await, Ok(None));
    }

    #[tokio::test]
    async fn test_sign_out_invalidates_session() {
        let store = setup_test_store().await;
        let session = signed_in(&store, "asha@example.com").await;

        store.sign_out(&session).await.unwrap();

        assert_eq!(store.get_session(&session.access_token).await, Ok(None));
    }

    // =========================================================================
    // energy records
    // =========================================================================

    #[tokio::test]
    async fn test_fetch_record_absent() {
        let store = setup_test_store().await;
        let session = signed_in(&store, "asha@example.com").await;

        let record = store.fetch_record(&session, &session.user_id).await;

        assert_eq!(record, Ok(None));
    }

    #[tokio::test]
    async fn test_upsert_and_fetch_record() {
        let store = setup_test_store().await;
        let session = signed_in(&store, "asha@example.com").await;
        let new_record = create_test_record(&session.user_id);

        let stored = store
            .upsert_record(&session, new_record.clone())
            .await
            .expect("Failed to upsert record");
        let fetched = store
            .fetch_record(&session, &session.user_id)
            .await
            .expect("Failed to fetch record")
            .expect("Record should exist");

        assert_eq!(fetched, stored);
        assert_eq!(fetched.appliances, new_record.appliances);
        assert_eq!(fetched.energy_sources, new_record.energy_sources);
        assert_eq!(fetched.monthly_bill, dec!(2400.75));
        assert_eq!(fetched.peak_usage_time, PeakUsageTime::AllDay);
    }

    #[tokio::test]
    async fn test_upsert_replaces_existing_record() {
        let store = setup_test_store().await;
        let session = signed_in(&store, "asha@example.com").await;
        let first = store
            .upsert_record(&session, create_test_record(&session.user_id))
            .await
            .unwrap();

        let mut second = create_test_record(&session.user_id);
        second.monthly_bill = dec!(3100);
        second.appliances.truncate(1);
        let updated = store.upsert_record(&session, second).await.unwrap();

        assert_eq!(updated.monthly_bill, dec!(3100));
        assert_eq!(updated.appliances.len(), 1);
        assert_eq!(updated.created_at, first.created_at);
        assert!(updated.updated_at >= first.updated_at);
    }

    #[tokio::test]
    async fn test_upsert_for_other_user_is_unauthorized() {
        let store = setup_test_store().await;
        let asha = signed_in(&store, "asha@example.com").await;
        let ravi = signed_in(&store, "ravi@example.com").await;

        let result = store
            .upsert_record(&asha, create_test_record(&ravi.user_id))
            .await;

        assert_eq!(result, Err(StoreError::Unauthorized(ravi.user_id.clone())));
        assert_eq!(store.fetch_record(&ravi, &ravi.user_id).await, Ok(None));
    }

    #[tokio::test]
    async fn test_fetch_other_users_record_is_unauthorized() {
        let store = setup_test_store().await;
        let asha = signed_in(&store, "asha@example.com").await;
        let ravi = signed_in(&store, "ravi@example.com").await;
        store
            .upsert_record(&ravi, create_test_record(&ravi.user_id))
            .await
            .unwrap();

        let result = store.fetch_record(&asha, &ravi.user_id).await;

        assert_eq!(result, Err(StoreError::Unauthorized(ravi.user_id)));
    }

    #[tokio::test]
    async fn test_signed_out_session_cannot_write() {
        let store = setup_test_store().await;
        let session = signed_in(&store, "asha@example.com").await;
        store.sign_out(&session).await.unwrap();

        let result = store
            .upsert_record(&session, create_test_record(&session.user_id))
            .await;

        assert!(matches!(result, Err(StoreError::Unauthorized(_))));
    }

    #[test]
    fn test_sources_encoding_round_trip() {
        let sources: BTreeSet<_> = [EnergySource::Gas, EnergySource::Electricity].into();

        let encoded = encode_sources(&sources);

        assert_eq!(encoded, "electricity,gas");
        assert_eq!(decode_sources(&encoded), Some(sources));
        assert_eq!(decode_sources("electricity,coal"), None);
    }

    #[test]
    fn test_hash_password_depends_on_salt() {
        assert_ne!(hash_password("a", "secret"), hash_password("b", "secret"));
        assert_eq!(hash_password("a", "secret"), hash_password("a", "secret"));
    }
}
