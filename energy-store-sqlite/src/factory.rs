use async_trait::async_trait;

use energy_core::store::{RecordStoreFactory, StoreConfig};
use energy_core::{RecordStore, StoreError};

use crate::store::SqliteRecordStore;

/// [`RecordStoreFactory`] for SQLite.
///
/// Register this with a [`energy_core::store::StoreRegistry`] to make the
/// `"sqlite"` backend available:
///
/// ```rust,no_run
/// use energy_core::store::StoreRegistry;
/// use energy_store_sqlite::SqliteStoreFactory;
///
/// let mut registry = StoreRegistry::new();
/// registry.register(Box::new(SqliteStoreFactory));
/// ```
pub struct SqliteStoreFactory;

#[async_trait]
impl RecordStoreFactory for SqliteStoreFactory {
    fn backend_name(&self) -> &'static str {
        "sqlite"
    }

    /// Open the database described by `config.connection_string` and bring
    /// its schema up to date.
    ///
    /// Accepted connection-string values:
    /// * A bare file path, e.g. `"energy.db"`. The file is created if it
    ///   does not exist.
    /// * `":memory:"`, an ephemeral in-memory database (useful for tests).
    /// * A sqlx URL such as `"sqlite:energy.db?mode=rwc"`.
    async fn create(
        &self,
        config: &StoreConfig,
    ) -> Result<Box<dyn RecordStore>, StoreError> {
        let store = SqliteRecordStore::new(&config.connection_string)
            .await
            .map_err(|e| StoreError::Connection(format!("{e:#}")))?;
        store
            .run_migrations()
            .await
            .map_err(|e| StoreError::Database(format!("{e:#}")))?;
        Ok(Box::new(store))
    }
}

#[cfg(test)]
mod tests {
    use energy_core::store::{RecordStoreFactory, StoreConfig};

    use super::SqliteStoreFactory;

    #[test]
    fn backend_name_is_sqlite() {
        assert_eq!(SqliteStoreFactory.backend_name(), "sqlite");
    }

    /// Full round-trip: factory → SqliteRecordStore with an in-memory DB.
    #[tokio::test]
    async fn creates_in_memory_store() {
        let config = StoreConfig {
            backend: "sqlite".to_string(),
            connection_string: ":memory:".to_string(),
        };

        let store = SqliteStoreFactory
            .create(&config)
            .await
            .expect("failed to create in-memory store");

        store
            .sign_up("asha@example.com", "secret-pass")
            .await
            .expect("migrated schema should accept sign-up");
    }

    #[tokio::test]
    async fn unopenable_path_is_a_connection_error() {
        let config = StoreConfig {
            backend: "sqlite".to_string(),
            connection_string: "/nonexistent-dir/for/energy.db".to_string(),
        };

        let result = SqliteStoreFactory.create(&config).await;

        assert!(matches!(result, Err(energy_core::StoreError::Connection(_))));
    }
}
