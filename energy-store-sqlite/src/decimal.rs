use energy_core::StoreError;
use rust_decimal::Decimal;
use sqlx::{Row, TypeInfo, ValueRef};

/// Get a decimal value from a row.
///
/// Values written by this crate are TEXT; INTEGER and REAL are accepted for
/// rows edited by hand.
pub fn get_decimal(
    row: &sqlx::sqlite::SqliteRow,
    column: &str,
) -> Result<Decimal, StoreError> {
    let value_ref = row
        .try_get_raw(column)
        .map_err(|e| StoreError::Database(format!("Column '{}' not found: {}", column, e)))?;

    let type_info = value_ref.type_info();
    let type_name = type_info.name();

    match type_name {
        "TEXT" => {
            let val: String = row.try_get(column).map_err(|e| {
                StoreError::Database(format!("Failed to get TEXT from '{}': {}", column, e))
            })?;
            val.trim().parse::<Decimal>().map_err(|e| {
                StoreError::Database(format!(
                    "Failed to parse decimal '{}' in '{}': {}",
                    val, column, e
                ))
            })
        }
        "INTEGER" => {
            let val: i64 = row.try_get(column).map_err(|e| {
                StoreError::Database(format!("Failed to get INTEGER from '{}': {}", column, e))
            })?;
            Ok(Decimal::from(val))
        }
        "REAL" => {
            let val: f64 = row.try_get(column).map_err(|e| {
                StoreError::Database(format!("Failed to get REAL from '{}': {}", column, e))
            })?;
            Decimal::try_from(val).map_err(|e| {
                StoreError::Database(format!("Failed to convert {} to Decimal: {}", val, e))
            })
        }
        "NULL" => Err(StoreError::Database(format!("Column '{}' is NULL", column))),
        _ => Err(StoreError::Database(format!(
            "Unexpected type '{}' for column '{}'",
            type_name, column
        ))),
    }
}

/// Normalized text form used when binding a decimal.
pub fn decimal_to_text(d: Decimal) -> String {
    d.normalize().to_string()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;
    use sqlx::sqlite::SqlitePoolOptions;

    use super::*;

    async fn setup_test_db() -> sqlx::sqlite::SqlitePool {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .expect("Failed to create in-memory database");
        sqlx::query(
            "CREATE TABLE test_decimals (
                id INTEGER PRIMARY KEY,
                int_value INTEGER,
                real_value REAL,
                text_value TEXT
            )",
        )
        .execute(&pool)
        .await
        .expect("Failed to create test table");
        pool
    }

    async fn fetch(
        pool: &sqlx::sqlite::SqlitePool,
        column: &str,
    ) -> sqlx::sqlite::SqliteRow {
        sqlx::query(&format!("SELECT {column} FROM test_decimals WHERE id = 1"))
            .fetch_one(pool)
            .await
            .expect("Failed to fetch row")
    }

    #[tokio::test]
    async fn test_get_decimal_from_text() {
        let pool = setup_test_db().await;
        sqlx::query("INSERT INTO test_decimals (id, text_value) VALUES (1, '2400.50')")
            .execute(&pool)
            .await
            .expect("Failed to insert test data");

        let row = fetch(&pool, "text_value").await;

        assert_eq!(get_decimal(&row, "text_value"), Ok(dec!(2400.50)));
    }

    #[tokio::test]
    async fn test_get_decimal_from_integer() {
        let pool = setup_test_db().await;
        sqlx::query("INSERT INTO test_decimals (id, int_value) VALUES (1, 1500)")
            .execute(&pool)
            .await
            .expect("Failed to insert test data");

        let row = fetch(&pool, "int_value").await;

        assert_eq!(get_decimal(&row, "int_value"), Ok(dec!(1500)));
    }

    #[tokio::test]
    async fn test_get_decimal_from_real() {
        let pool = setup_test_db().await;
        sqlx::query("INSERT INTO test_decimals (id, real_value) VALUES (1, 0.5)")
            .execute(&pool)
            .await
            .expect("Failed to insert test data");

        let row = fetch(&pool, "real_value").await;

        assert_eq!(get_decimal(&row, "real_value"), Ok(dec!(0.5)));
    }

    #[tokio::test]
    async fn test_get_decimal_rejects_garbage_text() {
        let pool = setup_test_db().await;
        sqlx::query("INSERT INTO test_decimals (id, text_value) VALUES (1, 'lots')")
            .execute(&pool)
            .await
            .expect("Failed to insert test data");

        let row = fetch(&pool, "text_value").await;

        assert!(matches!(get_decimal(&row, "text_value"), Err(StoreError::Database(_))));
    }

    #[tokio::test]
    async fn test_get_decimal_rejects_null() {
        let pool = setup_test_db().await;
        sqlx::query("INSERT INTO test_decimals (id) VALUES (1)")
            .execute(&pool)
            .await
            .expect("Failed to insert test data");

        let row = fetch(&pool, "text_value").await;

        assert_eq!(
            get_decimal(&row, "text_value"),
            Err(StoreError::Database("Column 'text_value' is NULL".to_string()))
        );
    }

    #[tokio::test]
    async fn test_get_decimal_missing_column() {
        let pool = setup_test_db().await;
        sqlx::query("INSERT INTO test_decimals (id, int_value) VALUES (1, 1)")
            .execute(&pool)
            .await
            .expect("Failed to insert test data");

        let row = fetch(&pool, "int_value").await;

        assert!(get_decimal(&row, "nonexistent").is_err());
    }

    #[test]
    fn test_decimal_to_text_strips_trailing_zeros() {
        assert_eq!(decimal_to_text(dec!(1500.00)), "1500");
        assert_eq!(decimal_to_text(dec!(0.50)), "0.5");
    }
}
