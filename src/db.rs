use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use sqlx::{Executor, Row};
use std::path::Path;
use std::str::FromStr;

use crate::constants::{EXPECTED_DB_VERSION, VERSION_KEY};
use crate::error::DynError;
use crate::queries::{ddl, metadata};

/// Open a file-based database pool for production use
/// Creates the file if missing and enables WAL mode
pub async fn open_database(db_path: &Path) -> Result<SqlitePool, DynError> {
    let options = SqliteConnectOptions::new()
        .filename(db_path)
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal);

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;
    log::debug!("SQLite database: {}", db_path.display());
    Ok(pool)
}

/// Create an in-memory database pool
/// A single connection keeps every query on the same in-memory database
pub async fn open_in_memory() -> Result<SqlitePool, DynError> {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")?;
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await?;
    Ok(pool)
}

/// Initialize database schema
pub async fn init_database_schema(pool: &SqlitePool) -> Result<(), DynError> {
    sqlx::query(&ddl::create_metadata_table())
        .execute(pool)
        .await?;
    Ok(())
}

/// Write the schema version on a fresh database, refuse a database from another version
pub async fn ensure_version(pool: &SqlitePool) -> Result<(), DynError> {
    match query_metadata(pool, VERSION_KEY).await? {
        None => {
            insert_metadata(pool, VERSION_KEY, EXPECTED_DB_VERSION).await?;
            Ok(())
        }
        Some(version) if version == EXPECTED_DB_VERSION => Ok(()),
        Some(version) => Err(format!(
            "Unsupported database version: '{}'. Expected '{}'",
            version, EXPECTED_DB_VERSION
        )
        .into()),
    }
}

/// Query a single metadata value by key
pub async fn query_metadata<'e, E>(executor: E, key: &str) -> Result<Option<String>, DynError>
where
    E: Executor<'e, Database = sqlx::Sqlite>,
{
    let sql = metadata::select_by_key();
    let result = sqlx::query(&sql)
        .bind(key)
        .fetch_optional(executor)
        .await?;

    Ok(result.map(|row| row.get::<String, _>(0)))
}

/// Update or insert a metadata key-value pair
pub async fn upsert_metadata<'e, E>(executor: E, key: &str, value: &str) -> Result<(), DynError>
where
    E: Executor<'e, Database = sqlx::Sqlite>,
{
    let sql = metadata::upsert();
    sqlx::query(&sql)
        .bind(key)
        .bind(value)
        .execute(executor)
        .await?;
    Ok(())
}

/// Insert a new metadata key-value pair
pub async fn insert_metadata<'e, E>(executor: E, key: &str, value: &str) -> Result<(), DynError>
where
    E: Executor<'e, Database = sqlx::Sqlite>,
{
    let sql = metadata::insert();
    sqlx::query(&sql)
        .bind(key)
        .bind(value)
        .execute(executor)
        .await?;
    Ok(())
}

/// Delete a metadata key, returns whether a row was removed
pub async fn delete_metadata<'e, E>(executor: E, key: &str) -> Result<bool, DynError>
where
    E: Executor<'e, Database = sqlx::Sqlite>,
{
    let sql = metadata::delete_by_key();
    let result = sqlx::query(&sql).bind(key).execute(executor).await?;
    Ok(result.rows_affected() > 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_metadata_round_trip_through_placeholders() {
        let pool = open_in_memory().await.unwrap();
        init_database_schema(&pool).await.unwrap();

        let value = r#"{"scriptureRef":"John's \"3:16\""}"#;
        upsert_metadata(&pool, "doc", value).await.unwrap();
        assert_eq!(
            query_metadata(&pool, "doc").await.unwrap().as_deref(),
            Some(value)
        );

        upsert_metadata(&pool, "doc", "[]").await.unwrap();
        assert_eq!(
            query_metadata(&pool, "doc").await.unwrap().as_deref(),
            Some("[]")
        );

        assert!(delete_metadata(&pool, "doc").await.unwrap());
        assert!(!delete_metadata(&pool, "doc").await.unwrap());
        assert_eq!(query_metadata(&pool, "doc").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_ensure_version_rejects_foreign_database() {
        let pool = open_in_memory().await.unwrap();
        init_database_schema(&pool).await.unwrap();

        ensure_version(&pool).await.unwrap();
        ensure_version(&pool).await.unwrap();

        upsert_metadata(&pool, VERSION_KEY, "999").await.unwrap();
        let err = ensure_version(&pool).await.unwrap_err();
        assert!(err.to_string().contains("Unsupported database version"));
    }
}
