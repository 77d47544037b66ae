//! Database connection pool management
//!
//! Wraps SQLx's `SqlitePool`. Opening a pool creates the database file and
//! its directory when missing and brings the schema up to date. Schema
//! migrations are embedded in the binary and tracked in `PRAGMA user_version`,
//! so reopening an existing database only applies what is new.

use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use tracing::{debug, info};

use crate::CacheError;

/// Embedded migrations in application order; entry `n` moves the schema to version `n + 1`
const MIGRATIONS: &[(&str, &str)] = &[(
    "initial",
    include_str!("migrations/20261019_initial.sql"),
)];

const MAX_CONNECTIONS: u32 = 5;
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// SQLite connection pool for Cortex users and file records
///
/// File databases run in WAL mode with up to five connections, so listing
/// and statistics reads proceed while a sync batch commits. Foreign keys are
/// always enforced: removing a user removes their file records.
pub struct DatabasePool {
    pool: SqlitePool,
}

impl DatabasePool {
    /// Opens (creating if needed) the database at `db_path` and migrates it
    ///
    /// # Errors
    ///
    /// Returns `CacheError::ConnectionFailed` if the directory or connection
    /// cannot be created, or `CacheError::MigrationFailed` if a migration fails.
    pub async fn new(db_path: &Path) -> Result<Self, CacheError> {
        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                CacheError::ConnectionFailed(format!(
                    "Failed to create database directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let options = SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true)
            .foreign_keys(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(BUSY_TIMEOUT);

        let pool = SqlitePoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .connect_with(options)
            .await
            .map_err(|e| {
                CacheError::ConnectionFailed(format!(
                    "Failed to open database at {}: {}",
                    db_path.display(),
                    e
                ))
            })?;

        let version = migrate(&pool).await?;
        info!(path = %db_path.display(), schema_version = version, "Database ready");

        Ok(Self { pool })
    }

    /// Opens a private in-memory database, for tests
    ///
    /// Limited to a single connection: every SQLite in-memory connection is
    /// a separate database.
    pub async fn in_memory() -> Result<Self, CacheError> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")
            .map_err(|e| CacheError::ConnectionFailed(e.to_string()))?
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .map_err(|e| {
                CacheError::ConnectionFailed(format!("Failed to open in-memory database: {}", e))
            })?;

        migrate(&pool).await?;
        Ok(Self { pool })
    }

    /// Returns the underlying SQLite connection pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Returns the schema version recorded in the database
    pub async fn schema_version(&self) -> Result<u32, CacheError> {
        read_version(&self.pool).await
    }

    /// Waits for in-flight queries and closes every connection
    pub async fn close(&self) {
        self.pool.close().await;
        debug!("Database pool closed");
    }
}

async fn read_version(pool: &SqlitePool) -> Result<u32, CacheError> {
    let version: i64 = sqlx::query_scalar("PRAGMA user_version")
        .fetch_one(pool)
        .await?;
    Ok(u32::try_from(version).unwrap_or(0))
}

/// Applies every migration newer than the stored version, each in its own
/// transaction, and returns the resulting version
async fn migrate(pool: &SqlitePool) -> Result<u32, CacheError> {
    let mut version = read_version(pool).await?;

    for (name, sql) in MIGRATIONS.iter().skip(version as usize) {
        let next = version + 1;
        let failed =
            |e: sqlx::Error| CacheError::MigrationFailed(format!("Migration {next} ({name}): {e}"));

        let mut tx = pool.begin().await.map_err(failed)?;
        sqlx::raw_sql(sql).execute(&mut *tx).await.map_err(failed)?;
        // PRAGMA does not take bound parameters
        sqlx::raw_sql(&format!("PRAGMA user_version = {next}"))
            .execute(&mut *tx)
            .await
            .map_err(failed)?;
        tx.commit().await.map_err(failed)?;

        debug!(version = next, name, "Applied migration");
        version = next;
    }

    Ok(version)
}
