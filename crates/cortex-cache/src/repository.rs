//! SQLite implementation of IStateRepository
//!
//! This module provides the concrete SQLite-based implementation of the
//! state repository port defined in cortex-core. It handles all domain
//! type conversion and SQL query construction.
//!
//! ## Type Mapping
//!
//! | Domain Type    | SQL Type | Strategy                                          |
//! |----------------|----------|---------------------------------------------------|
//! | UserId         | TEXT     | UUID string via `.to_string()` / `FromStr`        |
//! | RemoteFileId   | TEXT     | String via `.as_str()` / `RemoteFileId::new()`    |
//! | Email          | TEXT     | String via `.as_str()` / `Email::new()`           |
//! | ByteSize       | INTEGER  | `i64`; sizes above `i64::MAX` are rejected        |
//! | DateTime<Utc>  | TEXT     | RFC 3339 with microseconds and `Z`, so text order is time order |
//! | bool           | INTEGER  | 0 / 1                                             |
//!
//! Name search runs against `name_folded`, a lowercased copy of `name`
//! maintained on every write.

use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use cortex_core::domain::{
    newtypes::{ByteSize, Email, RemoteFileId, TotalBytes, UserId},
    FileAggregates, FileQuery, FileRecord, User,
};
use cortex_core::ports::IStateRepository;

use crate::CacheError;

/// SQLite-based implementation of the state repository port
///
/// Provides persistent storage for users and file records using SQLite.
/// All operations are performed through a connection pool for concurrency.
pub struct SqliteStateRepository {
    pool: SqlitePool,
}

impl SqliteStateRepository {
    /// Creates a new repository instance with the given connection pool
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

// ============================================================================
// Helper functions for type conversion
// ============================================================================

/// Format a DateTime<Utc> so that lexical order equals chronological order
fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Parse a DateTime<Utc> from an ISO 8601 string
fn parse_datetime(s: &str) -> Result<DateTime<Utc>, CacheError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|_| {
            // Try parsing without timezone (SQLite default format)
            chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
                .map(|ndt| ndt.and_utc())
        })
        .map_err(|e| {
            CacheError::InvalidRow(format!("Failed to parse datetime '{}': {}", s, e))
        })
}

/// Parse an optional DateTime<Utc> from an optional string
fn parse_optional_datetime(s: Option<String>) -> Result<Option<DateTime<Utc>>, CacheError> {
    match s {
        Some(ref val) if !val.is_empty() => parse_datetime(val).map(Some),
        _ => Ok(None),
    }
}

fn size_to_sql(size: ByteSize) -> Result<i64, CacheError> {
    i64::try_from(size.as_u64()).map_err(|_| {
        CacheError::InvalidRow(format!("File size {} exceeds storage range", size))
    })
}

fn size_from_sql(size: i64) -> Result<ByteSize, CacheError> {
    u64::try_from(size)
        .map(ByteSize::new)
        .map_err(|_| CacheError::InvalidRow(format!("Negative stored size: {}", size)))
}

/// Rebuilds a byte sum that SQL computed in 32-bit halves
///
/// A single `SUM(size)` overflows `i64` once one MIME type holds more than
/// `i64::MAX` bytes; the two half sums stay in range.
fn split_sum(high: i64, low: i64) -> Result<TotalBytes, CacheError> {
    let high = u128::try_from(high)
        .map_err(|_| CacheError::InvalidRow(format!("Negative stored size sum: {}", high)))?;
    let low = u128::try_from(low)
        .map_err(|_| CacheError::InvalidRow(format!("Negative stored size sum: {}", low)))?;
    Ok(TotalBytes::new((high << 32) + low))
}

// ============================================================================
// Row mapping functions
// ============================================================================

/// Reconstruct a User from a database row
fn user_from_row(row: &SqliteRow) -> Result<User, CacheError> {
    let id_str: String = row.try_get("id")?;
    let email_str: String = row.try_get("email")?;
    let name: String = row.try_get("name")?;
    let refresh_token: Option<String> = row.try_get("refresh_token")?;
    let last_sync_str: Option<String> = row.try_get("last_sync_at")?;
    let created_at_str: String = row.try_get("created_at")?;

    let id = UserId::from_str(&id_str)
        .map_err(|e| CacheError::InvalidRow(format!("Invalid user id: {}", e)))?;
    let email = Email::new(email_str)
        .map_err(|e| CacheError::InvalidRow(format!("Invalid email: {}", e)))?;

    let mut user = User::with_id(id, email, name, parse_datetime(&created_at_str)?);
    user.update_refresh_token(refresh_token);
    if let Some(at) = parse_optional_datetime(last_sync_str)? {
        user.record_sync(at);
    }
    Ok(user)
}

/// Reconstruct a FileRecord from a database row
fn file_from_row(row: &SqliteRow) -> Result<FileRecord, CacheError> {
    let id_str: String = row.try_get("id")?;
    let user_id_str: String = row.try_get("user_id")?;
    let size: i64 = row.try_get("size")?;
    let created_time: String = row.try_get("created_time")?;
    let modified_time: String = row.try_get("modified_time")?;
    let indexed_at: String = row.try_get("indexed_at")?;

    Ok(FileRecord {
        id: RemoteFileId::new(id_str)
            .map_err(|e| CacheError::InvalidRow(format!("Invalid file id: {}", e)))?,
        user_id: UserId::from_str(&user_id_str)
            .map_err(|e| CacheError::InvalidRow(format!("Invalid user id: {}", e)))?,
        name: row.try_get("name")?,
        mime_type: row.try_get("mime_type")?,
        size: size_from_sql(size)?,
        web_view_link: row.try_get("web_view_link")?,
        owner_email: row.try_get("owner_email")?,
        owner_name: row.try_get("owner_name")?,
        last_modifier_name: row.try_get("last_modifier_name")?,
        is_starred: row.try_get("is_starred")?,
        is_shared: row.try_get("is_shared")?,
        created_time: parse_datetime(&created_time)?,
        modified_time: parse_datetime(&modified_time)?,
        indexed_at: parse_datetime(&indexed_at)?,
    })
}

fn files_from_rows(rows: &[SqliteRow]) -> Result<Vec<FileRecord>, CacheError> {
    rows.iter().map(file_from_row).collect()
}

// ============================================================================
// IStateRepository implementation
// ============================================================================

#[async_trait::async_trait]
impl IStateRepository for SqliteStateRepository {
    // --- User operations ---

    async fn get_user(&self, id: &UserId) -> anyhow::Result<Option<User>> {
        let row = sqlx::query("SELECT * FROM users WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(ref r) => Ok(Some(user_from_row(r)?)),
            None => Ok(None),
        }
    }

    async fn upsert_user_by_email(
        &self,
        email: &Email,
        name: &str,
        refresh_token: Option<&str>,
    ) -> anyhow::Result<User> {
        let refresh_token = refresh_token.filter(|t| !t.is_empty());

        // COALESCE keeps the stored credential when none was issued this time
        let row = sqlx::query(
            "INSERT INTO users (id, email, name, refresh_token, last_sync_at, created_at) \
             VALUES (?, ?, ?, ?, NULL, ?) \
             ON CONFLICT(email) DO UPDATE SET \
                 name = excluded.name, \
                 refresh_token = COALESCE(excluded.refresh_token, users.refresh_token) \
             RETURNING *",
        )
        .bind(UserId::new().to_string())
        .bind(email.as_str())
        .bind(name)
        .bind(refresh_token)
        .bind(format_datetime(&Utc::now()))
        .fetch_one(&self.pool)
        .await?;

        let user = user_from_row(&row)?;
        tracing::trace!(user_id = %user.id(), "Upserted user");
        Ok(user)
    }

    async fn record_sync(&self, id: &UserId, at: DateTime<Utc>) -> anyhow::Result<()> {
        let result = sqlx::query("UPDATE users SET last_sync_at = ? WHERE id = ?")
            .bind(format_datetime(&at))
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            anyhow::bail!("User {} not found", id);
        }
        Ok(())
    }

    // --- File operations ---

    async fn upsert_files(&self, records: &[FileRecord]) -> anyhow::Result<()> {
        if records.is_empty() {
            return Ok(());
        }

        // Convert everything up front so a bad record fails before the transaction opens
        let sizes = records
            .iter()
            .map(|r| size_to_sql(r.size))
            .collect::<Result<Vec<_>, _>>()?;

        let mut tx = self.pool.begin().await?;

        for (record, size) in records.iter().zip(sizes) {
            sqlx::query(
                "INSERT INTO files \
                 (id, user_id, name, name_folded, mime_type, size, web_view_link, \
                  owner_email, owner_name, last_modifier_name, is_starred, is_shared, \
                  created_time, modified_time, indexed_at) \
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?) \
                 ON CONFLICT(id, user_id) DO UPDATE SET \
                     name = excluded.name, \
                     name_folded = excluded.name_folded, \
                     mime_type = excluded.mime_type, \
                     size = excluded.size, \
                     web_view_link = excluded.web_view_link, \
                     owner_email = excluded.owner_email, \
                     owner_name = excluded.owner_name, \
                     last_modifier_name = excluded.last_modifier_name, \
                     is_starred = excluded.is_starred, \
                     is_shared = excluded.is_shared, \
                     modified_time = excluded.modified_time, \
                     indexed_at = excluded.indexed_at",
            )
            .bind(record.id.as_str())
            .bind(record.user_id.to_string())
            .bind(&record.name)
            .bind(record.name.to_lowercase())
            .bind(&record.mime_type)
            .bind(size)
            .bind(&record.web_view_link)
            .bind(&record.owner_email)
            .bind(&record.owner_name)
            .bind(&record.last_modifier_name)
            .bind(record.is_starred)
            .bind(record.is_shared)
            .bind(format_datetime(&record.created_time))
            .bind(format_datetime(&record.modified_time))
            .bind(format_datetime(&record.indexed_at))
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        tracing::trace!(records = records.len(), "Upserted file batch");
        Ok(())
    }

    async fn get_file(
        &self,
        user_id: &UserId,
        id: &RemoteFileId,
    ) -> anyhow::Result<Option<FileRecord>> {
        let row = sqlx::query("SELECT * FROM files WHERE id = ? AND user_id = ?")
            .bind(id.as_str())
            .bind(user_id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(ref r) => Ok(Some(file_from_row(r)?)),
            None => Ok(None),
        }
    }

    async fn delete_file(&self, user_id: &UserId, id: &RemoteFileId) -> anyhow::Result<bool> {
        let result = sqlx::query("DELETE FROM files WHERE id = ? AND user_id = ?")
            .bind(id.as_str())
            .bind(user_id.to_string())
            .execute(&self.pool)
            .await?;

        tracing::trace!(file_id = %id, "Deleted file record");
        Ok(result.rows_affected() > 0)
    }

    async fn rename_file(
        &self,
        user_id: &UserId,
        id: &RemoteFileId,
        name: &str,
    ) -> anyhow::Result<Option<FileRecord>> {
        let row = sqlx::query(
            "UPDATE files SET name = ?, name_folded = ? \
             WHERE id = ? AND user_id = ? RETURNING *",
        )
        .bind(name)
        .bind(name.to_lowercase())
        .bind(id.as_str())
        .bind(user_id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(ref r) => Ok(Some(file_from_row(r)?)),
            None => Ok(None),
        }
    }

    async fn query_files(
        &self,
        user_id: &UserId,
        query: &FileQuery,
    ) -> anyhow::Result<(Vec<FileRecord>, u64)> {
        let user_id_str = user_id.to_string();
        let needle = query.search().map(str::to_lowercase);

        let mut filter = String::from(" FROM files WHERE user_id = ?");
        if needle.is_some() {
            filter.push_str(" AND instr(name_folded, ?) > 0");
        }

        // Column and direction both come from closed enums, never from input
        let order = query.order().as_sql();
        let page_sql = format!(
            "SELECT *{filter} ORDER BY {col} {order}, id {order} LIMIT ? OFFSET ?",
            col = query.sort_by().column(),
        );
        let count_sql = format!("SELECT COUNT(*){filter}");

        // Count and page from one snapshot
        let mut tx = self.pool.begin().await?;

        let mut count = sqlx::query_scalar::<_, i64>(&count_sql).bind(&user_id_str);
        if let Some(ref n) = needle {
            count = count.bind(n);
        }
        let total = count.fetch_one(&mut *tx).await?;

        let mut page = sqlx::query(&page_sql).bind(&user_id_str);
        if let Some(ref n) = needle {
            page = page.bind(n);
        }
        let rows = page
            .bind(i64::from(query.limit()))
            .bind(i64::try_from(query.offset()).unwrap_or(i64::MAX))
            .fetch_all(&mut *tx)
            .await?;

        tx.commit().await?;

        let files = files_from_rows(&rows)?;
        Ok((files, u64::try_from(total).unwrap_or(0)))
    }

    async fn file_aggregates(&self, user_id: &UserId) -> anyhow::Result<FileAggregates> {
        let rows = sqlx::query(
            "SELECT mime_type, COUNT(*) AS count, \
             SUM(size >> 32) AS bytes_high, SUM(size & 4294967295) AS bytes_low \
             FROM files WHERE user_id = ? GROUP BY mime_type",
        )
        .bind(user_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        let mut total_size = TotalBytes::default();
        let mut file_count = 0u64;
        let mut mime_counts = Vec::with_capacity(rows.len());

        for row in &rows {
            let mime_type: String = row.try_get("mime_type")?;
            let count: i64 = row.try_get("count")?;
            let high: i64 = row.try_get("bytes_high")?;
            let low: i64 = row.try_get("bytes_low")?;

            let count = u64::try_from(count).unwrap_or(0);
            total_size.add_total(split_sum(high, low)?);
            file_count += count;
            mime_counts.push((mime_type, count));
        }

        Ok(FileAggregates {
            total_size,
            file_count,
            mime_counts,
        })
    }

    async fn list_files(&self, user_id: &UserId) -> anyhow::Result<Vec<FileRecord>> {
        let rows = sqlx::query(
            "SELECT * FROM files WHERE user_id = ? ORDER BY modified_time DESC, id DESC",
        )
        .bind(user_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        Ok(files_from_rows(&rows)?)
    }
}
