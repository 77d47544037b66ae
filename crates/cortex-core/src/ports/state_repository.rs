//! State repository port (driven/secondary port)
//!
//! This module defines the interface for persisting users and their file
//! records.
//!
//! ## Design Notes
//!
//! - Uses `anyhow::Result` because storage errors are adapter-specific.
//! - Every file operation is scoped by the owning [`UserId`]; there is no
//!   way to read or mutate another user's records through this port.
//! - [`IStateRepository::upsert_files`] is the only multi-record write and
//!   must be atomic: all records commit or none do.

use chrono::{DateTime, Utc};

use crate::domain::{
    newtypes::{Email, RemoteFileId, UserId},
    FileAggregates, FileQuery, FileRecord, User,
};

/// Port trait for persistent state
#[async_trait::async_trait]
pub trait IStateRepository: Send + Sync {
    // ------------------------------------------------------------------
    // Users
    // ------------------------------------------------------------------

    /// Loads a user by ID
    async fn get_user(&self, id: &UserId) -> anyhow::Result<Option<User>>;

    /// Creates or updates a user keyed by email
    ///
    /// On update the name is overwritten, while the refresh credential is
    /// only replaced when `refresh_token` is `Some`.
    ///
    /// # Returns
    /// The stored user
    async fn upsert_user_by_email(
        &self,
        email: &Email,
        name: &str,
        refresh_token: Option<&str>,
    ) -> anyhow::Result<User>;

    /// Records the time of the last successful reconciliation
    async fn record_sync(&self, id: &UserId, at: DateTime<Utc>) -> anyhow::Result<()>;

    // ------------------------------------------------------------------
    // Files
    // ------------------------------------------------------------------

    /// Inserts or updates every record in one atomic batch
    ///
    /// Keyed by `(id, user_id)`. Updates overwrite every mutable field and
    /// `indexed_at`, but never `created_time`.
    async fn upsert_files(&self, records: &[FileRecord]) -> anyhow::Result<()>;

    /// Loads one record by composite key
    async fn get_file(&self, user_id: &UserId, id: &RemoteFileId)
        -> anyhow::Result<Option<FileRecord>>;

    /// Deletes one record by composite key
    ///
    /// # Returns
    /// `true` when a record was removed
    async fn delete_file(&self, user_id: &UserId, id: &RemoteFileId) -> anyhow::Result<bool>;

    /// Renames one record by composite key
    ///
    /// # Returns
    /// The updated record, or `None` when it does not exist
    async fn rename_file(
        &self,
        user_id: &UserId,
        id: &RemoteFileId,
        name: &str,
    ) -> anyhow::Result<Option<FileRecord>>;

    /// Runs a listing query
    ///
    /// # Returns
    /// The requested page and the total number of matching records
    async fn query_files(
        &self,
        user_id: &UserId,
        query: &FileQuery,
    ) -> anyhow::Result<(Vec<FileRecord>, u64)>;

    /// Reads size total, record count and per-type counts in one consistent pass
    async fn file_aggregates(&self, user_id: &UserId) -> anyhow::Result<FileAggregates>;

    /// Loads every record of a user, most recently modified first
    async fn list_files(&self, user_id: &UserId) -> anyhow::Result<Vec<FileRecord>>;
}
