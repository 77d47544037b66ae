//! File record entity
//!
//! A file record is the local mirror of one remote Drive file as seen by one
//! user. Identity is the composite key `(id, user_id)`: the same remote file
//! shared with two users is tracked as two independent records.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::newtypes::{ByteSize, RemoteFileId, UserId};

/// Local mirror of a remote Drive file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileRecord {
    /// Remote file identifier (first half of the composite key)
    pub id: RemoteFileId,
    /// Owning user (second half of the composite key)
    #[serde(skip_serializing)]
    pub user_id: UserId,
    pub name: String,
    pub mime_type: String,
    /// Serialized as a decimal string
    pub size: ByteSize,
    pub web_view_link: String,
    pub owner_email: String,
    pub owner_name: String,
    pub last_modifier_name: String,
    pub is_starred: bool,
    pub is_shared: bool,
    /// Set on insert only; later upserts never touch it
    pub created_time: DateTime<Utc>,
    pub modified_time: DateTime<Utc>,
    /// Refreshed on every upsert
    pub indexed_at: DateTime<Utc>,
}

impl FileRecord {
    /// Returns the composite identity of this record
    pub fn key(&self) -> (&RemoteFileId, &UserId) {
        (&self.id, &self.user_id)
    }
}
