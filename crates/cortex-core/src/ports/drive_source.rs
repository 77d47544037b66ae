//! Drive source port (driven/secondary port)
//!
//! This module defines the interface for reading and mutating a user's
//! remote Drive. The implementation targets Google Drive v3, but the
//! trait only speaks in port-level DTOs.
//!
//! ## Design Notes
//!
//! - Uses `anyhow::Result` because remote errors are adapter-specific; the
//!   use cases decide how each failure is classified.
//! - [`RemoteFileRecord`] is a port-level DTO, not a domain entity; the
//!   reconciliation use case maps it to a `FileRecord`.
//! - [`IDriveSource::list_all_files`] has a provided implementation that
//!   drains pagination strictly sequentially on top of
//!   [`IDriveSource::list_files_page`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::credentials::AccessToken;
use crate::domain::newtypes::RemoteFileId;

// ============================================================================
// Listing DTOs
// ============================================================================

/// An owner entry as reported by the remote source
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteOwner {
    pub display_name: Option<String>,
    pub email_address: Option<String>,
}

/// A single file as reported by the remote listing
///
/// Only `id`, `name` and `mime_type` are guaranteed; every other field may
/// be absent and is defaulted during reconciliation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteFileRecord {
    pub id: String,
    pub name: String,
    pub mime_type: String,
    /// Decimal byte count as a string; absent for folders and native docs
    pub size: Option<String>,
    pub web_view_link: Option<String>,
    pub created_time: Option<DateTime<Utc>>,
    pub modified_time: Option<DateTime<Utc>>,
    /// Only the first owner is used
    pub owners: Vec<RemoteOwner>,
    pub last_modifying_user_name: Option<String>,
    pub starred: Option<bool>,
    pub shared: Option<bool>,
}

impl RemoteFileRecord {
    /// The first reported owner, if any
    pub fn primary_owner(&self) -> Option<&RemoteOwner> {
        self.owners.first()
    }
}

/// One page of the remote listing
#[derive(Debug, Clone, Default)]
pub struct RemoteFilePage {
    pub files: Vec<RemoteFileRecord>,
    /// Opaque continuation token; `None` on the last page
    pub next_page_token: Option<String>,
}

// ============================================================================
// IDriveSource trait
// ============================================================================

/// Port trait for the remote Drive
#[async_trait::async_trait]
pub trait IDriveSource: Send + Sync {
    /// Fetches one page of the user's files
    ///
    /// # Arguments
    /// * `access` - A valid short-lived access credential
    /// * `page_token` - Continuation token from the previous page (None for the first)
    async fn list_files_page(
        &self,
        access: &AccessToken,
        page_token: Option<&str>,
    ) -> anyhow::Result<RemoteFilePage>;

    /// Lists every file by following continuation tokens until none is returned
    ///
    /// Pages are requested one after another, never concurrently. Any failing
    /// page aborts the whole listing; no partial result is returned.
    ///
    /// # Errors
    ///
    /// Returns the first page error, or an error if the source hands back the
    /// same continuation token it was just given.
    async fn list_all_files(&self, access: &AccessToken) -> anyhow::Result<Vec<RemoteFileRecord>> {
        let mut files = Vec::new();
        let mut page_token: Option<String> = None;
        let mut pages = 0usize;

        loop {
            let page = self.list_files_page(access, page_token.as_deref()).await?;
            pages += 1;
            debug!(page = pages, items = page.files.len(), "Received listing page");
            files.extend(page.files);

            match page.next_page_token.filter(|t| !t.is_empty()) {
                Some(next) if page_token.as_deref() == Some(next.as_str()) => {
                    anyhow::bail!("Remote listing returned a repeated page token after page {pages}");
                }
                Some(next) => page_token = Some(next),
                None => break,
            }
        }

        debug!(pages, total = files.len(), "Remote listing drained");
        Ok(files)
    }

    /// Deletes a file in the remote Drive
    async fn delete_file(&self, access: &AccessToken, id: &RemoteFileId) -> anyhow::Result<()>;

    /// Renames a file in the remote Drive
    async fn rename_file(
        &self,
        access: &AccessToken,
        id: &RemoteFileId,
        new_name: &str,
    ) -> anyhow::Result<()>;
}
