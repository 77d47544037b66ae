//! GoogleDriveSource - IDriveSource implementation for Google Drive v3
//!
//! Binds a fresh [`DriveClient`] to the caller's access credential for each
//! call and delegates to the [`listing`](crate::listing) module or makes the
//! mutation request directly.
//!
//! ## Design Notes
//!
//! - Access credentials are per user and short-lived, so none is stored
//!   here; the shared `reqwest::Client` keeps the connection pool.
//! - Authentication (`refresh`, code exchange) is handled separately by
//!   `GoogleAuthAdapter`; this source focuses on file operations.
//! - No call is retried; retry policy belongs to the caller.

use anyhow::{Context, Result};
use reqwest::{Client, Method};
use serde::Serialize;
use tracing::{debug, info};

use cortex_core::domain::newtypes::RemoteFileId;
use cortex_core::ports::{AccessToken, IDriveSource, RemoteFilePage};

use crate::client::{DriveClient, DRIVE_BASE_URL};
use crate::listing;

/// Body of `PATCH /files/{id}` for a rename
#[derive(Debug, Serialize)]
struct RenameRequest<'a> {
    name: &'a str,
}

/// Drive source backed by the Google Drive v3 REST API
pub struct GoogleDriveSource {
    http: Client,
    base_url: String,
}

impl GoogleDriveSource {
    /// Creates a source pointing at the public Drive v3 endpoint
    pub fn new() -> Self {
        Self::with_base_url(DRIVE_BASE_URL)
    }

    /// Creates a source with a custom base URL (useful for testing)
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.into(),
        }
    }

    fn client_for(&self, access: &AccessToken) -> DriveClient {
        DriveClient::with_http_client(self.http.clone(), access.secret(), self.base_url.clone())
    }
}

impl Default for GoogleDriveSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl IDriveSource for GoogleDriveSource {
    async fn list_files_page(
        &self,
        access: &AccessToken,
        page_token: Option<&str>,
    ) -> Result<RemoteFilePage> {
        let client = self.client_for(access);
        listing::list_files_page(&client, page_token).await
    }

    async fn delete_file(&self, access: &AccessToken, id: &RemoteFileId) -> Result<()> {
        let client = self.client_for(access);
        let url = client.file_url(id.as_str())?;

        debug!(file_id = %id, "Deleting Drive file");
        client
            .send(client.request_url(Method::DELETE, url))
            .await
            .with_context(|| format!("Failed to delete Drive file {id}"))?;

        info!(file_id = %id, "Deleted Drive file");
        Ok(())
    }

    async fn rename_file(
        &self,
        access: &AccessToken,
        id: &RemoteFileId,
        new_name: &str,
    ) -> Result<()> {
        let client = self.client_for(access);
        let url = client.file_url(id.as_str())?;

        debug!(file_id = %id, "Renaming Drive file");
        client
            .send(
                client
                    .request_url(Method::PATCH, url)
                    .query(&[("fields", "id, name")])
                    .json(&RenameRequest { name: new_name }),
            )
            .await
            .with_context(|| format!("Failed to rename Drive file {id}"))?;

        info!(file_id = %id, "Renamed Drive file");
        Ok(())
    }
}
