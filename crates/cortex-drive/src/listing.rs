//! Paginated listing of a user's Drive files
//!
//! Wraps `GET /files` of the Drive v3 API. Each call fetches one page of at
//! most [`PAGE_SIZE`] files; draining every page is left to
//! `IDriveSource::list_all_files`.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use cortex_drive::client::DriveClient;
//! use cortex_drive::listing;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let client = DriveClient::new("access-token");
//! let first = listing::list_files_page(&client, None).await?;
//! println!("Got {} files", first.files.len());
//! # Ok(())
//! # }
//! ```

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use reqwest::Method;
use serde::Deserialize;
use tracing::debug;

use cortex_core::ports::{RemoteFilePage, RemoteFileRecord, RemoteOwner};

use crate::client::DriveClient;

/// Path for the listing endpoint relative to the Drive API base URL
const FILES_PATH: &str = "/files";

/// Number of files requested per page
pub const PAGE_SIZE: u32 = 100;

/// Partial response selector; only these attributes are returned
pub const LISTING_FIELDS: &str = "nextPageToken, files(id, name, mimeType, size, webViewLink, \
createdTime, modifiedTime, owners, lastModifyingUser(displayName), starred, shared)";

// ============================================================================
// Google Drive API response types (JSON deserialization)
// ============================================================================

/// Raw response from `GET /files`
///
/// See: <https://developers.google.com/drive/api/reference/rest/v3/files/list>
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DriveFileList {
    #[serde(default)]
    files: Vec<DriveFile>,

    /// Present when more pages exist
    next_page_token: Option<String>,
}

/// A file resource restricted to the requested fields
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DriveFile {
    id: String,

    #[serde(default)]
    name: String,

    #[serde(default)]
    mime_type: String,

    /// Byte count as a decimal string; absent for folders and native docs
    size: Option<String>,

    web_view_link: Option<String>,

    created_time: Option<DateTime<Utc>>,

    modified_time: Option<DateTime<Utc>>,

    #[serde(default)]
    owners: Vec<DriveUser>,

    last_modifying_user: Option<DriveUser>,

    starred: Option<bool>,

    shared: Option<bool>,
}

/// A user reference (owner or last modifier)
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DriveUser {
    display_name: Option<String>,
    email_address: Option<String>,
}

// ============================================================================
// ListingParser - converts Drive API responses to port-level types
// ============================================================================

/// Converts raw Drive listing responses into [`RemoteFilePage`]s
pub struct ListingParser;

impl ListingParser {
    fn parse_file(file: DriveFile) -> RemoteFileRecord {
        RemoteFileRecord {
            id: file.id,
            name: file.name,
            mime_type: file.mime_type,
            size: file.size,
            web_view_link: file.web_view_link,
            created_time: file.created_time,
            modified_time: file.modified_time,
            owners: file
                .owners
                .into_iter()
                .map(|o| RemoteOwner {
                    display_name: o.display_name,
                    email_address: o.email_address,
                })
                .collect(),
            last_modifying_user_name: file.last_modifying_user.and_then(|u| u.display_name),
            starred: file.starred,
            shared: file.shared,
        }
    }

    fn parse_response(response: DriveFileList) -> RemoteFilePage {
        RemoteFilePage {
            files: response.files.into_iter().map(Self::parse_file).collect(),
            next_page_token: response.next_page_token.filter(|t| !t.is_empty()),
        }
    }
}

/// Fetches one page of the authenticated user's files
///
/// # Arguments
///
/// * `client` - An authenticated [`DriveClient`]
/// * `page_token` - The `nextPageToken` of the previous page, `None` for the first
///
/// # Errors
///
/// Returns an error if the request fails, the API answers with an error
/// status, or the body is not a valid file list.
pub async fn list_files_page(
    client: &DriveClient,
    page_token: Option<&str>,
) -> Result<RemoteFilePage> {
    let page_size = PAGE_SIZE.to_string();
    let mut query: Vec<(&str, &str)> = vec![
        ("pageSize", page_size.as_str()),
        ("fields", LISTING_FIELDS),
    ];
    if let Some(token) = page_token {
        query.push(("pageToken", token));
    }

    debug!(has_token = page_token.is_some(), "Requesting Drive listing page");

    let raw: DriveFileList = client
        .send(client.request(Method::GET, FILES_PATH).query(&query))
        .await
        .context("Drive listing request failed")?
        .json()
        .await
        .context("Failed to parse Drive listing response JSON")?;

    Ok(ListingParser::parse_response(raw))
}

// ============================================================================
// Tests
// ============================================================================
