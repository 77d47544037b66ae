//! User entity
//!
//! The user is the identity anchor for every file record. A user is created
//! or updated on sign-in (upsert by email); the stored refresh credential is
//! what allows the backend to reach the user's Drive between sign-ins.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::newtypes::{Email, UserId};

/// A signed-in dashboard user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    id: UserId,
    email: Email,
    name: String,
    /// Long-lived Google refresh token; `None` means Drive is not connected
    #[serde(skip_serializing, default)]
    refresh_token: Option<String>,
    last_sync_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl User {
    /// Creates a new user with a random ID and no Drive connection
    pub fn new(email: Email, name: impl Into<String>) -> Self {
        Self::with_id(UserId::new(), email, name, Utc::now())
    }

    /// Reconstructs a user with a known ID (used by storage adapters)
    pub fn with_id(
        id: UserId,
        email: Email,
        name: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            email,
            name: name.into(),
            refresh_token: None,
            last_sync_at: None,
            created_at,
        }
    }

    pub fn id(&self) -> &UserId {
        &self.id
    }

    pub fn email(&self) -> &Email {
        &self.email
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn refresh_token(&self) -> Option<&str> {
        self.refresh_token.as_deref()
    }

    pub fn last_sync_at(&self) -> Option<DateTime<Utc>> {
        self.last_sync_at
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns true when a refresh credential is stored for this user
    pub fn is_drive_connected(&self) -> bool {
        self.refresh_token.as_deref().is_some_and(|t| !t.is_empty())
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Stores a refresh credential; `None` leaves the current one untouched
    pub fn update_refresh_token(&mut self, token: Option<String>) {
        if let Some(token) = token.filter(|t| !t.is_empty()) {
            self.refresh_token = Some(token);
        }
    }

    /// Records the completion time of a full reconciliation pass
    pub fn record_sync(&mut self, at: DateTime<Utc>) {
        self.last_sync_at = Some(at);
    }
}
