//! In-memory fakes of every port, shared by the use-case tests

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};

use crate::domain::{
    newtypes::{Email, RemoteFileId, TotalBytes, UserId},
    FileAggregates, FileQuery, FileRecord, SortField, SortOrder, User,
};
use crate::ports::{
    AccessToken, AssistantError, AssistantRequest, IAssistant, ICredentialProvisioner,
    IDriveSource, IIdentityProvider, IStateRepository, IdentityProfile, IssuedTokens,
    RemoteFilePage, RemoteFileRecord,
};

// ============================================================================
// Repository
// ============================================================================

#[derive(Default)]
pub struct InMemoryRepository {
    users: Mutex<HashMap<UserId, User>>,
    files: Mutex<BTreeMap<(UserId, String), FileRecord>>,
    writes: AtomicUsize,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a user with an optional refresh token and returns it
    pub fn seed_user(&self, email: &str, refresh_token: Option<&str>) -> User {
        let mut user = User::new(Email::new(email.to_string()).unwrap(), "Test User");
        user.update_refresh_token(refresh_token.map(str::to_string));
        self.users
            .lock()
            .unwrap()
            .insert(*user.id(), user.clone());
        user
    }

    pub fn user(&self, id: &UserId) -> Option<User> {
        self.users.lock().unwrap().get(id).cloned()
    }

    pub fn file_count(&self, user_id: &UserId) -> usize {
        self.files
            .lock()
            .unwrap()
            .keys()
            .filter(|(u, _)| u == user_id)
            .count()
    }

    pub fn file(&self, user_id: &UserId, id: &str) -> Option<FileRecord> {
        self.files
            .lock()
            .unwrap()
            .get(&(*user_id, id.to_string()))
            .cloned()
    }

    /// Number of write calls made through the port
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    fn bump(&self) {
        self.writes.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait::async_trait]
impl IStateRepository for InMemoryRepository {
    async fn get_user(&self, id: &UserId) -> Result<Option<User>> {
        Ok(self.user(id))
    }

    async fn upsert_user_by_email(
        &self,
        email: &Email,
        name: &str,
        refresh_token: Option<&str>,
    ) -> Result<User> {
        self.bump();
        let mut users = self.users.lock().unwrap();
        let existing = users.values().find(|u| u.email() == email).cloned();
        let mut user = existing.unwrap_or_else(|| User::new(email.clone(), name));
        user.set_name(name);
        user.update_refresh_token(refresh_token.map(str::to_string));
        users.insert(*user.id(), user.clone());
        Ok(user)
    }

    async fn record_sync(&self, id: &UserId, at: DateTime<Utc>) -> Result<()> {
        self.bump();
        let mut users = self.users.lock().unwrap();
        let user = users.get_mut(id).ok_or_else(|| anyhow!("no such user"))?;
        user.record_sync(at);
        Ok(())
    }

    async fn upsert_files(&self, records: &[FileRecord]) -> Result<()> {
        self.bump();
        let mut files = self.files.lock().unwrap();
        for record in records {
            let key = (record.user_id, record.id.as_str().to_string());
            let mut stored = record.clone();
            if let Some(existing) = files.get(&key) {
                stored.created_time = existing.created_time;
            }
            files.insert(key, stored);
        }
        Ok(())
    }

    async fn get_file(&self, user_id: &UserId, id: &RemoteFileId) -> Result<Option<FileRecord>> {
        Ok(self.file(user_id, id.as_str()))
    }

    async fn delete_file(&self, user_id: &UserId, id: &RemoteFileId) -> Result<bool> {
        self.bump();
        Ok(self
            .files
            .lock()
            .unwrap()
            .remove(&(*user_id, id.as_str().to_string()))
            .is_some())
    }

    async fn rename_file(
        &self,
        user_id: &UserId,
        id: &RemoteFileId,
        name: &str,
    ) -> Result<Option<FileRecord>> {
        self.bump();
        let mut files = self.files.lock().unwrap();
        Ok(files
            .get_mut(&(*user_id, id.as_str().to_string()))
            .map(|record| {
                record.name = name.to_string();
                record.clone()
            }))
    }

    async fn query_files(&self, user_id: &UserId, query: &FileQuery) -> Result<(Vec<FileRecord>, u64)> {
        let needle = query.search().map(str::to_lowercase);
        let mut matching: Vec<FileRecord> = self
            .files
            .lock()
            .unwrap()
            .values()
            .filter(|r| &r.user_id == user_id)
            .filter(|r| {
                needle
                    .as_deref()
                    .map_or(true, |n| r.name.to_lowercase().contains(n))
            })
            .cloned()
            .collect();

        matching.sort_by(|a, b| {
            let ord = match query.sort_by() {
                SortField::Name => a.name.cmp(&b.name),
                SortField::MimeType => a.mime_type.cmp(&b.mime_type),
                SortField::Size => a.size.cmp(&b.size),
                SortField::ModifiedTime => a.modified_time.cmp(&b.modified_time),
                SortField::CreatedTime => a.created_time.cmp(&b.created_time),
                SortField::IndexedAt => a.indexed_at.cmp(&b.indexed_at),
            }
            .then_with(|| a.id.cmp(&b.id));
            match query.order() {
                SortOrder::Asc => ord,
                SortOrder::Desc => ord.reverse(),
            }
        });

        let total = matching.len() as u64;
        let page = matching
            .into_iter()
            .skip(query.offset() as usize)
            .take(query.limit() as usize)
            .collect();
        Ok((page, total))
    }

    async fn file_aggregates(&self, user_id: &UserId) -> Result<FileAggregates> {
        let files = self.files.lock().unwrap();
        let mut total_size = TotalBytes::default();
        let mut file_count = 0;
        let mut per_type: HashMap<String, u64> = HashMap::new();
        for record in files.values().filter(|r| &r.user_id == user_id) {
            total_size.add(record.size);
            file_count += 1;
            *per_type.entry(record.mime_type.clone()).or_default() += 1;
        }
        Ok(FileAggregates {
            total_size,
            file_count,
            mime_counts: per_type.into_iter().collect(),
        })
    }

    async fn list_files(&self, user_id: &UserId) -> Result<Vec<FileRecord>> {
        let mut files: Vec<FileRecord> = self
            .files
            .lock()
            .unwrap()
            .values()
            .filter(|r| &r.user_id == user_id)
            .cloned()
            .collect();
        files.sort_by(|a, b| b.modified_time.cmp(&a.modified_time));
        Ok(files)
    }
}

// ============================================================================
// Drive source
// ============================================================================

/// Scripted remote Drive: serves `pages` in order and records every call
#[derive(Default)]
pub struct FakeDrive {
    pages: Mutex<Vec<RemoteFilePage>>,
    page_requests: AtomicUsize,
    seen_tokens: Mutex<Vec<Option<String>>>,
    fail_listing: bool,
    fail_mutations: bool,
    pub deleted: Mutex<Vec<String>>,
    pub renamed: Mutex<Vec<(String, String)>>,
}

impl FakeDrive {
    pub fn with_pages(pages: Vec<RemoteFilePage>) -> Self {
        Self {
            pages: Mutex::new(pages),
            ..Default::default()
        }
    }

    pub fn failing_listing() -> Self {
        Self {
            fail_listing: true,
            ..Default::default()
        }
    }

    pub fn failing_mutations() -> Self {
        Self {
            fail_mutations: true,
            ..Default::default()
        }
    }

    pub fn page_requests(&self) -> usize {
        self.page_requests.load(Ordering::SeqCst)
    }

    pub fn seen_tokens(&self) -> Vec<Option<String>> {
        self.seen_tokens.lock().unwrap().clone()
    }

    pub fn mutation_calls(&self) -> usize {
        self.deleted.lock().unwrap().len() + self.renamed.lock().unwrap().len()
    }
}

#[async_trait::async_trait]
impl IDriveSource for FakeDrive {
    async fn list_files_page(
        &self,
        _access: &AccessToken,
        page_token: Option<&str>,
    ) -> Result<RemoteFilePage> {
        self.page_requests.fetch_add(1, Ordering::SeqCst);
        self.seen_tokens
            .lock()
            .unwrap()
            .push(page_token.map(str::to_string));
        if self.fail_listing {
            return Err(anyhow!("HTTP 500 from files.list"));
        }
        let mut pages = self.pages.lock().unwrap();
        if pages.is_empty() {
            return Ok(RemoteFilePage::default());
        }
        Ok(pages.remove(0))
    }

    async fn delete_file(&self, _access: &AccessToken, id: &RemoteFileId) -> Result<()> {
        if self.fail_mutations {
            return Err(anyhow!("HTTP 500 from files.delete"));
        }
        self.deleted.lock().unwrap().push(id.as_str().to_string());
        Ok(())
    }

    async fn rename_file(&self, _access: &AccessToken, id: &RemoteFileId, new_name: &str) -> Result<()> {
        if self.fail_mutations {
            return Err(anyhow!("HTTP 500 from files.update"));
        }
        self.renamed
            .lock()
            .unwrap()
            .push((id.as_str().to_string(), new_name.to_string()));
        Ok(())
    }
}

/// Builds a remote record with only the guaranteed fields set
pub fn remote_file(id: &str, mime_type: &str, size: Option<&str>) -> RemoteFileRecord {
    RemoteFileRecord {
        id: id.to_string(),
        name: format!("{id}.bin"),
        mime_type: mime_type.to_string(),
        size: size.map(str::to_string),
        ..Default::default()
    }
}

// ============================================================================
// Credentials and identity
// ============================================================================

#[derive(Default)]
pub struct FakeCredentials {
    pub reject: bool,
    calls: AtomicUsize,
}

impl FakeCredentials {
    pub fn rejecting() -> Self {
        Self {
            reject: true,
            ..Default::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl ICredentialProvisioner for FakeCredentials {
    async fn refresh(&self, refresh_token: &str) -> Result<AccessToken> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.reject {
            return Err(anyhow!("invalid_grant"));
        }
        Ok(AccessToken::new(format!("access-for-{refresh_token}")))
    }
}

pub struct FakeIdentity {
    pub profile: IdentityProfile,
    pub refresh_token: Option<String>,
    pub reject_code: bool,
    pub broken_url: bool,
}

#[async_trait::async_trait]
impl IIdentityProvider for FakeIdentity {
    fn authorization_url(&self) -> Result<String> {
        if self.broken_url {
            return Err(anyhow!("redirect URI is not a valid URL"));
        }
        Ok("https://accounts.example.com/consent?access_type=offline".to_string())
    }

    async fn exchange_code(&self, code: &str) -> Result<IssuedTokens> {
        if self.reject_code {
            return Err(anyhow!("invalid_grant for code {code}"));
        }
        Ok(IssuedTokens {
            access_token: AccessToken::new("access"),
            refresh_token: self.refresh_token.clone(),
            expires_at: Utc::now(),
        })
    }

    async fn fetch_profile(&self, _access: &AccessToken) -> Result<IdentityProfile> {
        Ok(self.profile.clone())
    }
}

// ============================================================================
// Assistant
// ============================================================================

pub struct FakeAssistant {
    pub reply: Result<String, AssistantError>,
    pub requests: Mutex<Vec<AssistantRequest>>,
}

impl FakeAssistant {
    pub fn replying(reply: &str) -> Self {
        Self {
            reply: Ok(reply.to_string()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(error: AssistantError) -> Self {
        Self {
            reply: Err(error),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn last_request(&self) -> Option<AssistantRequest> {
        self.requests.lock().unwrap().last().cloned()
    }
}

#[async_trait::async_trait]
impl IAssistant for FakeAssistant {
    async fn complete(&self, request: &AssistantRequest) -> Result<String, AssistantError> {
        self.requests.lock().unwrap().push(request.clone());
        self.reply.clone()
    }
}
