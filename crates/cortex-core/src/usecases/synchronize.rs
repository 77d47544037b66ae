//! Drive reconciliation use case
//!
//! Pulls a user's complete remote file listing and reconciles it into the
//! local store with an idempotent, all-or-nothing batch upsert keyed by
//! `(remote file id, user id)`.
//!
//! Records whose remote file disappeared are left untouched: reconciliation
//! only inserts and updates.

use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex};

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::domain::{
    newtypes::{ByteSize, RemoteFileId, UserId},
    DomainError, FileRecord,
};
use crate::error::CoreError;
use crate::ports::{ICredentialProvisioner, IDriveSource, IStateRepository, RemoteFileRecord};
use crate::usecases::drive_access::access_for_user;

// ============================================================================
// Mapping defaults
// ============================================================================

/// Values used for fields the remote listing leaves out
///
/// | Field                | Default            |
/// |----------------------|--------------------|
/// | size                 | 0                  |
/// | owner name / email   | empty string       |
/// | view link            | empty string       |
/// | last modifier        | `"Unknown"`        |
/// | starred / shared     | false              |
/// | created / modified   | `now`              |
#[derive(Debug, Clone)]
pub struct RecordDefaults {
    pub now: DateTime<Utc>,
    pub owner_name: &'static str,
    pub owner_email: &'static str,
    pub web_view_link: &'static str,
    pub last_modifier_name: &'static str,
}

impl RecordDefaults {
    pub fn at(now: DateTime<Utc>) -> Self {
        Self {
            now,
            owner_name: "",
            owner_email: "",
            web_view_link: "",
            last_modifier_name: "Unknown",
        }
    }

    /// Maps one remote record into a local record owned by `user_id`
    ///
    /// `indexed_at` is set to `now`.
    ///
    /// # Errors
    ///
    /// Returns an error when the remote ID is empty or the size is not a
    /// non-negative decimal integer.
    pub fn apply(&self, user_id: &UserId, remote: &RemoteFileRecord) -> Result<FileRecord, DomainError> {
        let id = RemoteFileId::new(remote.id.clone())?;
        let size = match remote.size.as_deref() {
            Some(raw) => raw.parse::<ByteSize>()?,
            None => ByteSize::ZERO,
        };
        let owner = remote.primary_owner();

        Ok(FileRecord {
            id,
            user_id: *user_id,
            name: remote.name.clone(),
            mime_type: remote.mime_type.clone(),
            size,
            web_view_link: remote
                .web_view_link
                .clone()
                .unwrap_or_else(|| self.web_view_link.to_string()),
            owner_email: owner
                .and_then(|o| o.email_address.clone())
                .unwrap_or_else(|| self.owner_email.to_string()),
            owner_name: owner
                .and_then(|o| o.display_name.clone())
                .unwrap_or_else(|| self.owner_name.to_string()),
            last_modifier_name: remote
                .last_modifying_user_name
                .clone()
                .unwrap_or_else(|| self.last_modifier_name.to_string()),
            is_starred: remote.starred.unwrap_or(false),
            is_shared: remote.shared.unwrap_or(false),
            created_time: remote.created_time.unwrap_or(self.now),
            modified_time: remote.modified_time.unwrap_or(self.now),
            indexed_at: self.now,
        })
    }
}

// ============================================================================
// SynchronizeUseCase
// ============================================================================

/// Use case reconciling a user's remote Drive into the local store
///
/// Concurrent calls for the same user are serialized; calls for different
/// users run independently. A user's lock is dropped from the map once no
/// call holds or awaits it.
pub struct SynchronizeUseCase {
    drive: Arc<dyn IDriveSource + Send + Sync>,
    credentials: Arc<dyn ICredentialProvisioner + Send + Sync>,
    state_repository: Arc<dyn IStateRepository + Send + Sync>,
    user_locks: StdMutex<HashMap<UserId, Arc<Mutex<()>>>>,
}

impl SynchronizeUseCase {
    /// Creates a new SynchronizeUseCase with the required dependencies
    ///
    /// # Arguments
    ///
    /// * `drive` - Remote Drive listing
    /// * `credentials` - Refresh credential exchange
    /// * `state_repository` - Persistent storage for users and file records
    pub fn new(
        drive: Arc<dyn IDriveSource + Send + Sync>,
        credentials: Arc<dyn ICredentialProvisioner + Send + Sync>,
        state_repository: Arc<dyn IStateRepository + Send + Sync>,
    ) -> Self {
        Self {
            drive,
            credentials,
            state_repository,
            user_locks: StdMutex::new(HashMap::new()),
        }
    }

    /// Runs a full reconciliation pass for one user
    ///
    /// 1. Loads the user's refresh credential
    /// 2. Exchanges it for an access credential
    /// 3. Drains the remote listing; an empty listing returns 0 without writes
    /// 4. Maps every remote record using [`RecordDefaults`]
    /// 5. Upserts all records in one atomic batch
    /// 6. Records the sync timestamp
    ///
    /// # Returns
    ///
    /// The number of remote records seen (not the number that changed)
    ///
    /// # Errors
    ///
    /// - [`CoreError::Unauthorized`] when no credential is stored or it cannot be refreshed
    /// - [`CoreError::Remote`] when the listing fails or is malformed
    /// - [`CoreError::Storage`] when the batch or the timestamp update fails
    pub async fn execute(&self, user_id: &UserId) -> Result<usize, CoreError> {
        let lease = self.lease(user_id);
        let _guard = lease.lock.lock().await;

        // Steps 1-2: refresh credential exchanged for an access credential
        let access =
            access_for_user(&*self.credentials, &*self.state_repository, user_id).await?;

        // Step 3: drain the listing
        let remote_files = self
            .drive
            .list_all_files(&access)
            .await
            .map_err(|e| CoreError::remote("Failed to fetch files from Google Drive", e))?;

        if remote_files.is_empty() {
            info!(user_id = %user_id, "Remote listing is empty, nothing to reconcile");
            return Ok(0);
        }

        // Step 4: map
        let defaults = RecordDefaults::at(Utc::now());
        let records = remote_files
            .iter()
            .map(|remote| defaults.apply(user_id, remote))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| {
                CoreError::remote(
                    "Google Drive returned an invalid file listing",
                    anyhow::Error::new(e),
                )
            })?;

        // Step 5: one atomic batch
        self.state_repository
            .upsert_files(&records)
            .await
            .map_err(CoreError::Storage)?;
        debug!(user_id = %user_id, records = records.len(), "Batch upsert committed");

        // Step 6: sync timestamp
        self.state_repository
            .record_sync(user_id, Utc::now())
            .await
            .map_err(CoreError::Storage)?;

        info!(user_id = %user_id, files = remote_files.len(), "Drive synchronized");
        Ok(remote_files.len())
    }

    fn lease(&self, user_id: &UserId) -> LockLease<'_> {
        let mut locks = self
            .user_locks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        LockLease {
            locks: &self.user_locks,
            user_id: *user_id,
            lock: Arc::clone(locks.entry(*user_id).or_default()),
        }
    }
}

/// A caller's claim on a user's lock
///
/// Dropping the last claim removes the lock from the map, including when the
/// sync future is cancelled mid-flight.
struct LockLease<'a> {
    locks: &'a StdMutex<HashMap<UserId, Arc<Mutex<()>>>>,
    user_id: UserId,
    lock: Arc<Mutex<()>>,
}

impl Drop for LockLease<'_> {
    fn drop(&mut self) {
        let mut locks = self
            .locks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        // One reference in the map, one here: nobody else is waiting
        if Arc::strong_count(&self.lock) == 2 {
            locks.remove(&self.user_id);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::domain::FileQuery;
    use crate::ports::{RemoteFilePage, RemoteOwner};
    use crate::usecases::test_support::{remote_file, FakeCredentials, FakeDrive, InMemoryRepository};
    use crate::usecases::ComputeStatsUseCase;

    fn page(files: Vec<RemoteFileRecord>, next: Option<&str>) -> RemoteFilePage {
        RemoteFilePage {
            files,
            next_page_token: next.map(str::to_string),
        }
    }

    fn use_case(
        drive: Arc<FakeDrive>,
        credentials: Arc<FakeCredentials>,
        repo: Arc<InMemoryRepository>,
    ) -> SynchronizeUseCase {
        SynchronizeUseCase::new(drive, credentials, repo)
    }

    #[tokio::test]
    async fn accumulates_every_page() {
        let repo = Arc::new(InMemoryRepository::new());
        let user = repo.seed_user("u@example.com", Some("rt"));
        let drive = Arc::new(FakeDrive::with_pages(vec![
            page(vec![remote_file("a", "text/plain", Some("1"))], Some("tok-2")),
            page(
                vec![
                    remote_file("b", "text/plain", Some("2")),
                    remote_file("c", "image/png", None),
                ],
                None,
            ),
        ]));
        let sync = use_case(drive.clone(), Arc::new(FakeCredentials::default()), repo.clone());

        let processed = sync.execute(user.id()).await.unwrap();

        assert_eq!(processed, 3);
        assert_eq!(drive.page_requests(), 2);
        assert_eq!(drive.seen_tokens(), vec![None, Some("tok-2".to_string())]);
        assert_eq!(repo.file_count(user.id()), 3);
        assert!(repo.user(user.id()).unwrap().last_sync_at().is_some());
    }

    #[tokio::test]
    async fn empty_listing_performs_no_writes() {
        let repo = Arc::new(InMemoryRepository::new());
        let user = repo.seed_user("u@example.com", Some("rt"));
        let drive = Arc::new(FakeDrive::with_pages(vec![page(Vec::new(), None)]));
        let sync = use_case(drive, Arc::new(FakeCredentials::default()), repo.clone());

        assert_eq!(sync.execute(user.id()).await.unwrap(), 0);
        assert_eq!(repo.writes(), 0);
        assert!(repo.user(user.id()).unwrap().last_sync_at().is_none());
    }

    #[tokio::test]
    async fn missing_refresh_token_is_unauthorized() {
        let repo = Arc::new(InMemoryRepository::new());
        let user = repo.seed_user("u@example.com", None);
        let credentials = Arc::new(FakeCredentials::default());
        let drive = Arc::new(FakeDrive::default());
        let sync = use_case(drive.clone(), credentials.clone(), repo);

        let err = sync.execute(user.id()).await.unwrap_err();
        assert!(matches!(err, CoreError::Unauthorized(_)));
        assert_eq!(err.status_code(), 401);
        assert_eq!(credentials.calls(), 0);
        assert_eq!(drive.page_requests(), 0);
    }

    #[tokio::test]
    async fn unknown_user_is_unauthorized() {
        let repo = Arc::new(InMemoryRepository::new());
        let sync = use_case(
            Arc::new(FakeDrive::default()),
            Arc::new(FakeCredentials::default()),
            repo,
        );

        let err = sync.execute(&UserId::new()).await.unwrap_err();
        assert!(matches!(err, CoreError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn rejected_refresh_is_unauthorized() {
        let repo = Arc::new(InMemoryRepository::new());
        let user = repo.seed_user("u@example.com", Some("revoked"));
        let drive = Arc::new(FakeDrive::default());
        let sync = use_case(drive.clone(), Arc::new(FakeCredentials::rejecting()), repo);

        let err = sync.execute(user.id()).await.unwrap_err();
        assert!(matches!(err, CoreError::Unauthorized(_)));
        assert_eq!(drive.page_requests(), 0);
    }

    #[tokio::test]
    async fn listing_failure_aborts_without_writes() {
        let repo = Arc::new(InMemoryRepository::new());
        let user = repo.seed_user("u@example.com", Some("rt"));
        let sync = use_case(
            Arc::new(FakeDrive::failing_listing()),
            Arc::new(FakeCredentials::default()),
            repo.clone(),
        );

        let err = sync.execute(user.id()).await.unwrap_err();
        assert!(matches!(err, CoreError::Remote { .. }));
        assert_eq!(err.status_code(), 500);
        assert_eq!(repo.writes(), 0);
    }

    #[tokio::test]
    async fn malformed_size_aborts_without_writes() {
        let repo = Arc::new(InMemoryRepository::new());
        let user = repo.seed_user("u@example.com", Some("rt"));
        let drive = Arc::new(FakeDrive::with_pages(vec![page(
            vec![
                remote_file("ok", "text/plain", Some("10")),
                remote_file("bad", "text/plain", Some("ten")),
            ],
            None,
        )]));
        let sync = use_case(drive, Arc::new(FakeCredentials::default()), repo.clone());

        assert!(sync.execute(user.id()).await.is_err());
        assert_eq!(repo.file_count(user.id()), 0);
        assert_eq!(repo.writes(), 0);
    }

    #[tokio::test]
    async fn missing_fields_use_named_defaults() {
        let repo = Arc::new(InMemoryRepository::new());
        let user = repo.seed_user("u@example.com", Some("rt"));
        let drive = Arc::new(FakeDrive::with_pages(vec![page(
            vec![remote_file("bare", "application/octet-stream", None)],
            None,
        )]));
        let sync = use_case(drive, Arc::new(FakeCredentials::default()), repo.clone());

        sync.execute(user.id()).await.unwrap();

        let record = repo.file(user.id(), "bare").unwrap();
        assert_eq!(record.size, ByteSize::ZERO);
        assert_eq!(record.owner_name, "");
        assert_eq!(record.owner_email, "");
        assert_eq!(record.web_view_link, "");
        assert_eq!(record.last_modifier_name, "Unknown");
        assert!(!record.is_starred);
        assert!(!record.is_shared);
        assert_eq!(record.created_time, record.indexed_at);
        assert_eq!(record.modified_time, record.indexed_at);
    }

    #[tokio::test]
    async fn first_owner_is_used() {
        let now = Utc::now();
        let remote = RemoteFileRecord {
            owners: vec![
                RemoteOwner {
                    display_name: Some("Alice".to_string()),
                    email_address: Some("alice@example.com".to_string()),
                },
                RemoteOwner {
                    display_name: Some("Bob".to_string()),
                    email_address: None,
                },
            ],
            starred: Some(true),
            ..remote_file("f", "text/plain", Some("5"))
        };

        let record = RecordDefaults::at(now).apply(&UserId::new(), &remote).unwrap();
        assert_eq!(record.owner_name, "Alice");
        assert_eq!(record.owner_email, "alice@example.com");
        assert!(record.is_starred);
        assert_eq!(record.size.as_u64(), 5);
    }

    #[tokio::test]
    async fn resync_is_idempotent_and_keeps_created_time() {
        let repo = Arc::new(InMemoryRepository::new());
        let user = repo.seed_user("u@example.com", Some("rt"));
        let listing = vec![
            remote_file("a", "text/plain", Some("1")),
            remote_file("b", "text/plain", Some("2")),
        ];

        let first = use_case(
            Arc::new(FakeDrive::with_pages(vec![page(listing.clone(), None)])),
            Arc::new(FakeCredentials::default()),
            repo.clone(),
        );
        first.execute(user.id()).await.unwrap();
        let before = repo.file(user.id(), "a").unwrap();

        let second = use_case(
            Arc::new(FakeDrive::with_pages(vec![page(listing, None)])),
            Arc::new(FakeCredentials::default()),
            repo.clone(),
        );
        second.execute(user.id()).await.unwrap();
        let after = repo.file(user.id(), "a").unwrap();

        assert_eq!(repo.file_count(user.id()), 2);
        assert_eq!(before.created_time, after.created_time);
        assert_eq!(before.name, after.name);
        assert_eq!(before.size, after.size);
        assert!(after.indexed_at >= before.indexed_at);
    }

    #[tokio::test]
    async fn same_remote_id_is_tracked_per_user() {
        let repo = Arc::new(InMemoryRepository::new());
        let alice = repo.seed_user("alice@example.com", Some("rt-a"));
        let bob = repo.seed_user("bob@example.com", Some("rt-b"));

        for user in [&alice, &bob] {
            let sync = use_case(
                Arc::new(FakeDrive::with_pages(vec![page(
                    vec![remote_file("shared", "text/plain", Some("7"))],
                    None,
                )])),
                Arc::new(FakeCredentials::default()),
                repo.clone(),
            );
            sync.execute(user.id()).await.unwrap();
        }

        assert_eq!(repo.file_count(alice.id()), 1);
        assert_eq!(repo.file_count(bob.id()), 1);
        let (alice_files, _) = repo
            .query_files(alice.id(), &FileQuery::default())
            .await
            .unwrap();
        assert_eq!(alice_files[0].user_id, *alice.id());
    }

    fn tracked_locks(sync: &SynchronizeUseCase) -> usize {
        sync.user_locks.lock().unwrap().len()
    }

    #[tokio::test]
    async fn user_lock_is_released_after_each_run() {
        let repo = Arc::new(InMemoryRepository::new());
        let user = repo.seed_user("u@example.com", Some("rt"));
        let sync = use_case(
            Arc::new(FakeDrive::with_pages(vec![page(
                vec![remote_file("a", "text/plain", Some("1"))],
                None,
            )])),
            Arc::new(FakeCredentials::default()),
            repo,
        );

        sync.execute(user.id()).await.unwrap();
        assert_eq!(tracked_locks(&sync), 0);

        // Failed runs release too
        sync.execute(&UserId::new()).await.unwrap_err();
        assert_eq!(tracked_locks(&sync), 0);
    }

    #[tokio::test]
    async fn concurrent_runs_share_then_release_the_lock() {
        let repo = Arc::new(InMemoryRepository::new());
        let user = repo.seed_user("u@example.com", Some("rt"));
        let listing = vec![remote_file("a", "text/plain", Some("1"))];
        let sync = use_case(
            Arc::new(FakeDrive::with_pages(vec![
                page(listing.clone(), None),
                page(listing, None),
            ])),
            Arc::new(FakeCredentials::default()),
            repo.clone(),
        );

        let (first, second) = tokio::join!(sync.execute(user.id()), sync.execute(user.id()));

        assert!(first.is_ok());
        assert!(second.is_ok());
        assert_eq!(repo.file_count(user.id()), 1);
        assert_eq!(tracked_locks(&sync), 0);
    }

    #[tokio::test]
    async fn cancelled_run_releases_the_lock() {
        let repo = Arc::new(InMemoryRepository::new());
        let user = repo.seed_user("u@example.com", Some("rt"));
        let sync = use_case(
            Arc::new(FakeDrive::default()),
            Arc::new(FakeCredentials::default()),
            repo,
        );

        let held = sync.lease(user.id());
        let guard = held.lock.lock().await;

        let waited =
            tokio::time::timeout(Duration::from_millis(20), sync.execute(user.id())).await;
        assert!(waited.is_err());
        assert_eq!(tracked_locks(&sync), 1);

        drop(guard);
        drop(held);
        assert_eq!(tracked_locks(&sync), 0);
    }

    #[tokio::test]
    async fn synced_files_feed_statistics() {
        let repo = Arc::new(InMemoryRepository::new());
        let user = repo.seed_user("u@example.com", Some("rt"));
        let drive = Arc::new(FakeDrive::with_pages(vec![page(
            vec![
                remote_file("f1", "application/pdf", Some("1024")),
                remote_file("f2", "application/pdf", Some("2048")),
            ],
            None,
        )]));
        let sync = use_case(drive, Arc::new(FakeCredentials::default()), repo.clone());
        sync.execute(user.id()).await.unwrap();

        let stats = ComputeStatsUseCase::new(repo).execute(user.id()).await.unwrap();
        let value = serde_json::to_value(&stats).unwrap();
        assert_eq!(value["fileCount"], 2);
        assert_eq!(value["totalStorage"], "3072");
        assert_eq!(
            value["typeDistribution"],
            serde_json::json!([{"mimeType": "application/pdf", "count": 2, "percentage": 100}])
        );
    }
}
