//! File management use case
//!
//! Delete and rename are remote-first: the Drive is changed before the local
//! record. If the remote call fails the local record is left untouched. If
//! the remote call succeeds but the local write fails, the next
//! reconciliation repairs renames; deletions stay visible locally until the
//! record is removed by hand, since reconciliation never deletes.

use std::sync::Arc;

use tracing::{info, warn};

use crate::domain::{
    newtypes::{RemoteFileId, UserId},
    FileRecord,
};
use crate::error::CoreError;
use crate::ports::{AccessToken, ICredentialProvisioner, IDriveSource, IStateRepository};
use crate::usecases::drive_access::access_for_user;

const FILE_NOT_FOUND: &str = "File not found";
const NAME_REQUIRED: &str = "Name is required";

/// Use case for remote-first delete and rename of a single file
pub struct ManageFileUseCase {
    drive: Arc<dyn IDriveSource + Send + Sync>,
    credentials: Arc<dyn ICredentialProvisioner + Send + Sync>,
    state_repository: Arc<dyn IStateRepository + Send + Sync>,
}

impl ManageFileUseCase {
    /// Creates a new ManageFileUseCase with the required dependencies
    ///
    /// # Arguments
    ///
    /// * `drive` - Remote Drive mutations
    /// * `credentials` - Refresh credential exchange
    /// * `state_repository` - Persistent storage for file records
    pub fn new(
        drive: Arc<dyn IDriveSource + Send + Sync>,
        credentials: Arc<dyn ICredentialProvisioner + Send + Sync>,
        state_repository: Arc<dyn IStateRepository + Send + Sync>,
    ) -> Self {
        Self {
            drive,
            credentials,
            state_repository,
        }
    }

    /// Deletes a file from the Drive, then from the local store
    ///
    /// # Errors
    ///
    /// - [`CoreError::NotFound`] when no record `(file_id, user_id)` exists
    /// - [`CoreError::Unauthorized`] when no access credential can be obtained
    /// - [`CoreError::RemoteMutation`] when the Drive rejects the delete
    pub async fn delete(&self, user_id: &UserId, file_id: &str) -> Result<(), CoreError> {
        let record = self.lookup(user_id, file_id).await?;
        let access = self.access_for(user_id).await?;

        self.drive
            .delete_file(&access, &record.id)
            .await
            .map_err(|source| {
                warn!(user_id = %user_id, file_id = %record.id, error = %source, "Remote delete failed");
                CoreError::RemoteMutation {
                    operation: "delete",
                    source,
                }
            })?;

        self.state_repository
            .delete_file(user_id, &record.id)
            .await
            .map_err(CoreError::Storage)?;

        info!(user_id = %user_id, file_id = %record.id, "File deleted");
        Ok(())
    }

    /// Renames a file in the Drive, then in the local store
    ///
    /// The name is trimmed; a missing or blank name is rejected before any
    /// remote or store call.
    ///
    /// # Returns
    ///
    /// The updated record
    ///
    /// # Errors
    ///
    /// - [`CoreError::Validation`] when the name is missing or blank
    /// - [`CoreError::NotFound`] when no record `(file_id, user_id)` exists
    /// - [`CoreError::Unauthorized`] when no access credential can be obtained
    /// - [`CoreError::RemoteMutation`] when the Drive rejects the rename
    pub async fn rename(
        &self,
        user_id: &UserId,
        file_id: &str,
        new_name: Option<&str>,
    ) -> Result<FileRecord, CoreError> {
        let new_name = new_name
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .ok_or_else(|| CoreError::validation(NAME_REQUIRED))?;

        let record = self.lookup(user_id, file_id).await?;
        let access = self.access_for(user_id).await?;

        self.drive
            .rename_file(&access, &record.id, new_name)
            .await
            .map_err(|source| {
                warn!(user_id = %user_id, file_id = %record.id, error = %source, "Remote rename failed");
                CoreError::RemoteMutation {
                    operation: "rename",
                    source,
                }
            })?;

        let updated = self
            .state_repository
            .rename_file(user_id, &record.id, new_name)
            .await
            .map_err(CoreError::Storage)?
            .ok_or_else(|| CoreError::not_found(FILE_NOT_FOUND))?;

        info!(user_id = %user_id, file_id = %record.id, "File renamed");
        Ok(updated)
    }

    async fn lookup(&self, user_id: &UserId, file_id: &str) -> Result<FileRecord, CoreError> {
        // An ID that could never have been stored cannot match a record
        let id = RemoteFileId::new(file_id.to_string())
            .map_err(|_| CoreError::not_found(FILE_NOT_FOUND))?;

        self.state_repository
            .get_file(user_id, &id)
            .await
            .map_err(CoreError::Storage)?
            .ok_or_else(|| CoreError::not_found(FILE_NOT_FOUND))
    }

    async fn access_for(&self, user_id: &UserId) -> Result<AccessToken, CoreError> {
        access_for_user(&*self.credentials, &*self.state_repository, user_id).await
    }
}
