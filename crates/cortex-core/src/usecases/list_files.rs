//! File listing use case

use std::sync::Arc;

use tracing::trace;

use crate::domain::{newtypes::UserId, FilePage, FileQuery, ListFilesParams};
use crate::error::CoreError;
use crate::ports::IStateRepository;

/// Use case answering paginated listing queries over a user's records
pub struct ListFilesUseCase {
    state_repository: Arc<dyn IStateRepository + Send + Sync>,
}

impl ListFilesUseCase {
    pub fn new(state_repository: Arc<dyn IStateRepository + Send + Sync>) -> Self {
        Self { state_repository }
    }

    /// Normalises the raw parameters and runs the query
    ///
    /// Never fails on bad parameters: they are clamped or defaulted (see
    /// [`FileQuery::from_params`]). The returned `limit` is the effective one.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Storage`] when the store cannot be read.
    pub async fn execute(
        &self,
        user_id: &UserId,
        params: &ListFilesParams,
    ) -> Result<FilePage, CoreError> {
        let query = FileQuery::from_params(params);
        trace!(user_id = %user_id, ?query, "Listing files");

        let (files, total) = self
            .state_repository
            .query_files(user_id, &query)
            .await
            .map_err(CoreError::Storage)?;

        Ok(FilePage {
            files,
            total,
            page: query.page(),
            total_pages: query.total_pages(total),
            limit: query.limit(),
        })
    }
}
