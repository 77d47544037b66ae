//! Statistics use case

use std::sync::Arc;

use crate::domain::{newtypes::UserId, StatsSnapshot};
use crate::error::CoreError;
use crate::ports::IStateRepository;

/// Use case computing a user's storage statistics on demand
pub struct ComputeStatsUseCase {
    state_repository: Arc<dyn IStateRepository + Send + Sync>,
}

impl ComputeStatsUseCase {
    pub fn new(state_repository: Arc<dyn IStateRepository + Send + Sync>) -> Self {
        Self { state_repository }
    }

    /// Reads the aggregates in one pass and buckets the type distribution
    ///
    /// A user with no records gets zero totals and an empty distribution.
    pub async fn execute(&self, user_id: &UserId) -> Result<StatsSnapshot, CoreError> {
        let aggregates = self
            .state_repository
            .file_aggregates(user_id)
            .await
            .map_err(CoreError::Storage)?;

        Ok(StatsSnapshot::from_aggregates(aggregates))
    }
}
