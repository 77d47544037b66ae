//! Shared application state
//!
//! Each use case is constructed once over the injected adapters and shared
//! by every request through `Arc`s.

use std::sync::Arc;

use cortex_core::ports::{
    IAssistant, ICredentialProvisioner, IDriveSource, IIdentityProvider, IStateRepository,
};
use cortex_core::usecases::{
    AnswerQuestionUseCase, ComputeStatsUseCase, ListFilesUseCase, LoginUseCase,
    ManageFileUseCase, SynchronizeUseCase,
};

use crate::auth::SessionKeys;

/// The adapters the use cases are built over
pub struct Adapters {
    pub drive: Arc<dyn IDriveSource + Send + Sync>,
    pub credentials: Arc<dyn ICredentialProvisioner + Send + Sync>,
    pub identity: Arc<dyn IIdentityProvider + Send + Sync>,
    pub assistant: Arc<dyn IAssistant + Send + Sync>,
    pub state_repository: Arc<dyn IStateRepository + Send + Sync>,
}

#[derive(Clone)]
pub struct AppState {
    pub synchronize: Arc<SynchronizeUseCase>,
    pub compute_stats: Arc<ComputeStatsUseCase>,
    pub list_files: Arc<ListFilesUseCase>,
    pub manage_file: Arc<ManageFileUseCase>,
    pub login: Arc<LoginUseCase>,
    pub answer_question: Arc<AnswerQuestionUseCase>,
    pub state_repository: Arc<dyn IStateRepository + Send + Sync>,
    pub sessions: Arc<SessionKeys>,
    /// Origin allowed by CORS
    pub cors_origin: String,
}

impl AppState {
    pub fn new(adapters: Adapters, sessions: SessionKeys, cors_origin: impl Into<String>) -> Self {
        let Adapters {
            drive,
            credentials,
            identity,
            assistant,
            state_repository,
        } = adapters;

        Self {
            synchronize: Arc::new(SynchronizeUseCase::new(
                drive.clone(),
                credentials.clone(),
                state_repository.clone(),
            )),
            compute_stats: Arc::new(ComputeStatsUseCase::new(state_repository.clone())),
            list_files: Arc::new(ListFilesUseCase::new(state_repository.clone())),
            manage_file: Arc::new(ManageFileUseCase::new(
                drive,
                credentials,
                state_repository.clone(),
            )),
            login: Arc::new(LoginUseCase::new(identity, state_repository.clone())),
            answer_question: Arc::new(AnswerQuestionUseCase::new(
                assistant,
                state_repository.clone(),
            )),
            state_repository,
            sessions: Arc::new(sessions),
            cors_origin: cors_origin.into(),
        }
    }
}
