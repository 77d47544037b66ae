//! Use cases (interactors) for Cortex
//!
//! This module contains the application use cases that orchestrate
//! domain entities and port interfaces. Use cases are thin coordinators
//! that delegate business rules to domain methods and I/O to ports.
//!
//! ## Use Cases
//!
//! - [`SynchronizeUseCase`] - Full reconciliation of a user's remote Drive
//! - [`ComputeStatsUseCase`] - Storage totals and MIME type distribution
//! - [`ListFilesUseCase`] - Paginated, searchable, sortable listing
//! - [`ManageFileUseCase`] - Remote-first delete and rename
//! - [`LoginUseCase`] - Google sign-in and user upsert
//! - [`AnswerQuestionUseCase`] - Assistant questions over the user's files

pub mod answer_question;
pub mod compute_stats;
pub mod drive_access;
pub mod list_files;
pub mod login;
pub mod manage_file;
pub mod synchronize;

#[cfg(test)]
mod test_support;

pub use answer_question::AnswerQuestionUseCase;
pub use compute_stats::ComputeStatsUseCase;
pub use drive_access::DRIVE_NOT_CONNECTED;
pub use list_files::ListFilesUseCase;
pub use login::LoginUseCase;
pub use manage_file::ManageFileUseCase;
pub use synchronize::SynchronizeUseCase;
