//! Cortex Core - Domain logic and business rules
//!
//! This crate contains the hexagonal architecture core with:
//! - **Domain entities** - `User`, `FileRecord`, `StatsSnapshot`, `FileQuery`
//! - **Use cases** - `SynchronizeUseCase`, `ComputeStatsUseCase`, `ListFilesUseCase`,
//!   `ManageFileUseCase`, `LoginUseCase`, `AnswerQuestionUseCase`
//! - **Port definitions** - Traits for adapters: `IDriveSource`, `ICredentialProvisioner`,
//!   `IIdentityProvider`, `IStateRepository`, `IAssistant`
//!
//! # Architecture
//!
//! This crate follows the hexagonal (ports & adapters) architecture pattern.
//! The domain module contains pure business logic with no I/O.
//! Ports define trait interfaces that adapter crates implement.
//! Use cases orchestrate domain entities through port interfaces.

pub mod config;
pub mod domain;
pub mod error;
pub mod ports;
pub mod usecases;

pub use error::CoreError;
