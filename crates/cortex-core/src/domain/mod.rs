//! Domain entities and business logic
//!
//! This module contains the core domain types for Cortex:
//! - Newtypes for type-safe identifiers and byte quantities
//! - The user and file record entities
//! - Listing query normalisation
//! - Statistics bucketing
//! - Domain-specific error types

pub mod errors;
pub mod file_record;
pub mod newtypes;
pub mod query;
pub mod stats;
pub mod user;

// Re-export commonly used types
pub use errors::DomainError;
pub use file_record::FileRecord;
pub use newtypes::*;
pub use query::{FilePage, FileQuery, ListFilesParams, SortField, SortOrder};
pub use stats::{FileAggregates, StatsSnapshot, TypeShare};
pub use user::User;
