//! Port definitions (hexagonal architecture interfaces)
//!
//! This module defines the port traits that form the boundaries of the
//! hexagonal architecture. Ports are interfaces that the domain core
//! depends on, but whose implementations live in adapter crates.
//!
//! ## Ports Overview
//!
//! - [`IDriveSource`] - Remote Drive listing and mutations
//! - [`ICredentialProvisioner`] - Refresh credential to access credential exchange
//! - [`IIdentityProvider`] - Sign-in flow (consent URL, code exchange, profile)
//! - [`IStateRepository`] - Persistent storage for users and file records
//! - [`IAssistant`] - Language model for question answering

pub mod assistant;
pub mod credentials;
pub mod drive_source;
pub mod state_repository;

pub use assistant::{AssistantError, AssistantRequest, IAssistant};
pub use credentials::{
    AccessToken, ICredentialProvisioner, IIdentityProvider, IdentityProfile, IssuedTokens,
};
pub use drive_source::{IDriveSource, RemoteFilePage, RemoteFileRecord, RemoteOwner};
pub use state_repository::IStateRepository;
