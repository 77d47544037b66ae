//! Integration tests for cortex-drive
//!
//! Uses wiremock to simulate the Google Drive and OAuth2 endpoints and
//! verifies end-to-end behavior of the listing, mutations and sign-in flow.

mod common;

mod test_auth;
mod test_listing;
mod test_mutations;
