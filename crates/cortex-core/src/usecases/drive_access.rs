//! Access credentials for Drive calls made on a user's behalf
//!
//! Every failure here means the user has to sign in with Google again, so
//! all of them surface as [`CoreError::Unauthorized`] with the same message.

use tracing::warn;

use crate::domain::newtypes::UserId;
use crate::error::CoreError;
use crate::ports::{AccessToken, ICredentialProvisioner, IStateRepository};

/// Message returned whenever the user must reconnect Google Drive
pub const DRIVE_NOT_CONNECTED: &str = "Google Drive not connected. Please authenticate again.";

/// Exchanges the user's stored refresh credential for an access credential
///
/// # Errors
///
/// - [`CoreError::Unauthorized`] when the user is unknown, has no stored
///   refresh credential, or the exchange is rejected
/// - [`CoreError::Storage`] when the user cannot be read
pub(crate) async fn access_for_user(
    credentials: &(dyn ICredentialProvisioner + Send + Sync),
    state_repository: &(dyn IStateRepository + Send + Sync),
    user_id: &UserId,
) -> Result<AccessToken, CoreError> {
    let user = state_repository
        .get_user(user_id)
        .await
        .map_err(CoreError::Storage)?
        .ok_or_else(|| CoreError::unauthorized(DRIVE_NOT_CONNECTED))?;

    let refresh_token = user
        .refresh_token()
        .filter(|t| !t.is_empty())
        .ok_or_else(|| CoreError::unauthorized(DRIVE_NOT_CONNECTED))?;

    credentials.refresh(refresh_token).await.map_err(|e| {
        warn!(user_id = %user_id, error = %e, "Refresh credential rejected");
        CoreError::unauthorized(DRIVE_NOT_CONNECTED)
    })
}
