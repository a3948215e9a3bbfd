//! Account deletion

use crate::client::{ApiClient, ClientError, ClientResult};

/// Text the user must type, exactly, to delete their account
pub const DELETE_CONFIRMATION: &str = "DELETE";

/// Whether `typed` unlocks account deletion. Case and whitespace matter.
pub fn is_confirmed(typed: &str) -> bool {
    typed == DELETE_CONFIRMATION
}

/// Permanently delete the account, then forget the session.
///
/// Nothing is sent unless `typed` is exactly [`DELETE_CONFIRMATION`].
pub async fn delete(client: &ApiClient, typed: &str) -> ClientResult<()> {
    if !is_confirmed(typed) {
        return Err(ClientError::validation(format!(
            "Type {} to confirm account deletion",
            DELETE_CONFIRMATION
        )));
    }

    client.delete("/auth/delete-account").await?;
    client.credentials().clear()?;

    tracing::info!("Account deleted");
    Ok(())
}
