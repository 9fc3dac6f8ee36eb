//! Re-authenticate-and-retry for expired sessions.

use async_trait::async_trait;
use futures::future::BoxFuture;
use tracing::info;

use crate::error::ApiError;

/// A client that can renew its own session.
#[async_trait]
pub trait Reauthenticate: Send + Sync {
    /// Logs in again and replaces the session.
    async fn reauthenticate(&mut self) -> Result<(), ApiError>;
}

/// Runs `op`; on [`ApiError::AuthExpired`] re-authenticates once and runs it
/// again.
///
/// The second attempt's result is returned as-is, so a session that expires
/// twice in a row surfaces `AuthExpired` to the caller.
///
/// # Errors
///
/// Returns the operation's error, or the re-authentication error if the
/// renewal itself fails.
pub async fn retry_once_on_expiry<C, T, F>(client: &mut C, op: F) -> Result<T, ApiError>
where
    C: Reauthenticate,
    F: for<'a> Fn(&'a C) -> BoxFuture<'a, Result<T, ApiError>>,
{
    let first = op(client).await;
    match first {
        Err(ApiError::AuthExpired) => {
            info!("Session expired, re-authenticating");
            client.reauthenticate().await?;
            op(client).await
        }
        other => other,
    }
}
