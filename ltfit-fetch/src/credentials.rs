//! Password lookup for the configured account.

use tracing::{debug, warn};

use crate::error::KeychainError;
use crate::host::KeychainApi;

/// Environment variable that overrides the stored password.
pub const PASSWORD_ENV: &str = "LTFIT_PASSWORD";
/// Environment variable that overrides the configured username.
pub const USERNAME_ENV: &str = "LTFIT_USERNAME";
/// Keychain service holding account passwords, keyed by username.
pub const KEYCHAIN_SERVICE: &str = "account";

/// Resolves and stores account passwords.
pub struct CredentialStore<'a, K: KeychainApi + ?Sized> {
    keychain: &'a K,
}

impl<'a, K: KeychainApi + ?Sized> CredentialStore<'a, K> {
    /// Wraps a keychain.
    pub fn new(keychain: &'a K) -> Self {
        Self { keychain }
    }

    /// Password for `username`: [`PASSWORD_ENV`] first, then the keychain.
    ///
    /// Keychain errors are logged and treated as "not found".
    pub async fn password(&self, username: &str) -> Option<String> {
        if let Some(password) = password_from_env() {
            debug!("Using password from environment");
            return Some(password);
        }

        match self.keychain.get(KEYCHAIN_SERVICE, username).await {
            Ok(found) => found,
            Err(e) => {
                warn!(error = %e, "Keychain lookup failed");
                None
            }
        }
    }

    /// Stores the password for `username`.
    ///
    /// # Errors
    ///
    /// Returns the keychain error.
    pub async fn save_password(&self, username: &str, password: &str) -> Result<(), KeychainError> {
        self.keychain.set(KEYCHAIN_SERVICE, username, password).await
    }

    /// Removes the stored password for `username`.
    ///
    /// # Errors
    ///
    /// Returns the keychain error.
    pub async fn delete_password(&self, username: &str) -> Result<(), KeychainError> {
        self.keychain.delete(KEYCHAIN_SERVICE, username).await
    }
}

fn password_from_env() -> Option<String> {
    std::env::var(PASSWORD_ENV).ok().filter(|p| !p.is_empty())
}

/// Username from [`USERNAME_ENV`], if set.
pub fn username_from_env() -> Option<String> {
    std::env::var(USERNAME_ENV).ok().filter(|u| !u.is_empty())
}
