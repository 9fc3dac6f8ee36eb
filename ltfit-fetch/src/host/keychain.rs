//! Secure credential storage using the system keychain.
//!
//! - macOS: Keychain Services
//! - Linux: Secret Service (GNOME Keyring, KDE Wallet)
//!
//! [`MemoryKeychain`] stands in for the platform store in tests and on
//! headless hosts.

use std::collections::HashMap;

use async_trait::async_trait;
use keyring::Entry;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::error::KeychainError;

/// Service name prefix for ltfit credentials.
const SERVICE_PREFIX: &str = "ltfit";

// ============================================================================
// Keychain API Trait
// ============================================================================

/// API for secure credential storage.
#[async_trait]
pub trait KeychainApi: Send + Sync {
    /// Get a credential.
    ///
    /// Returns `Ok(None)` if no credential is stored.
    async fn get(&self, service: &str, account: &str) -> Result<Option<String>, KeychainError>;

    /// Store a credential, replacing any previous value.
    async fn set(&self, service: &str, account: &str, secret: &str) -> Result<(), KeychainError>;

    /// Delete a credential. Deleting a missing entry succeeds.
    async fn delete(&self, service: &str, account: &str) -> Result<(), KeychainError>;

    /// Check if a credential exists.
    async fn exists(&self, service: &str, account: &str) -> bool {
        matches!(self.get(service, account).await, Ok(Some(_)))
    }
}

// ============================================================================
// System Keychain Implementation
// ============================================================================

/// Implementation backed by the `keyring` crate.
#[derive(Debug, Clone, Default)]
pub struct SystemKeychain;

impl SystemKeychain {
    /// Creates a new system keychain instance.
    pub fn new() -> Self {
        Self
    }

    /// Builds the full service name with prefix.
    fn full_service(service: &str) -> String {
        format!("{SERVICE_PREFIX}:{service}")
    }

    fn entry(service: &str, account: &str) -> Result<Entry, KeychainError> {
        let full_service = Self::full_service(service);
        Entry::new(&full_service, account).map_err(|e| KeychainError::Platform(e.to_string()))
    }
}

#[async_trait]
impl KeychainApi for SystemKeychain {
    async fn get(&self, service: &str, account: &str) -> Result<Option<String>, KeychainError> {
        debug!(service = %service, account = %account, "Getting credential from keychain");

        let entry = Self::entry(service, account)?;

        match entry.get_password() {
            Ok(secret) if !secret.is_empty() => Ok(Some(secret)),
            Ok(_) | Err(keyring::Error::NoEntry) => {
                debug!(service = %service, account = %account, "Credential not found");
                Ok(None)
            }
            Err(e) => {
                warn!(service = %service, account = %account, error = %e, "Failed to get credential");
                Err(e.into())
            }
        }
    }

    async fn set(&self, service: &str, account: &str, secret: &str) -> Result<(), KeychainError> {
        debug!(service = %service, account = %account, "Setting credential in keychain");

        let entry = Self::entry(service, account)?;
        entry.set_password(secret).map_err(|e| {
            warn!(service = %service, account = %account, error = %e, "Failed to set credential");
            KeychainError::from(e)
        })
    }

    async fn delete(&self, service: &str, account: &str) -> Result<(), KeychainError> {
        debug!(service = %service, account = %account, "Deleting credential from keychain");

        let entry = Self::entry(service, account)?;
        match entry.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => {
                warn!(service = %service, account = %account, error = %e, "Failed to delete credential");
                Err(e.into())
            }
        }
    }
}

// ============================================================================
// In-Memory Implementation
// ============================================================================

/// Process-local keychain.
#[derive(Debug, Default)]
pub struct MemoryKeychain {
    entries: Mutex<HashMap<(String, String), String>>,
}

impl MemoryKeychain {
    /// Creates an empty keychain.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeychainApi for MemoryKeychain {
    async fn get(&self, service: &str, account: &str) -> Result<Option<String>, KeychainError> {
        let entries = self.entries.lock().await;
        Ok(entries
            .get(&(service.to_string(), account.to_string()))
            .cloned())
    }

    async fn set(&self, service: &str, account: &str, secret: &str) -> Result<(), KeychainError> {
        self.entries
            .lock()
            .await
            .insert((service.to_string(), account.to_string()), secret.to_string());
        Ok(())
    }

    async fn delete(&self, service: &str, account: &str) -> Result<(), KeychainError> {
        self.entries
            .lock()
            .await
            .remove(&(service.to_string(), account.to_string()));
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
