//! API keys embedded in the public Life Time web page.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::CoreError;

/// Length shared by both keys.
const KEY_LEN: usize = 32;

/// The pair of static API keys required by the restricted endpoints.
///
/// - `subscription_key` is the API-management key (32 lowercase hex chars),
///   sent as `ocp-apim-subscription-key` on every call.
/// - `account_key` is the "my account" key (32 alphanumeric chars), sent as
///   `ApiKey` on the club visits endpoint.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiKeys {
    subscription_key: String,
    account_key: String,
}

impl ApiKeys {
    /// Creates a validated key pair.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidApiKey`] if either key does not match its
    /// upstream format.
    pub fn new(
        subscription_key: impl Into<String>,
        account_key: impl Into<String>,
    ) -> Result<Self, CoreError> {
        let subscription_key = subscription_key.into();
        let account_key = account_key.into();

        validate(&subscription_key, "subscription_key", |c| {
            c.is_ascii_digit() || ('a'..='f').contains(&c)
        })?;
        validate(&account_key, "account_key", |c| c.is_ascii_alphanumeric())?;

        Ok(Self {
            subscription_key,
            account_key,
        })
    }

    /// The API-management subscription key.
    pub fn subscription_key(&self) -> &str {
        &self.subscription_key
    }

    /// The "my account" API key.
    pub fn account_key(&self) -> &str {
        &self.account_key
    }

    /// Short, log-safe rendering of a key (first four chars).
    pub fn masked(key: &str) -> String {
        let prefix: String = key.chars().take(4).collect();
        format!("{prefix}…")
    }
}

fn validate(key: &str, name: &'static str, allowed: impl Fn(char) -> bool) -> Result<(), CoreError> {
    if key.len() != KEY_LEN {
        return Err(CoreError::InvalidApiKey {
            name,
            reason: format!("expected {KEY_LEN} characters, got {}", key.len()),
        });
    }
    if let Some(bad) = key.chars().find(|c| !allowed(*c)) {
        return Err(CoreError::InvalidApiKey {
            name,
            reason: format!("unexpected character {bad:?}"),
        });
    }
    Ok(())
}

impl fmt::Debug for ApiKeys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiKeys")
            .field("subscription_key", &Self::masked(&self.subscription_key))
            .field("account_key", &Self::masked(&self.account_key))
            .finish()
    }
}
