//! CLI command implementations.

pub mod config;
pub mod keys;
pub mod reservations;
pub mod visits;
pub mod watch;

use anyhow::{Context, Result};
use ltfit_core::Credentials;
use ltfit_fetch::credentials::{PASSWORD_ENV, USERNAME_ENV, username_from_env};
use ltfit_fetch::{ApiClient, CredentialStore, SystemKeychain};
use ltfit_store::{Coordinator, RefreshFailure, Settings, SettingsStore};
use std::time::Duration;
use tracing::debug;

use crate::ExitCode;

/// Username from the environment, then the settings file.
pub(crate) fn resolve_username(settings: &Settings) -> Result<String> {
    username_from_env()
        .or_else(|| settings.username.clone())
        .with_context(|| {
            format!("No username configured. Set {USERNAME_ENV} or run `ltfit config set-username`")
        })
}

/// Username and password for the configured account.
pub(crate) async fn resolve_credentials(settings: &Settings) -> Result<Credentials> {
    let username = resolve_username(settings)?;
    let keychain = SystemKeychain::new();
    let password = CredentialStore::new(&keychain)
        .password(&username)
        .await
        .with_context(|| {
            format!("No password for {username}. Set {PASSWORD_ENV} or run `ltfit config set-password`")
        })?;

    Ok(Credentials::new(username, password))
}

/// Builds a coordinator over an [`ApiClient`] from the saved settings.
///
/// `interval` overrides the configured refresh interval.
pub(crate) async fn build_coordinator(
    store: &SettingsStore,
    interval: Option<Duration>,
) -> Result<Coordinator<ApiClient>> {
    let settings = store.get().await;
    let credentials = resolve_credentials(&settings).await?;
    debug!(username = %credentials.username, "Building API client");

    let client = ApiClient::builder(credentials)
        .endpoints(settings.endpoints())
        .build()?;

    Ok(Coordinator::new(
        client,
        settings.start_of_week_day,
        interval.unwrap_or_else(|| settings.refresh_interval()),
    ))
}

/// Exit code for a failed refresh.
pub(crate) fn exit_code_for(failure: &RefreshFailure) -> ExitCode {
    if failure.is_auth() {
        ExitCode::AuthFailed
    } else {
        ExitCode::Unavailable
    }
}
