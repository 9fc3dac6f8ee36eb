//! Config command - manage configuration.

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use ltfit_core::StartOfWeek;
use ltfit_fetch::credentials::KEYCHAIN_SERVICE;
use ltfit_fetch::{CredentialStore, KeychainApi, SystemKeychain};
use ltfit_store::{SettingsStore, default_config_dir, default_settings_path};
use std::io::BufRead;
use tracing::info;

use super::resolve_username;
use crate::output::JsonFormatter;
use crate::{Cli, OutputFormat};

/// Arguments for the config command.
#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

/// Config subcommands.
#[derive(Subcommand)]
pub enum ConfigAction {
    /// Show current configuration.
    Show,

    /// Show configuration paths.
    Path,

    /// Set the account username.
    SetUsername {
        /// Account email or username.
        username: String,
    },

    /// Set the first day of the week.
    SetStartOfWeek {
        /// Day name or 0-6 (Monday = 0).
        day: String,
    },

    /// Set the refresh interval.
    SetInterval {
        /// Seconds between refreshes.
        seconds: u64,
    },

    /// Store the account password in the system keychain (read from stdin).
    SetPassword,

    /// Remove the stored password.
    DeletePassword,

    /// Reset to defaults.
    Reset,
}

/// Runs the config command.
pub async fn run(args: &ConfigArgs, cli: &Cli) -> Result<()> {
    match &args.action {
        ConfigAction::Show => show_config(cli).await,
        ConfigAction::Path => show_paths(cli),
        ConfigAction::SetUsername { username } => set_username(username).await,
        ConfigAction::SetStartOfWeek { day } => set_start_of_week(day).await,
        ConfigAction::SetInterval { seconds } => set_interval(*seconds).await,
        ConfigAction::SetPassword => set_password(cli).await,
        ConfigAction::DeletePassword => delete_password().await,
        ConfigAction::Reset => reset_config().await,
    }
}

async fn show_config(cli: &Cli) -> Result<()> {
    let store = SettingsStore::load_default().await;
    let settings = store.get().await;

    let password_stored = match &settings.username {
        Some(username) => SystemKeychain::new().exists(KEYCHAIN_SERVICE, username).await,
        None => false,
    };

    match cli.format {
        OutputFormat::Text => {
            println!("ltfit Configuration");
            println!("{}", "─".repeat(40));
            println!();
            println!(
                "Username:         {}",
                settings.username.as_deref().unwrap_or("(not set)")
            );
            println!("Password stored:  {password_stored}");
            println!("Start of week:    {}", settings.start_of_week_day);
            println!("Refresh interval: {}s", settings.refresh_interval().as_secs());
            println!("Log level:        {}", settings.log_level);
            if settings.endpoints.is_some() {
                println!("Endpoints:        custom");
            }
        }
        OutputFormat::Json => {
            let output = serde_json::json!({
                "settings": settings,
                "password_stored": password_stored,
            });
            let formatter = JsonFormatter::new(cli.pretty);
            println!("{}", formatter.format(&output)?);
        }
    }

    Ok(())
}

fn show_paths(cli: &Cli) -> Result<()> {
    let config_dir = default_config_dir();
    let settings_path = default_settings_path();

    match cli.format {
        OutputFormat::Text => {
            println!("Configuration Paths");
            println!("{}", "─".repeat(40));
            println!();
            println!("Config dir:    {}", config_dir.display());
            println!("Settings file: {}", settings_path.display());
        }
        OutputFormat::Json => {
            let paths = serde_json::json!({
                "config_dir": config_dir.display().to_string(),
                "settings_file": settings_path.display().to_string(),
            });
            let formatter = JsonFormatter::new(cli.pretty);
            println!("{}", formatter.format(&paths)?);
        }
    }

    Ok(())
}

async fn set_username(username: &str) -> Result<()> {
    let username = username.trim();
    if username.is_empty() {
        anyhow::bail!("Username cannot be empty");
    }

    let store = SettingsStore::load_default().await;
    store.set_username(username).await;
    store.save().await?;

    info!("Username updated");
    println!("Username set to: {username}");

    Ok(())
}

async fn set_start_of_week(day: &str) -> Result<()> {
    let day = StartOfWeek::parse(day)?;

    let store = SettingsStore::load_default().await;
    store.set_start_of_week_day(day).await;
    store.save().await?;

    info!(day = %day, "Start of week updated");
    println!("Start of week set to: {day}");

    Ok(())
}

async fn set_interval(seconds: u64) -> Result<()> {
    let store = SettingsStore::load_default().await;
    store.set_refresh_interval_secs(seconds).await?;
    store.save().await?;

    info!(seconds, "Refresh interval updated");
    println!("Refresh interval set to: {seconds}s");

    Ok(())
}

async fn set_password(cli: &Cli) -> Result<()> {
    let store = SettingsStore::load_default().await;
    let username = resolve_username(&store.get().await)?;

    if !cli.quiet {
        eprintln!("Password for {username}:");
    }
    let mut password = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut password)
        .context("Failed to read password from stdin")?;
    let password = password.trim_end_matches(['\r', '\n']);
    if password.is_empty() {
        anyhow::bail!("Password cannot be empty");
    }

    let keychain = SystemKeychain::new();
    CredentialStore::new(&keychain)
        .save_password(&username, password)
        .await?;

    info!("Password stored in keychain");
    println!("Password stored for: {username}");

    Ok(())
}

async fn delete_password() -> Result<()> {
    let store = SettingsStore::load_default().await;
    let username = resolve_username(&store.get().await)?;

    let keychain = SystemKeychain::new();
    CredentialStore::new(&keychain)
        .delete_password(&username)
        .await?;

    info!("Password removed from keychain");
    println!("Password removed for: {username}");

    Ok(())
}

async fn reset_config() -> Result<()> {
    let path = default_settings_path();

    if path.exists() {
        tokio::fs::remove_file(&path).await?;
        info!(path = %path.display(), "Settings reset");
        println!("Configuration reset to defaults");
    } else {
        println!("No configuration file to reset");
    }

    Ok(())
}
