//! User preferences store.
//!
//! Manages user settings with persistence and change notification.

use ltfit_core::StartOfWeek;
use ltfit_fetch::Endpoints;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{RwLock, watch};
use tracing::{debug, info, warn};

use crate::error::StoreError;
use crate::persistence::{default_settings_path, load_json, save_json};

/// Default refresh interval in seconds.
pub const DEFAULT_REFRESH_INTERVAL_SECS: u64 = 300;

// ============================================================================
// Settings Types
// ============================================================================

/// User preferences.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Account email or username.
    pub username: Option<String>,

    /// First day of the "this week" bucket.
    pub start_of_week_day: StartOfWeek,

    /// Seconds between scheduled refreshes.
    pub refresh_interval_secs: u64,

    /// Log level.
    pub log_level: LogLevel,

    /// Endpoint overrides.
    pub endpoints: Option<Endpoints>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            username: None,
            start_of_week_day: StartOfWeek::default(),
            refresh_interval_secs: DEFAULT_REFRESH_INTERVAL_SECS,
            log_level: LogLevel::default(),
            endpoints: None,
        }
    }
}

impl Settings {
    /// Refresh interval; zero falls back to the default.
    pub fn refresh_interval(&self) -> Duration {
        match self.refresh_interval_secs {
            0 => Duration::from_secs(DEFAULT_REFRESH_INTERVAL_SECS),
            secs => Duration::from_secs(secs),
        }
    }

    /// Configured endpoints, or the production defaults.
    pub fn endpoints(&self) -> Endpoints {
        self.endpoints.clone().unwrap_or_default()
    }
}

/// Log level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LogLevel {
    /// Error level logging.
    Error,
    /// Warning level logging.
    #[default]
    Warn,
    /// Info level logging.
    Info,
    /// Debug level logging.
    Debug,
    /// Trace level logging.
    Trace,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogLevel::Error => write!(f, "error"),
            LogLevel::Warn => write!(f, "warn"),
            LogLevel::Info => write!(f, "info"),
            LogLevel::Debug => write!(f, "debug"),
            LogLevel::Trace => write!(f, "trace"),
        }
    }
}

// ============================================================================
// Settings Store
// ============================================================================

/// Persistent settings store with change notifications.
pub struct SettingsStore {
    settings: Arc<RwLock<Settings>>,
    path: PathBuf,
    notify: watch::Sender<u64>,
    version: Arc<RwLock<u64>>,
}

impl SettingsStore {
    /// Creates a store with default settings at `path`.
    pub fn new(path: PathBuf) -> Self {
        Self::with_settings(path, Settings::default())
    }

    fn with_settings(path: PathBuf, settings: Settings) -> Self {
        let (notify, _) = watch::channel(0);
        Self {
            settings: Arc::new(RwLock::new(settings)),
            path,
            notify,
            version: Arc::new(RwLock::new(0)),
        }
    }

    /// Loads settings from the default path.
    pub async fn load_default() -> Self {
        Self::load(default_settings_path()).await
    }

    /// Loads settings from a path, falling back to defaults if the file is
    /// missing or unreadable.
    pub async fn load(path: PathBuf) -> Self {
        let settings = if path.exists() {
            info!(path = %path.display(), "Loading settings");
            load_json(&path).await.unwrap_or_else(|e| {
                warn!(error = %e, "Failed to load settings, using defaults");
                Settings::default()
            })
        } else {
            debug!(path = %path.display(), "Settings file not found, using defaults");
            Settings::default()
        };

        Self::with_settings(path, settings)
    }

    /// Settings file location.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Gets a copy of the current settings.
    pub async fn get(&self) -> Settings {
        self.settings.read().await.clone()
    }

    /// Updates settings and notifies subscribers.
    pub async fn update<F>(&self, f: F)
    where
        F: FnOnce(&mut Settings),
    {
        {
            let mut settings = self.settings.write().await;
            f(&mut settings);
        }
        self.notify_change().await;
    }

    /// Saves settings to disk.
    ///
    /// # Errors
    ///
    /// Returns error if settings cannot be written to disk.
    pub async fn save(&self) -> Result<(), StoreError> {
        let settings = self.settings.read().await;
        save_json(&self.path, &*settings).await?;
        info!(path = %self.path.display(), "Settings saved");
        Ok(())
    }

    /// Subscribes to settings changes.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.notify.subscribe()
    }

    async fn notify_change(&self) {
        let mut version = self.version.write().await;
        *version += 1;
        let _ = self.notify.send(*version);
    }

    // ========================================================================
    // Convenience Methods
    // ========================================================================

    /// Configured username.
    pub async fn username(&self) -> Option<String> {
        self.settings.read().await.username.clone()
    }

    /// Sets the username.
    pub async fn set_username(&self, username: impl Into<String>) {
        let username = username.into();
        self.update(|s| s.username = Some(username)).await;
    }

    /// First day of the week.
    pub async fn start_of_week_day(&self) -> StartOfWeek {
        self.settings.read().await.start_of_week_day
    }

    /// Sets the first day of the week.
    pub async fn set_start_of_week_day(&self, day: StartOfWeek) {
        self.update(|s| s.start_of_week_day = day).await;
    }

    /// Refresh interval.
    pub async fn refresh_interval(&self) -> Duration {
        self.settings.read().await.refresh_interval()
    }

    /// Sets the refresh interval.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Config`] for a zero interval.
    pub async fn set_refresh_interval_secs(&self, secs: u64) -> Result<(), StoreError> {
        if secs == 0 {
            return Err(StoreError::Config(
                "refresh interval must be at least one second".into(),
            ));
        }
        self.update(|s| s.refresh_interval_secs = secs).await;
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
