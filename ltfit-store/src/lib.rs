// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # ltfit Store
//!
//! Refresh coordination and derived state for ltfit.
//!
//! This crate provides:
//!
//! - **Coordinator**: Periodic refresh of visits and reservations with
//!   watch-channel publishing
//! - **Derivation**: Year / month / week visit counts
//! - **Calendar**: Reservations as calendar events
//! - **SettingsStore**: User preferences with persistence
//!
//! ## Usage
//!
//! ```ignore
//! use std::sync::Arc;
//! use ltfit_store::{Coordinator, SettingsStore};
//!
//! let settings = SettingsStore::load_default().await.get().await;
//! let coordinator = Arc::new(Coordinator::new(
//!     client,
//!     settings.start_of_week_day,
//!     settings.refresh_interval(),
//! ));
//! let mut rx = coordinator.subscribe();
//! Arc::clone(&coordinator).spawn();
//! while rx.changed().await.is_ok() {
//!     println!("{:?}", rx.borrow().data);
//! }
//! ```

pub mod calendar;
pub mod coordinator;
pub mod derive;
pub mod error;
pub mod persistence;
pub mod settings;

pub use calendar::{events, events_between, next_event};
pub use coordinator::{
    ClubDataSource, Coordinator, CoordinatorState, DEFAULT_UPDATE_INTERVAL, RefreshFailure,
    RefreshPhase,
};
pub use derive::{derive_snapshot, reservations_from_payload, visits_from_payload, week_start};
pub use error::StoreError;
pub use persistence::{
    default_config_dir, default_settings_path, load_json, load_json_or_default, save_json,
};
pub use settings::{DEFAULT_REFRESH_INTERVAL_SECS, LogLevel, Settings, SettingsStore};
