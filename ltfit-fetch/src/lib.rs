// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # ltfit Fetch
//!
//! HTTP layer for the Life Time Fitness member API.
//!
//! ## Clients
//!
//! - [`keys::KeyFetcher`] - Scrapes the two API keys from the member portal
//! - [`auth::AuthClient`] - Login and member id lookup
//! - [`api::ApiClient`] - Club visits and reservations, with one re-login
//!   on an expired session
//!
//! ## Host APIs
//!
//! - [`host::http`] - HTTP client with tracing and domain allowlist
//! - [`host::keychain`] - Secure credential storage (system keychain)
//!
//! ## Example
//!
//! ```ignore
//! use ltfit_core::Credentials;
//! use ltfit_fetch::ApiClient;
//!
//! let mut client = ApiClient::new(Credentials::new("me@example.com", "pw"))?;
//! client.authenticate().await?;
//! let report = client.update().await?;
//! ```

pub mod api;
pub mod auth;
pub mod credentials;
pub mod endpoints;
pub mod error;
pub mod host;
pub mod keys;
pub mod retry;

pub use api::{ApiClient, ApiClientBuilder, UpdateReport};
pub use auth::{AuthClient, AuthenticatedSession, classify_login_response};
pub use credentials::CredentialStore;
pub use endpoints::Endpoints;
pub use error::{ApiError, HttpError, KeyFetchError, KeychainError};
pub use host::{HttpClient, KeychainApi, MemoryKeychain, SystemKeychain};
pub use keys::{ApiKeyCache, KeyFetcher, extract_keys};
pub use retry::{Reauthenticate, retry_once_on_expiry};
