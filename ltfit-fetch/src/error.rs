//! Fetch error types.

use thiserror::Error;

// ============================================================================
// API Error
// ============================================================================

/// Error type for authentication and data requests.
///
/// Variants fall into two groups the refresh coordinator cares about:
/// auth failures that need new credentials (see [`ApiError::is_auth_failure`])
/// and transient faults that the next scheduled refresh may clear.
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    /// Network or transport fault.
    #[error("Cannot connect: {0}")]
    CannotConnect(String),

    /// The credentials were rejected.
    #[error("Invalid username or password")]
    InvalidAuth,

    /// The current session token went stale.
    #[error("Session expired")]
    AuthExpired,

    /// A data call was made before authenticating.
    #[error("Authentication required: {0}")]
    AuthRequired(String),

    /// The account password must be changed on the website.
    #[error("Password needs to be changed")]
    PasswordNeedsToBeChanged,

    /// The account is locked out after repeated failures.
    #[error("Too many authentication attempts")]
    TooManyAuthenticationAttempts,

    /// The account has not been activated.
    #[error("Account activation required")]
    ActivationRequired,

    /// More than one account uses this email.
    #[error("Multiple accounts are associated with this email")]
    DuplicateEmail,

    /// The login response could not be classified.
    #[error("Unknown authentication error: {0}")]
    UnknownAuthError(String),

    /// The profile response was malformed or incomplete.
    #[error("Profile error: {0}")]
    ProfileError(String),

    /// API keys could not be obtained.
    #[error("API key fetch failed: {0}")]
    KeyFetch(#[from] KeyFetchError),

    /// A data endpoint answered with an unexpected status.
    #[error("Unexpected HTTP {status} from {endpoint}")]
    UnexpectedStatus {
        /// Which endpoint answered.
        endpoint: &'static str,
        /// HTTP status code.
        status: u16,
    },

    /// A data endpoint answered with an undecodable body.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl ApiError {
    /// Returns true if the user must re-enter credentials.
    pub fn is_auth_failure(&self) -> bool {
        matches!(
            self,
            Self::InvalidAuth
                | Self::AuthExpired
                | Self::AuthRequired(_)
                | Self::PasswordNeedsToBeChanged
                | Self::TooManyAuthenticationAttempts
                | Self::ActivationRequired
                | Self::DuplicateEmail
                | Self::UnknownAuthError(_)
        )
    }

    /// Returns true if a later retry may succeed.
    pub fn is_transient(&self) -> bool {
        !self.is_auth_failure()
    }
}

impl From<HttpError> for ApiError {
    fn from(err: HttpError) -> Self {
        ApiError::CannotConnect(err.to_string())
    }
}

// ============================================================================
// Key Fetch Error
// ============================================================================

/// Error type for scraping API keys.
#[derive(Debug, Clone, Error)]
pub enum KeyFetchError {
    /// The config page could not be reached.
    #[error("Connection error fetching API keys: {0}")]
    Connection(String),

    /// The config page answered with a non-success status.
    #[error("Failed to fetch config page: HTTP {0}")]
    HttpStatus(u16),

    /// A key pattern was not found in the page.
    #[error("Could not find {0} in page content")]
    MissingKey(&'static str),

    /// A matched key failed validation.
    #[error("Invalid key in page content: {0}")]
    InvalidKey(String),
}

impl From<HttpError> for KeyFetchError {
    fn from(err: HttpError) -> Self {
        KeyFetchError::Connection(err.to_string())
    }
}

// ============================================================================
// HTTP Error
// ============================================================================

/// HTTP-specific error type.
#[derive(Debug, Error)]
pub enum HttpError {
    /// Request error.
    #[error("Request error: {0}")]
    Request(#[from] reqwest::Error),

    /// Header value could not be encoded.
    #[error("Invalid header value for {0}")]
    InvalidHeader(&'static str),

    /// Invalid URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Domain not in allowlist.
    #[error("Domain not allowed: {0}")]
    DomainNotAllowed(String),
}

// ============================================================================
// Keychain Error
// ============================================================================

/// Error type for keychain operations.
#[derive(Debug, Error)]
pub enum KeychainError {
    /// Access denied.
    #[error("Access denied to keychain")]
    AccessDenied,

    /// Platform error.
    #[error("Platform error: {0}")]
    Platform(String),

    /// Generic error.
    #[error("Keychain error: {0}")]
    Other(String),
}

impl From<keyring::Error> for KeychainError {
    fn from(err: keyring::Error) -> Self {
        match err {
            keyring::Error::PlatformFailure(e) => KeychainError::Platform(e.to_string()),
            keyring::Error::NoStorageAccess(_) => KeychainError::AccessDenied,
            _ => KeychainError::Other(err.to_string()),
        }
    }
}
