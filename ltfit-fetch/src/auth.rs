//! Login and member lookup.

use ltfit_core::{ApiKeys, Credentials, MemberIdentity, SessionState};
use reqwest::StatusCode;
use reqwest::header::{self, HeaderMap, HeaderValue};
use serde_json::{Value, json};
use tracing::{debug, error, info, instrument, warn};

use crate::endpoints::Endpoints;
use crate::error::{ApiError, HttpError};
use crate::host::HttpClient;
use crate::keys::KeyFetcher;

/// Subscription key header sent on every API call.
pub const SUBSCRIPTION_KEY_HEADER: &str = "ocp-apim-subscription-key";

const MESSAGE_SUCCESS: &str = "Success";
const MESSAGE_PASSWORD_CHANGE: &str = "Password needs to be changed.";
const MESSAGE_INVALID: &str = "Invalid username or password";

const STATUS_INVALID: &str = "-201";
const STATUS_TOO_MANY_ATTEMPTS: &str = "-207";
const STATUS_ACTIVATION_REQUIRED: &str = "-208";
const STATUS_DUPLICATE_EMAIL: &str = "-209";

// ============================================================================
// Login Classification
// ============================================================================

/// Classifies a login response body.
///
/// A password-change response still counts as a login when it carries an
/// SSO id; the data endpoints accept it.
///
/// # Errors
///
/// Returns the [`ApiError`] variant matching the upstream status or message.
pub fn classify_login_response(body: &Value) -> Result<SessionState, ApiError> {
    let state = SessionState::from_response(body);

    match state.message() {
        Some(MESSAGE_SUCCESS) => return Ok(state),
        Some(MESSAGE_PASSWORD_CHANGE) => {
            if state.sso_id().is_some_and(|s| !s.is_empty()) {
                warn!("Login succeeded but the account password needs to be changed");
                return Ok(state);
            }
            return Err(ApiError::PasswordNeedsToBeChanged);
        }
        _ => {}
    }

    if state.status() == Some(STATUS_INVALID) || state.message() == Some(MESSAGE_INVALID) {
        return Err(ApiError::InvalidAuth);
    }

    match state.status() {
        Some(STATUS_TOO_MANY_ATTEMPTS) => Err(ApiError::TooManyAuthenticationAttempts),
        Some(STATUS_ACTIVATION_REQUIRED) => Err(ApiError::ActivationRequired),
        Some(STATUS_DUPLICATE_EMAIL) => Err(ApiError::DuplicateEmail),
        _ => {
            error!(body = %body, "Unrecognized login response");
            Err(ApiError::UnknownAuthError(
                state
                    .message()
                    .unwrap_or("unrecognized login response")
                    .to_string(),
            ))
        }
    }
}

// ============================================================================
// Auth Client
// ============================================================================

/// Result of a successful login.
#[derive(Debug, Clone)]
pub struct AuthenticatedSession {
    /// Session fields from the login response.
    pub session: SessionState,
    /// Member id from the profile endpoint.
    pub member: MemberIdentity,
}

/// Performs login and profile lookup.
#[derive(Debug, Clone)]
pub struct AuthClient {
    http: HttpClient,
    endpoints: Endpoints,
    keys: KeyFetcher,
}

impl AuthClient {
    /// Creates an auth client.
    pub fn new(http: HttpClient, endpoints: Endpoints, keys: KeyFetcher) -> Self {
        Self {
            http,
            endpoints,
            keys,
        }
    }

    /// Current API keys, scraping on a cache miss.
    ///
    /// # Errors
    ///
    /// Key fetch failures are reported as [`ApiError::CannotConnect`].
    pub async fn api_keys(&self) -> Result<ApiKeys, ApiError> {
        self.keys.fetch(false).await.map_err(|e| {
            warn!(error = %e, "Could not obtain API keys");
            ApiError::CannotConnect(e.to_string())
        })
    }

    /// Fetches the API keys directly, bypassing the cache when `force_refresh`
    /// is set.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::KeyFetch`] with the underlying failure.
    pub async fn fetch_api_keys(&self, force_refresh: bool) -> Result<ApiKeys, ApiError> {
        Ok(self.keys.fetch(force_refresh).await?)
    }

    /// Logs in and resolves the member id.
    ///
    /// # Errors
    ///
    /// Returns the login classification error, [`ApiError::InvalidAuth`] on
    /// HTTP 401, [`ApiError::ProfileError`] for an unusable profile, or
    /// [`ApiError::CannotConnect`] on transport faults.
    #[instrument(skip(self, credentials), fields(username = %credentials.username))]
    pub async fn authenticate(
        &self,
        credentials: &Credentials,
    ) -> Result<AuthenticatedSession, ApiError> {
        let keys = self.api_keys().await?;
        let session = self.login(credentials, &keys).await?;

        let token = session
            .access_token()
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ApiError::AuthRequired("login response carried no token".into()))?;

        let member = self.fetch_member_identity(token, &keys).await?;
        info!(member_id = %member.member_id, "Authenticated");

        Ok(AuthenticatedSession { session, member })
    }

    async fn login(
        &self,
        credentials: &Credentials,
        keys: &ApiKeys,
    ) -> Result<SessionState, ApiError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            SUBSCRIPTION_KEY_HEADER,
            header_value(keys.subscription_key(), SUBSCRIPTION_KEY_HEADER)?,
        );
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let body = json!({
            "username": credentials.username,
            "password": credentials.password(),
        });

        let response = self.http.post_json(&self.endpoints.login, &body, headers).await?;
        let status = response.status();
        debug!(status = %status, "Login response");

        if status == StatusCode::UNAUTHORIZED {
            return Err(ApiError::InvalidAuth);
        }

        let text = response
            .text()
            .await
            .map_err(|e| ApiError::CannotConnect(e.to_string()))?;

        match serde_json::from_str::<Value>(&text) {
            Ok(value) => classify_login_response(&value),
            Err(_) if status.is_success() => {
                error!("Login response was not JSON");
                Err(ApiError::UnknownAuthError("login response was not JSON".into()))
            }
            Err(_) => {
                error!(status = %status, "Login failed with non-JSON response");
                Err(ApiError::UnknownAuthError(format!("HTTP {}", status.as_u16())))
            }
        }
    }

    /// Looks up the member id for a bearer token.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::InvalidAuth`] on HTTP 401 and
    /// [`ApiError::ProfileError`] for any other unusable response.
    #[instrument(skip_all)]
    pub async fn fetch_member_identity(
        &self,
        token: &str,
        keys: &ApiKeys,
    ) -> Result<MemberIdentity, ApiError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            header_value(&format!("Bearer {token}"), "authorization")?,
        );
        headers.insert(
            SUBSCRIPTION_KEY_HEADER,
            header_value(keys.subscription_key(), SUBSCRIPTION_KEY_HEADER)?,
        );

        let response = self.http.get(&self.endpoints.profile, headers).await?;
        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(ApiError::InvalidAuth);
        }
        if !status.is_success() {
            return Err(ApiError::ProfileError(format!("HTTP {}", status.as_u16())));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| ApiError::ProfileError(format!("invalid JSON: {e}")))?;

        member_from_profile(&body)
    }
}

/// Reads `memberDetails.memberId` from a profile body.
fn member_from_profile(body: &Value) -> Result<MemberIdentity, ApiError> {
    let details = body
        .get("memberDetails")
        .filter(|d| d.is_object())
        .ok_or_else(|| ApiError::ProfileError("profile has no memberDetails".into()))?;

    match details.get("memberId") {
        Some(Value::String(id)) if !id.is_empty() => Ok(MemberIdentity::new(id.clone())),
        Some(Value::Number(id)) => Ok(MemberIdentity::new(id.to_string())),
        _ => Err(ApiError::ProfileError("profile has no memberId".into())),
    }
}

/// Encodes a header value.
pub(crate) fn header_value(value: &str, name: &'static str) -> Result<HeaderValue, HttpError> {
    HeaderValue::from_str(value).map_err(|_| HttpError::InvalidHeader(name))
}
