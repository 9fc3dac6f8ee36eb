//! Authenticated data client for club visits and reservations.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{Datelike, Days, Local, NaiveDate, NaiveTime};
use ltfit_core::{ApiKeys, Credentials, MemberIdentity, SessionState};
use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::{Response, StatusCode};
use serde_json::Value;
use tracing::{debug, error, info, instrument, warn};

use crate::auth::{AuthClient, SUBSCRIPTION_KEY_HEADER, header_value};
use crate::endpoints::Endpoints;
use crate::error::ApiError;
use crate::host::HttpClient;
use crate::keys::{ApiKeyCache, KeyFetcher};
use crate::retry::{Reauthenticate, retry_once_on_expiry};

/// SSO session header.
pub const SSO_ID_HEADER: &str = "x-ltf-ssoid";
/// Account key header on the visits endpoint.
pub const ACCOUNT_KEY_HEADER: &str = "apikey";

/// Days ahead covered by the reservations window.
pub const RESERVATION_WINDOW_DAYS: u64 = 30;

const VISITS_DATE_FORMAT: &str = "%Y-%m-%d";
const RESERVATIONS_DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

const VISITS_ENDPOINT: &str = "club-visits";
const RESERVATIONS_ENDPOINT: &str = "reservations";

// ============================================================================
// Update Report
// ============================================================================

/// Outcome of [`ApiClient::update`] beyond plain success.
#[derive(Debug, Clone, Default)]
pub struct UpdateReport {
    /// Set when reservations failed; the previous batch was kept.
    pub reservations_error: Option<ApiError>,
}

impl UpdateReport {
    /// Returns true if both halves succeeded.
    pub fn is_complete(&self) -> bool {
        self.reservations_error.is_none()
    }
}

// ============================================================================
// Builder
// ============================================================================

/// Builder for [`ApiClient`].
#[derive(Debug)]
pub struct ApiClientBuilder {
    credentials: Credentials,
    endpoints: Endpoints,
    cache: Option<Arc<ApiKeyCache>>,
    timeout: Option<Duration>,
    restrict_domains: bool,
}

impl ApiClientBuilder {
    /// Overrides the endpoint set.
    #[must_use]
    pub fn endpoints(mut self, endpoints: Endpoints) -> Self {
        self.endpoints = endpoints;
        self
    }

    /// Uses a dedicated key cache instead of the process-wide one.
    #[must_use]
    pub fn key_cache(mut self, cache: Arc<ApiKeyCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Sets the per-request timeout.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Allows requests to any host instead of only the endpoint hosts.
    #[must_use]
    pub fn unrestricted(mut self) -> Self {
        self.restrict_domains = false;
        self
    }

    /// Builds the client.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::CannotConnect`] if the HTTP client cannot be built.
    pub fn build(self) -> Result<ApiClient, ApiError> {
        let mut http = match self.timeout {
            Some(timeout) => HttpClient::with_timeout(timeout)?,
            None => HttpClient::new()?,
        };
        if self.restrict_domains {
            http = http.with_allowed_domains(self.endpoints.allowed_domains());
        }

        let cache = self.cache.unwrap_or_else(ApiKeyCache::shared);
        let keys = KeyFetcher::new(http.clone(), self.endpoints.config_page.clone(), cache);
        let auth = AuthClient::new(http.clone(), self.endpoints.clone(), keys);

        Ok(ApiClient {
            http,
            endpoints: self.endpoints,
            auth,
            credentials: self.credentials,
            session: None,
            member: None,
            update_successful: false,
            visits_json: None,
            reservations_json: None,
        })
    }
}

// ============================================================================
// API Client
// ============================================================================

/// Client for the member data endpoints.
///
/// Owns the credentials, the session learned at login and the most recent
/// raw payloads.
#[derive(Debug)]
pub struct ApiClient {
    http: HttpClient,
    endpoints: Endpoints,
    auth: AuthClient,
    credentials: Credentials,
    session: Option<SessionState>,
    member: Option<MemberIdentity>,
    update_successful: bool,
    visits_json: Option<Value>,
    reservations_json: Option<Value>,
}

impl ApiClient {
    /// Starts building a client for `credentials`.
    pub fn builder(credentials: Credentials) -> ApiClientBuilder {
        ApiClientBuilder {
            credentials,
            endpoints: Endpoints::default(),
            cache: None,
            timeout: None,
            restrict_domains: true,
        }
    }

    /// Creates a client with default endpoints and the shared key cache.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::CannotConnect`] if the HTTP client cannot be built.
    pub fn new(credentials: Credentials) -> Result<Self, ApiError> {
        Self::builder(credentials).build()
    }

    /// Account username.
    pub fn username(&self) -> &str {
        &self.credentials.username
    }

    /// Member id, once authenticated.
    pub fn member_id(&self) -> Option<&str> {
        self.member.as_ref().map(|m| m.member_id.as_str())
    }

    /// Session state, once authenticated.
    pub fn session(&self) -> Option<&SessionState> {
        self.session.as_ref()
    }

    /// Returns true if the session holds an SSO id.
    pub fn is_authenticated(&self) -> bool {
        self.sso_id().is_ok() && self.member.is_some()
    }

    /// Whether the last visits update succeeded.
    pub fn update_successful(&self) -> bool {
        self.update_successful
    }

    /// Last visits payload.
    pub fn visits_json(&self) -> Option<&Value> {
        self.visits_json.as_ref()
    }

    /// Last reservations payload.
    pub fn reservations_json(&self) -> Option<&Value> {
        self.reservations_json.as_ref()
    }

    /// The key fetcher's view of the API keys.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::CannotConnect`] if the keys cannot be obtained.
    pub async fn api_keys(&self) -> Result<ApiKeys, ApiError> {
        self.auth.api_keys().await
    }

    /// Logs in and stores the session and member id.
    ///
    /// Each login replaces the previous session entirely; nothing from an
    /// earlier auth cycle carries over.
    ///
    /// # Errors
    ///
    /// Returns the [`AuthClient::authenticate`] error; the previous session
    /// is left in place.
    pub async fn authenticate(&mut self) -> Result<(), ApiError> {
        let authenticated = self.auth.authenticate(&self.credentials).await?;

        self.session = Some(authenticated.session);
        self.member = Some(authenticated.member);
        Ok(())
    }

    fn sso_id(&self) -> Result<&str, ApiError> {
        self.session
            .as_ref()
            .and_then(SessionState::sso_id)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| ApiError::AuthRequired("not authenticated".into()))
    }

    fn member(&self) -> Result<&MemberIdentity, ApiError> {
        self.member
            .as_ref()
            .ok_or_else(|| ApiError::AuthRequired("member id unknown".into()))
    }

    /// Fetches raw club visits for `[start, end]`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::AuthRequired`] before login,
    /// [`ApiError::AuthExpired`] on HTTP 401, and transport or status errors
    /// otherwise.
    #[instrument(skip(self))]
    pub async fn fetch_visits(&self, start: NaiveDate, end: NaiveDate) -> Result<Value, ApiError> {
        let sso_id = self.sso_id()?;
        let member = self.member()?;
        let keys = self.api_keys().await?;

        let mut headers = HeaderMap::new();
        headers.insert(header::ACCEPT, HeaderValue::from_static("*/*"));
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(SSO_ID_HEADER, header_value(sso_id, SSO_ID_HEADER)?);
        headers.insert(
            SUBSCRIPTION_KEY_HEADER,
            header_value(keys.subscription_key(), SUBSCRIPTION_KEY_HEADER)?,
        );
        headers.insert(
            ACCOUNT_KEY_HEADER,
            header_value(keys.account_key(), ACCOUNT_KEY_HEADER)?,
        );

        let url = self.endpoints.club_visits_url(&member.member_id)?;
        let query = [
            ("endDate", end.format(VISITS_DATE_FORMAT).to_string()),
            ("startDate", start.format(VISITS_DATE_FORMAT).to_string()),
        ];

        let response = self.http.get_with_query(&url, &query, headers).await?;
        read_json(response, VISITS_ENDPOINT).await
    }

    /// Fetches raw reservations for `[start, end]`.
    ///
    /// # Errors
    ///
    /// Same as [`ApiClient::fetch_visits`].
    #[instrument(skip(self))]
    pub async fn fetch_reservations(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Value, ApiError> {
        let sso_id = self.sso_id()?;
        let member = self.member()?;
        let keys = self.api_keys().await?;

        let mut headers = HeaderMap::new();
        headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(SSO_ID_HEADER, header_value(sso_id, SSO_ID_HEADER)?);
        headers.insert(
            SUBSCRIPTION_KEY_HEADER,
            header_value(keys.subscription_key(), SUBSCRIPTION_KEY_HEADER)?,
        );

        let query = [
            ("memberIds", member.member_id.clone()),
            ("start", reservation_bound(start)),
            ("end", reservation_bound(end)),
            ("groupCamps", "true".to_string()),
            ("pageSize", "0".to_string()),
        ];

        let response = self
            .http
            .get_with_query(&self.endpoints.reservations, &query, headers)
            .await?;
        read_json(response, RESERVATIONS_ENDPOINT).await
    }

    /// Refreshes visits for this calendar year.
    ///
    /// # Errors
    ///
    /// Returns the fetch error after at most one re-login.
    pub async fn update_visits(&mut self) -> Result<(), ApiError> {
        self.update_visits_for(Local::now().date_naive()).await
    }

    /// Refreshes visits for `[Jan 1, today]` of `today`'s year.
    ///
    /// # Errors
    ///
    /// Returns the fetch error after at most one re-login.
    pub async fn update_visits_for(&mut self, today: NaiveDate) -> Result<(), ApiError> {
        let start = NaiveDate::from_ymd_opt(today.year(), 1, 1).unwrap_or(today);

        let result =
            retry_once_on_expiry(self, |client| Box::pin(client.fetch_visits(start, today))).await;

        match result {
            Ok(json) => {
                self.visits_json = Some(json);
                self.update_successful = true;
                debug!("Visits updated");
                Ok(())
            }
            Err(e) => {
                self.update_successful = false;
                error!(error = %e, "Failed to update visits");
                Err(e)
            }
        }
    }

    /// Refreshes reservations for the next thirty days.
    ///
    /// # Errors
    ///
    /// Returns the fetch error after at most one re-login.
    pub async fn update_reservations(&mut self) -> Result<(), ApiError> {
        self.update_reservations_for(Local::now().date_naive()).await
    }

    /// Refreshes reservations for `[today, today + 30 days]`.
    ///
    /// # Errors
    ///
    /// Returns the fetch error after at most one re-login. The previous
    /// payload is kept on failure.
    pub async fn update_reservations_for(&mut self, today: NaiveDate) -> Result<(), ApiError> {
        let end = today
            .checked_add_days(Days::new(RESERVATION_WINDOW_DAYS))
            .unwrap_or(NaiveDate::MAX);

        let json =
            retry_once_on_expiry(self, |client| Box::pin(client.fetch_reservations(today, end)))
                .await?;
        self.reservations_json = Some(json);
        debug!("Reservations updated");
        Ok(())
    }

    /// Refreshes visits, then reservations, logging in first if needed.
    ///
    /// # Errors
    ///
    /// Returns the login or visits error. Reservation failures are reported
    /// in the [`UpdateReport`] instead.
    pub async fn update(&mut self) -> Result<UpdateReport, ApiError> {
        self.update_for(Local::now().date_naive()).await
    }

    /// [`ApiClient::update`] with an explicit date.
    ///
    /// # Errors
    ///
    /// Same as [`ApiClient::update`].
    pub async fn update_for(&mut self, today: NaiveDate) -> Result<UpdateReport, ApiError> {
        if !self.is_authenticated() {
            if let Err(e) = self.authenticate().await {
                self.update_successful = false;
                return Err(e);
            }
        }

        self.update_visits_for(today).await?;

        let reservations_error = match self.update_reservations_for(today).await {
            Ok(()) => None,
            Err(e) => {
                warn!(error = %e, "Failed to update reservations, keeping previous batch");
                Some(e)
            }
        };

        info!(
            reservations_ok = reservations_error.is_none(),
            "Update complete"
        );
        Ok(UpdateReport { reservations_error })
    }
}

#[async_trait]
impl Reauthenticate for ApiClient {
    async fn reauthenticate(&mut self) -> Result<(), ApiError> {
        self.authenticate().await
    }
}

fn reservation_bound(date: NaiveDate) -> String {
    date.and_time(NaiveTime::MIN)
        .format(RESERVATIONS_DATE_FORMAT)
        .to_string()
}

async fn read_json(response: Response, endpoint: &'static str) -> Result<Value, ApiError> {
    let status = response.status();
    if status == StatusCode::UNAUTHORIZED {
        debug!(endpoint, "Session rejected");
        return Err(ApiError::AuthExpired);
    }
    if !status.is_success() {
        return Err(ApiError::UnexpectedStatus {
            endpoint,
            status: status.as_u16(),
        });
    }

    response
        .json()
        .await
        .map_err(|e| ApiError::InvalidResponse(format!("{endpoint}: {e}")))
}
