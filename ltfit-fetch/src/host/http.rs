//! HTTP client with tracing and a domain allowlist.
//!
//! Wraps `reqwest` so every request is logged and checked against the
//! hosts the configured endpoints point at.

use reqwest::{Client, Response, header::HeaderMap};
use std::time::Duration;
use tracing::{debug, instrument};
use url::Url;

use crate::error::HttpError;

/// Default request timeout.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Browser-like user agent. The config page serves a stripped-down shell
/// to unknown agents.
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

// ============================================================================
// HTTP Client
// ============================================================================

/// HTTP client wrapper with tracing and domain allowlist.
#[derive(Debug, Clone)]
pub struct HttpClient {
    inner: Client,
    allowed_domains: Option<Vec<String>>,
}

impl HttpClient {
    /// Creates a new HTTP client with default settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the TLS backend cannot be initialized.
    pub fn new() -> Result<Self, HttpError> {
        Self::with_timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    /// Creates a new HTTP client with a custom timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the TLS backend cannot be initialized.
    pub fn with_timeout(timeout: Duration) -> Result<Self, HttpError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(BROWSER_USER_AGENT)
            .build()?;

        Ok(Self {
            inner: client,
            allowed_domains: None,
        })
    }

    /// Restricts requests to the given domains and their subdomains.
    #[must_use]
    pub fn with_allowed_domains(mut self, domains: Vec<String>) -> Self {
        self.allowed_domains = Some(domains);
        self
    }

    /// Checks if a URL's domain is allowed.
    fn is_domain_allowed(&self, url: &str) -> Result<(), HttpError> {
        let Some(ref allowed) = self.allowed_domains else {
            return Ok(());
        };

        let parsed = Url::parse(url).map_err(|e| HttpError::InvalidUrl(e.to_string()))?;

        let host = parsed
            .host_str()
            .ok_or_else(|| HttpError::InvalidUrl("No host in URL".to_string()))?;

        let allowed = allowed
            .iter()
            .any(|domain| host == domain || host.ends_with(&format!(".{domain}")));

        if allowed {
            Ok(())
        } else {
            Err(HttpError::DomainNotAllowed(host.to_string()))
        }
    }

    /// Performs a GET request with custom headers.
    #[instrument(skip(self, headers), fields(url = %url))]
    pub async fn get(&self, url: &str, headers: HeaderMap) -> Result<Response, HttpError> {
        self.is_domain_allowed(url)?;
        debug!("GET request");

        let response = self.inner.get(url).headers(headers).send().await?;
        debug!(status = %response.status(), "Response received");
        Ok(response)
    }

    /// Performs a GET request with query parameters and custom headers.
    #[instrument(skip(self, query, headers), fields(url = %url))]
    pub async fn get_with_query<Q: serde::Serialize + ?Sized>(
        &self,
        url: &str,
        query: &Q,
        headers: HeaderMap,
    ) -> Result<Response, HttpError> {
        self.is_domain_allowed(url)?;
        debug!("GET request with query");

        let response = self
            .inner
            .get(url)
            .query(query)
            .headers(headers)
            .send()
            .await?;
        debug!(status = %response.status(), "Response received");
        Ok(response)
    }

    /// Performs a POST request with JSON body and custom headers.
    #[instrument(skip(self, body, headers), fields(url = %url))]
    pub async fn post_json<T: serde::Serialize + ?Sized>(
        &self,
        url: &str,
        body: &T,
        headers: HeaderMap,
    ) -> Result<Response, HttpError> {
        self.is_domain_allowed(url)?;
        debug!("POST request with JSON");

        let response = self
            .inner
            .post(url)
            .json(body)
            .headers(headers)
            .send()
            .await?;
        debug!(status = %response.status(), "Response received");
        Ok(response)
    }
}

// ============================================================================
// Tests
// ============================================================================
