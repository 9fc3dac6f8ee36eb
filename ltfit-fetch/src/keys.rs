//! API key discovery.
//!
//! Both API keys are embedded in the member portal's HTML. They are scraped
//! once and cached process-wide for a day so repeated clients do not hammer
//! the page.

use std::sync::{Arc, LazyLock, OnceLock};
use std::time::{Duration, Instant};

use ltfit_core::ApiKeys;
use regex::Regex;
use reqwest::header::{self, HeaderMap, HeaderValue};
use tokio::sync::RwLock;
use tracing::{debug, info, instrument, warn};

use crate::error::KeyFetchError;
use crate::host::HttpClient;

/// How long scraped keys stay valid.
pub const DEFAULT_KEY_TTL: Duration = Duration::from_secs(86_400);

static APIM_KEY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#""apimKey"\s*:\s*"([a-f0-9]{32})""#).expect("Invalid regex")
});

static MY_ACCOUNT_KEY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#""ltMyAccountApiKey"\s*:\s*"([A-Za-z0-9]{32})""#).expect("Invalid regex")
});

static SHARED_CACHE: OnceLock<Arc<ApiKeyCache>> = OnceLock::new();

// ============================================================================
// Key Cache
// ============================================================================

#[derive(Debug, Clone)]
struct CachedKeys {
    keys: ApiKeys,
    fetched_at: Instant,
}

/// Time-bounded cache for the scraped key pair.
///
/// Both keys are always replaced together.
#[derive(Debug)]
pub struct ApiKeyCache {
    entry: RwLock<Option<CachedKeys>>,
    ttl: Duration,
}

impl Default for ApiKeyCache {
    fn default() -> Self {
        Self::with_ttl(DEFAULT_KEY_TTL)
    }
}

impl ApiKeyCache {
    /// Creates an empty cache with the default lifetime.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty cache with a custom lifetime.
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            entry: RwLock::new(None),
            ttl,
        }
    }

    /// The process-wide cache shared by default clients.
    pub fn shared() -> Arc<Self> {
        Arc::clone(SHARED_CACHE.get_or_init(|| Arc::new(Self::new())))
    }

    /// Returns the cached keys if they are younger than the lifetime.
    pub async fn get(&self) -> Option<ApiKeys> {
        let entry = self.entry.read().await;
        entry
            .as_ref()
            .filter(|cached| cached.fetched_at.elapsed() < self.ttl)
            .map(|cached| cached.keys.clone())
    }

    /// Replaces the cached pair.
    pub async fn set(&self, keys: ApiKeys) {
        *self.entry.write().await = Some(CachedKeys {
            keys,
            fetched_at: Instant::now(),
        });
    }

    /// Drops the cached pair.
    pub async fn clear(&self) {
        *self.entry.write().await = None;
    }

    /// Age of the cached pair, expired or not.
    pub async fn age(&self) -> Option<Duration> {
        self.entry.read().await.as_ref().map(|c| c.fetched_at.elapsed())
    }
}

// ============================================================================
// Key Fetcher
// ============================================================================

/// Scrapes API keys from the config page, through a shared cache.
#[derive(Debug, Clone)]
pub struct KeyFetcher {
    http: HttpClient,
    url: String,
    cache: Arc<ApiKeyCache>,
}

impl KeyFetcher {
    /// Creates a fetcher for `url` backed by `cache`.
    pub fn new(http: HttpClient, url: impl Into<String>, cache: Arc<ApiKeyCache>) -> Self {
        Self {
            http,
            url: url.into(),
            cache,
        }
    }

    /// The cache this fetcher reads and writes.
    pub fn cache(&self) -> &Arc<ApiKeyCache> {
        &self.cache
    }

    /// Returns valid keys, scraping the page on a miss or when forced.
    ///
    /// A failed scrape leaves the cache untouched.
    ///
    /// # Errors
    ///
    /// Returns [`KeyFetchError`] if the page cannot be fetched or does not
    /// contain both keys.
    #[instrument(skip(self), fields(url = %self.url))]
    pub async fn fetch(&self, force_refresh: bool) -> Result<ApiKeys, KeyFetchError> {
        if !force_refresh {
            if let Some(keys) = self.cache.get().await {
                debug!("Using cached API keys");
                return Ok(keys);
            }
        }

        info!(force_refresh, "Fetching API keys");

        let mut headers = HeaderMap::new();
        headers.insert(
            header::ACCEPT,
            HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
            ),
        );

        let response = self.http.get(&self.url, headers).await?;
        let status = response.status();
        if !status.is_success() {
            warn!(status = %status, "Config page request failed");
            return Err(KeyFetchError::HttpStatus(status.as_u16()));
        }

        let html = response
            .text()
            .await
            .map_err(|e| KeyFetchError::Connection(e.to_string()))?;

        let keys = extract_keys(&html)?;
        debug!(
            subscription_key = %ApiKeys::masked(keys.subscription_key()),
            account_key = %ApiKeys::masked(keys.account_key()),
            "Extracted API keys"
        );

        self.cache.set(keys.clone()).await;
        Ok(keys)
    }
}

/// Pulls both keys out of the page HTML.
///
/// # Errors
///
/// Returns [`KeyFetchError::MissingKey`] naming the first key not found.
pub fn extract_keys(html: &str) -> Result<ApiKeys, KeyFetchError> {
    let subscription = APIM_KEY_RE
        .captures(html)
        .and_then(|c| c.get(1))
        .ok_or(KeyFetchError::MissingKey("apimKey"))?;
    let account = MY_ACCOUNT_KEY_RE
        .captures(html)
        .and_then(|c| c.get(1))
        .ok_or(KeyFetchError::MissingKey("ltMyAccountApiKey"))?;

    ApiKeys::new(subscription.as_str(), account.as_str())
        .map_err(|e| KeyFetchError::InvalidKey(e.to_string()))
}
