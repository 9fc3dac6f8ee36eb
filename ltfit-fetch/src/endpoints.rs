//! Upstream endpoint locations.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::HttpError;

/// Page that embeds the API keys.
pub const CONFIG_PAGE_URL: &str = "https://my.lifetime.life/";
/// Login endpoint.
pub const LOGIN_URL: &str = "https://api.lifetimefitness.com/auth/v2/login";
/// Member profile endpoint.
pub const PROFILE_URL: &str = "https://api.lifetimefitness.com/user-profile/profile";
/// Collection under which each member's club visits live.
pub const MEMBERS_URL: &str = "https://api.lifetime.life/myaccount-club-visits-gateway-api/members";
/// Upcoming reservations endpoint.
pub const RESERVATIONS_URL: &str =
    "https://api.lifetimefitness.com/ux/web-schedules/v2/reservations/upcoming";

/// Set of upstream URLs. Every field can be overridden from settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Endpoints {
    /// HTML page scraped for API keys.
    pub config_page: String,
    /// Login endpoint.
    pub login: String,
    /// Profile endpoint.
    pub profile: String,
    /// Members collection; visits are at `{members}/{member_id}/club-visits`.
    pub members: String,
    /// Reservations endpoint.
    pub reservations: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            config_page: CONFIG_PAGE_URL.to_string(),
            login: LOGIN_URL.to_string(),
            profile: PROFILE_URL.to_string(),
            members: MEMBERS_URL.to_string(),
            reservations: RESERVATIONS_URL.to_string(),
        }
    }
}

impl Endpoints {
    /// All endpoints rooted at `base`, keeping the production paths.
    pub fn with_base_url(base: &str) -> Self {
        let base = base.trim_end_matches('/');
        Self {
            config_page: format!("{base}/"),
            login: format!("{base}/auth/v2/login"),
            profile: format!("{base}/user-profile/profile"),
            members: format!("{base}/myaccount-club-visits-gateway-api/members"),
            reservations: format!("{base}/ux/web-schedules/v2/reservations/upcoming"),
        }
    }

    /// Club visits URL for a member. The id is percent-encoded as one
    /// path segment.
    ///
    /// # Errors
    ///
    /// Returns [`HttpError::InvalidUrl`] if `members` is not a base URL.
    pub fn club_visits_url(&self, member_id: &str) -> Result<String, HttpError> {
        let mut url = Url::parse(&self.members).map_err(|e| HttpError::InvalidUrl(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|()| HttpError::InvalidUrl(self.members.clone()))?
            .pop_if_empty()
            .push(member_id)
            .push("club-visits");
        Ok(url.into())
    }

    /// Distinct hosts across all endpoints.
    pub fn allowed_domains(&self) -> Vec<String> {
        let mut hosts: Vec<String> = [
            &self.config_page,
            &self.login,
            &self.profile,
            &self.members,
            &self.reservations,
        ]
        .iter()
        .filter_map(|u| Url::parse(u).ok()?.host_str().map(str::to_string))
        .collect();
        hosts.sort();
        hosts.dedup();
        hosts
    }
}
