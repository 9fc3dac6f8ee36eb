//! Login credentials, session state and member identity.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;

// ============================================================================
// Credentials
// ============================================================================

/// Username/password pair used for the login handshake.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Account username (usually an email address).
    pub username: String,
    password: String,
}

impl Credentials {
    /// Creates a credential pair.
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// The account password.
    pub fn password(&self) -> &str {
        &self.password
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

// ============================================================================
// Session State
// ============================================================================

/// Authentication fields learned from the login endpoint.
///
/// The login API answers with `token`, `ssoId`, `partyId`, `message` and
/// `status`. Responses are folded in with [`SessionState::merge`]: the first
/// merge takes every field as-is, later merges only overwrite a field when the
/// incoming value is present and non-empty, so a partial response cannot
/// erase identity data learned earlier.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
    /// Bearer token for the profile endpoint.
    #[serde(rename = "token", default, deserialize_with = "lenient_string")]
    pub access_token: Option<String>,
    /// SSO session identifier for data endpoints.
    #[serde(default, deserialize_with = "lenient_string")]
    pub sso_id: Option<String>,
    /// Upstream party identifier.
    #[serde(default, deserialize_with = "lenient_string")]
    pub party_id: Option<String>,
    /// Human-readable result message.
    #[serde(default, deserialize_with = "lenient_string")]
    pub message: Option<String>,
    /// Numeric-ish status code, kept as text.
    #[serde(default, deserialize_with = "lenient_string")]
    pub status: Option<String>,
    #[serde(skip)]
    merged: bool,
}

impl SessionState {
    /// Creates an empty session state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a session state from a login response body.
    ///
    /// Unknown fields are ignored; non-object bodies yield an empty state.
    pub fn from_response(body: &Value) -> Self {
        let update: SessionState = serde_json::from_value(body.clone()).unwrap_or_default();
        let mut state = Self::new();
        state.merge(update);
        state
    }

    /// Folds `update` into this state.
    pub fn merge(&mut self, update: SessionState) {
        if !self.merged {
            *self = SessionState {
                merged: true,
                ..update
            };
            return;
        }

        overwrite_non_empty(&mut self.access_token, update.access_token);
        overwrite_non_empty(&mut self.sso_id, update.sso_id);
        overwrite_non_empty(&mut self.party_id, update.party_id);
        overwrite_non_empty(&mut self.message, update.message);
        overwrite_non_empty(&mut self.status, update.status);
    }

    /// Returns true once at least one update has been merged.
    pub fn has_merged(&self) -> bool {
        self.merged
    }

    /// The bearer token, if any.
    pub fn access_token(&self) -> Option<&str> {
        self.access_token.as_deref()
    }

    /// The SSO identifier, if any.
    pub fn sso_id(&self) -> Option<&str> {
        self.sso_id.as_deref()
    }

    /// The party identifier, if any.
    pub fn party_id(&self) -> Option<&str> {
        self.party_id.as_deref()
    }

    /// The response message, if any.
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// The response status, if any.
    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }
}

fn overwrite_non_empty(slot: &mut Option<String>, incoming: Option<String>) {
    if let Some(value) = incoming.filter(|v| !v.is_empty()) {
        *slot = Some(value);
    }
}

impl fmt::Debug for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionState")
            .field("access_token", &self.access_token.as_ref().map(|_| "<redacted>"))
            .field("sso_id", &self.sso_id.as_ref().map(|_| "<redacted>"))
            .field("party_id", &self.party_id)
            .field("message", &self.message)
            .field("status", &self.status)
            .finish()
    }
}

/// Accepts strings and numbers; anything else becomes `None`.
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

// ============================================================================
// Member Identity
// ============================================================================

/// Member identifier scoping visit and reservation queries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberIdentity {
    /// Upstream member id.
    pub member_id: String,
}

impl MemberIdentity {
    /// Creates a member identity.
    pub fn new(member_id: impl Into<String>) -> Self {
        Self {
            member_id: member_id.into(),
        }
    }
}
