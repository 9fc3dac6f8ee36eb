//! JSON output formatting.

use anyhow::Result;
use chrono::{DateTime, FixedOffset, Utc};
use ltfit_core::{ApiKeys, CalendarEvent};
use ltfit_store::CoordinatorState;
use serde::{Serialize, Serializer};

// ============================================================================
// Output Types
// ============================================================================

/// JSON output for the visit counts.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VisitsOutput {
    pub username: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub member_id: Option<String>,
    pub available: bool,
    pub total_visits: usize,
    pub visits_this_year: usize,
    pub visits_this_month: usize,
    pub visits_this_week: usize,
    #[serde(serialize_with = "serialize_datetime_opt")]
    pub last_visit: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reservations_error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl VisitsOutput {
    /// Builds the output from a coordinator state.
    pub fn from_state(username: &str, state: &CoordinatorState) -> Self {
        let data = state.data.as_deref();
        Self {
            username: username.to_string(),
            member_id: state.member_id.clone(),
            available: state.available(),
            total_visits: data.map_or(0, |d| d.total_visits),
            visits_this_year: data.map_or(0, |d| d.visits_this_year),
            visits_this_month: data.map_or(0, |d| d.visits_this_month),
            visits_this_week: data.map_or(0, |d| d.visits_this_week),
            last_visit: data.and_then(ltfit_core::DerivedSnapshot::last_visit),
            reservations_error: state.reservations_error.as_ref().map(ToString::to_string),
            error: state.last_failure.as_ref().map(ToString::to_string),
        }
    }
}

/// JSON output for one reservation.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventOutput {
    pub summary: String,
    #[serde(serialize_with = "serialize_datetime")]
    pub start: DateTime<FixedOffset>,
    #[serde(serialize_with = "serialize_datetime")]
    pub end: DateTime<FixedOffset>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uid: Option<String>,
}

impl From<&CalendarEvent> for EventOutput {
    fn from(event: &CalendarEvent) -> Self {
        Self {
            summary: event.summary.clone(),
            start: event.start,
            end: event.end,
            location: event.location.clone(),
            description: event.description.clone(),
            uid: event.uid.clone(),
        }
    }
}

/// JSON output for the fetched API keys.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KeysOutput {
    pub subscription_key: String,
    pub account_key: String,
    pub masked: bool,
}

impl KeysOutput {
    /// Builds the output, masking keys unless `reveal` is set.
    pub fn new(keys: &ApiKeys, reveal: bool) -> Self {
        let render = |key: &str| {
            if reveal {
                key.to_string()
            } else {
                ApiKeys::masked(key)
            }
        };
        Self {
            subscription_key: render(keys.subscription_key()),
            account_key: render(keys.account_key()),
            masked: !reveal,
        }
    }
}

// ============================================================================
// Serialization helpers
// ============================================================================

fn serialize_datetime<S>(dt: &DateTime<FixedOffset>, s: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    s.serialize_str(&dt.to_rfc3339())
}

#[allow(clippy::ref_option)]
fn serialize_datetime_opt<S>(dt: &Option<DateTime<Utc>>, s: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match dt {
        Some(dt) => s.serialize_str(&dt.to_rfc3339()),
        None => s.serialize_none(),
    }
}

// ============================================================================
// JSON Formatter
// ============================================================================

/// JSON formatter.
pub struct JsonFormatter {
    pretty: bool,
}

impl JsonFormatter {
    /// Creates a new JSON formatter.
    pub fn new(pretty: bool) -> Self {
        Self { pretty }
    }

    /// Formats any serializable value.
    pub fn format<T: Serialize>(&self, data: &T) -> Result<String> {
        let json = if self.pretty {
            serde_json::to_string_pretty(data)?
        } else {
            serde_json::to_string(data)?
        };
        Ok(json)
    }

    /// Formats the visit counts.
    pub fn format_visits(&self, username: &str, state: &CoordinatorState) -> Result<String> {
        self.format(&VisitsOutput::from_state(username, state))
    }

    /// Formats a list of reservations.
    pub fn format_events(&self, events: &[CalendarEvent]) -> Result<String> {
        let outputs: Vec<EventOutput> = events.iter().map(EventOutput::from).collect();
        self.format(&outputs)
    }
}
