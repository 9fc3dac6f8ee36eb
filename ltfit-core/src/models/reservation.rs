//! Reservations and their calendar projection.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Summary used when a reservation has no event name.
const DEFAULT_SUMMARY: &str = "Reservation";

/// A raw reservation record from the schedules API.
///
/// The record is kept verbatim; the accessors below read the handful of
/// fields the calendar projection needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReservationRecord(pub Value);

/// An instructor attached to a reservation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instructor {
    /// Display name.
    #[serde(default)]
    pub name: Option<String>,
}

impl ReservationRecord {
    /// Wraps a raw JSON value.
    pub fn new(raw: Value) -> Self {
        Self(raw)
    }

    /// The raw JSON record.
    pub fn raw(&self) -> &Value {
        &self.0
    }

    fn str_field(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    /// Raw `start` string.
    pub fn start_raw(&self) -> Option<&str> {
        self.str_field("start")
    }

    /// Raw `end` string.
    pub fn end_raw(&self) -> Option<&str> {
        self.str_field("end")
    }

    /// Parsed start time.
    pub fn start(&self) -> Option<DateTime<FixedOffset>> {
        parse_iso(self.start_raw()?)
    }

    /// Parsed end time.
    pub fn end(&self) -> Option<DateTime<FixedOffset>> {
        parse_iso(self.end_raw()?)
    }

    /// Event name (class or appointment title).
    pub fn event_name(&self) -> Option<&str> {
        self.str_field("eventName")
    }

    /// Reservation type, e.g. "Group Fitness".
    pub fn reservation_type(&self) -> Option<&str> {
        self.str_field("reservationType")
    }

    /// Club name.
    pub fn location_name(&self) -> Option<&str> {
        self.str_field("locationName")
    }

    /// Free-form location (studio, room).
    pub fn location(&self) -> Option<&str> {
        self.str_field("location")
    }

    /// Instructors, skipping malformed entries.
    pub fn instructors(&self) -> Vec<Instructor> {
        self.0
            .get("instructors")
            .and_then(Value::as_array)
            .map(|list| {
                list.iter()
                    .filter_map(|v| serde_json::from_value(v.clone()).ok())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Opaque identifier rendered as text (numbers are stringified).
    pub fn uid(&self) -> Option<String> {
        match self.0.get("id")? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    /// Projects this reservation onto a calendar event.
    ///
    /// Returns `None` when `start` or `end` is missing or unparseable.
    pub fn to_event(&self) -> Option<CalendarEvent> {
        let start = self.start()?;
        let end = self.end()?;

        let mut description = Vec::new();
        if let Some(kind) = self.reservation_type().filter(|s| !s.is_empty()) {
            description.push(format!("Type: {kind}"));
        }
        let names: Vec<String> = self
            .instructors()
            .into_iter()
            .filter_map(|i| i.name)
            .filter(|n| !n.is_empty())
            .collect();
        if !names.is_empty() {
            description.push(format!("Instructor: {}", names.join(", ")));
        }
        if let Some(club) = self.location_name().filter(|s| !s.is_empty()) {
            description.push(format!("Club: {club}"));
        }

        Some(CalendarEvent {
            summary: self.event_name().unwrap_or(DEFAULT_SUMMARY).to_string(),
            start,
            end,
            description: (!description.is_empty()).then(|| description.join("\n")),
            location: self.location().map(str::to_string),
            uid: self.uid(),
        })
    }
}

/// ISO 8601 without seconds, e.g. `2024-01-20T09:00-06:00`.
const MINUTE_PRECISION: &str = "%Y-%m-%dT%H:%M%:z";

fn parse_iso(s: &str) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(s).ok().or_else(|| {
        let normalized = match s.strip_suffix('Z') {
            Some(rest) => format!("{rest}+00:00"),
            None => s.to_string(),
        };
        DateTime::parse_from_str(&normalized, MINUTE_PRECISION).ok()
    })
}

/// A reservation as a calendar event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarEvent {
    /// Event title.
    pub summary: String,
    /// Start time with the upstream offset.
    pub start: DateTime<FixedOffset>,
    /// End time with the upstream offset.
    pub end: DateTime<FixedOffset>,
    /// Type / instructor / club lines.
    pub description: Option<String>,
    /// Location string.
    pub location: Option<String>,
    /// Stable identifier.
    pub uid: Option<String>,
}

impl CalendarEvent {
    /// Returns true if the event overlaps `[from, to]`.
    pub fn overlaps<Tz: chrono::TimeZone>(&self, from: &DateTime<Tz>, to: &DateTime<Tz>) -> bool {
        self.end >= *from && self.start <= *to
    }
}
