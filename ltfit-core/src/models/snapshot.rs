//! Derived visit statistics.

use chrono::{DateTime, Utc, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::reservation::ReservationRecord;
use super::visit::VisitRecord;
use crate::error::CoreError;

// ============================================================================
// Start of Week
// ============================================================================

/// First day of the week used for the "this week" bucket.
///
/// Indexed 0 = Monday .. 6 = Sunday. Defaults to Monday.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct StartOfWeek(u8);

impl StartOfWeek {
    /// Monday.
    pub const MONDAY: Self = Self(0);
    /// Sunday.
    pub const SUNDAY: Self = Self(6);

    /// All seven values in order.
    pub fn all() -> impl Iterator<Item = Self> {
        (0..7).map(Self)
    }

    /// Creates from a 0..=6 index.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidStartOfWeek`] for indexes above 6.
    pub fn from_index(index: u8) -> Result<Self, CoreError> {
        if index <= 6 {
            Ok(Self(index))
        } else {
            Err(CoreError::InvalidStartOfWeek(index))
        }
    }

    /// The 0..=6 index.
    pub fn index(self) -> u8 {
        self.0
    }

    /// As a chrono weekday.
    pub fn weekday(self) -> Weekday {
        match self.0 {
            0 => Weekday::Mon,
            1 => Weekday::Tue,
            2 => Weekday::Wed,
            3 => Weekday::Thu,
            4 => Weekday::Fri,
            5 => Weekday::Sat,
            _ => Weekday::Sun,
        }
    }

    /// English day name.
    pub fn name(self) -> &'static str {
        match self.weekday() {
            Weekday::Mon => "Monday",
            Weekday::Tue => "Tuesday",
            Weekday::Wed => "Wednesday",
            Weekday::Thu => "Thursday",
            Weekday::Fri => "Friday",
            Weekday::Sat => "Saturday",
            Weekday::Sun => "Sunday",
        }
    }

    /// Parses an index ("0".."6") or a day name ("monday", "Sun").
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidData`] for unrecognized input.
    pub fn parse(s: &str) -> Result<Self, CoreError> {
        let s = s.trim();
        if let Ok(index) = s.parse::<u8>() {
            return Self::from_index(index);
        }
        s.parse::<Weekday>()
            .map(Self::from)
            .map_err(|_| CoreError::InvalidData(format!("unknown day of week: {s}")))
    }
}

impl From<Weekday> for StartOfWeek {
    fn from(day: Weekday) -> Self {
        // num_days_from_monday is always 0..=6
        #[allow(clippy::cast_possible_truncation)]
        Self(day.num_days_from_monday() as u8)
    }
}

impl TryFrom<u8> for StartOfWeek {
    type Error = CoreError;

    fn try_from(index: u8) -> Result<Self, Self::Error> {
        Self::from_index(index)
    }
}

impl From<StartOfWeek> for u8 {
    fn from(day: StartOfWeek) -> Self {
        day.0
    }
}

impl fmt::Display for StartOfWeek {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ============================================================================
// Derived Snapshot
// ============================================================================

/// Visit statistics and reservations computed from one refresh cycle.
///
/// Always rebuilt from scratch; nothing carries over between cycles.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DerivedSnapshot {
    /// Number of visit records returned upstream, parseable or not.
    pub total_visits: usize,
    /// Visits in the current calendar year.
    pub visits_this_year: usize,
    /// Visits in the current calendar month.
    pub visits_this_month: usize,
    /// Visits since the configured start of the week.
    pub visits_this_week: usize,
    /// Most recent visit as fractional epoch seconds.
    pub last_visit_timestamp: Option<f64>,
    /// The visit batch the counts were computed from.
    pub raw_visits: Vec<VisitRecord>,
    /// Upcoming reservations, unfiltered.
    pub reservations: Vec<ReservationRecord>,
}

impl DerivedSnapshot {
    /// Creates an empty snapshot carrying only reservations.
    pub fn empty(reservations: Vec<ReservationRecord>) -> Self {
        Self {
            reservations,
            ..Self::default()
        }
    }

    /// Most recent visit as a UTC instant.
    #[allow(clippy::cast_possible_truncation)]
    pub fn last_visit(&self) -> Option<DateTime<Utc>> {
        let secs = self.last_visit_timestamp?;
        DateTime::<Utc>::from_timestamp_millis((secs * 1000.0).trunc() as i64)
    }

    /// Returns true if any visit was recorded.
    pub fn has_visits(&self) -> bool {
        self.total_visits > 0
    }
}
