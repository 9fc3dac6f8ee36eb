//! Club visit records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// JSON key holding the visit time in epoch milliseconds.
pub const VISIT_TIMESTAMP_KEY: &str = "usageDateTime";

/// Why a visit record's timestamp could not be used.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum VisitTimestampError {
    /// The record has no timestamp (or it is null).
    #[error("visit record has no usageDateTime")]
    Missing,

    /// The timestamp is not a JSON number.
    #[error("visit timestamp is not numeric: {0}")]
    NotNumeric(Value),

    /// The timestamp cannot be represented as a date.
    #[error("visit timestamp out of range: {0}")]
    OutOfRange(f64),
}

/// A raw club visit record.
///
/// Only the [`VISIT_TIMESTAMP_KEY`] field is interpreted; everything else is
/// opaque and passed through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VisitRecord(pub Value);

impl VisitRecord {
    /// Wraps a raw JSON value.
    pub fn new(raw: Value) -> Self {
        Self(raw)
    }

    /// The raw JSON record.
    pub fn raw(&self) -> &Value {
        &self.0
    }

    /// Visit time in epoch milliseconds.
    ///
    /// # Errors
    ///
    /// Returns [`VisitTimestampError`] when the field is absent, null or not
    /// a number.
    pub fn timestamp_millis(&self) -> Result<f64, VisitTimestampError> {
        match self.0.get(VISIT_TIMESTAMP_KEY) {
            None | Some(Value::Null) => Err(VisitTimestampError::Missing),
            Some(Value::Number(n)) => n
                .as_f64()
                .ok_or_else(|| VisitTimestampError::NotNumeric(Value::Number(n.clone()))),
            Some(other) => Err(VisitTimestampError::NotNumeric(other.clone())),
        }
    }

    /// Visit time as fractional epoch seconds.
    ///
    /// # Errors
    ///
    /// See [`VisitRecord::timestamp_millis`].
    pub fn timestamp_secs(&self) -> Result<f64, VisitTimestampError> {
        self.timestamp_millis().map(|ms| ms / 1000.0)
    }

    /// Visit time as a UTC instant.
    ///
    /// # Errors
    ///
    /// Returns [`VisitTimestampError::OutOfRange`] when the millisecond value
    /// does not fit a calendar date, or any error from
    /// [`VisitRecord::timestamp_millis`].
    #[allow(clippy::cast_possible_truncation)]
    pub fn visited_at(&self) -> Result<DateTime<Utc>, VisitTimestampError> {
        let ms = self.timestamp_millis()?;
        if !ms.is_finite() {
            return Err(VisitTimestampError::OutOfRange(ms));
        }
        DateTime::<Utc>::from_timestamp_millis(ms.trunc() as i64)
            .ok_or(VisitTimestampError::OutOfRange(ms))
    }
}
