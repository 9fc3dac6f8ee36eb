//! Domain models for `ltfit`.
//!
//! ## Submodules
//!
//! - [`keys`] - Scraped API keys
//! - [`session`] - Credentials, login session state and member identity
//! - [`visit`] - Club visit records
//! - [`reservation`] - Reservations and their calendar projection
//! - [`snapshot`] - Derived statistics and the start-of-week setting

mod keys;
mod reservation;
mod session;
mod snapshot;
mod visit;

pub use keys::ApiKeys;
pub use reservation::{CalendarEvent, Instructor, ReservationRecord};
pub use session::{Credentials, MemberIdentity, SessionState};
pub use snapshot::{DerivedSnapshot, StartOfWeek};
pub use visit::{VisitRecord, VisitTimestampError, VISIT_TIMESTAMP_KEY};

#[cfg(test)]
mod serde_tests;
