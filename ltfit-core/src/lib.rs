// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # `ltfit` Core
//!
//! Core types and models for the `ltfit` workspace.
//!
//! This crate provides the domain types shared by the fetch layer, the
//! refresh coordinator and the CLI:
//!
//! ## Key Types
//!
//! ### Authentication
//! - [`ApiKeys`] - Subscription keys scraped from the public web page
//! - [`Credentials`] - Username/password pair used to log in
//! - [`SessionState`] - Accumulated login response fields
//! - [`MemberIdentity`] - Member identifier resolved from the profile
//!
//! ### Club Data
//! - [`VisitRecord`] - Raw club visit record
//! - [`ReservationRecord`] - Raw reservation record
//! - [`CalendarEvent`] - Calendar projection of a reservation
//! - [`DerivedSnapshot`] - Visit statistics computed per refresh
//! - [`StartOfWeek`] - Configured first day of the week

pub mod error;
pub mod models;

pub use error::CoreError;

pub use models::{
    // Authentication
    ApiKeys,
    Credentials,
    MemberIdentity,
    SessionState,
    // Club data
    CalendarEvent,
    DerivedSnapshot,
    Instructor,
    ReservationRecord,
    StartOfWeek,
    VisitRecord,
    VisitTimestampError,
    VISIT_TIMESTAMP_KEY,
};
