//! ICS reading and writing for the portable export format and the per-event
//! store files.
//!
//! Field names and the `VALUE=DATE` all-day form are what third-party calendar
//! apps import, so they are kept stable.

mod generate;
mod parse;

use chrono::NaiveDate;

pub use generate::{generate_calendar, generate_export};
pub use parse::parse_events;

pub const PRODID: &str = "-//Lab Protocol Calendar//Lab Calendar Tool//EN";
pub const CATEGORY: &str = "Lab Protocol";

/// An all-day VEVENT as written to and read from .ics files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IcsEvent {
    pub uid: String,
    pub summary: String,
    pub description: Option<String>,
    pub start: NaiveDate,
    /// Exclusive end date (the day after `start` for a one-day event).
    pub end: NaiveDate,
}

/// Stable event UID derived from experiment id, day and date.
pub fn export_uid(experiment_id: &str, day: u32, date: NaiveDate) -> String {
    format!("{}-day{}-{}@lab-calendar", experiment_id, day, date.format("%Y%m%d"))
}
