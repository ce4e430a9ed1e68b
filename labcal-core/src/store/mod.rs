//! Native per-event calendar store capability.
//!
//! A store holds named calendars of individually addressable events. Access is
//! granted asynchronously: `request_access` returns immediately and reports the
//! outcome through the callback, possibly from another thread.

#[cfg(feature = "native-store")]
mod dir;
#[cfg(test)]
pub(crate) mod memory;

use chrono::NaiveDate;

use crate::error::LabCalResult;

#[cfg(feature = "native-store")]
pub use dir::DirStore;

/// Outcome of an access request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessOutcome {
    Granted,
    Denied(String),
}

/// Completion callback for `EventStore::request_access`.
pub type AccessCallback = Box<dyn FnOnce(AccessOutcome) + Send + 'static>;

/// Where new calendars can be created (an account or a local folder).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreSource {
    pub id: String,
    pub title: String,
}

/// A named calendar inside the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreCalendar {
    pub id: String,
    pub title: String,
}

/// An all-day event inside a store calendar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreEvent {
    /// Store-assigned identifier; empty until the event is saved.
    pub id: String,
    pub title: String,
    pub notes: Option<String>,
    pub start: NaiveDate,
    /// Exclusive end date.
    pub end: NaiveDate,
}

pub trait EventStore: Send + Sync {
    /// Ask for access to events. Must call `on_complete` at most once.
    fn request_access(&self, on_complete: AccessCallback);

    fn calendars(&self) -> LabCalResult<Vec<StoreCalendar>>;

    fn sources(&self) -> LabCalResult<Vec<StoreSource>>;

    fn create_calendar(&self, title: &str, source: &StoreSource) -> LabCalResult<StoreCalendar>;

    /// Save a new event and return its identifier.
    fn save_event(&self, calendar: &StoreCalendar, event: &StoreEvent) -> LabCalResult<String>;

    fn remove_event(&self, calendar: &StoreCalendar, event_id: &str) -> LabCalResult<()>;

    fn events(&self, calendar: &StoreCalendar) -> LabCalResult<Vec<StoreEvent>>;
}
