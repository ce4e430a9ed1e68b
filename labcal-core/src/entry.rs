//! Schedule value types.
//!
//! `DayEntry` and `DatedEntry` are produced fresh by each call and never shared.
//! `StoredEvent` is a snapshot of what a backend holds; it is re-queried on every
//! operation rather than cached.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One "Day N: task." line from a protocol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayEntry {
    pub day: u32,
    pub task: String,
}

impl DayEntry {
    pub fn new(day: u32, task: impl Into<String>) -> Self {
        DayEntry {
            day,
            task: task.into(),
        }
    }
}

/// A day entry anchored to a calendar date for one experiment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatedEntry {
    pub day: u32,
    pub task: String,
    pub date: NaiveDate,
    pub experiment_id: String,
}

/// An event as read back from a backend.
///
/// `day` and `experiment_id` are parsed out of the embedded tags; `source` names
/// the storage unit it came from (export file name or calendar title).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredEvent {
    pub experiment_id: String,
    pub day: u32,
    pub date: NaiveDate,
    pub summary: String,
    pub source: String,
}

/// All stored events for one experiment identifier.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExperimentGroup {
    pub reference_date: Option<NaiveDate>,
    pub events: Vec<StoredEvent>,
}
