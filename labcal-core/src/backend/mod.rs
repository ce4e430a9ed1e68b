//! Calendar backends.
//!
//! Two interchangeable implementations of `CalendarBackend`:
//! - `NativeBackend`: individually addressable events in an `EventStore`, truly
//!   deleted on remove.
//! - `IcsExportBackend`: append-only .ics export files; remove cannot retract
//!   anything already exported.
//!
//! The variant is chosen once by `select_backend` and handed to the synchronizer.

mod native;
mod portable;

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;
use tracing::{debug, info};

use crate::config::{BackendPreference, LabCalConfig};
use crate::entry::{DatedEntry, StoredEvent};
use crate::error::{LabCalError, LabCalResult};

pub use native::NativeBackend;
pub use portable::{IcsExportBackend, REMOVE_CAVEAT};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    Native,
    Portable,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            BackendKind::Native => write!(f, "native calendar store"),
            BackendKind::Portable => write!(f, "portable .ics export"),
        }
    }
}

/// Result of `CalendarBackend::add`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AddOutcome {
    pub requested: usize,
    pub added: usize,
    /// One message per entry that could not be stored.
    pub failures: Vec<String>,
    /// Export file written, for the portable backend.
    pub location: Option<PathBuf>,
}

impl AddOutcome {
    pub fn is_complete(&self) -> bool {
        self.added == self.requested
    }
}

/// Result of `CalendarBackend::remove`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RemoveOutcome {
    /// Events physically deleted.
    pub removed: usize,
    /// Events matched but not deleted.
    pub failures: Vec<String>,
    /// Set when the backend only records the removal and the caller must act out
    /// of band (re-import or delete exported files by hand).
    pub caveat: Option<String>,
}

impl RemoveOutcome {
    /// Something was removed, or the backend recorded a removal marker.
    pub fn succeeded(&self) -> bool {
        self.removed > 0 || self.caveat.is_some()
    }
}

/// Persistence of dated, tagged events.
pub trait CalendarBackend {
    fn kind(&self) -> BackendKind;

    /// Persist one event per entry, tagged with `experiment_id` and the day.
    fn add(&self, entries: &[DatedEntry], experiment_id: &str) -> LabCalResult<AddOutcome>;

    /// Remove every event whose tag names exactly `experiment_id`.
    fn remove(&self, experiment_id: &str) -> LabCalResult<RemoveOutcome>;

    /// Every stored event whose identifier matches `partial_id`
    /// (see `tag::id_matches`), across all storage units.
    fn query(&self, partial_id: &str) -> LabCalResult<Vec<StoredEvent>>;
}

/// Pick the backend for this process. Call once and pass the result around.
pub fn select_backend(config: &LabCalConfig) -> LabCalResult<Box<dyn CalendarBackend>> {
    let backend = match config.backend {
        BackendPreference::Portable => portable_backend(config),
        BackendPreference::Native => native_backend(config)?,
        BackendPreference::Auto => native_backend(config).unwrap_or_else(|e| {
            debug!(reason = %e, "native store unavailable, using .ics export");
            portable_backend(config)
        }),
    };

    info!(backend = %backend.kind(), "selected calendar backend");
    Ok(backend)
}

fn portable_backend(config: &LabCalConfig) -> Box<dyn CalendarBackend> {
    Box::new(IcsExportBackend::new(config.export_path()))
}

#[cfg(feature = "native-store")]
fn native_backend(config: &LabCalConfig) -> LabCalResult<Box<dyn CalendarBackend>> {
    let store_path = config.store_path();
    if !store_path.is_dir() {
        return Err(LabCalError::BackendUnavailable(format!(
            "calendar store directory {} does not exist",
            store_path.display()
        )));
    }

    let store = crate::store::DirStore::new(store_path);
    Ok(Box::new(NativeBackend::new(
        store,
        &config.calendar_name,
        config.access_timeout,
    )))
}

#[cfg(not(feature = "native-store"))]
fn native_backend(_config: &LabCalConfig) -> LabCalResult<Box<dyn CalendarBackend>> {
    Err(LabCalError::BackendUnavailable(
        "built without the native-store feature".to_string(),
    ))
}
