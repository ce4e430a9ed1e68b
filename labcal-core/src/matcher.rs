//! Experiment identifier matching.

use std::collections::BTreeMap;

use tracing::debug;

use crate::backend::CalendarBackend;
use crate::day0::infer_from_events;
use crate::entry::ExperimentGroup;
use crate::error::LabCalResult;

/// Every stored experiment whose identifier matches `partial_id`, keyed by the
/// full identifier.
///
/// Events for the same identifier found in several storage units are
/// concatenated in the order the backend returned them. Each group's
/// `reference_date` is inferred from its events. Nothing matching is an empty
/// map.
pub fn find_matching(
    partial_id: &str,
    backend: &dyn CalendarBackend,
) -> LabCalResult<BTreeMap<String, ExperimentGroup>> {
    let mut groups: BTreeMap<String, ExperimentGroup> = BTreeMap::new();

    for event in backend.query(partial_id)? {
        groups
            .entry(event.experiment_id.clone())
            .or_default()
            .events
            .push(event);
    }

    for (id, group) in groups.iter_mut() {
        group.reference_date = infer_from_events(&group.events);
        debug!(
            experiment_id = %id,
            events = group.events.len(),
            reference_date = ?group.reference_date,
            "matched experiment"
        );
    }

    Ok(groups)
}
