//! Create, remove and update pipelines over a calendar backend.
//!
//! None of the operations retry. Per-event failures land in the reports;
//! only whole-call failures (invalid input, access, I/O before anything was
//! written, Day 0 inference during update) come back as `Err`.

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{info, warn};

use crate::backend::{AddOutcome, BackendKind, CalendarBackend, RemoveOutcome};
use crate::entry::DatedEntry;
use crate::error::{LabCalError, LabCalResult};
use crate::matcher::find_matching;
use crate::parse::extract_day_entries;
use crate::schedule::{assign_dates, today};
use crate::tag::validate_experiment_id;

/// Drives the three schedule operations against one backend.
///
/// The backend is chosen once by the caller (see `backend::select_backend`)
/// and borrowed for the synchronizer's lifetime.
pub struct ScheduleSynchronizer<'a> {
    backend: &'a dyn CalendarBackend,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateReport {
    pub experiment_id: String,
    pub backend: BackendKind,
    pub reference_date: NaiveDate,
    pub entries: Vec<DatedEntry>,
    /// `None` when the document held no Day entries and nothing was written.
    pub outcome: Option<AddOutcome>,
}

impl CreateReport {
    pub fn success(&self) -> bool {
        self.outcome.as_ref().is_some_and(AddOutcome::is_complete)
    }

    pub fn message(&self) -> String {
        let Some(outcome) = &self.outcome else {
            return format!(
                "No Day entries found; nothing added for experiment {}",
                self.experiment_id
            );
        };

        let mut message = format!(
            "Added {} of {} events for experiment {} to the {}",
            outcome.added, outcome.requested, self.experiment_id, self.backend
        );
        if let Some(path) = &outcome.location {
            message.push_str(&format!(" ({})", path.display()));
        }
        for failure in &outcome.failures {
            message.push_str(&format!("\n  {}", failure));
        }
        message
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RemoveReport {
    pub experiment_id: String,
    pub backend: BackendKind,
    pub outcome: RemoveOutcome,
}

impl RemoveReport {
    pub fn success(&self) -> bool {
        self.outcome.succeeded()
    }

    pub fn message(&self) -> String {
        let mut message = match (&self.outcome.caveat, self.outcome.removed) {
            (Some(caveat), _) => format!(
                "Removal of experiment {} recorded. {}",
                self.experiment_id, caveat
            ),
            (None, 0) => format!("No events found to remove for experiment {}", self.experiment_id),
            (None, n) => format!("Removed {} events for experiment {}", n, self.experiment_id),
        };
        for failure in &self.outcome.failures {
            message.push_str(&format!("\n  {}", failure));
        }
        message
    }
}

/// What happened to one matched experiment during an update.
#[derive(Debug, Clone, Serialize)]
pub struct ExperimentUpdate {
    pub experiment_id: String,
    pub reference_date: NaiveDate,
    pub removed: Option<RemoveOutcome>,
    pub added: Option<AddOutcome>,
    /// Set when remove or add failed outright.
    pub error: Option<String>,
}

impl ExperimentUpdate {
    pub fn success(&self) -> bool {
        self.error.is_none()
            && self.removed.as_ref().is_some_and(|r| r.failures.is_empty())
            && self.added.as_ref().is_some_and(AddOutcome::is_complete)
    }

    pub fn message(&self) -> String {
        if let Some(error) = &self.error {
            return format!("Update of experiment {} failed: {}", self.experiment_id, error);
        }

        let removed = self.removed.as_ref().map_or(0, |r| r.removed);
        let (added, requested) = self
            .added
            .as_ref()
            .map_or((0, 0), |a| (a.added, a.requested));
        let mut message = format!(
            "Updated experiment {} (Day 0: {}): removed {}, added {} of {} events",
            self.experiment_id, self.reference_date, removed, added, requested
        );

        let failures = self
            .removed
            .iter()
            .flat_map(|r| r.failures.iter())
            .chain(self.added.iter().flat_map(|a| a.failures.iter()));
        for failure in failures {
            message.push_str(&format!("\n  {}", failure));
        }
        if let Some(caveat) = self.removed.as_ref().and_then(|r| r.caveat.as_ref()) {
            message.push_str(&format!("\n  {}", caveat));
        }
        message
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct UpdateReport {
    pub partial_id: String,
    pub backend: BackendKind,
    /// Set when the new document held no Day entries; nothing was touched.
    pub no_entries: bool,
    /// One result per matched experiment, in identifier order.
    pub experiments: Vec<ExperimentUpdate>,
}

impl UpdateReport {
    pub fn success(&self) -> bool {
        !self.no_entries
            && !self.experiments.is_empty()
            && self.experiments.iter().all(ExperimentUpdate::success)
    }

    pub fn message(&self) -> String {
        if self.no_entries {
            return format!(
                "No Day entries found; nothing updated for experiments matching '{}'",
                self.partial_id
            );
        }
        if self.experiments.is_empty() {
            return format!("No experiments found matching '{}'", self.partial_id);
        }
        self.experiments
            .iter()
            .map(ExperimentUpdate::message)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl<'a> ScheduleSynchronizer<'a> {
    pub fn new(backend: &'a dyn CalendarBackend) -> Self {
        ScheduleSynchronizer { backend }
    }

    pub fn backend_kind(&self) -> BackendKind {
        self.backend.kind()
    }

    /// Parse `text`, date it from `reference_date` (today when absent) and add
    /// the events. Earlier saves are kept when a later one fails.
    pub fn create(
        &self,
        text: &str,
        reference_date: Option<NaiveDate>,
        experiment_id: &str,
    ) -> LabCalResult<CreateReport> {
        validate_experiment_id(experiment_id)?;
        let reference_date = reference_date.unwrap_or_else(today);
        let entries = assign_dates(&extract_day_entries(text)?, reference_date, experiment_id)?;

        self.add_schedule(entries, reference_date, experiment_id)
    }

    /// Add an already dated schedule as-is.
    pub fn add_schedule(
        &self,
        entries: Vec<DatedEntry>,
        reference_date: NaiveDate,
        experiment_id: &str,
    ) -> LabCalResult<CreateReport> {
        validate_experiment_id(experiment_id)?;

        let mut report = CreateReport {
            experiment_id: experiment_id.to_string(),
            backend: self.backend.kind(),
            reference_date,
            entries,
            outcome: None,
        };

        if report.entries.is_empty() {
            warn!(experiment_id, "no Day entries found, nothing to add");
            return Ok(report);
        }

        report.outcome = Some(self.backend.add(&report.entries, experiment_id)?);
        Ok(report)
    }

    pub fn remove(&self, experiment_id: &str) -> LabCalResult<RemoveReport> {
        validate_experiment_id(experiment_id)?;
        let outcome = self.backend.remove(experiment_id)?;
        Ok(RemoveReport {
            experiment_id: experiment_id.to_string(),
            backend: self.backend.kind(),
            outcome,
        })
    }

    /// Replace the stored events of every experiment matching `partial_id`
    /// with a schedule parsed from `text`, keeping each experiment's Day 0.
    ///
    /// Day 0 is inferred and the new schedule dated for all matches before
    /// anything is changed; if any match has no usable events the whole update
    /// fails with `Day0InferenceFailed`, and a schedule that runs past the date
    /// range fails with `DateOutOfRange`. After that each experiment is removed
    /// and re-added on its own, so one failure does not affect the others.
    pub fn update(&self, partial_id: &str, text: &str) -> LabCalResult<UpdateReport> {
        let groups = find_matching(partial_id, self.backend)?;

        let mut report = UpdateReport {
            partial_id: partial_id.to_string(),
            backend: self.backend.kind(),
            no_entries: false,
            experiments: Vec::new(),
        };

        if groups.is_empty() {
            info!(partial_id, "no experiments matched");
            return Ok(report);
        }

        let anchored: Vec<(String, NaiveDate)> = groups
            .into_iter()
            .map(|(id, group)| match group.reference_date {
                Some(date) => Ok((id, date)),
                None => Err(LabCalError::Day0InferenceFailed { experiment_id: id }),
            })
            .collect::<LabCalResult<_>>()?;

        let day_entries = extract_day_entries(text)?;
        if day_entries.is_empty() {
            warn!(partial_id, "no Day entries found, nothing updated");
            report.no_entries = true;
            return Ok(report);
        }

        let planned: Vec<(String, NaiveDate, Vec<DatedEntry>)> = anchored
            .into_iter()
            .map(|(id, date)| {
                assign_dates(&day_entries, date, &id).map(|entries| (id, date, entries))
            })
            .collect::<LabCalResult<_>>()?;

        for (experiment_id, reference_date, entries) in planned {
            let mut result = ExperimentUpdate {
                experiment_id: experiment_id.clone(),
                reference_date,
                removed: None,
                added: None,
                error: None,
            };

            match self.backend.remove(&experiment_id) {
                Ok(removed) => result.removed = Some(removed),
                Err(e) => {
                    warn!(experiment_id = %experiment_id, error = %e, "remove failed, skipping add");
                    result.error = Some(format!("remove: {}", e));
                    report.experiments.push(result);
                    continue;
                }
            }

            match self.backend.add(&entries, &experiment_id) {
                Ok(added) => result.added = Some(added),
                Err(e) => {
                    warn!(experiment_id = %experiment_id, error = %e, "add failed");
                    result.error = Some(format!("add: {}", e));
                }
            }

            info!(
                experiment_id = %experiment_id,
                success = result.success(),
                "updated experiment"
            );
            report.experiments.push(result);
        }

        Ok(report)
    }
}
