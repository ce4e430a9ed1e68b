//! Portable .ics export backend.
//!
//! Each `add` writes a new, timestamped export file; nothing is ever rewritten.
//! `query` reads every export in the directory, so the directory as a whole is
//! the store.

use std::path::{Path, PathBuf};

use chrono::{Local, Utc};
use tracing::{debug, info, warn};

use super::{AddOutcome, BackendKind, CalendarBackend, RemoveOutcome};
use crate::entry::{DatedEntry, StoredEvent};
use crate::error::{LabCalError, LabCalResult};
use crate::ics::{generate_export, parse_events};
use crate::tag::{id_matches, parse_day, parse_experiment_id};

/// Reported with every portable removal.
pub const REMOVE_CAVEAT: &str = "Events already exported to .ics files cannot be retracted. \
Delete them from your calendar application and remove the matching export files by hand.";

pub struct IcsExportBackend {
    export_dir: PathBuf,
}

impl IcsExportBackend {
    pub fn new(export_dir: impl Into<PathBuf>) -> Self {
        IcsExportBackend {
            export_dir: export_dir.into(),
        }
    }

    pub fn export_dir(&self) -> &Path {
        &self.export_dir
    }

    /// `<id>_<YYYYMMDD_HHMMSS>.ics`, with _02, _03... when two exports land in
    /// the same second. Suffixed names sort after the plain one.
    fn unique_export_path(&self, experiment_id: &str) -> LabCalResult<PathBuf> {
        let id_slug = match slug::slugify(experiment_id) {
            s if s.is_empty() => "experiment".to_string(),
            s => s,
        };
        let base = format!("{}_{}", id_slug, Local::now().format("%Y%m%d_%H%M%S"));

        let path = self.export_dir.join(format!("{}.ics", base));
        if !path.exists() {
            return Ok(path);
        }

        for n in 2..=99 {
            let path = self.export_dir.join(format!("{}_{:02}.ics", base, n));
            if !path.exists() {
                return Ok(path);
            }
        }

        Err(LabCalError::Store(format!(
            "Too many export name collisions for '{}'",
            base
        )))
    }

    fn export_files(&self) -> LabCalResult<Vec<PathBuf>> {
        let Ok(entries) = std::fs::read_dir(&self.export_dir) else {
            return Ok(Vec::new());
        };

        let mut paths: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.is_file() && path.extension().is_some_and(|e| e == "ics"))
            .collect();
        paths.sort();
        Ok(paths)
    }
}

impl CalendarBackend for IcsExportBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Portable
    }

    fn add(&self, entries: &[DatedEntry], experiment_id: &str) -> LabCalResult<AddOutcome> {
        std::fs::create_dir_all(&self.export_dir)?;

        let path = self.unique_export_path(experiment_id)?;
        let content = generate_export(entries, experiment_id, Utc::now());
        std::fs::write(&path, content)?;

        info!(experiment_id, path = %path.display(), events = entries.len(), "wrote export");
        Ok(AddOutcome {
            requested: entries.len(),
            added: entries.len(),
            failures: Vec::new(),
            location: Some(path),
        })
    }

    fn remove(&self, experiment_id: &str) -> LabCalResult<RemoveOutcome> {
        warn!(
            experiment_id,
            export_dir = %self.export_dir.display(),
            "exported events cannot be retracted"
        );
        Ok(RemoveOutcome {
            removed: 0,
            failures: Vec::new(),
            caveat: Some(REMOVE_CAVEAT.to_string()),
        })
    }

    fn query(&self, partial_id: &str) -> LabCalResult<Vec<StoredEvent>> {
        let mut found = Vec::new();

        for path in self.export_files()? {
            let file_name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();

            let parsed = std::fs::read_to_string(&path)
                .map_err(LabCalError::from)
                .and_then(|content| parse_events(&content));
            let events = match parsed {
                Ok(events) => events,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "skipping unreadable export");
                    continue;
                }
            };

            for event in events {
                let Some(id) = parse_experiment_id(event.description.as_deref(), &event.summary)
                else {
                    continue;
                };
                if !id_matches(partial_id, &id) {
                    continue;
                }
                let Some(day) = parse_day(&event.summary, &id) else {
                    debug!(summary = %event.summary, "tagged event without a day number");
                    continue;
                };
                found.push(StoredEvent {
                    experiment_id: id,
                    day,
                    date: event.start,
                    summary: event.summary,
                    source: file_name.clone(),
                });
            }
        }

        Ok(found)
    }
}
