//! Native per-event store backend.

use std::sync::mpsc;
use std::time::Duration;

use chrono::Days;
use tracing::{debug, info, warn};

use super::{AddOutcome, BackendKind, CalendarBackend, RemoveOutcome};
use crate::entry::{DatedEntry, StoredEvent};
use crate::error::{LabCalError, LabCalResult};
use crate::store::{AccessOutcome, EventStore, StoreCalendar, StoreEvent};
use crate::tag::{event_notes, event_title, id_matches, parse_day, parse_experiment_id};

/// Backend over an `EventStore`, working inside one named calendar.
///
/// Every call starts with an access request and blocks for at most
/// `access_timeout` waiting for the answer.
pub struct NativeBackend<S: EventStore> {
    store: S,
    calendar_name: String,
    access_timeout: Duration,
}

impl<S: EventStore> NativeBackend<S> {
    pub fn new(store: S, calendar_name: &str, access_timeout: Duration) -> Self {
        NativeBackend {
            store,
            calendar_name: calendar_name.to_string(),
            access_timeout,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Request access and wait for the callback. A late answer is ignored.
    fn authorize(&self) -> LabCalResult<()> {
        let (tx, rx) = mpsc::channel();
        self.store.request_access(Box::new(move |outcome| {
            let _ = tx.send(outcome);
        }));

        match rx.recv_timeout(self.access_timeout) {
            Ok(AccessOutcome::Granted) => Ok(()),
            Ok(AccessOutcome::Denied(reason)) => Err(LabCalError::AccessDenied(reason)),
            Err(mpsc::RecvTimeoutError::Timeout) => {
                Err(LabCalError::AccessTimeout(self.access_timeout))
            }
            Err(mpsc::RecvTimeoutError::Disconnected) => Err(LabCalError::AccessDenied(
                "the store dropped the access request".to_string(),
            )),
        }
    }

    fn find_calendar(&self) -> LabCalResult<Option<StoreCalendar>> {
        Ok(self
            .store
            .calendars()?
            .into_iter()
            .find(|c| c.title == self.calendar_name))
    }

    fn find_or_create_calendar(&self) -> LabCalResult<StoreCalendar> {
        if let Some(calendar) = self.find_calendar()? {
            return Ok(calendar);
        }

        let source = self.store.sources()?.into_iter().next().ok_or_else(|| {
            LabCalError::Store("No calendar sources available".to_string())
        })?;

        let calendar = self
            .store
            .create_calendar(&self.calendar_name, &source)
            .map_err(|e| {
                LabCalError::Store(format!(
                    "Could not create calendar '{}': {}",
                    self.calendar_name, e
                ))
            })?;
        info!(calendar = %self.calendar_name, source = %source.title, "created calendar");
        Ok(calendar)
    }

    /// Events in the target calendar together with their parsed experiment id.
    fn tagged_events(&self, calendar: &StoreCalendar) -> LabCalResult<Vec<(String, StoreEvent)>> {
        Ok(self
            .store
            .events(calendar)?
            .into_iter()
            .filter_map(|event| {
                let id = parse_experiment_id(event.notes.as_deref(), &event.title)?;
                Some((id, event))
            })
            .collect())
    }
}

impl<S: EventStore> CalendarBackend for NativeBackend<S> {
    fn kind(&self) -> BackendKind {
        BackendKind::Native
    }

    fn add(&self, entries: &[DatedEntry], experiment_id: &str) -> LabCalResult<AddOutcome> {
        self.authorize()?;
        let calendar = self.find_or_create_calendar()?;

        let mut outcome = AddOutcome {
            requested: entries.len(),
            added: 0,
            failures: Vec::new(),
            location: None,
        };

        for entry in entries {
            let event = StoreEvent {
                id: String::new(),
                title: event_title(experiment_id, entry.day, &entry.task),
                notes: Some(event_notes(experiment_id, &entry.task)),
                start: entry.date,
                end: entry.date.checked_add_days(Days::new(1)).unwrap_or(entry.date),
            };

            match self.store.save_event(&calendar, &event) {
                Ok(event_id) => {
                    debug!(experiment_id, day = entry.day, event_id = %event_id, "saved event");
                    outcome.added += 1;
                }
                Err(e) => {
                    warn!(experiment_id, day = entry.day, error = %e, "could not save event");
                    outcome
                        .failures
                        .push(format!("Could not save event for Day {}: {}", entry.day, e));
                }
            }
        }

        info!(
            experiment_id,
            added = outcome.added,
            requested = outcome.requested,
            calendar = %self.calendar_name,
            "added events"
        );
        Ok(outcome)
    }

    fn remove(&self, experiment_id: &str) -> LabCalResult<RemoveOutcome> {
        self.authorize()?;

        let mut outcome = RemoveOutcome {
            removed: 0,
            failures: Vec::new(),
            caveat: None,
        };

        let Some(calendar) = self.find_calendar()? else {
            warn!(calendar = %self.calendar_name, "calendar not found, nothing to remove");
            return Ok(outcome);
        };

        for (id, event) in self.tagged_events(&calendar)? {
            if id != experiment_id {
                continue;
            }
            match self.store.remove_event(&calendar, &event.id) {
                Ok(()) => outcome.removed += 1,
                Err(e) => {
                    warn!(experiment_id, title = %event.title, error = %e, "could not delete event");
                    outcome
                        .failures
                        .push(format!("Could not delete event '{}': {}", event.title, e));
                }
            }
        }

        info!(experiment_id, removed = outcome.removed, "removed events");
        Ok(outcome)
    }

    fn query(&self, partial_id: &str) -> LabCalResult<Vec<StoredEvent>> {
        self.authorize()?;

        let Some(calendar) = self.find_calendar()? else {
            debug!(calendar = %self.calendar_name, "calendar not found, no events");
            return Ok(Vec::new());
        };

        Ok(self
            .tagged_events(&calendar)?
            .into_iter()
            .filter(|(id, _)| id_matches(partial_id, id))
            .filter_map(|(id, event)| {
                let day = parse_day(&event.title, &id)?;
                Some(StoredEvent {
                    experiment_id: id,
                    day,
                    date: event.start,
                    summary: event.title,
                    source: calendar.title.clone(),
                })
            })
            .collect())
    }
}
