//! Calendar-directory event store.
//!
//! Layout under the store root:
//!
//! ```text
//! <root>/
//!   lab-protocols/
//!     .labcal/calendar.toml    # title = "Lab Protocols"
//!     2f1c...-....ics          # one file per event, named by event id
//! ```

use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{AccessCallback, AccessOutcome, EventStore, StoreCalendar, StoreEvent, StoreSource};
use crate::error::{LabCalError, LabCalResult};
use crate::ics::{IcsEvent, generate_calendar, parse_events};

const CALENDAR_META_DIR: &str = ".labcal";
const CALENDAR_META_FILE: &str = "calendar.toml";

#[derive(Serialize, Deserialize)]
struct CalendarMeta {
    title: String,
}

/// Event store backed by a directory of calendars, one `.ics` file per event.
#[derive(Debug, Clone)]
pub struct DirStore {
    root: PathBuf,
}

impl DirStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        DirStore { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn calendar_path(&self, calendar: &StoreCalendar) -> PathBuf {
        self.root.join(&calendar.id)
    }

    fn event_path(&self, calendar: &StoreCalendar, event_id: &str) -> PathBuf {
        self.calendar_path(calendar).join(format!("{}.ics", event_id))
    }

    /// Generate a directory name that doesn't collide with an existing calendar.
    /// If the base slug exists, tries slug-2, slug-3, etc.
    fn unique_slug_for(&self, title: &str) -> LabCalResult<String> {
        let base = match slug::slugify(title) {
            s if s.is_empty() => "calendar".to_string(),
            s => s,
        };

        if !self.root.join(&base).exists() {
            return Ok(base);
        }

        for n in 2..=100 {
            let suffixed = format!("{}-{}", base, n);
            if !self.root.join(&suffixed).exists() {
                return Ok(suffixed);
            }
        }

        Err(LabCalError::Store(format!(
            "Too many calendar name collisions for '{}'",
            base
        )))
    }
}

fn check_access(root: &Path) -> AccessOutcome {
    match std::fs::metadata(root) {
        Ok(meta) if !meta.is_dir() => {
            AccessOutcome::Denied(format!("{} is not a directory", root.display()))
        }
        Ok(meta) if meta.permissions().readonly() => {
            AccessOutcome::Denied(format!("{} is read-only", root.display()))
        }
        Ok(_) => AccessOutcome::Granted,
        Err(e) => AccessOutcome::Denied(format!("{}: {}", root.display(), e)),
    }
}

impl EventStore for DirStore {
    fn request_access(&self, on_complete: AccessCallback) {
        let root = self.root.clone();
        std::thread::spawn(move || on_complete(check_access(&root)));
    }

    fn calendars(&self) -> LabCalResult<Vec<StoreCalendar>> {
        let Ok(entries) = std::fs::read_dir(&self.root) else {
            return Ok(Vec::new());
        };

        let mut calendars: Vec<StoreCalendar> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.is_dir())
            .filter_map(|path| {
                let meta_path = path.join(CALENDAR_META_DIR).join(CALENDAR_META_FILE);
                let content = std::fs::read_to_string(meta_path).ok()?;
                let meta: CalendarMeta = toml::from_str(&content).ok()?;
                let id = path.file_name()?.to_str()?.to_string();
                Some(StoreCalendar {
                    id,
                    title: meta.title,
                })
            })
            .collect();

        calendars.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(calendars)
    }

    fn sources(&self) -> LabCalResult<Vec<StoreSource>> {
        if !self.root.is_dir() {
            return Ok(Vec::new());
        }
        Ok(vec![StoreSource {
            id: "local".to_string(),
            title: self.root.display().to_string(),
        }])
    }

    fn create_calendar(&self, title: &str, _source: &StoreSource) -> LabCalResult<StoreCalendar> {
        let id = self.unique_slug_for(title)?;
        let meta_dir = self.root.join(&id).join(CALENDAR_META_DIR);
        std::fs::create_dir_all(&meta_dir)?;

        let meta = CalendarMeta {
            title: title.to_string(),
        };
        let content =
            toml::to_string_pretty(&meta).map_err(|e| LabCalError::Store(e.to_string()))?;
        std::fs::write(meta_dir.join(CALENDAR_META_FILE), content)?;

        debug!(calendar = %id, "created calendar directory");
        Ok(StoreCalendar {
            id,
            title: title.to_string(),
        })
    }

    fn save_event(&self, calendar: &StoreCalendar, event: &StoreEvent) -> LabCalResult<String> {
        let id = uuid::Uuid::new_v4().to_string();
        let ics_event = IcsEvent {
            uid: id.clone(),
            summary: event.title.clone(),
            description: event.notes.clone(),
            start: event.start,
            end: event.end,
        };
        let content = generate_calendar(&[ics_event], Utc::now());
        std::fs::write(self.event_path(calendar, &id), content)?;
        Ok(id)
    }

    fn remove_event(&self, calendar: &StoreCalendar, event_id: &str) -> LabCalResult<()> {
        let path = self.event_path(calendar, event_id);
        std::fs::remove_file(&path).map_err(|e| {
            LabCalError::Store(format!("Could not delete {}: {}", path.display(), e))
        })
    }

    fn events(&self, calendar: &StoreCalendar) -> LabCalResult<Vec<StoreEvent>> {
        let entries = std::fs::read_dir(self.calendar_path(calendar))?;

        let mut paths: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.extension().is_some_and(|e| e == "ics"))
            .collect();
        paths.sort();

        let mut events = Vec::new();
        for path in paths {
            let Some(id) = path.file_stem().and_then(|s| s.to_str()).map(str::to_string) else {
                continue;
            };
            let parsed = std::fs::read_to_string(&path)
                .map_err(LabCalError::from)
                .and_then(|content| parse_events(&content));

            match parsed {
                Ok(parsed) => {
                    if let Some(ics_event) = parsed.into_iter().next() {
                        events.push(StoreEvent {
                            id,
                            title: ics_event.summary,
                            notes: ics_event.description,
                            start: ics_event.start,
                            end: ics_event.end,
                        });
                    }
                }
                Err(e) => warn!(path = %path.display(), error = %e, "skipping unreadable event file"),
            }
        }

        Ok(events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::EventStore;
    use chrono::NaiveDate;
    use std::sync::mpsc;
    use std::time::Duration;

    fn event(title: &str) -> StoreEvent {
        StoreEvent {
            id: String::new(),
            title: title.to_string(),
            notes: Some(format!("[EXPERIMENT_ID:ENC1] {}", title)),
            start: NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
            end: NaiveDate::from_ymd_opt(2025, 3, 2).unwrap(),
        }
    }

    #[test]
    fn test_request_access_grants_existing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let store = DirStore::new(dir.path());
        let (tx, rx) = mpsc::channel();

        store.request_access(Box::new(move |outcome| {
            let _ = tx.send(outcome);
        }));

        assert_eq!(
            rx.recv_timeout(Duration::from_secs(5)).unwrap(),
            AccessOutcome::Granted
        );
    }

    #[test]
    fn test_request_access_denies_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let store = DirStore::new(dir.path().join("missing"));
        let (tx, rx) = mpsc::channel();

        store.request_access(Box::new(move |outcome| {
            let _ = tx.send(outcome);
        }));

        assert!(matches!(
            rx.recv_timeout(Duration::from_secs(5)).unwrap(),
            AccessOutcome::Denied(_)
        ));
    }

    #[test]
    fn test_calendar_create_and_lookup_by_title() {
        let dir = tempfile::tempdir().unwrap();
        let store = DirStore::new(dir.path());
        let source = store.sources().unwrap().remove(0);

        let first = store.create_calendar("Lab Protocols", &source).unwrap();
        let second = store.create_calendar("Lab Protocols", &source).unwrap();

        assert_eq!(first.id, "lab-protocols");
        assert_eq!(second.id, "lab-protocols-2", "Slug collisions get a suffix");

        let titles: Vec<String> = store.calendars().unwrap().into_iter().map(|c| c.title).collect();
        assert_eq!(titles, vec!["Lab Protocols", "Lab Protocols"]);
    }

    #[test]
    fn test_save_list_and_remove_events() {
        let dir = tempfile::tempdir().unwrap();
        let store = DirStore::new(dir.path());
        let source = store.sources().unwrap().remove(0);
        let calendar = store.create_calendar("Lab Protocols", &source).unwrap();

        let id = store
            .save_event(&calendar, &event("ID: ENC1, Day 0: Seed, then wait"))
            .unwrap();
        store.save_event(&calendar, &event("ID: ENC1, Day 2: Feed")).unwrap();

        let events = store.events(&calendar).unwrap();
        assert_eq!(events.len(), 2);
        let saved = events.iter().find(|e| e.id == id).expect("saved event listed");
        assert_eq!(saved.title, "ID: ENC1, Day 0: Seed, then wait");
        assert_eq!(
            saved.notes.as_deref(),
            Some("[EXPERIMENT_ID:ENC1] ID: ENC1, Day 0: Seed, then wait")
        );

        store.remove_event(&calendar, &id).unwrap();
        assert_eq!(store.events(&calendar).unwrap().len(), 1);
        assert!(
            store.remove_event(&calendar, &id).is_err(),
            "Removing a missing event is an error"
        );
    }

    #[test]
    fn test_sources_empty_when_root_missing() {
        let dir = tempfile::tempdir().unwrap();
        let store = DirStore::new(dir.path().join("nope"));
        assert!(store.sources().unwrap().is_empty());
        assert!(store.calendars().unwrap().is_empty());
    }
}
