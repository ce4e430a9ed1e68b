//! In-memory event store for tests.

use std::sync::Mutex;

use super::{AccessCallback, AccessOutcome, EventStore, StoreCalendar, StoreEvent, StoreSource};
use crate::error::{LabCalError, LabCalResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessMode {
    Grant,
    Deny,
    /// Hold on to the callback without ever invoking it.
    Silent,
}

#[derive(Default)]
struct State {
    calendars: Vec<StoreCalendar>,
    events: Vec<(String, StoreEvent)>,
    next_id: usize,
}

pub struct MemoryStore {
    access: AccessMode,
    has_source: bool,
    fail_calendar_creation: bool,
    /// Saves whose title contains this text fail.
    fail_saves_matching: Mutex<Option<String>>,
    pending: Mutex<Vec<AccessCallback>>,
    state: Mutex<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore {
            access: AccessMode::Grant,
            has_source: true,
            fail_calendar_creation: false,
            fail_saves_matching: Mutex::new(None),
            pending: Mutex::new(Vec::new()),
            state: Mutex::new(State::default()),
        }
    }

    pub fn with_access(mut self, access: AccessMode) -> Self {
        self.access = access;
        self
    }

    pub fn without_sources(mut self) -> Self {
        self.has_source = false;
        self
    }

    pub fn failing_calendar_creation(mut self) -> Self {
        self.fail_calendar_creation = true;
        self
    }

    pub fn failing_saves_matching(self, text: &str) -> Self {
        self.fail_saves_from_now(text);
        self
    }

    /// Start failing saves after the store has been seeded.
    pub fn fail_saves_from_now(&self, text: &str) {
        *self.fail_saves_matching.lock().unwrap() = Some(text.to_string());
    }

    /// Every event in every calendar, in insertion order.
    pub fn all_events(&self) -> Vec<StoreEvent> {
        let state = self.state.lock().unwrap();
        state.events.iter().map(|(_, e)| e.clone()).collect()
    }

    pub fn calendar_titles(&self) -> Vec<String> {
        let state = self.state.lock().unwrap();
        state.calendars.iter().map(|c| c.title.clone()).collect()
    }
}

impl EventStore for MemoryStore {
    fn request_access(&self, on_complete: AccessCallback) {
        match self.access {
            AccessMode::Grant => on_complete(AccessOutcome::Granted),
            AccessMode::Deny => on_complete(AccessOutcome::Denied("user declined".into())),
            AccessMode::Silent => self.pending.lock().unwrap().push(on_complete),
        }
    }

    fn calendars(&self) -> LabCalResult<Vec<StoreCalendar>> {
        Ok(self.state.lock().unwrap().calendars.clone())
    }

    fn sources(&self) -> LabCalResult<Vec<StoreSource>> {
        if !self.has_source {
            return Ok(Vec::new());
        }
        Ok(vec![StoreSource {
            id: "memory".into(),
            title: "Memory".into(),
        }])
    }

    fn create_calendar(&self, title: &str, _source: &StoreSource) -> LabCalResult<StoreCalendar> {
        if self.fail_calendar_creation {
            return Err(LabCalError::Store("source is read-only".into()));
        }
        let mut state = self.state.lock().unwrap();
        let calendar = StoreCalendar {
            id: format!("cal-{}", state.calendars.len() + 1),
            title: title.to_string(),
        };
        state.calendars.push(calendar.clone());
        Ok(calendar)
    }

    fn save_event(&self, calendar: &StoreCalendar, event: &StoreEvent) -> LabCalResult<String> {
        if let Some(text) = self.fail_saves_matching.lock().unwrap().as_deref() {
            if event.title.contains(text) {
                return Err(LabCalError::Store(format!("refused to save '{}'", event.title)));
            }
        }
        let mut state = self.state.lock().unwrap();
        state.next_id += 1;
        let id = format!("evt-{}", state.next_id);
        let mut saved = event.clone();
        saved.id = id.clone();
        state.events.push((calendar.id.clone(), saved));
        Ok(id)
    }

    fn remove_event(&self, calendar: &StoreCalendar, event_id: &str) -> LabCalResult<()> {
        let mut state = self.state.lock().unwrap();
        let before = state.events.len();
        state
            .events
            .retain(|(cal_id, e)| !(cal_id == &calendar.id && e.id == event_id));
        if state.events.len() == before {
            return Err(LabCalError::Store(format!("no event {}", event_id)));
        }
        Ok(())
    }

    fn events(&self, calendar: &StoreCalendar) -> LabCalResult<Vec<StoreEvent>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .events
            .iter()
            .filter(|(cal_id, _)| cal_id == &calendar.id)
            .map(|(_, e)| e.clone())
            .collect())
    }
}
