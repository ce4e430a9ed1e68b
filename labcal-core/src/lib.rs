//! Core logic for labcal.
//!
//! Turns a lab protocol ("Day 0: ...", "Day 5: ...") into a dated schedule and
//! keeps that schedule in sync with a calendar backend:
//! - `parse` extracts Day-indexed tasks from raw text
//! - `schedule` and `day0` assign and recover calendar dates
//! - `matcher` resolves partial experiment identifiers against a backend
//! - `backend` persists tagged events (native per-event store or portable .ics export)
//! - `sync` drives create, remove and update against a backend

pub mod backend;
pub mod config;
pub mod day0;
pub mod entry;
pub mod error;
pub mod extract;
pub mod ics;
pub mod matcher;
pub mod parse;
pub mod schedule;
pub mod store;
pub mod sync;
pub mod tag;

pub use entry::{DatedEntry, DayEntry, ExperimentGroup, StoredEvent};
pub use error::{LabCalError, LabCalResult};
