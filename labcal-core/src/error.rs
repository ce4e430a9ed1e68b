//! Error types for labcal.

use std::time::Duration;

use chrono::NaiveDate;
use thiserror::Error;

/// Errors that can occur in labcal operations.
#[derive(Error, Debug)]
pub enum LabCalError {
    #[error("Text extraction failed: {0}")]
    Extraction(String),

    #[error("Unsupported file type: {0}. Supported formats: .pdf, .doc, .docx, .txt, .md")]
    UnsupportedFormat(String),

    #[error("No Day entries found in the document. Looking for patterns like 'Day 0:', 'Day 1:', etc.")]
    NoEntriesFound,

    #[error(
        "Could not parse date: {0}. Supported formats: MM/DD/YY, MM/DD/YYYY, YYYY-MM-DD, MM-DD-YYYY, MM-DD-YY"
    )]
    DateParse(String),

    #[error("Day number {0} is too large")]
    DayNumberTooLarge(String),

    #[error("Day {day} counted from {reference} falls outside the supported date range")]
    DateOutOfRange { day: u32, reference: NaiveDate },

    #[error("Invalid experiment ID \"{id}\": {reason}")]
    InvalidExperimentId { id: String, reason: &'static str },

    #[error("Calendar access denied: {0}")]
    AccessDenied(String),

    #[error("Calendar access request timed out after {}s", .0.as_secs())]
    AccessTimeout(Duration),

    #[error("No calendar backend available: {0}")]
    BackendUnavailable(String),

    #[error("Could not extract Day 0 date for experiment ID \"{experiment_id}\"")]
    Day0InferenceFailed { experiment_id: String },

    #[error("Calendar store error: {0}")]
    Store(String),

    #[error("ICS parse error: {0}")]
    IcsParse(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl LabCalError {
    /// Whether this error means the native store refused or never answered the
    /// access request. Callers may retry later.
    pub fn is_access_denied(&self) -> bool {
        matches!(self, LabCalError::AccessDenied(_) | LabCalError::AccessTimeout(_))
    }
}

/// Result type alias for labcal operations.
pub type LabCalResult<T> = Result<T, LabCalError>;
