//! Date assignment and reference date parsing.

use chrono::{Days, Local, NaiveDate};

use crate::entry::{DatedEntry, DayEntry};
use crate::error::{LabCalError, LabCalResult};

/// Accepted reference date formats, tried in order. The flag marks formats whose
/// year must be written with four digits (chrono would otherwise read "25" as
/// year 25 under `%Y`).
const DATE_FORMATS: &[(&str, bool)] = &[
    ("%m/%d/%y", false),
    ("%m/%d/%Y", true),
    ("%Y-%m-%d", true),
    ("%m-%d-%Y", true),
    ("%m-%d-%y", false),
];

/// Anchor each entry to `reference + day` days. Order and count are preserved.
///
/// Fails with `DateOutOfRange` if any day lands past the last representable
/// date; no entry is ever clamped or dropped.
pub fn assign_dates(
    entries: &[DayEntry],
    reference: NaiveDate,
    experiment_id: &str,
) -> LabCalResult<Vec<DatedEntry>> {
    entries
        .iter()
        .map(|entry| {
            offset_days(reference, entry.day).map(|date| DatedEntry {
                day: entry.day,
                task: entry.task.clone(),
                date,
                experiment_id: experiment_id.to_string(),
            })
        })
        .collect()
}

fn offset_days(reference: NaiveDate, day: u32) -> LabCalResult<NaiveDate> {
    reference
        .checked_add_days(Days::new(u64::from(day)))
        .ok_or(LabCalError::DateOutOfRange { day, reference })
}

/// Today's date in local time, used when no reference date is given.
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Parse a reference date string. The first format that parses wins.
pub fn parse_reference_date(input: &str) -> LabCalResult<NaiveDate> {
    let input = input.trim();

    DATE_FORMATS
        .iter()
        .filter(|(fmt, four_digit_year)| !four_digit_year || has_four_digit_year(input, fmt))
        .find_map(|(fmt, _)| NaiveDate::parse_from_str(input, fmt).ok())
        .ok_or_else(|| LabCalError::DateParse(input.to_string()))
}

fn has_four_digit_year(input: &str, fmt: &str) -> bool {
    let mut parts = input.split(['/', '-']);
    let year = if fmt.starts_with("%Y") {
        parts.next()
    } else {
        parts.last()
    };
    year.is_some_and(|y| y.len() == 4)
}
