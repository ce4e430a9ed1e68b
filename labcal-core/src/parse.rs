//! Day entry extraction from protocol text.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::entry::DayEntry;
use crate::error::{LabCalError, LabCalResult};

/// "Day N:" or "Day N-M:" (first number wins) followed by everything up to the
/// first period, across newlines.
static DAY_ENTRY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)Day\s*(\d+)(?:[-–]\d+)?:\s*([^.]*?\.)").expect("valid day entry regex")
});
static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid ws regex"));

/// Extract Day entries from protocol text, sorted by day.
///
/// The sort is stable, so entries sharing a day number keep document order.
/// Duplicate day numbers are kept as separate entries. An empty result means
/// the document has no Day-tagged content. A day number that does not fit in
/// a `u32` fails with `DayNumberTooLarge`.
pub fn extract_day_entries(text: &str) -> LabCalResult<Vec<DayEntry>> {
    let mut entries = Vec::new();

    for caps in DAY_ENTRY_RE.captures_iter(text) {
        let task = clean_task(&caps[2]);
        if task.is_empty() {
            continue;
        }
        let day = caps[1]
            .parse::<u32>()
            .map_err(|_| LabCalError::DayNumberTooLarge(caps[1].to_string()))?;
        entries.push(DayEntry { day, task });
    }

    entries.sort_by_key(|e| e.day);
    Ok(entries)
}

/// Strip the trailing period and collapse internal whitespace.
fn clean_task(raw: &str) -> String {
    let trimmed = raw.trim();
    let trimmed = trimmed.strip_suffix('.').unwrap_or(trimmed).trim();
    WHITESPACE_RE.replace_all(trimmed, " ").into_owned()
}

/// The protocol title: the first non-empty line that isn't a Day entry.
pub fn extract_title(text: &str) -> Option<String> {
    text.lines()
        .map(str::trim)
        .find(|line| !line.is_empty() && !line.starts_with("Day"))
        .map(str::to_string)
}
