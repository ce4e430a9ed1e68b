//! Day 0 recovery from previously stored events.

use chrono::{Days, NaiveDate};

use crate::entry::StoredEvent;

/// Recover the Day 0 reference date from `(day, date)` pairs.
///
/// A Day 0 event wins outright (the first one, if the store holds several).
/// Otherwise the event with the smallest day number is walked back by that many
/// days; ties go to the first event seen. Returns `None` for an empty input,
/// which callers treat as "cannot update".
pub fn infer_reference_date<I>(events: I) -> Option<NaiveDate>
where
    I: IntoIterator<Item = (u32, NaiveDate)>,
{
    let mut earliest: Option<(u32, NaiveDate)> = None;

    for (day, date) in events {
        if day == 0 {
            return Some(date);
        }
        if earliest.is_none_or(|(min_day, _)| day < min_day) {
            earliest = Some((day, date));
        }
    }

    let (day, date) = earliest?;
    date.checked_sub_days(Days::new(u64::from(day)))
}

/// Convenience wrapper over stored events.
pub fn infer_from_events(events: &[StoredEvent]) -> Option<NaiveDate> {
    infer_reference_date(events.iter().map(|e| (e.day, e.date)))
}
