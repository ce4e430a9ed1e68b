//! ICS parsing using the icalendar crate's parser.

use chrono::{Days, NaiveDate};
use icalendar::{
    DatePerhapsTime,
    parser::{Component, read_calendar, unfold},
};

use super::IcsEvent;
use crate::error::{LabCalError, LabCalResult};

/// Parse every VEVENT in a calendar file.
///
/// Events without a UID or a usable DTSTART are skipped.
pub fn parse_events(content: &str) -> LabCalResult<Vec<IcsEvent>> {
    let unfolded = unfold(content);
    let calendar = read_calendar(&unfolded).map_err(|e| LabCalError::IcsParse(e.to_string()))?;

    Ok(calendar
        .components
        .iter()
        .filter(|c| c.name == "VEVENT")
        .filter_map(parse_vevent)
        .collect())
}

fn parse_vevent(vevent: &Component) -> Option<IcsEvent> {
    let uid = vevent.find_prop("UID")?.val.to_string();
    let start = to_date(DatePerhapsTime::try_from(vevent.find_prop("DTSTART")?).ok()?);
    let end = vevent
        .find_prop("DTEND")
        .and_then(|p| DatePerhapsTime::try_from(p).ok())
        .map(to_date)
        .unwrap_or_else(|| start.checked_add_days(Days::new(1)).unwrap_or(start));

    let summary = vevent
        .find_prop("SUMMARY")
        .map(|p| p.val.to_string())
        .unwrap_or_default();
    let description = vevent
        .find_prop("DESCRIPTION")
        .map(|p| p.val.to_string());

    Some(IcsEvent {
        uid,
        summary,
        description,
        start,
        end,
    })
}

/// Reduce any DTSTART/DTEND form to its calendar date.
fn to_date(dpt: DatePerhapsTime) -> NaiveDate {
    match dpt {
        DatePerhapsTime::Date(d) => d,
        DatePerhapsTime::DateTime(cal_dt) => match cal_dt {
            icalendar::CalendarDateTime::Utc(dt) => dt.date_naive(),
            icalendar::CalendarDateTime::Floating(naive) => naive.date(),
            icalendar::CalendarDateTime::WithTimezone { date_time, .. } => date_time.date(),
        },
    }
}
