//! ICS generation using the icalendar crate's builder.

use chrono::{DateTime, Days, NaiveDate, Utc};
use icalendar::{Calendar, Component, Property, ValueType};

use super::{CATEGORY, IcsEvent, PRODID, export_uid};
use crate::entry::DatedEntry;
use crate::tag::{event_notes, event_title};

/// Generate a complete export calendar for one experiment.
pub fn generate_export(entries: &[DatedEntry], experiment_id: &str, stamp: DateTime<Utc>) -> String {
    let events: Vec<IcsEvent> = entries
        .iter()
        .map(|entry| IcsEvent {
            uid: export_uid(experiment_id, entry.day, entry.date),
            summary: event_title(experiment_id, entry.day, &entry.task),
            description: Some(event_notes(experiment_id, &entry.task)),
            start: entry.date,
            end: entry.date.checked_add_days(Days::new(1)).unwrap_or(entry.date),
        })
        .collect();

    generate_calendar(&events, stamp)
}

/// Generate a VCALENDAR holding the given all-day events.
///
/// Text escaping and line folding are done by icalendar.
pub fn generate_calendar(events: &[IcsEvent], stamp: DateTime<Utc>) -> String {
    let dtstamp = stamp.format("%Y%m%dT%H%M%SZ").to_string();

    let mut cal = Calendar::empty();
    cal.append_property(Property::new("VERSION", "2.0"));
    cal.append_property(Property::new("PRODID", PRODID));
    cal.append_property(Property::new("CALSCALE", "GREGORIAN"));
    cal.append_property(Property::new("METHOD", "PUBLISH"));

    for event in events {
        let mut ics_event = icalendar::Event::new();
        ics_event.uid(&event.uid);
        ics_event.add_property("DTSTAMP", &dtstamp);
        add_date_property(&mut ics_event, "DTSTART", event.start);
        add_date_property(&mut ics_event, "DTEND", event.end);
        ics_event.summary(&event.summary);
        if let Some(ref desc) = event.description {
            ics_event.description(desc);
        }
        ics_event.add_property("CATEGORIES", CATEGORY);
        ics_event.add_property("STATUS", "CONFIRMED");
        ics_event.add_property("SEQUENCE", "0");

        cal.push(ics_event.done());
    }

    cal.done().to_string()
}

/// `NAME;VALUE=DATE:YYYYMMDD`
fn add_date_property(ics_event: &mut icalendar::Event, name: &str, date: NaiveDate) {
    let mut prop = Property::new(name, date.format("%Y%m%d").to_string());
    prop.append_parameter(ValueType::Date);
    ics_event.append_property(prop);
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn stamp() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 10, 11, 9, 30, 0).unwrap()
    }

    fn entry(day: u32, task: &str, date: NaiveDate) -> DatedEntry {
        DatedEntry {
            day,
            task: task.to_string(),
            date,
            experiment_id: "ENC1".to_string(),
        }
    }

    #[test]
    fn test_generate_export_event_fields() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 20).unwrap();
        let ics = generate_export(&[entry(5, "Harvest", date)], "ENC1", stamp());

        assert!(ics.starts_with("BEGIN:VCALENDAR\r\nVERSION:2.0\r\n"), "ICS:\n{}", ics);
        assert!(ics.contains(&format!("PRODID:{}\r\n", PRODID)), "ICS:\n{}", ics);
        assert!(ics.contains("METHOD:PUBLISH\r\n"), "ICS:\n{}", ics);
        assert!(ics.contains("UID:ENC1-day5-20250320@lab-calendar\r\n"), "ICS:\n{}", ics);
        assert!(ics.contains("DTSTART;VALUE=DATE:20250320\r\n"), "ICS:\n{}", ics);
        assert!(
            ics.contains("DTEND;VALUE=DATE:20250321\r\n"),
            "All-day DTEND should be the following day. ICS:\n{}",
            ics
        );
        assert!(ics.contains("SUMMARY:ID: ENC1\\, Day 5: Harvest\r\n"), "ICS:\n{}", ics);
        assert!(
            ics.contains("DESCRIPTION:[EXPERIMENT_ID:ENC1] Harvest\r\n"),
            "ICS:\n{}",
            ics
        );
        assert!(ics.contains("CATEGORIES:Lab Protocol\r\n"), "ICS:\n{}", ics);
        assert!(ics.contains("DTSTAMP:20251011T093000Z\r\n"), "ICS:\n{}", ics);
        assert!(ics.ends_with("END:VCALENDAR\r\n"));
    }

    #[test]
    fn test_special_characters_are_escaped() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 20).unwrap();
        let ics = generate_export(&[entry(1, "a\\b, c; d\ne", date)], "ENC1", stamp());

        assert!(
            ics.contains("DESCRIPTION:[EXPERIMENT_ID:ENC1] a\\\\b\\, c\\; d\\ne\r\n"),
            "Backslash, comma, semicolon and newline must be escaped. ICS:\n{}",
            ics
        );
    }

    #[test]
    fn test_long_lines_are_folded() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 20).unwrap();
        let task = "Aspirate media and wash twice with PBS before adding trypsin to every well of the plate";
        let ics = generate_export(&[entry(1, task, date)], "ENC1", stamp());

        for line in ics.split("\r\n") {
            assert!(line.len() <= 75, "Line longer than 75 octets: {:?}", line);
        }
        assert!(ics.contains("\r\n "), "Expected at least one folded line");
    }

    #[test]
    fn test_folding_keeps_multibyte_characters_whole() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 20).unwrap();
        let task = "µ".repeat(60);
        let ics = generate_export(&[entry(1, &task, date)], "ENC1", stamp());

        let unfolded = ics.replace("\r\n ", "");
        assert!(
            unfolded.contains(&format!("DESCRIPTION:[EXPERIMENT_ID:ENC1] {}\r\n", task)),
            "Unfolding should restore the original line. ICS:\n{}",
            ics
        );
    }
}
