//! Plain-text schedule summary written next to the run.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate, NaiveDateTime};
use labcal_core::DatedEntry;

use crate::render::{day_heading, task_line};

/// `<stem>_<id>_calendar.txt`, or `<stem>_calendar.txt` without an id.
pub fn summary_file_name(source: &Path, id: Option<&str>) -> String {
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "protocol".to_string());

    match id {
        Some(id) => format!("{}_{}_calendar.txt", stem, id),
        None => format!("{}_calendar.txt", stem),
    }
}

pub fn build_summary(
    title: Option<&str>,
    id: Option<&str>,
    reference_date: NaiveDate,
    entries: &[DatedEntry],
    generated: NaiveDateTime,
) -> String {
    let mut out = String::from("LAB PROTOCOL CALENDAR\n");
    if let Some(title) = title {
        out.push_str(&format!("Title: {}\n", title));
    }
    if let Some(id) = id {
        out.push_str(&format!("Experiment ID: {}\n", id));
    }
    out.push_str(&format!("Generated: {}\n", generated.format("%Y-%m-%d %H:%M:%S")));
    out.push_str(&format!("Day 0: {}\n", reference_date.format("%A, %B %d, %Y")));
    out.push_str(&"=".repeat(80));
    out.push_str("\n\n");

    for entry in entries {
        out.push_str(&format!("{}\n  {}\n\n", day_heading(entry), task_line(entry, id)));
    }
    out
}

/// Write the summary into `dir` and return its path.
pub fn write_summary(
    dir: &Path,
    source: &Path,
    title: Option<&str>,
    id: Option<&str>,
    reference_date: NaiveDate,
    entries: &[DatedEntry],
) -> Result<PathBuf> {
    let path = dir.join(summary_file_name(source, id));
    let content = build_summary(title, id, reference_date, entries, Local::now().naive_local());

    std::fs::write(&path, content)
        .with_context(|| format!("Could not write summary to {}", path.display()))?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_summary_file_name() {
        let source = Path::new("/tmp/protocols/organoids.pdf");
        assert_eq!(summary_file_name(source, Some("ENC1")), "organoids_ENC1_calendar.txt");
        assert_eq!(summary_file_name(source, None), "organoids_calendar.txt");
    }

    #[test]
    fn test_summary_content() {
        let entries = vec![DatedEntry {
            day: 2,
            task: "Feed".to_string(),
            date: d(2025, 3, 3),
            experiment_id: "ENC1".to_string(),
        }];
        let generated = d(2025, 3, 1).and_hms_opt(9, 30, 0).unwrap();

        let text = build_summary(Some("Organoids"), Some("ENC1"), d(2025, 3, 1), &entries, generated);

        assert!(text.starts_with("LAB PROTOCOL CALENDAR\nTitle: Organoids\nExperiment ID: ENC1\n"));
        assert!(text.contains("Generated: 2025-03-01 09:30:00\n"));
        assert!(text.contains("Day 0: Saturday, March 01, 2025\n"));
        assert!(text.contains("Day   2 (Monday, March 03, 2025):\n  ID: ENC1, Day 2: Feed\n"));
    }

    #[test]
    fn test_write_summary_into_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_summary(
            dir.path(),
            Path::new("protocol.txt"),
            None,
            None,
            d(2025, 3, 1),
            &[],
        )
        .unwrap();

        assert_eq!(path, dir.path().join("protocol_calendar.txt"));
        assert!(std::fs::read_to_string(path).unwrap().starts_with("LAB PROTOCOL CALENDAR"));
    }
}
