//! Terminal rendering for schedules and sync reports, colored with owo_colors.

use labcal_core::DatedEntry;
use labcal_core::sync::{ExperimentUpdate, UpdateReport};
use owo_colors::OwoColorize;

/// Extension trait for colored terminal rendering.
pub trait Render {
    fn render(&self) -> String;
}

/// `Day   N (Weekday, Month DD, YYYY):`
pub fn day_heading(entry: &DatedEntry) -> String {
    format!(
        "Day {:>3} ({}):",
        entry.day,
        entry.date.format("%A, %B %d, %Y")
    )
}

/// The task line, tagged with the experiment id when there is one.
pub fn task_line(entry: &DatedEntry, id: Option<&str>) -> String {
    match id {
        Some(id) => format!("ID: {}, Day {}: {}", id, entry.day, entry.task),
        None => entry.task.clone(),
    }
}

pub fn render_schedule(title: Option<&str>, entries: &[DatedEntry], id: Option<&str>) -> String {
    let mut lines = Vec::new();

    if let Some(title) = title {
        lines.push(title.bold().to_string());
    }
    if let Some(first) = entries.first() {
        lines.push(format!(
            "{} {}",
            "Day 0:".dimmed(),
            first
                .date
                .checked_sub_days(chrono::Days::new(u64::from(first.day)))
                .unwrap_or(first.date)
                .format("%A, %B %d, %Y")
        ));
    }
    lines.push(String::new());

    for entry in entries {
        lines.push(day_heading(entry).cyan().to_string());
        lines.push(format!("  {}", task_line(entry, id)));
    }

    lines.push(String::new());
    lines.join("\n")
}

impl Render for ExperimentUpdate {
    fn render(&self) -> String {
        let marker = if self.success() {
            "✓".green().to_string()
        } else {
            "✗".red().to_string()
        };
        let mut lines = vec![format!(
            "{} {} {}",
            marker,
            self.experiment_id.bold(),
            format!("(Day 0: {})", self.reference_date).dimmed()
        )];

        if let Some(error) = &self.error {
            lines.push(format!("   {}", error.red()));
            return lines.join("\n");
        }
        if let Some(removed) = &self.removed {
            lines.push(format!("   {} removed {}", "-".red(), removed.removed));
            for failure in &removed.failures {
                lines.push(format!("     {}", failure.yellow()));
            }
        }
        if let Some(added) = &self.added {
            lines.push(format!(
                "   {} added {} of {}",
                "+".green(),
                added.added,
                added.requested
            ));
            for failure in &added.failures {
                lines.push(format!("     {}", failure.yellow()));
            }
        }
        lines.join("\n")
    }
}

impl Render for UpdateReport {
    fn render(&self) -> String {
        if self.experiments.is_empty() {
            return String::new();
        }

        let mut lines = vec![format!(
            "Updating {} {} on the {}",
            self.experiments.len(),
            if self.experiments.len() == 1 {
                "experiment"
            } else {
                "experiments"
            },
            self.backend
        )];
        lines.extend(self.experiments.iter().map(Render::render));
        lines.push(String::new());
        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn entry(day: u32, date: NaiveDate) -> DatedEntry {
        DatedEntry {
            day,
            task: "Change media".to_string(),
            date,
            experiment_id: "ENC1".to_string(),
        }
    }

    #[test]
    fn test_day_heading_format() {
        let e = entry(5, NaiveDate::from_ymd_opt(2025, 3, 6).unwrap());
        assert_eq!(day_heading(&e), "Day   5 (Thursday, March 06, 2025):");
    }

    #[test]
    fn test_task_line_with_and_without_id() {
        let e = entry(5, NaiveDate::from_ymd_opt(2025, 3, 6).unwrap());
        assert_eq!(task_line(&e, Some("ENC1")), "ID: ENC1, Day 5: Change media");
        assert_eq!(task_line(&e, None), "Change media");
    }
}
