//! Tagging convention shared by both backends.
//!
//! Every stored event carries:
//! - a title `ID: <id>, Day <n>: <task>`
//! - a description/notes field `[EXPERIMENT_ID:<id>] <task>`
//!
//! An event that loses the `[EXPERIMENT_ID:...]` tag (and the title prefix) can no
//! longer be found, removed or updated.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{LabCalError, LabCalResult};

static EXPERIMENT_TAG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\[EXPERIMENT_ID:([^\]]+)\]").expect("valid tag regex"));
static TITLE_ID_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)ID:\s*([^,]+)").expect("valid title id regex"));
static DAY_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)Day\s+(\d+)").expect("valid day regex"));

/// Check that an identifier survives being written into a title and tag and
/// read back unchanged.
///
/// `]` would end the notes tag early and `,` would end the title prefix early.
/// Surrounding whitespace is trimmed on read, and line breaks split the title.
pub fn validate_experiment_id(experiment_id: &str) -> LabCalResult<()> {
    let reason = if experiment_id.trim().is_empty() {
        Some("must not be empty")
    } else if experiment_id.trim() != experiment_id {
        Some("must not start or end with whitespace")
    } else if experiment_id.contains(']') {
        Some("must not contain ']'")
    } else if experiment_id.contains(',') {
        Some("must not contain ','")
    } else if experiment_id.chars().any(char::is_control) {
        Some("must not contain control characters or line breaks")
    } else {
        None
    };

    match reason {
        Some(reason) => Err(LabCalError::InvalidExperimentId {
            id: experiment_id.to_string(),
            reason,
        }),
        None => Ok(()),
    }
}

/// `[EXPERIMENT_ID:<id>]`
pub fn experiment_tag(experiment_id: &str) -> String {
    format!("[EXPERIMENT_ID:{}]", experiment_id)
}

/// `ID: <id>, Day <n>: <task>`
pub fn event_title(experiment_id: &str, day: u32, task: &str) -> String {
    format!("ID: {}, Day {}: {}", experiment_id, day, task)
}

/// `[EXPERIMENT_ID:<id>] <task>`
pub fn event_notes(experiment_id: &str, task: &str) -> String {
    format!("{} {}", experiment_tag(experiment_id), task)
}

/// Read the experiment id out of an `[EXPERIMENT_ID:...]` tag.
pub fn parse_experiment_tag(text: &str) -> Option<String> {
    let id = EXPERIMENT_TAG_RE.captures(text)?.get(1)?.as_str().trim();
    (!id.is_empty()).then(|| id.to_string())
}

/// Read the experiment id, preferring the notes tag and falling back to the
/// `ID: <id>,` title prefix.
pub fn parse_experiment_id(notes: Option<&str>, title: &str) -> Option<String> {
    notes.and_then(parse_experiment_tag).or_else(|| {
        let id = TITLE_ID_RE.captures(title)?.get(1)?.as_str().trim();
        (!id.is_empty()).then(|| id.to_string())
    })
}

/// Read the day number out of a title.
///
/// The `ID: <id>,` prefix is skipped first when present, so an identifier that
/// itself reads like "Day 3" doesn't shadow the real day.
pub fn parse_day(title: &str, experiment_id: &str) -> Option<u32> {
    let prefix = format!("ID: {},", experiment_id);
    let rest = title.strip_prefix(&prefix).unwrap_or(title);
    DAY_RE.captures(rest)?.get(1)?.as_str().parse().ok()
}

/// Case-insensitive containment of the partial query in a stored identifier.
///
/// The query has to start on a segment boundary of the identifier: the start,
/// after a separator, or where letters turn into digits (or back). "enc" finds
/// "ENC1" and "b2-enc" but not "science"; "1" finds "ENC1".
/// Plain substring matching would also accept "nc" and "c1" for "ENC1"; this
/// rule rejects both.
pub fn id_matches(partial: &str, experiment_id: &str) -> bool {
    let needle = partial.to_lowercase();
    let hay = experiment_id.to_lowercase();

    hay.char_indices()
        .map(|(i, _)| i)
        .chain(std::iter::once(hay.len()))
        .filter(|&i| hay[i..].starts_with(&needle))
        .any(|i| is_segment_start(&hay, i))
}

fn is_segment_start(hay: &str, i: usize) -> bool {
    let Some(prev) = hay[..i].chars().next_back() else {
        return true;
    };
    let Some(next) = hay[i..].chars().next() else {
        return true;
    };
    !prev.is_alphanumeric() || !next.is_alphanumeric() || prev.is_alphabetic() != next.is_alphabetic()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_title_and_notes_format() {
        assert_eq!(event_title("ENC1", 5, "Harvest"), "ID: ENC1, Day 5: Harvest");
        assert_eq!(event_notes("ENC1", "Harvest"), "[EXPERIMENT_ID:ENC1] Harvest");
    }

    #[test]
    fn test_parse_tag_roundtrip() {
        let notes = event_notes("enc-2", "Seed cells");
        assert_eq!(parse_experiment_tag(&notes).as_deref(), Some("enc-2"));
        assert_eq!(
            parse_experiment_tag("[experiment_id: ENC1 ] text").as_deref(),
            Some("ENC1"),
            "Tag match is case-insensitive and trims the id"
        );
        assert_eq!(parse_experiment_tag("no tag here"), None);
    }

    #[test]
    fn test_parse_experiment_id_falls_back_to_title() {
        let title = event_title("ENC1", 2, "Change media");
        assert_eq!(parse_experiment_id(None, &title).as_deref(), Some("ENC1"));
        assert_eq!(
            parse_experiment_id(Some("edited notes without tag"), &title).as_deref(),
            Some("ENC1")
        );
        assert_eq!(parse_experiment_id(None, "Lunch"), None);
    }

    #[test]
    fn test_parse_day_skips_id_prefix() {
        assert_eq!(parse_day(&event_title("ENC1", 12, "Stain"), "ENC1"), Some(12));
        assert_eq!(
            parse_day(&event_title("Day 3 batch", 7, "Stain"), "Day 3 batch"),
            Some(7)
        );
        assert_eq!(parse_day("ID: ENC1, no day", "ENC1"), None);
    }

    #[test]
    fn test_id_matches_is_case_insensitive_containment() {
        assert!(id_matches("enc", "ENC1"));
        assert!(id_matches("enc", "enc-2"));
        assert!(!id_matches("enc", "science"));
        assert!(!id_matches("ENC12", "ENC1"), "Query must be contained in the id, not the reverse");
    }

    #[test]
    fn test_id_matches_segment_boundaries() {
        assert!(id_matches("1", "ENC1"));
        assert!(id_matches("enc", "b2-ENC"));
        assert!(id_matches("enc", "b2enc"), "Digit to letter is a boundary");
        assert!(id_matches("", "ENC1"), "Empty query matches every id");
        assert!(!id_matches("nc", "ENC1"));
    }

    #[test]
    fn test_id_matches_rejects_mid_segment_substrings() {
        assert!(
            !id_matches("nc", "ENC1"),
            "\"nc\" starts inside the ENC segment"
        );
        assert!(
            !id_matches("c1", "ENC1"),
            "\"c1\" starts inside the ENC segment"
        );
        assert!(!id_matches("cien", "science"));
        assert!(id_matches("enc1", "ENC1"), "The whole id is always a match");
    }

    #[test]
    fn test_validate_experiment_id_accepts_usual_ids() {
        for id in ["ENC1", "enc-2", "Day 3 batch", "b2_enc.v1"] {
            assert!(validate_experiment_id(id).is_ok(), "{} should be accepted", id);
        }
    }

    #[test]
    fn test_validate_experiment_id_rejects_ids_that_break_tags() {
        for id in ["", "   ", " ENC1", "ENC1 ", "ENC]1", "ENC,1", "ENC\n1"] {
            let err = validate_experiment_id(id).unwrap_err();
            assert!(
                matches!(err, LabCalError::InvalidExperimentId { .. }),
                "{:?} should be rejected, got {:?}",
                id,
                err
            );
        }
    }

    #[test]
    fn test_valid_ids_read_back_unchanged() {
        let id = "Day 3 batch";
        validate_experiment_id(id).unwrap();
        let title = event_title(id, 4, "Stain");
        let notes = event_notes(id, "Stain");

        assert_eq!(parse_experiment_id(Some(&notes), &title).as_deref(), Some(id));
        assert_eq!(parse_experiment_id(None, &title).as_deref(), Some(id));
    }
}
