//! Display label resolution for recordings.
//!
//! Picks the first usable candidate from an ordered list of sources and
//! turns it into a string that is safe to use as a single path component.

use crate::domain::{DisplayZone, Recording};

/// Maximum label length in bytes. Cuts never split a character.
pub const MAX_LABEL_BYTES: usize = 200;

/// strftime format used when a recording has no title.
pub const DATE_LABEL_FORMAT: &str = "%Y-%m-%d %H.%M.%S";

/// Characters that are not allowed in file names on common filesystems.
const ILLEGAL_CHARS: &[char] = &['/', '\\', ':', '*', '?', '"', '<', '>', '|'];

/// Where a resolved label came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelSource {
    /// `ZCUSTOMLABELFORSORTING`.
    PrimaryLabel,
    /// `ZCUSTOMLABEL`.
    LegacyLabel,
    /// Formatted recording date.
    RecordedAt,
    /// The recording's unique identifier.
    UniqueId,
    /// Nothing usable; built from the primary key.
    RowId,
}

/// Candidate sources in precedence order.
pub const LABEL_PRECEDENCE: [LabelSource; 4] = [
    LabelSource::PrimaryLabel,
    LabelSource::LegacyLabel,
    LabelSource::RecordedAt,
    LabelSource::UniqueId,
];

/// A sanitized label and its origin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedLabel {
    pub text: String,
    pub source: LabelSource,
}

/// Resolves display labels for recordings.
#[derive(Debug, Clone, Copy, Default)]
pub struct LabelResolver {
    zone: DisplayZone,
}

impl LabelResolver {
    /// Create a resolver rendering date fallbacks in the given zone.
    #[must_use]
    pub const fn new(zone: DisplayZone) -> Self {
        Self { zone }
    }

    /// Resolves the label for a recording.
    #[must_use]
    pub fn resolve(&self, recording: &Recording) -> ResolvedLabel {
        LABEL_PRECEDENCE
            .iter()
            .find_map(|&source| {
                self.candidate(recording, source)
                    .map(|raw| sanitize_label(&raw))
                    .filter(|text| !text.is_empty())
                    .map(|text| ResolvedLabel { text, source })
            })
            .unwrap_or_else(|| ResolvedLabel {
                text: format!("Recording {}", recording.id),
                source: LabelSource::RowId,
            })
    }

    fn candidate(&self, recording: &Recording, source: LabelSource) -> Option<String> {
        match source {
            LabelSource::PrimaryLabel => recording.label_primary.clone(),
            LabelSource::LegacyLabel => recording.label_legacy.clone(),
            LabelSource::RecordedAt => recording
                .recorded_datetime()
                .and_then(|dt| self.zone.format(dt, DATE_LABEL_FORMAT)),
            LabelSource::UniqueId => recording.unique_id.clone(),
            LabelSource::RowId => None,
        }
    }
}

/// Makes a string safe to use as a file name component.
///
/// Applying it twice gives the same result as applying it once.
#[must_use]
pub fn sanitize_label(raw: &str) -> String {
    let replaced: String = raw
        .chars()
        .map(|c| {
            if ILLEGAL_CHARS.contains(&c) {
                '_'
            } else if c.is_control() {
                ' '
            } else {
                c
            }
        })
        .collect();

    let collapsed = replaced.split_whitespace().collect::<Vec<_>>().join(" ");
    let trimmed = trim_edges(&collapsed);
    trim_edges(truncate_at_char_boundary(trimmed, MAX_LABEL_BYTES)).to_string()
}

/// Replaces path separators and other illegal characters only.
///
/// Used for the date prefix, where spacing is part of the format.
#[must_use]
pub fn replace_illegal(raw: &str) -> String {
    raw.chars()
        .map(|c| {
            if ILLEGAL_CHARS.contains(&c) || c.is_control() {
                '_'
            } else {
                c
            }
        })
        .collect()
}

fn trim_edges(s: &str) -> &str {
    s.trim_matches(|c: char| c == '.' || c.is_whitespace())
}

fn truncate_at_char_boundary(s: &str, max_bytes: usize) -> &str {
    if s.len() <= max_bytes {
        return s;
    }

    let mut end = max_bytes;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SchemaVariant;

    fn recording() -> Recording {
        Recording {
            id: 42,
            folder_id: None,
            recorded_at: 700_000_000.0,
            duration_seconds: Some(3.0),
            label_primary: None,
            label_legacy: None,
            relative_audio_path: Some("a.m4a".into()),
            unique_id: Some("5B0F-UUID".into()),
            variant: SchemaVariant::Cloud,
        }
    }

    #[test]
    fn test_primary_label_wins() {
        let mut rec = recording();
        rec.label_primary = Some("Meeting Notes".into());
        rec.label_legacy = Some("Old Title".into());

        let label = LabelResolver::new(DisplayZone::Utc).resolve(&rec);
        assert_eq!(label.text, "Meeting Notes");
        assert_eq!(label.source, LabelSource::PrimaryLabel);
    }

    #[test]
    fn test_blank_primary_falls_back_to_legacy() {
        let mut rec = recording();
        rec.label_primary = Some("  \t ".into());
        rec.label_legacy = Some("Old Title".into());

        let label = LabelResolver::new(DisplayZone::Utc).resolve(&rec);
        assert_eq!(label.text, "Old Title");
        assert_eq!(label.source, LabelSource::LegacyLabel);
    }

    #[test]
    fn test_date_fallback() {
        let label = LabelResolver::new(DisplayZone::Utc).resolve(&recording());
        assert_eq!(label.text, "2023-03-08 20.26.40");
        assert_eq!(label.source, LabelSource::RecordedAt);
    }

    #[test]
    fn test_unique_id_fallback_when_date_unusable() {
        let mut rec = recording();
        rec.recorded_at = f64::MAX;

        let label = LabelResolver::new(DisplayZone::Utc).resolve(&rec);
        assert_eq!(label.text, "5B0F-UUID");
        assert_eq!(label.source, LabelSource::UniqueId);

        rec.unique_id = None;
        let label = LabelResolver::new(DisplayZone::Utc).resolve(&rec);
        assert_eq!(label.text, "Recording 42");
        assert_eq!(label.source, LabelSource::RowId);
    }

    #[test]
    fn test_sanitize_replaces_illegal_chars() {
        assert_eq!(sanitize_label("a/b:c\\d"), "a_b_c_d");
        assert_eq!(sanitize_label("line\nbreak\ttab"), "line break tab");
        assert_eq!(sanitize_label("  many    spaces  "), "many spaces");
        assert_eq!(sanitize_label("trailing dots..."), "trailing dots");
        assert_eq!(sanitize_label(".hidden"), "hidden");
        assert_eq!(sanitize_label(" . . "), "");
    }

    #[test]
    fn test_sanitize_truncates_on_char_boundary() {
        let long = "é".repeat(150);
        let out = sanitize_label(&long);
        assert!(out.len() <= MAX_LABEL_BYTES);
        assert_eq!(out.chars().count(), 100);

        let mixed = format!("a{}", "日本".repeat(100));
        let out = sanitize_label(&mixed);
        assert!(out.len() <= MAX_LABEL_BYTES);
        assert!(out.starts_with('a'));
    }

    #[test]
    fn test_sanitize_truncation_does_not_leave_trailing_space() {
        let raw = format!("{} tail", "x".repeat(MAX_LABEL_BYTES - 1));
        let out = sanitize_label(&raw);
        assert_eq!(out, "x".repeat(MAX_LABEL_BYTES - 1));
    }

    #[test]
    fn test_sanitize_idempotent() {
        let inputs = vec![
            "Meeting Notes".to_string(),
            " a/b .. c:d.. ".to_string(),
            "\u{7}bell\u{0}null".to_string(),
            "word ".repeat(80),
            format!("{}.", "ü".repeat(120)),
        ];
        for input in &inputs {
            let once = sanitize_label(input);
            assert_eq!(sanitize_label(&once), once, "input: {input:?}");
        }
    }

    #[test]
    fn test_replace_illegal_keeps_spacing() {
        assert_eq!(replace_illegal("%Y/%m %d "), "%Y_%m %d ");
    }
}
