//! Extraction report.

use serde::{Deserialize, Serialize};

/// Outcome recorded for one field or span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryStatus {
    /// The value made it into the profile.
    Extracted,
    /// A span looked like this field but scored below the threshold.
    Ambiguous,
    /// A candidate lost to a better-scoring (or earlier) one.
    Superseded,
    /// Nothing was found for this field or section.
    Absent,
}

/// One line of the extraction report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportEntry {
    /// Field path (`contact.email`, `experience[1].role`) or section name
    pub field: String,

    /// Confidence in [0, 1]; 0 for absent fields
    pub confidence: f32,

    pub status: EntryStatus,

    /// Leading text of the span, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub excerpt: Option<String>,
}

/// Per-field record of what the extractor decided.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractionReport {
    pub entries: Vec<ReportEntry>,
}

const EXCERPT_CHARS: usize = 60;

impl ExtractionReport {
    /// Create an empty report.
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record(
        &mut self,
        field: impl Into<String>,
        confidence: f32,
        status: EntryStatus,
        text: Option<&str>,
    ) {
        self.entries.push(ReportEntry {
            field: field.into(),
            confidence,
            status,
            excerpt: text.map(excerpt),
        });
    }

    /// Entries with the given status.
    pub fn with_status(&self, status: EntryStatus) -> impl Iterator<Item = &ReportEntry> {
        self.entries.iter().filter(move |e| e.status == status)
    }

    /// Status recorded for a field, preferring `Extracted` over other outcomes.
    pub fn status_of(&self, field: &str) -> Option<EntryStatus> {
        let mut found = None;
        for entry in self.entries.iter().filter(|e| e.field == field) {
            if entry.status == EntryStatus::Extracted {
                return Some(EntryStatus::Extracted);
            }
            found.get_or_insert(entry.status);
        }
        found
    }

    /// Number of spans reported as ambiguous.
    pub fn ambiguous_count(&self) -> usize {
        self.with_status(EntryStatus::Ambiguous).count()
    }
}

fn excerpt(text: &str) -> String {
    if text.chars().count() <= EXCERPT_CHARS {
        return text.to_string();
    }
    let mut out: String = text.chars().take(EXCERPT_CHARS).collect();
    out.push('…');
    out
}
