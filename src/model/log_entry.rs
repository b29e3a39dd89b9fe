//! Log entry types at each stage of the pipeline.
//!
//! `LogEntry` comes out of the segmenter, `ClassifiedEntry` out of the classifier and
//! provenance extractor, and `AggregatedEntry` is the deduplicated master-list unit.

use crate::model::{ErrorCategory, Provenance};
use serde::Serialize;

/// Placeholder for fragments that carry a timestamp but no message.
pub const NO_MESSAGE: &str = "No error message specified...";

// ===== LogEntry =====

/// A single segmented entry, before classification.
/// Invariant: `raw_message` is never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    timestamp: String,
    raw_message: String,
}

impl LogEntry {
    /// Create a new entry. An empty or whitespace-only message is replaced by [`NO_MESSAGE`].
    pub fn new(timestamp: impl Into<String>, raw_message: impl Into<String>) -> Self {
        let raw_message = raw_message.into();
        let raw_message = if raw_message.trim().is_empty() {
            NO_MESSAGE.to_string()
        } else {
            raw_message
        };
        Self {
            timestamp: timestamp.into(),
            raw_message,
        }
    }

    /// Timestamp text exactly as embedded in the log.
    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }

    /// Message text, possibly multi-line.
    pub fn raw_message(&self) -> &str {
        &self.raw_message
    }
}

// ===== ClassifiedEntry =====

/// A log entry with its category and provenance resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedEntry {
    /// Timestamp text.
    pub timestamp: String,
    /// Detected category.
    pub category: ErrorCategory,
    /// Message with its category prefix stripped and whitespace trimmed. Dedup key.
    pub details: String,
    /// File/line provenance, when the message embeds a path under the app root.
    pub provenance: Option<Provenance>,
}

// ===== AggregatedEntry =====

/// One distinct message with all the timestamps it was logged at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AggregatedEntry {
    /// Category of the first-seen occurrence.
    pub category: ErrorCategory,
    /// Dedup key.
    pub details: String,
    /// Provenance of the first-seen occurrence.
    pub provenance: Option<Provenance>,
    /// Timestamps, most recent first.
    pub occurrences: Vec<String>,
}

impl AggregatedEntry {
    /// Start a record from its first (most recent) occurrence.
    pub fn from_first(entry: ClassifiedEntry) -> Self {
        Self {
            category: entry.category,
            details: entry.details,
            provenance: entry.provenance,
            occurrences: vec![entry.timestamp],
        }
    }

    /// The most recent timestamp.
    pub fn last_occurrence(&self) -> Option<&str> {
        self.occurrences.first().map(String::as_str)
    }

    /// Number of times the message was logged.
    pub fn occurrence_count(&self) -> usize {
        self.occurrences.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_message_gets_placeholder() {
        let entry = LogEntry::new("29-Nov-2023 01:30:03 UTC", "   \n");
        assert_eq!(entry.raw_message(), NO_MESSAGE);
    }

    #[test]
    fn message_is_kept_verbatim() {
        let entry = LogEntry::new("ts", "PHP Notice: x\n");
        assert_eq!(entry.timestamp(), "ts");
        assert_eq!(entry.raw_message(), "PHP Notice: x\n");
    }

    #[test]
    fn aggregated_entry_starts_with_one_occurrence() {
        let record = AggregatedEntry::from_first(ClassifiedEntry {
            timestamp: "t1".into(),
            category: ErrorCategory::Other,
            details: "boom".into(),
            provenance: None,
        });
        assert_eq!(record.occurrence_count(), 1);
        assert_eq!(record.last_occurrence(), Some("t1"));
    }
}
