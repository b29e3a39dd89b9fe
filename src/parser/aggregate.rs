//! Deduplication of classified entries into the master list.

use crate::model::{AggregatedEntry, ClassifiedEntry};
use std::collections::HashMap;

/// Group entries with identical details.
///
/// Input is newest first. Each distinct `details` value yields one record, ordered by its
/// first appearance, carrying every timestamp it was logged at (most recent first). Category
/// and provenance come from the first-seen occurrence.
pub fn aggregate(entries: impl IntoIterator<Item = ClassifiedEntry>) -> Vec<AggregatedEntry> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut records: Vec<AggregatedEntry> = Vec::new();

    for entry in entries {
        match index.get(&entry.details) {
            Some(&slot) => records[slot].occurrences.push(entry.timestamp),
            None => {
                index.insert(entry.details.clone(), records.len());
                records.push(AggregatedEntry::from_first(entry));
            }
        }
    }

    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ErrorCategory;

    fn entry(timestamp: &str, category: ErrorCategory, details: &str) -> ClassifiedEntry {
        ClassifiedEntry {
            timestamp: timestamp.into(),
            category,
            details: details.into(),
            provenance: None,
        }
    }

    #[test]
    fn duplicates_collapse_in_first_seen_order() {
        let records = aggregate(vec![
            entry("t3", ErrorCategory::Warning, "a"),
            entry("t2", ErrorCategory::Notice, "b"),
            entry("t1", ErrorCategory::Warning, "a"),
        ]);

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].details, "a");
        assert_eq!(records[0].occurrences, vec!["t3", "t1"]);
        assert_eq!(records[1].details, "b");
        assert_eq!(records[1].occurrence_count(), 1);
    }

    #[test]
    fn first_seen_category_is_kept() {
        let records = aggregate(vec![
            entry("t2", ErrorCategory::Fatal, "same"),
            entry("t1", ErrorCategory::Other, "same"),
        ]);
        assert_eq!(records[0].category, ErrorCategory::Fatal);
    }

    #[test]
    fn empty_input() {
        assert!(aggregate(Vec::new()).is_empty());
    }
}
