//! Debug log parsing pipeline.
//!
//! Raw log text flows through four pure stages:
//!
//! 1. [`segment`]: split into timestamped entries, newest first
//! 2. [`classify`]: detect the category and strip its prefix
//! 3. [`provenance`]: locate the file/line and owning component
//! 4. [`aggregate`]: fold duplicate messages into one record each
//!
//! None of the stages fail on malformed input. An odd fragment becomes a placeholder entry
//! and an unparseable path leaves the entry unannotated.

pub mod aggregate;
pub mod classify;
pub mod provenance;
pub mod segment;

pub use aggregate::aggregate;
pub use classify::Classifier;
pub use provenance::ProvenanceExtractor;
pub use segment::{segment, SegmentOptions};

use crate::model::{AggregatedEntry, ClassifiedEntry, LogEntry};
use crate::registry::ComponentRegistry;

/// The full segment → classify → extract → aggregate pipeline.
///
/// Holds no state between runs: every call re-parses the text it is given.
pub struct LogPipeline {
    classifier: Classifier,
    segment_options: SegmentOptions,
    app_root: String,
    registry: Box<dyn ComponentRegistry>,
}

impl LogPipeline {
    /// Create a pipeline with the built-in classifier.
    pub fn new(app_root: impl Into<String>, registry: Box<dyn ComponentRegistry>) -> Self {
        Self {
            classifier: Classifier::default(),
            segment_options: SegmentOptions::default(),
            app_root: app_root.into(),
            registry,
        }
    }

    /// Replace the classifier.
    pub fn with_classifier(mut self, classifier: Classifier) -> Self {
        self.classifier = classifier;
        self
    }

    /// Replace the segmentation options.
    pub fn with_segment_options(mut self, options: SegmentOptions) -> Self {
        self.segment_options = options;
        self
    }

    /// Application root used for provenance detection.
    pub fn app_root(&self) -> &str {
        &self.app_root
    }

    /// Run all stages over `raw` and return the master list.
    pub fn run(&self, raw: &str) -> Vec<AggregatedEntry> {
        let entries = segment(raw, self.segment_options);
        let segmented = entries.len();

        let extractor = ProvenanceExtractor::new(&self.app_root, self.registry.as_ref());
        let classified = entries
            .iter()
            .map(|entry| self.classify_entry(entry, &extractor));
        let records = aggregate(classified);

        tracing::debug!(
            bytes = raw.len(),
            entries = segmented,
            distinct = records.len(),
            "Parsed debug log"
        );
        records
    }

    fn classify_entry(&self, entry: &LogEntry, extractor: &ProvenanceExtractor<'_>) -> ClassifiedEntry {
        let (category, details) = self.classifier.classify(entry.raw_message());
        let provenance = extractor.extract(&details);
        ClassifiedEntry {
            timestamp: entry.timestamp().to_string(),
            category,
            details,
            provenance,
        }
    }
}

#[cfg(test)]
#[path = "parser_tests.rs"]
mod tests;
