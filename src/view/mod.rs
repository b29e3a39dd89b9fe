//! Shaping aggregated records for a table widget.
//!
//! Pure functions: the host decides how rows reach the browser.

pub mod format;
pub mod html;

pub use format::{display_timestamp, format_count, format_size};
pub use html::{details_html, escape_html, source_link, RenderContext};

use crate::model::AggregatedEntry;
use serde::Serialize;

/// Display pattern for the last-occurrence column.
pub const ROW_TIME_FORMAT: &str = "%b %-d, %Y - %H:%M:%S";

/// Display pattern for the dashboard summary.
pub const DASHBOARD_TIME_FORMAT: &str = "%b %-d, %Y, %H:%M:%S";

/// Number of records shown on the dashboard summary.
pub const DASHBOARD_LIMIT: usize = 10;

/// One table row: 1-based index, category label, details HTML, last occurrence HTML.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntryRow(pub usize, pub String, pub String, pub String);

impl EntryRow {
    /// Category label column.
    pub fn category(&self) -> &str {
        &self.1
    }
}

/// Shape records into table rows, preserving order.
pub fn to_rows(entries: &[AggregatedEntry], ctx: &RenderContext) -> Vec<EntryRow> {
    entries
        .iter()
        .enumerate()
        .map(|(i, entry)| {
            EntryRow(
                i + 1,
                entry.category.label().to_string(),
                details_html(entry, ctx),
                occurrence_html(entry, ctx),
            )
        })
        .collect()
}

/// Last occurrence plus occurrence count suffix.
pub fn occurrence_html(entry: &AggregatedEntry, ctx: &RenderContext) -> String {
    let last = entry
        .last_occurrence()
        .map(|ts| display_timestamp(ts, ctx.utc_offset_minutes, ROW_TIME_FORMAT))
        .unwrap_or_default();
    let count = entry.occurrence_count();
    let noun = if count == 1 { "occurrence" } else { "occurrences" };
    format!(
        "{}<br /><span class=\"dlm-faint\">({} {noun} logged)</span>",
        escape_html(&last),
        format_count(count as u64)
    )
}

/// Rows whose category label equals `label`. `None` keeps every row.
pub fn filter_rows(rows: Vec<EntryRow>, label: Option<&str>) -> Vec<EntryRow> {
    match label {
        Some(label) => rows.into_iter().filter(|row| row.category() == label).collect(),
        None => rows,
    }
}

/// Compact record for the dashboard summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DashboardEntry {
    /// Category label.
    pub category: String,
    /// Last occurrence, localized.
    pub last_occurrence: String,
    /// Details HTML.
    pub details: String,
}

/// The first `limit` records, in master-list order.
pub fn dashboard_entries(
    entries: &[AggregatedEntry],
    ctx: &RenderContext,
    limit: usize,
) -> Vec<DashboardEntry> {
    entries
        .iter()
        .take(limit)
        .map(|entry| DashboardEntry {
            category: entry.category.label().to_string(),
            last_occurrence: entry
                .last_occurrence()
                .map(|ts| display_timestamp(ts, ctx.utc_offset_minutes, DASHBOARD_TIME_FORMAT))
                .unwrap_or_default(),
            details: details_html(entry, ctx),
        })
        .collect()
}

#[cfg(test)]
#[path = "rows_tests.rs"]
mod tests;
