//! Domain model types (pure).
//!
//! All types in this module are plain data; the pipeline stages in [`crate::parser`] produce
//! and consume them.

pub mod category;
pub mod error;
pub mod log_entry;
pub mod provenance;

// Re-export for convenience
pub use category::{builtin_rules, CategoryRule, ErrorCategory};
pub use error::{AppError, InputError, WpConfigError};
pub use log_entry::{AggregatedEntry, ClassifiedEntry, LogEntry, NO_MESSAGE};
pub use provenance::{LocationStyle, Provenance, SourceKind};
