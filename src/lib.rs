//! Debug Log Manager (dlm)
//!
//! Reads a PHP error log, folds repeated messages into one record each, classifies and
//! annotates them with the theme or plugin they came from, and shapes them into table rows.
//! Debug logging itself is switched on and off by editing `wp-config.php` in place.
//!
//! Pure parsing lives in [`parser`] and [`view`]; file access lives in [`source`] and
//! [`wpconfig`]; [`service::DebugLogManager`] wires them together.

pub mod config;
pub mod logging;
pub mod model;
pub mod parser;
pub mod registry;
pub mod service;
pub mod source;
pub mod view;
pub mod wpconfig;

pub use service::{DebugLogManager, LoggingStatus, ToggleOutcome};
