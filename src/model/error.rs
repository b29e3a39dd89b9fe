//! Error types for the debug log manager.
//!
//! This module defines the error taxonomy using `thiserror`. Errors compose via `?` and
//! `From` conversions up to [`AppError`].
//!
//! # Error Hierarchy
//!
//! - [`AppError`] - Top-level error returned from service operations
//!   - [`InputError`] - Log file reading/writing failures
//!   - [`WpConfigError`] - `wp-config.php` parse and mutation failures
//!
//! # Error Recovery Strategy
//!
//! Parsing the log itself is **total**: a malformed entry gets a placeholder message and an
//! unrecognized file path simply leaves provenance fields empty. Only I/O and config
//! transformer failures surface as errors, and each aborts just the single requested
//! operation. Nothing is retried.

use std::path::PathBuf;
use thiserror::Error;

use crate::wpconfig::ConfigKind;

/// Top-level error encompassing all failure modes of a service operation.
#[derive(Debug, Error)]
pub enum AppError {
    /// Failed to read or write the debug log file.
    #[error("Debug log error: {0}")]
    Input(#[from] InputError),

    /// Failed to read, parse or update `wp-config.php`.
    ///
    /// The file is re-read on every call, so a failed mutation leaves no stale state behind.
    #[error("wp-config.php error: {0}")]
    WpConfig(#[from] WpConfigError),

    /// No `wp-config.php` was configured and none was found near the install root.
    #[error("wp-config.php not found for the installation at {app_root}")]
    WpConfigMissing {
        /// Install root that was searched.
        app_root: PathBuf,
    },
}

/// Errors encountered when reading or mutating the debug log file.
#[derive(Debug, Error)]
pub enum InputError {
    /// The debug log file does not exist at the configured path.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::path::PathBuf;
    /// use dlm::model::error::InputError;
    ///
    /// let err = InputError::FileNotFound {
    ///     path: PathBuf::from("/tmp/missing_debug.log")
    /// };
    /// assert!(err.to_string().contains("/tmp/missing_debug.log"));
    /// ```
    #[error("File not found: {path}")]
    FileNotFound {
        /// The path that was not found.
        path: PathBuf,
    },

    /// Generic I/O error on the log file (permissions, disk errors).
    #[error("I/O error on {path}: {source}")]
    Io {
        /// The file being accessed.
        path: PathBuf,
        /// Underlying OS error.
        #[source]
        source: std::io::Error,
    },
}

/// Failures of the `wp-config.php` transformer.
///
/// Each variant aborts only the requested call. Callers are responsible for user-facing
/// messaging.
#[derive(Debug, Error)]
pub enum WpConfigError {
    /// The config file could not be read at all.
    #[error("Unable to read config file {path}: {source}")]
    Read {
        /// Config file path.
        path: PathBuf,
        /// Underlying OS error.
        #[source]
        source: std::io::Error,
    },

    /// The config file is empty or whitespace-only, so nothing can be parsed.
    #[error("Config file is empty: {path}")]
    EmptyFile {
        /// Config file path.
        path: PathBuf,
    },

    /// A config kind name other than `constant` or `variable` was requested.
    ///
    /// # Examples
    ///
    /// ```
    /// use dlm::model::error::WpConfigError;
    ///
    /// let err = WpConfigError::UnknownConfigType("setting".to_string());
    /// assert_eq!(err.to_string(), "Config type 'setting' does not exist.");
    /// ```
    #[error("Config type '{0}' does not exist.")]
    UnknownConfigType(String),

    /// The requested statement is not defined in the config file.
    #[error("Config {kind} '{name}' is not defined.")]
    NotFound {
        /// Statement kind.
        kind: ConfigKind,
        /// Statement name.
        name: String,
    },

    /// Neither sentinel comment was found and the caller did not ask for EOF placement.
    #[error("Unable to locate placement anchor.")]
    AnchorNotFound,

    /// A raw (unquoted) value was requested for an empty string.
    #[error("Raw value for empty string not supported.")]
    EmptyValue,

    /// Refused to write blank content over the config file.
    #[error("Cannot save the config file with empty contents.")]
    EmptyContent,

    /// Writing the config file failed.
    #[error("Failed to update the config file {path}: {source}")]
    Write {
        /// Config file path.
        path: PathBuf,
        /// Underlying OS error.
        #[source]
        source: std::io::Error,
    },
}
