//! Error categories and the ordered rules that detect them.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Severity/category of a log entry.
///
/// The built-in variants cover the PHP runtime, database and browser errors. New runtime
/// message formats can be covered with [`ErrorCategory::Custom`] rules from configuration
/// rather than new control flow.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorCategory {
    /// `PHP Fatal error`, `FATAL`, `E_ERROR`.
    Fatal,
    /// `PHP Warning`, `E_WARNING`.
    Warning,
    /// `PHP Notice`, `E_NOTICE`.
    Notice,
    /// `PHP Deprecated`.
    Deprecated,
    /// `PHP Parse error`, `E_PARSE`.
    Parse,
    /// `EXCEPTION:`.
    Exception,
    /// Database errors reported by the application.
    Database,
    /// Browser-side errors reported back to the server.
    JavaScript,
    /// Anything no rule matched.
    Other,
    /// Category contributed by configuration, identified by its display label.
    Custom(String),
}

impl ErrorCategory {
    /// Display label, also used as the value of the category filter.
    pub fn label(&self) -> &str {
        match self {
            ErrorCategory::Fatal => "PHP Fatal",
            ErrorCategory::Warning => "PHP Warning",
            ErrorCategory::Notice => "PHP Notice",
            ErrorCategory::Deprecated => "PHP Deprecated",
            ErrorCategory::Parse => "PHP Parse",
            ErrorCategory::Exception => "Exception",
            ErrorCategory::Database => "Database",
            ErrorCategory::JavaScript => "JavaScript",
            ErrorCategory::Other => "Other",
            ErrorCategory::Custom(label) => label,
        }
    }

    /// Resolve a filter label back into a category.
    ///
    /// Unknown labels become [`ErrorCategory::Custom`].
    pub fn from_label(label: &str) -> Self {
        match label {
            "PHP Fatal" => ErrorCategory::Fatal,
            "PHP Warning" => ErrorCategory::Warning,
            "PHP Notice" => ErrorCategory::Notice,
            "PHP Deprecated" => ErrorCategory::Deprecated,
            "PHP Parse" => ErrorCategory::Parse,
            "Exception" => ErrorCategory::Exception,
            "Database" => ErrorCategory::Database,
            "JavaScript" => ErrorCategory::JavaScript,
            "Other" => ErrorCategory::Other,
            custom => ErrorCategory::Custom(custom.to_string()),
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One step of the ordered classification table.
///
/// A rule matches when the message contains any of `needles`; every occurrence of each
/// `strip` phrase is then removed from the message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryRule {
    /// Category assigned on match.
    pub category: ErrorCategory,
    /// Substrings that select this rule.
    pub needles: Vec<String>,
    /// Prefix phrases removed from the message on match.
    pub strip: Vec<String>,
}

impl CategoryRule {
    /// Build a rule from string slices.
    pub fn new(category: ErrorCategory, needles: &[&str], strip: &[&str]) -> Self {
        Self {
            category,
            needles: needles.iter().map(|s| s.to_string()).collect(),
            strip: strip.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Returns true if the message selects this rule.
    pub fn matches(&self, message: &str) -> bool {
        self.needles.iter().any(|needle| message.contains(needle.as_str()))
    }
}

/// The built-in rule table in priority order. Order matters: the first match wins.
pub fn builtin_rules() -> Vec<CategoryRule> {
    vec![
        CategoryRule::new(
            ErrorCategory::Fatal,
            &["PHP Fatal", "FATAL", "E_ERROR"],
            &["PHP Fatal error: ", "PHP Fatal: "],
        ),
        CategoryRule::new(
            ErrorCategory::Warning,
            &["PHP Warning", "E_WARNING"],
            &["PHP Warning: "],
        ),
        CategoryRule::new(
            ErrorCategory::Notice,
            &["PHP Notice", "E_NOTICE"],
            &["PHP Notice: "],
        ),
        CategoryRule::new(
            ErrorCategory::Deprecated,
            &["PHP Deprecated"],
            &["PHP Deprecated: "],
        ),
        CategoryRule::new(
            ErrorCategory::Parse,
            &["PHP Parse", "E_PARSE"],
            &["PHP Parse error: "],
        ),
        CategoryRule::new(ErrorCategory::Exception, &["EXCEPTION:"], &["EXCEPTION: "]),
        CategoryRule::new(
            ErrorCategory::Database,
            &["WordPress database error"],
            &["WordPress database error "],
        ),
        CategoryRule::new(
            ErrorCategory::JavaScript,
            &["JavaScript Error"],
            &["JavaScript Error: "],
        ),
    ]
}
