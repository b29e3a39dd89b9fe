//! Category detection and prefix stripping.

use crate::model::{builtin_rules, CategoryRule, ErrorCategory};

/// Ordered, first-match-wins classifier.
///
/// Built-in rules come first, then any configured rules, then the `Other` fallback.
#[derive(Debug, Clone)]
pub struct Classifier {
    rules: Vec<CategoryRule>,
}

impl Default for Classifier {
    fn default() -> Self {
        Self {
            rules: builtin_rules(),
        }
    }
}

impl Classifier {
    /// Built-in rules followed by `extra` rules.
    pub fn with_extra_rules(extra: impl IntoIterator<Item = CategoryRule>) -> Self {
        let mut rules = builtin_rules();
        rules.extend(extra);
        Self { rules }
    }

    /// Rules in evaluation order.
    pub fn rules(&self) -> &[CategoryRule] {
        &self.rules
    }

    /// Determine the category and return the message with its prefix phrases removed.
    ///
    /// The returned details are trimmed; they are the dedup key downstream.
    pub fn classify(&self, message: &str) -> (ErrorCategory, String) {
        match self.rules.iter().find(|rule| rule.matches(message)) {
            Some(rule) => {
                let details = rule
                    .strip
                    .iter()
                    .fold(message.to_string(), |text, phrase| text.replace(phrase.as_str(), ""));
                (rule.category.clone(), details.trim().to_string())
            }
            None => (ErrorCategory::Other, message.trim().to_string()),
        }
    }
}

/// Classify with the built-in rules only.
pub fn classify(message: &str) -> (ErrorCategory, String) {
    Classifier::default().classify(message)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fatal_strips_both_prefix_variants() {
        let (category, details) = classify("PHP Fatal error:  Uncaught Error: boom");
        assert_eq!(category, ErrorCategory::Fatal);
        assert_eq!(details, "Uncaught Error: boom");

        let (category, details) = classify("PHP Fatal: short form");
        assert_eq!(category, ErrorCategory::Fatal);
        assert_eq!(details, "short form");
    }

    #[test]
    fn fatal_matches_alternate_keywords() {
        assert_eq!(classify("FATAL: disk gone").0, ErrorCategory::Fatal);
        assert_eq!(classify("level E_ERROR raised").0, ErrorCategory::Fatal);
    }

    #[test]
    fn each_builtin_category_is_detected() {
        let cases = [
            ("PHP Warning:  Undefined variable $x", ErrorCategory::Warning, "Undefined variable $x"),
            ("PHP Notice:  Trying to get property", ErrorCategory::Notice, "Trying to get property"),
            ("PHP Deprecated:  Creation of dynamic property", ErrorCategory::Deprecated, "Creation of dynamic property"),
            ("PHP Parse error:  syntax error", ErrorCategory::Parse, "syntax error"),
            ("EXCEPTION: Stripe timeout", ErrorCategory::Exception, "Stripe timeout"),
            ("WordPress database error Table 'wp_x' doesn't exist", ErrorCategory::Database, "Table 'wp_x' doesn't exist"),
            ("JavaScript Error: x is undefined", ErrorCategory::JavaScript, "x is undefined"),
            ("Cron reschedule event error", ErrorCategory::Other, "Cron reschedule event error"),
        ];
        for (message, category, details) in cases {
            assert_eq!(classify(message), (category, details.to_string()), "{message}");
        }
    }

    #[test]
    fn warning_wins_over_javascript() {
        let (category, _) = classify("JavaScript Error: relayed PHP Warning from server");
        assert_eq!(category, ErrorCategory::Warning);
    }

    #[test]
    fn extra_rules_run_before_other() {
        let classifier = Classifier::with_extra_rules([CategoryRule::new(
            ErrorCategory::Custom("PHP Strict".into()),
            &["PHP Strict Standards"],
            &["PHP Strict Standards: "],
        )]);

        let (category, details) = classifier.classify("PHP Strict Standards: Non-static method");
        assert_eq!(category, ErrorCategory::Custom("PHP Strict".into()));
        assert_eq!(details, "Non-static method");

        // Built-ins still take priority.
        let (category, _) = classifier.classify("PHP Warning: PHP Strict Standards");
        assert_eq!(category, ErrorCategory::Warning);
    }

    #[test]
    fn details_are_trimmed() {
        let (_, details) = classify("  something odd \n");
        assert_eq!(details, "something odd");
    }
}
