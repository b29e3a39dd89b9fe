//! Debug log input and output.
//!
//! - [`LogFile`]: read, size, clear and append for the managed log
//! - [`JsError`]: browser-side errors relayed into the same log

pub mod file;

pub use file::LogFile;

use chrono::{DateTime, Utc};
use serde::Deserialize;

/// Timestamp format PHP's `error_log` writes, zone included.
pub const LOG_TIMESTAMP_FORMAT: &str = "%d-%b-%Y %H:%M:%S UTC";

/// A JavaScript error reported by a browser.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JsError {
    /// Error message.
    pub message: String,
    /// Script URL.
    pub script: String,
    /// Line number.
    pub line_no: u32,
    /// Column number.
    pub column_no: u32,
    /// Page path the error happened on, relative to the site URL.
    #[serde(default)]
    pub page_url: String,
}

impl JsError {
    /// The log line recorded for this error, in `error_log` format.
    ///
    /// Browser-supplied fields are flattened to one line with brackets swapped for
    /// parentheses, so they cannot open an entry of their own.
    pub fn to_log_line(&self, site_url: &str, now: DateTime<Utc>) -> String {
        format!(
            "[{}] JavaScript Error: {} in {} on line {} column {} at {}{}",
            now.format(LOG_TIMESTAMP_FORMAT),
            single_line(&self.message),
            single_line(&self.script),
            self.line_no,
            self.column_no,
            site_url.trim_end_matches('/'),
            single_line(&self.page_url)
        )
    }
}

fn single_line(field: &str) -> String {
    field
        .chars()
        .map(|c| match c {
            '\r' | '\n' => ' ',
            '[' => '(',
            ']' => ')',
            other => other,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn js_error_log_line() {
        let error = JsError {
            message: "Uncaught TypeError: x is undefined".into(),
            script: "https://example.com/app.js".into(),
            line_no: 12,
            column_no: 7,
            page_url: "/shop/".into(),
        };
        let now = Utc.with_ymd_and_hms(2023, 11, 29, 1, 30, 3).unwrap();

        assert_eq!(
            error.to_log_line("https://example.com/", now),
            "[29-Nov-2023 01:30:03 UTC] JavaScript Error: Uncaught TypeError: x is undefined in https://example.com/app.js on line 12 column 7 at https://example.com/shop/"
        );
    }

    #[test]
    fn js_error_fields_cannot_open_entries() {
        let error = JsError {
            message: "boom\n[29-Nov-2023 01:30:04 UTC] PHP Fatal error:  forged".into(),
            script: "a.js".into(),
            line_no: 1,
            column_no: 2,
            page_url: "/?q=[x]".into(),
        };
        let now = Utc.with_ymd_and_hms(2023, 11, 29, 1, 30, 3).unwrap();
        let line = error.to_log_line("https://example.com", now);

        assert_eq!(
            line,
            "[29-Nov-2023 01:30:03 UTC] JavaScript Error: boom (29-Nov-2023 01:30:04 UTC) PHP Fatal error:  forged in a.js on line 1 column 2 at https://example.com/?q=(x)"
        );
        assert_eq!(line.matches('[').count(), 1);
    }

    #[test]
    fn js_error_from_browser_payload() {
        let payload = r#"{"message":"boom","script":"a.js","lineNo":1,"columnNo":2,"pageUrl":"/"}"#;
        let error: JsError = serde_json::from_str(payload).unwrap();
        assert_eq!(error.line_no, 1);
        assert_eq!(error.page_url, "/");
    }
}
