//! Splitting raw log text into entries.
//!
//! Entries are delimited by the `[` that opens each timestamp bracket, not by newlines,
//! because stack traces span several lines of one entry. Known `[` look-alikes inside
//! messages are protected with sentinel sequences before the split and restored after.

use crate::model::LogEntry;
use regex::Regex;
use std::sync::LazyLock;

/// Visual break inserted before stack trace sections and frames.
pub const SECTION_BREAK: &str = "<hr />";

/// Marker that starts the stack trace section of an uncaught error.
pub const STACK_TRACE_MARKER: &str = "Stack trace:";

/// Default number of most recent fragments kept per read.
pub const DEFAULT_MAX_ENTRIES: usize = 100_000;

/// `[` look-alikes and the sentinel text standing in for them during the split.
const PROTECTED: [(&str, &str); 2] = [
    ("[\\", "\u{1}\\"),
    ("[internal function]", "\u{1}internal function\u{2}"),
];

/// `29-Nov-2023 01:30:03 America/New_York`: PHP's `error_log` date in any zone.
static ZONED_TIMESTAMP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\d{2}-[A-Za-z]{3}-\d{4} \d{2}:\d{2}:\d{2} \S+$")
        .expect("zoned timestamp regex is valid")
});

/// Phrases where `#<n>` is an argument position, not a stack frame.
const NON_FRAME_PHRASES: [&str; 3] = ["Argument ", "parameter ", "the "];

/// Segmentation knobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentOptions {
    /// Keep at most this many of the most recent fragments.
    pub max_entries: usize,
    /// Accept timestamp brackets in zones other than UTC.
    pub non_utc_timezones: bool,
}

impl Default for SegmentOptions {
    fn default() -> Self {
        Self {
            max_entries: DEFAULT_MAX_ENTRIES,
            non_utc_timezones: true,
        }
    }
}

/// Split raw log text into entries, newest first.
///
/// Never fails: fragments without a recognizable timestamp boundary get the
/// "no message" placeholder.
pub fn segment(raw: &str, options: SegmentOptions) -> Vec<LogEntry> {
    let protected = protect(raw);
    let fragments: Vec<&str> = protected.split('[').filter(|f| !f.is_empty()).collect();

    // Tail slice: the most recent fragments are at the end of the file.
    let start = fragments.len().saturating_sub(options.max_entries);
    if start > 0 {
        tracing::debug!(
            dropped = start,
            kept = options.max_entries,
            "Debug log exceeds retention bound, oldest fragments dropped"
        );
    }

    fragments[start..]
        .iter()
        .rev()
        .map(|fragment| parse_fragment(&restore(fragment), options.non_utc_timezones))
        .collect()
}

fn protect(raw: &str) -> String {
    PROTECTED
        .iter()
        .fold(raw.to_string(), |text, (from, to)| text.replace(from, to))
}

fn restore(fragment: &str) -> String {
    PROTECTED
        .iter()
        .fold(fragment.to_string(), |text, (from, to)| text.replace(to, from))
}

/// Turn one fragment (text after a consumed `[`) into an entry.
fn parse_fragment(fragment: &str, non_utc_timezones: bool) -> LogEntry {
    match timestamp_boundary(fragment, non_utc_timezones) {
        Some((close, message_start)) => LogEntry::new(
            &fragment[..close],
            insert_section_breaks(&fragment[message_start..]),
        ),
        None => {
            let timestamp = fragment
                .split(']')
                .next()
                .unwrap_or(fragment)
                .trim()
                .replace(|c: char| c == '[' || c == ']', "");
            LogEntry::new(timestamp, "")
        }
    }
}

/// Locate the end of the timestamp bracket and the start of the message.
///
/// The first `]` of a fragment always closes its timestamp, so `]` inside the message never
/// moves the boundary. The bracket must be followed by a space to count as a full entry.
fn timestamp_boundary(fragment: &str, non_utc_timezones: bool) -> Option<(usize, usize)> {
    let close = fragment.find(']')?;
    let bracket = &fragment[..close];
    let recognized = bracket.ends_with("UTC")
        || (non_utc_timezones && ZONED_TIMESTAMP.is_match(bracket));
    if !recognized || !fragment[close + 1..].starts_with(' ') {
        return None;
    }
    Some((close, close + 2))
}

/// Insert [`SECTION_BREAK`] before `Stack trace:` and before each `#<digit>` frame marker.
fn insert_section_breaks(message: &str) -> String {
    let mut out = String::with_capacity(message.len() + 64);
    for (idx, ch) in message.char_indices() {
        let rest = &message[idx..];
        if rest.starts_with(STACK_TRACE_MARKER) {
            out.push_str(SECTION_BREAK);
        } else if ch == '#'
            && rest[1..].starts_with(|c: char| c.is_ascii_digit())
            && !NON_FRAME_PHRASES.iter().any(|phrase| out.ends_with(phrase))
        {
            out.push_str(SECTION_BREAK);
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::NO_MESSAGE;

    fn opts() -> SegmentOptions {
        SegmentOptions::default()
    }

    #[test]
    fn splits_entries_newest_first() {
        let raw = "[29-Nov-2023 01:30:03 UTC] first\n[29-Nov-2023 01:31:00 UTC] second\n";
        let entries = segment(raw, opts());

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].timestamp(), "29-Nov-2023 01:31:00 UTC");
        assert_eq!(entries[0].raw_message(), "second\n");
        assert_eq!(entries[1].timestamp(), "29-Nov-2023 01:30:03 UTC");
    }

    #[test]
    fn keeps_multiline_stack_trace_in_one_entry() {
        let raw = "[29-Nov-2023 01:30:03 UTC] PHP Fatal error:  Uncaught Error: x in /a/b.php:3\nStack trace:\n#0 /a/c.php(10): f()\n#1 {main}\n  thrown in /a/b.php on line 3\n";
        let entries = segment(raw, opts());

        assert_eq!(entries.len(), 1);
        let message = entries[0].raw_message();
        assert!(message.contains("<hr />Stack trace:"));
        assert!(message.contains("<hr />#0 /a/c.php(10)"));
        assert!(message.contains("<hr />#1 {main}"));
    }

    #[test]
    fn internal_function_and_escaped_bracket_do_not_split() {
        let raw = concat!(
            "[29-Nov-2023 01:30:03 UTC] PHP Fatal error:  Uncaught TypeError\nStack trace:\n#0 [internal function]: cb()\n#1 {main}\n",
            "[29-Nov-2023 01:30:04 UTC] PHP Warning:  Array to string conversion: [\\App\\Foo, 'bar']\n",
            "[29-Nov-2023 01:30:05 UTC] PHP Notice:  done\n",
        );
        let entries = segment(raw, opts());

        assert_eq!(entries.len(), 3);
        assert!(entries[2].raw_message().contains("[internal function]: cb()"));
        assert!(entries[1].raw_message().contains("[\\App\\Foo, 'bar']"));
    }

    #[test]
    fn argument_positions_are_not_frame_breaks() {
        let raw = "[29-Nov-2023 01:30:03 UTC] PHP Fatal error:  f(): Argument #1 ($a) must be int, parameter #2 and the #3 one\n";
        let entries = segment(raw, opts());

        let message = entries[0].raw_message();
        assert!(message.contains("Argument #1"));
        assert!(message.contains("parameter #2"));
        assert!(message.contains("the #3"));
        assert!(!message.contains(SECTION_BREAK));
    }

    #[test]
    fn hash_without_digit_is_left_alone() {
        let raw = "[29-Nov-2023 01:30:03 UTC] color #fff is #ok\n";
        let entries = segment(raw, opts());
        assert!(!entries[0].raw_message().contains(SECTION_BREAK));
    }

    #[test]
    fn bracket_in_message_does_not_move_timestamp_boundary() {
        let raw = "[29-Nov-2023 01:30:03 UTC] value] odd UTC] text\n";
        let entries = segment(raw, opts());

        assert_eq!(entries[0].timestamp(), "29-Nov-2023 01:30:03 UTC");
        assert_eq!(entries[0].raw_message(), "value] odd UTC] text\n");
    }

    #[test]
    fn timestamp_only_fragment_gets_placeholder() {
        let raw = "[29-Nov-2023 01:30:03 UTC]\n[29-Nov-2023 01:30:04 UTC] real\n";
        let entries = segment(raw, opts());

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].timestamp(), "29-Nov-2023 01:30:03 UTC");
        assert_eq!(entries[1].raw_message(), NO_MESSAGE);
    }

    #[test]
    fn non_utc_zone_requires_option() {
        let raw = "[29-Nov-2023 01:30:03 Europe/Berlin] PHP Notice:  hi\n";

        let accepted = segment(raw, opts());
        assert_eq!(accepted[0].timestamp(), "29-Nov-2023 01:30:03 Europe/Berlin");
        assert_eq!(accepted[0].raw_message(), "PHP Notice:  hi\n");

        let strict = segment(
            raw,
            SegmentOptions {
                non_utc_timezones: false,
                ..opts()
            },
        );
        assert_eq!(strict[0].raw_message(), NO_MESSAGE);
    }

    #[test]
    fn print_r_index_is_not_a_zoned_timestamp() {
        let raw = "[29-Nov-2023 01:30:03 America/New_York] Array\n(\n    [0] => foo\n)\n";
        let entries = segment(raw, opts());

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].timestamp(), "0");
        assert_eq!(entries[0].raw_message(), NO_MESSAGE);
        assert_eq!(entries[1].timestamp(), "29-Nov-2023 01:30:03 America/New_York");
        assert_eq!(entries[1].raw_message(), "Array\n(\n    ");
    }

    #[test]
    fn keeps_most_recent_fragments_only() {
        let raw: String = (0..10)
            .map(|i| format!("[29-Nov-2023 01:30:{i:02} UTC] entry {i}\n"))
            .collect();
        let entries = segment(
            &raw,
            SegmentOptions {
                max_entries: 3,
                ..opts()
            },
        );

        let messages: Vec<&str> = entries.iter().map(|e| e.raw_message().trim()).collect();
        assert_eq!(messages, vec!["entry 9", "entry 8", "entry 7"]);
    }

    #[test]
    fn empty_input_yields_no_entries() {
        assert!(segment("", opts()).is_empty());
        assert!(segment("[[[", opts()).is_empty());
    }
}
