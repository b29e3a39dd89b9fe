//! Number, size and timestamp formatting for display.

use chrono::{FixedOffset, NaiveDateTime, TimeZone, Utc};

const SIZE_UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];

/// Human-readable byte size, base 1024, rounded to a whole number.
///
/// ```
/// use dlm::view::format_size;
///
/// assert_eq!(format_size(0), "0 B");
/// assert_eq!(format_size(1536), "2 KB");
/// assert_eq!(format_size(5 * 1024 * 1024), "5 MB");
/// ```
pub fn format_size(bytes: u64) -> String {
    let mut unit = 0;
    let mut magnitude = 1u64;
    while unit + 1 < SIZE_UNITS.len() && bytes >= magnitude * 1024 {
        magnitude *= 1024;
        unit += 1;
    }
    let value = (bytes as f64 / magnitude as f64).round() as u64;
    format!("{} {}", format_count(value), SIZE_UNITS[unit])
}

/// Integer with `,` thousands separators.
pub fn format_count(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Format of timestamps written by PHP's `error_log`, without the zone.
const LOG_TIME_FORMAT: &str = "%d-%b-%Y %H:%M:%S";

/// Parse a log timestamp such as `29-Nov-2023 01:30:03 UTC`.
///
/// Returns the naive time and whether it was recorded in UTC.
pub fn parse_log_timestamp(timestamp: &str) -> Option<(NaiveDateTime, bool)> {
    let trimmed = timestamp.trim();
    let (time, zone) = match trimmed.rsplit_once(' ') {
        Some((time, zone)) if !zone.starts_with(|c: char| c.is_ascii_digit()) => (time, Some(zone)),
        _ => (trimmed, None),
    };
    let naive = NaiveDateTime::parse_from_str(time, LOG_TIME_FORMAT).ok()?;
    Some((naive, zone.map_or(true, |z| z == "UTC")))
}

/// Render a log timestamp with the given pattern.
///
/// UTC timestamps are shifted by `offset_minutes`; timestamps in other zones are shown as
/// recorded. Unparseable text is returned unchanged.
pub fn display_timestamp(timestamp: &str, offset_minutes: i32, pattern: &str) -> String {
    let Some((naive, is_utc)) = parse_log_timestamp(timestamp) else {
        return timestamp.to_string();
    };
    if !is_utc {
        return naive.format(pattern).to_string();
    }
    let utc = Utc.from_utc_datetime(&naive);
    match FixedOffset::east_opt(offset_minutes.saturating_mul(60)) {
        Some(offset) => utc.with_timezone(&offset).format(pattern).to_string(),
        None => utc.format(pattern).to_string(),
    }
}
