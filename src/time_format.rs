use chrono::{NaiveTime, Timelike};

pub const ZERO: &str = "00:00:00";

/// Format a number of seconds as zero padded `HH:MM:SS`.
///
/// Hours are not wrapped at 24, so long-running modules render as `123:04:05`.
/// Negative input renders as `00:00:00`.
pub fn format_seconds(seconds: i64) -> String {
    if seconds < 0 {
        return ZERO.to_string();
    }

    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;

    format!("{:02}:{:02}:{:02}", hours, minutes, secs)
}

/// Parse a manually entered `HH:MM` duration into seconds.
///
/// Hours must be 00-23 and minutes 00-59, both written with two digits.
pub fn parse_hh_mm(input: &str) -> Option<u64> {
    let input = input.trim();
    let (h, m) = input.split_once(':')?;
    if h.len() != 2 || m.len() != 2 {
        return None;
    }

    let time = NaiveTime::parse_from_str(input, "%H:%M").ok()?;
    Some(time.hour() as u64 * 3600 + time.minute() as u64 * 60)
}
