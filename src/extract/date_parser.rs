use chrono::{NaiveDate, NaiveDateTime};

/// Parse `"YYYY-MM-DD HH:MM:SS"` or `"YYYY-MM-DD"` → micros since the epoch.
///
/// Values carry no zone; they are stored as naive timestamps.
pub fn parse_timestamp_micros(s: &str) -> Option<i64> {
    let s = s.trim();
    // minimal length + separators check before handing off to chrono
    let bytes = s.as_bytes();
    if bytes.len() < 10 || bytes[4] != b'-' || bytes[7] != b'-' {
        return None;
    }
    let naive = match s.len() {
        19 if bytes[10] == b' ' => NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").ok()?,
        10 => NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .ok()?
            .and_hms_opt(0, 0, 0)?,
        _ => return None,
    };
    Some(naive.and_utc().timestamp_micros())
}
