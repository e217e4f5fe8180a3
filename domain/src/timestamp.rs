//! Timestamp encodings used by stored items.

use std::time::{SystemTime, UNIX_EPOCH};

/// Seconds since the epoch with a six digit fraction, e.g. `1700000000.123456`.
pub fn epoch_seconds_string(t: SystemTime) -> String {
    let d = t.duration_since(UNIX_EPOCH).unwrap_or_default();
    format!("{}.{:06}", d.as_secs(), d.subsec_micros())
}

/// Milliseconds since the epoch.
pub fn epoch_millis(t: SystemTime) -> u64 {
    let d = t.duration_since(UNIX_EPOCH).unwrap_or_default();
    d.as_secs() * 1000 + u64::from(d.subsec_millis())
}

/// Parse a decimal seconds string (`"1700000000.5"`) into whole milliseconds.
///
/// Older records carry `updatedAt` in this form; the fraction may have any
/// number of digits and is truncated past the millisecond.
pub fn millis_from_seconds_str(s: &str) -> Option<u64> {
    let s = s.trim();
    let (secs, frac) = match s.split_once('.') {
        Some((secs, frac)) => (secs, frac),
        None => (s, ""),
    };
    if secs.is_empty() || !frac.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let secs: u64 = secs.parse().ok()?;
    let mut millis = 0u64;
    for (i, c) in frac.chars().take(3).enumerate() {
        let digit = u64::from(c.to_digit(10)?);
        millis += digit * 10u64.pow(2 - i as u32);
    }
    secs.checked_mul(1000)?.checked_add(millis)
}
