use chrono::{DateTime, Utc};
use std::cmp::Ordering;

// Parse an instant string (RFC3339, with RFC2822 as a fallback) into UTC.
// Returns Some(ts) on success; None if unparseable.
pub fn parse_instant(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(dt.with_timezone(&Utc));
    }
    None
}

// Descending comparator over timestamp strings. Parseable values form one
// class ordered by instant; unparseable values sort after them, by raw
// string. Keeping the classes separate keeps the order total even when
// mixed formats land in the same feed.
pub fn cmp_timestamps_desc(a: &str, b: &str) -> Ordering {
    match (parse_instant(a), parse_instant(b)) {
        (Some(ta), Some(tb)) => tb.cmp(&ta),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => b.cmp(a),
    }
}

// Compact display form for feed rows; unparseable values pass through as-is.
pub fn display_instant(s: &str) -> String {
    if s.is_empty() {
        return "--".to_string();
    }
    match parse_instant(s) {
        Some(dt) => dt.format("%b %d, %H:%M").to_string(),
        None => s.to_string(),
    }
}
