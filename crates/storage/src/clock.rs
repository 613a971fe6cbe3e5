#![forbid(unsafe_code)]

use time::OffsetDateTime;
use time::macros::format_description;

/// Current UTC time as an ISO-8601 string with second precision and no
/// offset (`YYYY-MM-DDTHH:MM:SS`). This is the only timestamp shape the
/// store persists.
pub fn now_iso() -> String {
    OffsetDateTime::now_utc()
        .format(format_description!(
            "[year]-[month]-[day]T[hour]:[minute]:[second]"
        ))
        .unwrap_or_else(|_| "1970-01-01T00:00:00".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn now_iso_has_second_precision_and_no_offset() {
        let ts = now_iso();
        assert_eq!(ts.len(), 19, "expected YYYY-MM-DDTHH:MM:SS (got={ts})");
        assert_eq!(ts.as_bytes()[4], b'-');
        assert_eq!(ts.as_bytes()[10], b'T');
        assert!(!ts.ends_with('Z'), "timestamps are naive UTC");
    }
}
