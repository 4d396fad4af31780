//! Date normalization for dirty export data.
//!
//! Every lifecycle date in the source passes through [`parse_timestamp`].
//! It never fails: a value it cannot read becomes `None`, so one malformed
//! cell cannot abort an aggregation.

use chrono::{DateTime, NaiveDate, NaiveDateTime};

/// Format the CRM export writes. Tried before anything else.
pub const STRICT_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Timestamp layouts seen in hand-edited or re-exported spreadsheets.
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
    "%Y.%m.%d %H:%M:%S",
];

/// Date-only layouts; parsed as midnight.
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%Y.%m.%d", "%Y年%m月%d日", "%m/%d/%Y"];

/// Cell contents that mean "no value" in spreadsheet exports.
const NULL_TOKENS: &[&str] = &["", "nan", "NaN", "NaT", "None", "null", "NULL"];

/// Whether a raw cell is empty or a null marker.
pub fn is_null_token(raw: &str) -> bool {
    NULL_TOKENS.contains(&raw.trim())
}

/// Parse a raw cell into a timestamp.
///
/// Tries [`STRICT_FORMAT`] first, then the general layouts, then RFC 3339
/// (keeping the wall-clock time). Returns `None` for null markers and for
/// anything unreadable.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let s = raw.trim();
    if is_null_token(s) {
        return None;
    }

    if let Ok(ts) = NaiveDateTime::parse_from_str(s, STRICT_FORMAT) {
        return Some(ts);
    }

    parse_general(s)
}

fn parse_general(s: &str) -> Option<NaiveDateTime> {
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
        .or_else(|| DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.naive_local()))
}

/// Whole days from `from` to `to`, floored (a 23-hour gap is 0 days, a
/// negative 1-hour gap is -1 day).
pub fn days_between(from: NaiveDateTime, to: NaiveDateTime) -> i64 {
    (to - from).num_seconds().div_euclid(86_400)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    #[test]
    fn strict_format_first() {
        let ts = parse_timestamp("2024-01-05 09:30:15").expect("strict");
        assert_eq!(ts.date(), ymd(2024, 1, 5));
        assert_eq!(ts.hour(), 9);
        assert_eq!(ts.second(), 15);
    }

    #[test]
    fn general_layouts() {
        assert_eq!(parse_timestamp("2024-01-05").map(|t| t.date()), Some(ymd(2024, 1, 5)));
        assert_eq!(parse_timestamp("2024/1/5").map(|t| t.date()), Some(ymd(2024, 1, 5)));
        assert_eq!(
            parse_timestamp("2024/01/05 18:00").map(|t| t.hour()),
            Some(18)
        );
        assert_eq!(
            parse_timestamp("2024年1月5日").map(|t| t.date()),
            Some(ymd(2024, 1, 5))
        );
        assert_eq!(
            parse_timestamp("2024-01-05T10:00:00+09:00").map(|t| t.hour()),
            Some(10)
        );
    }

    #[test]
    fn null_and_garbage_become_none() {
        assert!(parse_timestamp("").is_none());
        assert!(parse_timestamp("   ").is_none());
        assert!(parse_timestamp("NaT").is_none());
        assert!(parse_timestamp("next tuesday").is_none());
        assert!(parse_timestamp("2024-02-30").is_none());
    }

    #[test]
    fn days_between_floors() {
        let a = parse_timestamp("2024-01-01 00:00:00").expect("a");
        let b = parse_timestamp("2024-01-06 12:00:00").expect("b");
        assert_eq!(days_between(a, b), 5);
        let c = parse_timestamp("2023-12-31 23:00:00").expect("c");
        assert_eq!(days_between(a, c), -1);
    }
}
