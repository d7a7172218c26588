//! Lenient date parsing for `date:` lines and dated file names.

use std::sync::LazyLock;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, SecondsFormat, Utc};
use regex::Regex;

/// Naive date-time layouts, read as UTC.
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
];

/// Calendar date layouts, read as UTC midnight.
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%B %d, %Y", "%B %d %Y", "%d %B %Y"];

/// Format an instant as ISO-8601 with millisecond precision, e.g.
/// `2024-03-15T00:00:00.000Z`.
pub fn to_iso(instant: &DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parse a free-form date value.
///
/// Accepts RFC 3339, RFC 2822, naive date-times and a handful of plain
/// calendar layouts. Values without an offset are taken as UTC.
pub fn parse_date(value: &str) -> Option<DateTime<Utc>> {
    let value = strip_quotes(value.trim()).trim();
    if value.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }

    if let Ok(dt) = DateTime::parse_from_rfc2822(value) {
        return Some(dt.with_timezone(&Utc));
    }

    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, format) {
            return Some(dt.and_utc());
        }
    }

    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(value, format).ok())
        .map(midnight)
}

/// Find a `YYYY[-MM][-DD]` date embedded in a file name.
///
/// Month and day default to `01`. Returns `None` when there are no four
/// consecutive digits or when the composed date does not exist.
pub fn date_from_file_name(file_name: &str) -> Option<DateTime<Utc>> {
    static RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"(\d{4})(?:[-_](\d{2}))?(?:[-_](\d{2}))?").expect("Invalid file date regex")
    });

    let caps = RE.captures(file_name)?;
    let year = caps.get(1)?.as_str();
    let month = caps.get(2).map_or("01", |m| m.as_str());
    let day = caps.get(3).map_or("01", |m| m.as_str());

    NaiveDate::parse_from_str(&format!("{year}-{month}-{day}"), "%Y-%m-%d")
        .ok()
        .map(midnight)
}

fn midnight(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

fn strip_quotes(value: &str) -> &str {
    for quote in ['"', '\''] {
        if let Some(inner) = value
            .strip_prefix(quote)
            .and_then(|rest| rest.strip_suffix(quote))
        {
            return inner;
        }
    }
    value
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn iso(value: &str) -> Option<String> {
        parse_date(value).map(|dt| to_iso(&dt))
    }

    #[test]
    fn formats_with_millis_and_zulu() {
        let dt = parse_date("2024-03-15").unwrap();
        assert_eq!(to_iso(&dt), "2024-03-15T00:00:00.000Z");
    }

    #[test]
    fn parses_rfc3339_with_offset() {
        assert_eq!(
            iso("2024-03-15T10:30:00+08:00").as_deref(),
            Some("2024-03-15T02:30:00.000Z")
        );
        assert_eq!(
            iso("2024-03-15T10:30:00.250Z").as_deref(),
            Some("2024-03-15T10:30:00.250Z")
        );
    }

    #[test]
    fn parses_naive_datetimes_as_utc() {
        assert_eq!(
            iso("2024-03-15 08:05").as_deref(),
            Some("2024-03-15T08:05:00.000Z")
        );
        assert_eq!(
            iso("2024-03-15T08:05:09").as_deref(),
            Some("2024-03-15T08:05:09.000Z")
        );
    }

    #[test]
    fn parses_plain_calendar_layouts() {
        assert_eq!(iso("2024/03/15").as_deref(), Some("2024-03-15T00:00:00.000Z"));
        assert_eq!(
            iso("March 15, 2024").as_deref(),
            Some("2024-03-15T00:00:00.000Z")
        );
        assert_eq!(iso("15 Mar 2024").as_deref(), Some("2024-03-15T00:00:00.000Z"));
    }

    #[test]
    fn parses_rfc2822() {
        assert_eq!(
            iso("Fri, 15 Mar 2024 10:00:00 +0000").as_deref(),
            Some("2024-03-15T10:00:00.000Z")
        );
    }

    #[test]
    fn strips_quotes() {
        assert_eq!(iso("\"2024-03-15\"").as_deref(), Some("2024-03-15T00:00:00.000Z"));
        assert_eq!(iso("'2024-03-15'").as_deref(), Some("2024-03-15T00:00:00.000Z"));
    }

    #[test]
    fn rejects_garbage() {
        assert_eq!(parse_date(""), None);
        assert_eq!(parse_date("soon"), None);
        assert_eq!(parse_date("2024-13-01"), None);
        assert_eq!(parse_date("2024-02-30"), None);
    }

    #[test]
    fn reads_full_date_from_file_name() {
        let dt = date_from_file_name("2024-03-15-hello-world.md").unwrap();
        assert_eq!(to_iso(&dt), "2024-03-15T00:00:00.000Z");
    }

    #[test]
    fn defaults_missing_month_and_day() {
        let dt = date_from_file_name("2023_07-notes.md").unwrap();
        assert_eq!(to_iso(&dt), "2023-07-01T00:00:00.000Z");

        let dt = date_from_file_name("recap-2021.md").unwrap();
        assert_eq!(to_iso(&dt), "2021-01-01T00:00:00.000Z");
    }

    #[test]
    fn rejects_impossible_file_dates() {
        assert_eq!(date_from_file_name("2024-13-40-post.md"), None);
        assert_eq!(date_from_file_name("hello.md"), None);
    }
}
