use chrono::{DateTime, NaiveDateTime, Utc};

/// Parses an HTTP date header value such as `Last-Modified`.
///
/// Accepts the three formats HTTP/1.1 allows recipients to see:
/// - IMF-fixdate: `Sun, 06 Nov 1994 08:49:37 GMT`
/// - RFC 850: `Sunday, 06-Nov-94 08:49:37 GMT`
/// - ANSI C asctime: `Sun Nov  6 08:49:37 1994`
///
/// Returns `None` for anything else.
pub(crate) fn parse_http_date(value: &str) -> Option<DateTime<Utc>> {
    let value = value.split_whitespace().collect::<Vec<_>>().join(" ");
    if value.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc2822(&value) {
        return Some(dt.with_timezone(&Utc));
    }

    ["%A, %d-%b-%y %H:%M:%S GMT", "%a %b %d %H:%M:%S %Y"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(&value, format).ok())
        .map(|naive| naive.and_utc())
}
