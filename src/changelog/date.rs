use std::sync::LazyLock;

use chrono::{DateTime, FixedOffset, NaiveDate, TimeZone, Utc};
use regex::Regex;

/// Full `date(1)` style header, e.g. `Fri Sep  9 22:34:31 UTC 2016`.
static HEADER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?:Mon|Tue|Wed|Thu|Fri|Sat|Sun) +(Jan|Feb|Mar|Apr|May|Jun|Jul|Aug|Sep|Oct|Nov|Dec) +(\d{1,2}) +(\d{2}):(\d{2}):(\d{2}) +([A-Z]{1,5}) +(\d{4})$",
    )
    .expect("header regex is valid")
});

/// Weekday, month, day and the start of a time: the line was meant to be
/// a header. Prose that merely opens with a weekday and month is content.
static HEADER_PREFIX_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?:Mon|Tue|Wed|Thu|Fri|Sat|Sun) +(?:Jan|Feb|Mar|Apr|May|Jun|Jul|Aug|Sep|Oct|Nov|Dec) +\d{1,2} +\d{1,2}:",
    )
    .expect("header prefix regex is valid")
});

const MONTHS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Classification of a single line with respect to date headers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum HeaderLine {
    /// A complete, valid header.
    Date(DateTime<Utc>),
    /// Starts like a header but is truncated or names an impossible date.
    Malformed,
    NotHeader,
}

pub(crate) fn classify(line: &str) -> HeaderLine {
    if !HEADER_PREFIX_RE.is_match(line) {
        return HeaderLine::NotHeader;
    }
    match parse_header(line) {
        Some(date) => HeaderLine::Date(date),
        None => HeaderLine::Malformed,
    }
}

fn parse_header(line: &str) -> Option<DateTime<Utc>> {
    let caps = HEADER_RE.captures(line)?;

    let month = MONTHS.iter().position(|m| *m == &caps[1])? as u32 + 1;
    let day: u32 = caps[2].parse().ok()?;
    let hour: u32 = caps[3].parse().ok()?;
    let minute: u32 = caps[4].parse().ok()?;
    let second: u32 = caps[5].parse().ok()?;
    let year: i32 = caps[7].parse().ok()?;

    let naive = NaiveDate::from_ymd_opt(year, month, day)?.and_hms_opt(hour, minute, second)?;
    let offset = FixedOffset::east_opt(zone_offset_seconds(&caps[6]))?;
    offset
        .from_local_datetime(&naive)
        .single()
        .map(|dt| dt.with_timezone(&Utc))
}

/// UTC offset for the zone abbreviations seen in Slackware change logs.
///
/// Unknown abbreviations are read as UTC.
fn zone_offset_seconds(zone: &str) -> i32 {
    const HOUR: i32 = 3600;
    match zone {
        "UTC" | "GMT" | "UT" | "Z" => 0,
        "EST" => -5 * HOUR,
        "EDT" => -4 * HOUR,
        "CST" => -6 * HOUR,
        "CDT" => -5 * HOUR,
        "MST" => -7 * HOUR,
        "MDT" => -6 * HOUR,
        "PST" => -8 * HOUR,
        "PDT" => -7 * HOUR,
        other => {
            tracing::debug!(zone = other, "Unknown time zone in date header, assuming UTC");
            0
        }
    }
}
