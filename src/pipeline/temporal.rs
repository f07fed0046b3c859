//! Date/time parsing for display-formatted event fields and the "is this
//! event over" predicate.

use crate::constants::{DATE_DISPLAY_FORMAT, TIME_DISPLAY_FORMAT};
use crate::types::CanonicalEvent;
use chrono::{DateTime, FixedOffset, Local, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

/// Accepted shapes for a display date; the first is the canonical one.
const DATE_FORMATS: [&str; 3] = ["%b %d, %Y", "%B %d, %Y", "%Y-%m-%d"];

/// Used when an event carries a date but no time: it is upcoming until the
/// day is over.
const END_OF_DAY: &str = "11:59 PM";

static CLOCK_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(\d{1,2}):(\d{2})\s*(AM|PM)(?:\s*\(?\s*([A-Z]{2,4})\s*\)?)?$")
        .expect("clock pattern")
});

/// A wall-clock time with the zone named next to it, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClockTime {
    pub time: NaiveTime,
    pub offset: Option<FixedOffset>,
}

fn zone_offset(abbreviation: &str) -> Option<FixedOffset> {
    let hours = match abbreviation.to_ascii_uppercase().as_str() {
        "UT" | "UTC" | "GMT" | "Z" => 0,
        "EST" => -5,
        "EDT" => -4,
        "CST" => -6,
        "CDT" => -5,
        "MST" => -7,
        "MDT" => -6,
        "PST" => -8,
        "PDT" => -7,
        "AKST" => -9,
        "AKDT" => -8,
        "HST" => -10,
        _ => return None,
    };
    FixedOffset::east_opt(hours * 3600)
}

pub fn parse_display_date(date: &str) -> Option<NaiveDate> {
    let trimmed = date.trim();
    if trimmed.is_empty() {
        return None;
    }
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(trimmed, format).ok())
}

/// Parses `"7:30 PM"`, `"7:30pm"`, `"12:00 PM (EST)"` or `"12:00 PM EST"`.
/// Unknown zone names fall back to the viewer's zone.
pub fn parse_clock(time: &str) -> Option<ClockTime> {
    let captures = CLOCK_RE.captures(time.trim())?;
    let hour: u32 = captures.get(1)?.as_str().parse().ok()?;
    let minute: u32 = captures.get(2)?.as_str().parse().ok()?;
    if !(1..=12).contains(&hour) {
        return None;
    }
    let is_pm = captures.get(3)?.as_str().eq_ignore_ascii_case("pm");
    let hour_24 = match (hour, is_pm) {
        (12, false) => 0,
        (12, true) => 12,
        (h, true) => h + 12,
        (h, false) => h,
    };
    let offset = captures.get(4).and_then(|m| zone_offset(m.as_str()));
    Some(ClockTime {
        time: NaiveTime::from_hms_opt(hour_24, minute, 0)?,
        offset,
    })
}

pub fn format_display_date<Tz: TimeZone>(instant: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    instant.format(DATE_DISPLAY_FORMAT).to_string()
}

pub fn format_display_time<Tz: TimeZone>(instant: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    instant.format(TIME_DISPLAY_FORMAT).to_string()
}

/// Parses an ISO-8601 instant as sent by the API or found in `datetime`
/// attributes. Offset-less values are read as UTC.
pub fn parse_iso_instant(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
}

/// Resolves a display date plus optional display time to an instant,
/// interpreting wall-clock values in `tz` unless the time names a zone.
pub fn display_instant<Tz: TimeZone>(date: &str, time: &str, tz: &Tz) -> Option<DateTime<Utc>> {
    let day = parse_display_date(date)?;
    let clock = if time.trim().is_empty() {
        parse_clock(END_OF_DAY)?
    } else {
        parse_clock(time)?
    };
    let naive = day.and_time(clock.time);
    match clock.offset {
        Some(offset) => offset
            .from_local_datetime(&naive)
            .single()
            .map(|dt| dt.with_timezone(&Utc)),
        None => tz
            .from_local_datetime(&naive)
            .earliest()
            .map(|dt| dt.with_timezone(&Utc)),
    }
}

/// The instant an event is compared against "now". API start instants are
/// authoritative; otherwise the display date and time are combined.
pub fn comparison_instant<Tz: TimeZone>(event: &CanonicalEvent, tz: &Tz) -> Option<DateTime<Utc>> {
    if let Some(start) = event.start_datetime.as_deref().and_then(parse_iso_instant) {
        return Some(start);
    }
    display_instant(&event.date, &event.time, tz)
}

/// Whether an event already happened. Missing or unparseable dates are
/// never past.
pub fn is_past(event: &CanonicalEvent) -> bool {
    is_past_at(event, &Local::now())
}

pub fn is_past_at<Tz: TimeZone>(event: &CanonicalEvent, now: &DateTime<Tz>) -> bool {
    if event.date.trim().is_empty() {
        return false;
    }
    match comparison_instant(event, &now.timezone()) {
        Some(instant) => instant < now.with_timezone(&Utc),
        None => false,
    }
}

/// Search results keep everything starting today or later.
pub fn starts_today_or_later<Tz: TimeZone>(event: &CanonicalEvent, now: &DateTime<Tz>) -> bool {
    let Some(start) = event.start_datetime.as_deref().and_then(parse_iso_instant) else {
        return !is_past_at(event, now);
    };
    let tz = now.timezone();
    let midnight = now
        .date_naive()
        .and_hms_opt(0, 0, 0)
        .and_then(|naive| tz.from_local_datetime(&naive).earliest());
    match midnight {
        Some(midnight) => start >= midnight.with_timezone(&Utc),
        None => !is_past_at(event, now),
    }
}

/// Orders events by start, unknown starts last.
pub fn sort_by_start<Tz: TimeZone>(events: &mut [CanonicalEvent], tz: &Tz) {
    events.sort_by_key(|e| {
        let instant = comparison_instant(e, tz);
        (instant.is_none(), instant)
    });
}
