//! Timestamp storage format and the date/time split used by event forms.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime, SecondsFormat, TimeZone, Utc};

use crate::types::{EventError, EventResult};

/// Time assumed when a form leaves the time field empty.
pub const DEFAULT_TIME: &str = "12:00";

const MAX_OFFSET_MINUTES: i32 = 14 * 60;

/// Stored timestamps are RFC 3339 in UTC with a `Z` suffix so that text order is time order.
pub fn format_timestamp(value: DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Secs, true)
}

pub fn parse_timestamp(value: &str) -> EventResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|parsed| parsed.with_timezone(&Utc))
        .map_err(|err| EventError::internal(format!("invalid stored timestamp {value:?}: {err}")))
}

/// Offset of the viewer's clock from UTC, east positive.
pub fn utc_offset(minutes: i32) -> EventResult<FixedOffset> {
    if !(-MAX_OFFSET_MINUTES..=MAX_OFFSET_MINUTES).contains(&minutes) {
        return Err(EventError::validation(format!(
            "UTC offset {minutes} minutes is out of range"
        )));
    }
    FixedOffset::east_opt(minutes * 60)
        .ok_or_else(|| EventError::validation(format!("UTC offset {minutes} minutes is invalid")))
}

/// Split a timestamp into `YYYY-MM-DD` and `HH:MM` as seen at `offset`.
pub fn split_local(value: DateTime<Utc>, offset: FixedOffset) -> (String, String) {
    let local = value.with_timezone(&offset);
    (
        local.format("%Y-%m-%d").to_string(),
        local.format("%H:%M").to_string(),
    )
}

/// Reassemble a date and optional time entered at `offset` into UTC.
///
/// A missing or blank time falls back to [`DEFAULT_TIME`].
pub fn combine_local(
    date: &str,
    time: Option<&str>,
    offset: FixedOffset,
) -> EventResult<DateTime<Utc>> {
    let date_value = NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d").map_err(|_| {
        EventError::validation(format!("Invalid date {date:?}, expected YYYY-MM-DD"))
    })?;

    let time = time
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .unwrap_or(DEFAULT_TIME);
    let time_value = NaiveTime::parse_from_str(time, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(time, "%H:%M:%S"))
        .map_err(|_| EventError::validation(format!("Invalid time {time:?}, expected HH:MM")))?;

    offset
        .from_local_datetime(&date_value.and_time(time_value))
        .single()
        .map(|local| local.with_timezone(&Utc))
        .ok_or_else(|| EventError::validation(format!("Invalid date and time {date} {time}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utc(s: &str) -> DateTime<Utc> {
        parse_timestamp(s).unwrap()
    }

    #[test]
    fn stored_format_round_trips_and_sorts() {
        let earlier = utc("2025-03-01T09:00:00Z");
        let later = utc("2025-03-01T10:00:00Z");
        assert_eq!(format_timestamp(earlier), "2025-03-01T09:00:00Z");
        assert!(format_timestamp(earlier) < format_timestamp(later));
    }

    #[test]
    fn parse_accepts_offsets_and_normalises_to_utc() {
        assert_eq!(
            parse_timestamp("2025-03-01T12:00:00+02:00").unwrap(),
            utc("2025-03-01T10:00:00Z")
        );
        assert!(parse_timestamp("yesterday").is_err());
    }

    #[test]
    fn missing_time_defaults_to_noon() {
        let offset = utc_offset(0).unwrap();
        assert_eq!(
            combine_local("2025-06-14", None, offset).unwrap(),
            utc("2025-06-14T12:00:00Z")
        );
        assert_eq!(
            combine_local("2025-06-14", Some("  "), offset).unwrap(),
            utc("2025-06-14T12:00:00Z")
        );
    }

    #[test]
    fn combine_applies_viewer_offset() {
        let ist = utc_offset(330).unwrap();
        assert_eq!(
            combine_local("2025-06-14", Some("18:30"), ist).unwrap(),
            utc("2025-06-14T13:00:00Z")
        );
    }

    #[test]
    fn split_is_inverse_of_combine() {
        let offset = utc_offset(-300).unwrap();
        let ts = utc("2025-01-01T02:15:00Z");
        let (date, time) = split_local(ts, offset);
        assert_eq!(date, "2024-12-31");
        assert_eq!(time, "21:15");
        assert_eq!(combine_local(&date, Some(&time), offset).unwrap(), ts);
    }

    #[test]
    fn rejects_malformed_input() {
        let offset = utc_offset(0).unwrap();
        assert!(combine_local("14/06/2025", None, offset).is_err());
        assert!(combine_local("2025-06-14", Some("25:00"), offset).is_err());
        assert!(utc_offset(15 * 60).is_err());
    }
}
