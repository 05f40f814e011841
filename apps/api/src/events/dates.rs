use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};

use crate::errors::AppError;

const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

/// Parses an event date. Accepts RFC 3339 (`Z` or an offset), a naive
/// date-time (taken as UTC) or a bare date (midnight UTC).
pub fn parse_event_date(raw: &str) -> Result<DateTime<Utc>, AppError> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    for format in NAIVE_DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Ok(naive.and_utc());
        }
    }
    if let Some(midnight) = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
    {
        return Ok(midnight.and_utc());
    }
    Err(AppError::Validation("Invalid date format".to_string()))
}

/// Parses `HH:MM` or `HH:MM:SS`. Blank input means "not set".
pub fn parse_time(raw: Option<&str>) -> Result<Option<NaiveTime>, AppError> {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(None);
    };
    NaiveTime::parse_from_str(raw, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M"))
        .map(Some)
        .map_err(|_| AppError::Validation(format!("Invalid time format: '{raw}'")))
}

pub fn check_time_range(
    start: Option<NaiveTime>,
    end: Option<NaiveTime>,
) -> Result<(), AppError> {
    match (start, end) {
        (Some(s), Some(e)) if e < s => Err(AppError::Validation(
            "End time must not be before start time".to_string(),
        )),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn test_rfc3339_with_z_and_offset() {
        let z = parse_event_date("2025-11-05T15:30:00Z").unwrap();
        assert_eq!(z.hour(), 15);
        let offset = parse_event_date("2025-11-05T10:30:00-05:00").unwrap();
        assert_eq!(offset, z);
    }

    #[test]
    fn test_naive_forms_are_utc() {
        let dt = parse_event_date("2025-11-05T09:00").unwrap();
        assert_eq!((dt.hour(), dt.minute()), (9, 0));
        let dt = parse_event_date("2025-11-05T09:00:30.250").unwrap();
        assert_eq!(dt.second(), 30);
        let dt = parse_event_date("2025-11-05").unwrap();
        assert_eq!((dt.day(), dt.hour()), (5, 0));
    }

    #[test]
    fn test_garbage_date_rejected() {
        let err = parse_event_date("next tuesday").unwrap_err();
        assert!(matches!(err, AppError::Validation(ref m) if m == "Invalid date format"));
    }

    #[test]
    fn test_parse_time() {
        assert_eq!(
            parse_time(Some("14:30")).unwrap(),
            NaiveTime::from_hms_opt(14, 30, 0)
        );
        assert_eq!(
            parse_time(Some("14:30:15")).unwrap(),
            NaiveTime::from_hms_opt(14, 30, 15)
        );
        assert_eq!(parse_time(Some("  ")).unwrap(), None);
        assert_eq!(parse_time(None).unwrap(), None);
        assert!(parse_time(Some("2pm")).is_err());
    }

    #[test]
    fn test_time_range() {
        let nine = NaiveTime::from_hms_opt(9, 0, 0);
        let five = NaiveTime::from_hms_opt(17, 0, 0);
        assert!(check_time_range(nine, five).is_ok());
        assert!(check_time_range(five, nine).is_err());
        assert!(check_time_range(None, nine).is_ok());
    }
}
