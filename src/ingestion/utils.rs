//! Utility functions for field normalization
//! One pure function per field; each fallback is a single match arm

use crate::ingestion::types::RawField;
use chrono::{DateTime, NaiveDateTime, Utc};
use tracing::debug;

/// Layout of `cd` in close-approach data, e.g. `2020-Jan-01 00:00`
pub const APPROACH_TIME_INPUT_FORMAT: &str = "%Y-%b-%d %H:%M";

/// Layout used for formatted approach times, e.g. `2020-01-01 00:00`
pub const APPROACH_TIME_OUTPUT_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Blank names mean "no name"
pub fn normalize_name(field: RawField) -> Option<String> {
    match field {
        RawField::Present(name) => Some(name),
        RawField::Empty | RawField::Absent => None,
    }
}

/// Diameter in km; blank, missing or non-numeric means unknown
pub fn normalize_diameter(field: RawField) -> Option<f64> {
    match field {
        RawField::Present(text) => match text.trim().parse::<f64>() {
            Ok(value) => Some(value),
            Err(_) => {
                debug!("Non-numeric diameter {:?}, treating as unknown", text);
                None
            }
        },
        RawField::Empty | RawField::Absent => None,
    }
}

/// Only the literal `Y` flags an object as potentially hazardous
pub fn normalize_hazardous(field: &RawField) -> bool {
    matches!(field, RawField::Present(flag) if flag == "Y")
}

/// Distance or velocity; anything unusable falls back to 0.0
pub fn normalize_measurement(field: &RawField) -> f64 {
    match field {
        RawField::Present(text) => text.trim().parse::<f64>().unwrap_or_else(|_| {
            debug!("Non-numeric measurement {:?}, using 0.0", text);
            0.0
        }),
        RawField::Empty | RawField::Absent => 0.0,
    }
}

/// Parse `cd` into a UTC timestamp; unknown or unparseable means no time
pub fn parse_approach_time(field: &RawField) -> Option<DateTime<Utc>> {
    match field {
        RawField::Present(text) => {
            match NaiveDateTime::parse_from_str(text.trim(), APPROACH_TIME_INPUT_FORMAT) {
                Ok(naive) => Some(naive.and_utc()),
                Err(e) => {
                    debug!("Unparseable approach time {:?}: {}", text, e);
                    None
                }
            }
        }
        RawField::Empty | RawField::Absent => None,
    }
}

/// Format a timestamp to minute precision
pub fn format_approach_time(time: &DateTime<Utc>) -> String {
    time.format(APPROACH_TIME_OUTPUT_FORMAT).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn present(s: &str) -> RawField {
        RawField::Present(s.to_string())
    }

    #[test]
    fn test_normalize_name() {
        assert_eq!(normalize_name(present("Eros")), Some("Eros".to_string()));
        assert_eq!(normalize_name(RawField::Empty), None);
        assert_eq!(normalize_name(RawField::Absent), None);
    }

    #[test]
    fn test_normalize_diameter() {
        assert_eq!(normalize_diameter(present("16.84")), Some(16.84));
        assert_eq!(normalize_diameter(present("0")), Some(0.0));
        assert_eq!(normalize_diameter(RawField::Empty), None);
        assert_eq!(normalize_diameter(RawField::Absent), None);
        assert_eq!(normalize_diameter(present("n/a")), None);
    }

    #[test]
    fn test_normalize_hazardous() {
        assert!(normalize_hazardous(&present("Y")));

        assert!(!normalize_hazardous(&present("N")));
        assert!(!normalize_hazardous(&present("y")));
        assert!(!normalize_hazardous(&present("Yes")));
        assert!(!normalize_hazardous(&present(" Y")));
        assert!(!normalize_hazardous(&RawField::Empty));
        assert!(!normalize_hazardous(&RawField::Absent));
    }

    #[test]
    fn test_normalize_measurement() {
        assert_eq!(normalize_measurement(&present("0.15")), 0.15);
        assert_eq!(normalize_measurement(&present("5.2")), 5.2);
        assert_eq!(normalize_measurement(&RawField::Empty), 0.0);
        assert_eq!(normalize_measurement(&RawField::Absent), 0.0);
        assert_eq!(normalize_measurement(&present("--")), 0.0);
    }

    #[test]
    fn test_parse_approach_time() {
        assert_eq!(
            parse_approach_time(&present("2020-Jan-01 00:00")),
            Some(Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap())
        );
        assert_eq!(
            parse_approach_time(&present("1900-DEC-31 23:59")),
            Some(Utc.with_ymd_and_hms(1900, 12, 31, 23, 59, 0).unwrap())
        );
        assert_eq!(parse_approach_time(&present("yesterday")), None);
        assert_eq!(parse_approach_time(&RawField::Empty), None);
        assert_eq!(parse_approach_time(&RawField::Absent), None);
    }

    #[test]
    fn test_format_approach_time() {
        let time = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(format_approach_time(&time), "2020-01-01 00:00");

        let time = Utc.with_ymd_and_hms(2045, 7, 9, 13, 5, 0).unwrap();
        assert_eq!(format_approach_time(&time), "2045-07-09 13:05");
    }
}
