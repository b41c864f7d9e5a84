//! Timestamp type and the text formats used across CityPulse

use crate::{CityPulseError, Result};
use chrono::{DateTime, NaiveDate, Utc};

/// Timestamp type used throughout the application
pub type Timestamp = DateTime<Utc>;

/// Row timestamp format of the aligned export and the map caption
pub const EXPORT_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Tick label format of the timeline charts (no year)
pub const AXIS_LABEL_FORMAT: &str = "%m/%d/%y %H:%M";

/// Parse a bucket-end timestamp as returned by the counts API,
/// e.g. `2022-02-24T00:00:00.000Z`.
pub fn parse_api_timestamp(value: &str) -> Result<Timestamp> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| CityPulseError::parse_with_source(format!("Invalid timestamp '{}'", value), e))
}

/// Format a timestamp for export rows and captions
pub fn format_timestamp(timestamp: &Timestamp) -> String {
    timestamp.format(EXPORT_FORMAT).to_string()
}

/// Format a timestamp as a chart tick label
pub fn format_axis_label(timestamp: &Timestamp) -> String {
    timestamp.format(AXIS_LABEL_FORMAT).to_string()
}

/// File stem for a run-dated export, `YYYY-MM-DD`
pub fn run_date_stem(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Seconds since the epoch as a chart coordinate
pub fn to_chart_x(timestamp: &Timestamp) -> f64 {
    timestamp.timestamp() as f64
}

/// Inverse of [`to_chart_x`], used by tick label formatters
pub fn from_chart_x(x: f64) -> Option<Timestamp> {
    DateTime::<Utc>::from_timestamp(x.round() as i64, 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_parse_api_timestamp_with_fraction() {
        let ts = parse_api_timestamp("2022-02-24T03:00:00.000Z").unwrap();
        assert_eq!(ts, Utc.with_ymd_and_hms(2022, 2, 24, 3, 0, 0).unwrap());
    }

    #[test]
    fn test_parse_api_timestamp_rejects_garbage() {
        assert!(parse_api_timestamp("24.02.2022").is_err());
        assert!(parse_api_timestamp("").is_err());
    }

    #[test]
    fn test_formats() {
        let ts = Utc.with_ymd_and_hms(2022, 2, 25, 14, 5, 9).unwrap();
        assert_eq!(format_timestamp(&ts), "2022-02-25 14:05:09");
        assert_eq!(format_axis_label(&ts), "02/25/22 14:05");
        assert_eq!(run_date_stem(ts.date_naive()), "2022-02-25");
    }

    #[test]
    fn test_chart_x_round_trip() {
        let ts = Utc.with_ymd_and_hms(2022, 3, 1, 12, 0, 0).unwrap();
        assert_eq!(from_chart_x(to_chart_x(&ts)), Some(ts));
    }
}
