//! Integration tests for citypulse-common crate.

use chrono::NaiveDate;
use citypulse_common::time::{from_chart_x, run_date_stem, to_chart_x};
use citypulse_common::{format_axis_label, format_timestamp, parse_api_timestamp, CityPulseError};

#[test]
fn test_api_timestamp_to_export_and_axis_formats() {
    let timestamp = parse_api_timestamp("2022-02-24T03:00:00.000Z").unwrap();

    assert_eq!(format_timestamp(&timestamp), "2022-02-24 03:00:00");
    assert_eq!(format_axis_label(&timestamp), "02/24/22 03:00");
    assert_eq!(from_chart_x(to_chart_x(&timestamp)), Some(timestamp));
}

#[test]
fn test_run_date_stem() {
    let date = NaiveDate::from_ymd_opt(2022, 3, 1).unwrap();
    assert_eq!(run_date_stem(date), "2022-03-01");
}

#[test]
fn test_partial_cohort_keeps_source() {
    let cause = CityPulseError::api_with_status("Too Many Requests", 429);
    let err = CityPulseError::partial_cohort("Odesa", 3, cause);

    let message = err.to_string();
    assert!(message.contains("Odesa"));
    assert!(message.contains('3'));
    assert!(std::error::Error::source(&err).is_some());
}
