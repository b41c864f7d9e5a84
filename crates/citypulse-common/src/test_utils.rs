//! Test utilities and shared test helpers for CityPulse.
//!
//! Available to other crates through the `testing` feature.

use crate::Timestamp;
use chrono::{Duration, TimeZone, Utc};
use std::sync::Once;
use tracing_subscriber::{fmt, EnvFilter};

/// Initialize test logging once per test run.
static INIT: Once = Once::new();

/// Initialize logging for tests with a sensible default configuration.
/// This function is safe to call multiple times and will only initialize once.
pub fn init_test_logging() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));
        let _ = fmt().with_test_writer().with_env_filter(filter).try_init();
    });
}

/// Test fixture for creating a timestamp.
pub fn mock_timestamp(year: i32, month: u32, day: u32, hour: u32, min: u32, sec: u32) -> Timestamp {
    Utc.with_ymd_and_hms(year, month, day, hour, min, sec)
        .single()
        .expect("valid test timestamp")
}

/// `count` hourly bucket-end timestamps starting one hour after `start`.
pub fn hourly_buckets(start: Timestamp, count: usize) -> Vec<Timestamp> {
    (1..=count as i64).map(|h| start + Duration::hours(h)).collect()
}

/// Render a timestamp the way the counts API does, e.g. `2022-02-24T00:00:00.000Z`.
pub fn api_timestamp(timestamp: &Timestamp) -> String {
    timestamp.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
}

/// Create a temporary directory for tests that automatically cleans up.
pub fn create_temp_dir() -> tempfile::TempDir {
    tempfile::tempdir().expect("Failed to create temporary directory")
}

/// Assert that two floating point numbers are approximately equal within a tolerance.
pub fn assert_approx_eq(left: f64, right: f64, tolerance: f64) {
    let diff = (left - right).abs();
    assert!(
        diff <= tolerance,
        "assertion failed: `{left}` is not approximately equal to `{right}` (tolerance: {tolerance}, diff: {diff})"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hourly_buckets_are_ascending() {
        let start = mock_timestamp(2022, 2, 28, 0, 0, 0);
        let buckets = hourly_buckets(start, 3);
        assert_eq!(buckets.len(), 3);
        assert_eq!(buckets[0], mock_timestamp(2022, 2, 28, 1, 0, 0));
        assert!(buckets.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_api_timestamp_parses_back() {
        let ts = mock_timestamp(2022, 2, 24, 0, 0, 0);
        assert_eq!(api_timestamp(&ts), "2022-02-24T00:00:00.000Z");
        assert_eq!(crate::parse_api_timestamp(&api_timestamp(&ts)).unwrap(), ts);
    }
}
