//! Integration tests for citypulse-data crate.
//!
//! These tests drive assembly, alignment and export end to end against a
//! scripted mention source.

use std::fs;

use chrono::{Duration, NaiveDate};
use citypulse_common::test_utils::{create_temp_dir, init_test_logging, mock_timestamp};
use citypulse_common::CityPulseError;
use citypulse_data::testing::{hourly_observations, record, ScriptedSource};
use citypulse_config::ApiConfig;
use citypulse_data::{
    load_locations, AlignedCohort, AlignedExporter, CohortAssembler, CountsClient, LocationDescriptor,
};

fn location(name: &str, population: u64) -> LocationDescriptor {
    LocationDescriptor::new(name, population, 30.0, 48.0).unwrap()
}

#[tokio::test]
async fn test_assemble_align_and_export() {
    init_test_logging();
    let start = mock_timestamp(2022, 2, 28, 0, 0, 0);
    let source = ScriptedSource::new()
        .with_hourly_counts("Kyiv", start, &[3, 8, 13])
        .with_hourly_counts("Lviv", start, &[1, 0, 2]);

    let assembler = CohortAssembler::new(source, start);
    let cohort = assembler
        .assemble(vec![location("Kyiv", 2_963_199), location("Lviv", 721_301)])
        .await
        .unwrap();
    let aligned = AlignedCohort::new(cohort).unwrap();

    let dir = create_temp_dir();
    let path = AlignedExporter::new()
        .export_to_dir(&aligned, dir.path(), NaiveDate::from_ymd_opt(2022, 3, 1).unwrap())
        .unwrap();

    let written = fs::read_to_string(path).unwrap();
    assert_eq!(
        written,
        "time;Kyiv;Lviv\n\
         2022-02-28 01:00:00;3;1\n\
         2022-02-28 02:00:00;8;0\n\
         2022-02-28 03:00:00;13;2\n"
    );
}

#[tokio::test]
async fn test_every_entity_queried_once_with_shared_start() {
    let start = mock_timestamp(2022, 2, 28, 0, 0, 0);
    let source = ScriptedSource::new()
        .with_hourly_counts("A", start, &[1])
        .with_hourly_counts("B", start, &[2])
        .with_hourly_counts("C", start, &[3]);

    let assembler = CohortAssembler::new(source, start).with_concurrency(2);
    let cohort = assembler
        .assemble(vec![location("A", 1), location("B", 1), location("C", 1)])
        .await
        .unwrap();

    assert_eq!(cohort.len(), 3);
    assert_eq!(cohort[2].name(), "C");
}

#[tokio::test]
async fn test_empty_entity_stops_before_any_output() {
    let start = mock_timestamp(2022, 2, 28, 0, 0, 0);
    let source = ScriptedSource::new()
        .with_hourly_counts("Kyiv", start, &[3, 8])
        .with_observations("Mariupol", Vec::new())
        .with_hourly_counts("Lviv", start, &[1, 0]);

    let dir = create_temp_dir();
    let result = CohortAssembler::new(source, start)
        .assemble(vec![location("Kyiv", 1), location("Mariupol", 1), location("Lviv", 1)])
        .await
        .and_then(AlignedCohort::new)
        .and_then(|aligned| {
            AlignedExporter::new().export_to_dir(&aligned, dir.path(), NaiveDate::from_ymd_opt(2022, 3, 1).unwrap())
        });

    assert!(matches!(result, Err(CityPulseError::DataUnavailable { ref entity }) if entity == "Mariupol"));
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn test_source_failure_reports_completed_entities() {
    let start = mock_timestamp(2022, 2, 28, 0, 0, 0);
    let source = ScriptedSource::new()
        .with_hourly_counts("Kyiv", start, &[3])
        .with_hourly_counts("Lviv", start, &[1])
        .with_failure("Odesa", "connection reset");

    let err = CohortAssembler::new(source, start)
        .assemble(vec![location("Kyiv", 1), location("Lviv", 1), location("Odesa", 1)])
        .await
        .unwrap_err();

    match err {
        CityPulseError::PartialCohort { entity, completed, source } => {
            assert_eq!(entity, "Odesa");
            assert_eq!(completed, 2);
            assert!(source.to_string().contains("connection reset"));
        }
        other => panic!("expected PartialCohort, got {other:?}"),
    }
}

#[test]
fn test_length_mismatch_rejected_before_export() {
    let start = mock_timestamp(2022, 2, 24, 0, 0, 0);
    let axis: Vec<_> = (0..11).map(|i| start + Duration::hours(i)).collect();

    let short = record("CityA", 100, &axis[..10], &[1; 10]).unwrap();
    let long = record("CityB", 100, &axis, &[1; 11]).unwrap();

    let err = AlignedCohort::new(vec![short, long]).unwrap_err();
    assert!(matches!(err, CityPulseError::MisalignedCohort { .. }));
}

#[test]
fn test_hourly_observations_helper() {
    let start = mock_timestamp(2022, 2, 28, 0, 0, 0);
    let observations = hourly_observations(start, &[4, 5]);

    assert_eq!(observations[0].bucket_end, start + Duration::hours(1));
    assert_eq!(observations[1].count, 5);
}

#[test]
fn test_invalid_utf8_never_reaches_search_query() {
    let dir = create_temp_dir();
    let path = dir.path().join("ua.json");
    fs::write(
        &path,
        b"[{\"city\": \"Ky\xffiv\", \"lat\": \"50.45\", \"lng\": \"30.52\", \"population\": \"2963199\"}]",
    )
    .unwrap();

    let locations = load_locations(&path, 15).unwrap();
    let client = CountsClient::new(&ApiConfig::default()).unwrap();

    assert_eq!(client.query_for(locations[0].name()), "#Ukraine Kyiv");
}
