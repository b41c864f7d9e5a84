//! Aligned exporter: one shared time column followed by one count column per entity

use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use citypulse_common::time::run_date_stem;
use citypulse_common::{format_timestamp, CityPulseError, Result, StagedOutput};
use tracing::{debug, info, instrument};

use crate::AlignedCohort;

/// Header of the time column
pub const TIME_COLUMN: &str = "time";

/// Field delimiter of the export
pub const DELIMITER: u8 = b';';

/// Writes an [`AlignedCohort`] as a `;`-delimited table
#[derive(Debug, Clone, Copy, Default)]
pub struct AlignedExporter;

impl AlignedExporter {
    /// Create an exporter
    pub fn new() -> Self {
        Self
    }

    /// Write header and one row per frame index to `writer`
    pub fn write<W: Write>(&self, cohort: &AlignedCohort, writer: W) -> Result<()> {
        let mut csv = csv::WriterBuilder::new()
            .delimiter(DELIMITER)
            .terminator(csv::Terminator::Any(b'\n'))
            .from_writer(writer);

        let mut header = Vec::with_capacity(cohort.entity_count() + 1);
        header.push(TIME_COLUMN);
        header.extend(cohort.names());
        csv.write_record(&header)?;

        let mut row = Vec::with_capacity(cohort.entity_count() + 1);
        for (frame, time) in cohort.time_axis().iter().enumerate() {
            row.clear();
            row.push(format_timestamp(time));
            row.extend(cohort.entities().iter().map(|e| e.counts()[frame].to_string()));
            csv.write_record(&row)?;
        }

        csv.flush()?;
        Ok(())
    }

    /// Render the table in memory
    pub fn to_string(&self, cohort: &AlignedCohort) -> Result<String> {
        let mut buffer = Vec::new();
        self.write(cohort, &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| CityPulseError::parse_with_source("Export is not valid UTF-8", e))
    }

    /// Write the whole table to a staged file that becomes `path` on persist
    #[instrument(skip(self, cohort), fields(path = %path.display()))]
    pub fn stage_file(&self, cohort: &AlignedCohort, path: &Path) -> Result<StagedOutput> {
        let mut staged = StagedOutput::create(path, ".csv")?;
        self.write(cohort, staged.file_mut())?;
        debug!(
            entities = cohort.entity_count(),
            rows = cohort.frame_count(),
            "Staged aligned export"
        );
        Ok(staged)
    }

    /// Write the table to `path`, replacing it only once the whole table is written
    pub fn export_to_file(&self, cohort: &AlignedCohort, path: &Path) -> Result<()> {
        self.stage_file(cohort, path)?.persist()?;
        info!(
            entities = cohort.entity_count(),
            rows = cohort.frame_count(),
            "Exported aligned cohort"
        );
        Ok(())
    }

    /// Stage `<dir>/<YYYY-MM-DD>.csv` without making it visible yet
    pub fn stage_in_dir(&self, cohort: &AlignedCohort, dir: &Path, run_date: NaiveDate) -> Result<StagedOutput> {
        self.stage_file(cohort, &export_path(dir, run_date))
    }

    /// Write `<dir>/<YYYY-MM-DD>.csv` and return its path
    pub fn export_to_dir(&self, cohort: &AlignedCohort, dir: &Path, run_date: NaiveDate) -> Result<PathBuf> {
        let path = self.stage_in_dir(cohort, dir, run_date)?.persist()?;
        info!(path = %path.display(), "Exported aligned cohort");
        Ok(path)
    }
}

/// Export file for a run date: `<dir>/<YYYY-MM-DD>.csv`
pub fn export_path(dir: &Path, run_date: NaiveDate) -> PathBuf {
    dir.join(format!("{}.csv", run_date_stem(run_date)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{build_series, LocationDescriptor, RawObservation};
    use chrono::{Duration, TimeZone, Utc};
    use std::fs;

    fn city(name: &str, counts: &[u64]) -> crate::EntityRecord {
        let base = Utc.with_ymd_and_hms(2022, 2, 24, 0, 0, 0).unwrap();
        let observations = counts
            .iter()
            .enumerate()
            .map(|(i, c)| RawObservation::new(base + Duration::days(i as i64), *c));
        build_series(LocationDescriptor::new(name, 1_000_000, 0.0, 0.0).unwrap(), observations).unwrap()
    }

    fn two_cities() -> AlignedCohort {
        AlignedCohort::new(vec![city("CityA", &[10, 20]), city("CityB", &[5, 15])]).unwrap()
    }

    #[test]
    fn test_two_city_export() {
        let text = AlignedExporter::new().to_string(&two_cities()).unwrap();

        assert_eq!(
            text,
            "time;CityA;CityB\n2022-02-24 00:00:00;10;5\n2022-02-25 00:00:00;20;15\n"
        );
    }

    #[test]
    fn test_rows_follow_shared_axis() {
        let cohort = AlignedCohort::new(vec![
            city("A", &[1, 2, 3, 4, 5]),
            city("B", &[0, 0, 7, 0, 0]),
            city("C", &[9, 8, 7, 6, 5]),
        ])
        .unwrap();

        let text = AlignedExporter::new().to_string(&cohort).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), cohort.frame_count() + 1);
        for (i, line) in lines[1..].iter().enumerate() {
            let fields: Vec<&str> = line.split(';').collect();
            assert_eq!(fields[0], format_timestamp(&cohort.time_axis()[i]));
            for (column, entity) in cohort.entities().iter().enumerate() {
                assert_eq!(fields[column + 1], entity.counts()[i].to_string());
            }
        }
    }

    #[test]
    fn test_export_to_dir_names_file_by_run_date() {
        let dir = tempfile::tempdir().unwrap();
        let run_date = NaiveDate::from_ymd_opt(2022, 3, 1).unwrap();

        let path = AlignedExporter::new()
            .export_to_dir(&two_cities(), &dir.path().join("data"), run_date)
            .unwrap();

        assert_eq!(path, dir.path().join("data").join("2022-03-01.csv"));
        let written = fs::read_to_string(&path).unwrap();
        assert!(written.starts_with("time;CityA;CityB\n"));
        // only the persisted file remains, no staging leftovers
        assert_eq!(fs::read_dir(dir.path().join("data")).unwrap().count(), 1);
    }

    #[test]
    fn test_staged_export_is_invisible_until_persisted() {
        let dir = tempfile::tempdir().unwrap();
        let run_date = NaiveDate::from_ymd_opt(2022, 3, 1).unwrap();
        let target = export_path(dir.path(), run_date);

        let staged = AlignedExporter::new()
            .stage_in_dir(&two_cities(), dir.path(), run_date)
            .unwrap();
        assert_eq!(staged.target(), target.as_path());
        assert!(!target.exists());

        drop(staged);
        assert!(!target.exists());
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
