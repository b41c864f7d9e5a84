//! Entity records: one tracked location and its mention-count series

use citypulse_common::{CityPulseError, Result, Timestamp};
use serde::Serialize;

/// Static attributes of a tracked location
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocationDescriptor {
    name: String,
    population: u64,
    longitude: f64,
    latitude: f64,
}

impl LocationDescriptor {
    /// Create a descriptor; a zero population is rejected since it divides marker sizes
    pub fn new(name: impl Into<String>, population: u64, longitude: f64, latitude: f64) -> Result<Self> {
        let name = name.into();
        if population == 0 {
            return Err(CityPulseError::invalid_population(name));
        }
        Ok(Self {
            name,
            population,
            longitude,
            latitude,
        })
    }

    /// Location name, used as the search term and column header
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Population, always greater than zero
    pub fn population(&self) -> u64 {
        self.population
    }

    /// Longitude in degrees
    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    /// Latitude in degrees
    pub fn latitude(&self) -> f64 {
        self.latitude
    }
}

/// One `(bucket-end time, count)` pair from the acquisition source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RawObservation {
    /// End of the counting interval
    pub bucket_end: Timestamp,
    /// Mentions inside the interval
    pub count: u64,
}

impl RawObservation {
    /// Create an observation
    pub fn new(bucket_end: Timestamp, count: u64) -> Self {
        Self { bucket_end, count }
    }
}

/// A tracked location together with its observed series.
///
/// `times` and `counts` only grow together, so both always have the same
/// length and `counts[i]` belongs to `times[i]`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntityRecord {
    #[serde(flatten)]
    location: LocationDescriptor,
    times: Vec<Timestamp>,
    counts: Vec<u64>,
}

impl EntityRecord {
    /// Create a record with an empty series
    pub fn new(location: LocationDescriptor) -> Self {
        Self {
            location,
            times: Vec::new(),
            counts: Vec::new(),
        }
    }

    /// Append one observation at the end of the series
    pub(crate) fn push(&mut self, observation: RawObservation) {
        self.times.push(observation.bucket_end);
        self.counts.push(observation.count);
    }

    /// Reverse the series in place, keeping times and counts paired
    pub(crate) fn reverse_series(&mut self) {
        self.times.reverse();
        self.counts.reverse();
    }

    /// Static attributes
    pub fn location(&self) -> &LocationDescriptor {
        &self.location
    }

    /// Location name
    pub fn name(&self) -> &str {
        self.location.name()
    }

    /// Population, always greater than zero
    pub fn population(&self) -> u64 {
        self.location.population()
    }

    /// Longitude in degrees
    pub fn longitude(&self) -> f64 {
        self.location.longitude()
    }

    /// Latitude in degrees
    pub fn latitude(&self) -> f64 {
        self.location.latitude()
    }

    /// Bucket-end timestamps in receipt order
    pub fn times(&self) -> &[Timestamp] {
        &self.times
    }

    /// Counts in receipt order
    pub fn counts(&self) -> &[u64] {
        &self.counts
    }

    /// Number of observations
    pub fn len(&self) -> usize {
        self.times.len()
    }

    /// Whether the series is empty
    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// Observation at `index`, if present
    pub fn observation(&self, index: usize) -> Option<RawObservation> {
        Some(RawObservation::new(*self.times.get(index)?, *self.counts.get(index)?))
    }

    /// Largest count of the series, 0 when empty
    pub fn max_count(&self) -> u64 {
        self.counts.iter().copied().max().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn kyiv() -> LocationDescriptor {
        LocationDescriptor::new("Kyiv", 2_963_199, 30.5236, 50.45).unwrap()
    }

    #[test]
    fn test_zero_population_is_rejected() {
        let err = LocationDescriptor::new("Nowhere", 0, 0.0, 0.0).unwrap_err();
        assert!(matches!(err, CityPulseError::InvalidPopulation { ref entity } if entity == "Nowhere"));
    }

    #[test]
    fn test_push_keeps_pairs() {
        let mut record = EntityRecord::new(kyiv());
        assert!(record.is_empty());

        let t0 = Utc.with_ymd_and_hms(2022, 2, 28, 1, 0, 0).unwrap();
        let t1 = Utc.with_ymd_and_hms(2022, 2, 28, 2, 0, 0).unwrap();
        record.push(RawObservation::new(t0, 7));
        record.push(RawObservation::new(t1, 3));

        assert_eq!(record.len(), 2);
        assert_eq!(record.times(), &[t0, t1]);
        assert_eq!(record.counts(), &[7, 3]);
        assert_eq!(record.observation(1), Some(RawObservation::new(t1, 3)));
        assert_eq!(record.observation(2), None);
        assert_eq!(record.max_count(), 7);
    }

    #[test]
    fn test_reverse_series_keeps_pairs() {
        let mut record = EntityRecord::new(kyiv());
        let t0 = Utc.with_ymd_and_hms(2022, 2, 28, 2, 0, 0).unwrap();
        let t1 = Utc.with_ymd_and_hms(2022, 2, 28, 1, 0, 0).unwrap();
        record.push(RawObservation::new(t0, 1));
        record.push(RawObservation::new(t1, 2));

        record.reverse_series();

        assert_eq!(record.observation(0), Some(RawObservation::new(t1, 2)));
        assert_eq!(record.observation(1), Some(RawObservation::new(t0, 1)));
    }
}
