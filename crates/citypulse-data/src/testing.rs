//! Test doubles for the acquisition seam

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Duration;
use citypulse_common::{CityPulseError, Result, Timestamp};

use crate::{build_series, EntityRecord, LocationDescriptor, MentionSource, RawObservation};

#[derive(Debug, Clone)]
enum Script {
    Observations(Vec<RawObservation>),
    Failure(String),
}

/// A [`MentionSource`] that answers from a fixed script and records every call
#[derive(Debug, Default)]
pub struct ScriptedSource {
    scripts: HashMap<String, Script>,
    calls: Mutex<Vec<(String, Timestamp)>>,
}

impl ScriptedSource {
    /// Create an empty script; unscripted locations fail
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `location` with `observations`
    pub fn with_observations(mut self, location: &str, observations: Vec<RawObservation>) -> Self {
        self.scripts
            .insert(location.to_string(), Script::Observations(observations));
        self
    }

    /// Answer `location` with hourly buckets ending one hour after `start`
    pub fn with_hourly_counts(self, location: &str, start: Timestamp, counts: &[u64]) -> Self {
        self.with_observations(location, hourly_observations(start, counts))
    }

    /// Fail `location` with a network error
    pub fn with_failure(mut self, location: &str, message: &str) -> Self {
        self.scripts
            .insert(location.to_string(), Script::Failure(message.to_string()));
        self
    }

    /// Calls received so far, in order
    pub fn calls(&self) -> Vec<(String, Timestamp)> {
        self.calls.lock().map(|calls| calls.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl MentionSource for ScriptedSource {
    async fn fetch_counts(&self, location: &str, start: Timestamp) -> Result<Vec<RawObservation>> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push((location.to_string(), start));
        }
        match self.scripts.get(location) {
            Some(Script::Observations(observations)) => Ok(observations.clone()),
            Some(Script::Failure(message)) => Err(CityPulseError::network(message.clone())),
            None => Err(CityPulseError::network(format!("No script for '{}'", location))),
        }
    }
}

/// Hourly observations whose first bucket ends one hour after `start`
pub fn hourly_observations(start: Timestamp, counts: &[u64]) -> Vec<RawObservation> {
    counts
        .iter()
        .enumerate()
        .map(|(i, count)| RawObservation::new(start + Duration::hours(i as i64 + 1), *count))
        .collect()
}

/// Build a record from explicit times and counts
pub fn record(name: &str, population: u64, times: &[Timestamp], counts: &[u64]) -> Result<EntityRecord> {
    let location = LocationDescriptor::new(name, population, 0.0, 0.0)?;
    let observations = times
        .iter()
        .zip(counts)
        .map(|(time, count)| RawObservation::new(*time, *count));
    build_series(location, observations)
}
