//! Location metadata loader

use std::fs;
use std::path::Path;
use std::str::FromStr;

use citypulse_common::{CityPulseError, Result};
use serde::Deserialize;
use tracing::{info, instrument, warn};

use crate::LocationDescriptor;

/// A field that may be written as a JSON string or a JSON number
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum Field {
    Text(String),
    Number(serde_json::Number),
}

impl Field {
    fn parse<T: FromStr>(&self, city: &str, name: &str) -> Result<T> {
        let text = match self {
            Self::Text(text) => text.trim().to_string(),
            Self::Number(number) => number.to_string(),
        };
        text.parse()
            .map_err(|_| CityPulseError::parse(format!("Invalid {} '{}' for '{}'", name, text, city)))
    }
}

#[derive(Debug, Deserialize)]
struct CityEntry {
    city: String,
    lat: Field,
    lng: Field,
    population: Field,
}

impl CityEntry {
    fn into_descriptor(self) -> Result<LocationDescriptor> {
        let latitude: f64 = self.lat.parse(&self.city, "lat")?;
        let longitude: f64 = self.lng.parse(&self.city, "lng")?;
        let population = parse_population(&self.population, &self.city)?;
        LocationDescriptor::new(self.city, population, longitude, latitude)
    }
}

// Some metadata sources write populations as "1446107.0"
fn parse_population(field: &Field, city: &str) -> Result<u64> {
    if let Ok(population) = field.parse::<u64>(city, "population") {
        return Ok(population);
    }
    let value: f64 = field.parse(city, "population")?;
    if value.is_finite() && value >= 0.0 && value.fract() == 0.0 {
        Ok(value as u64)
    } else {
        Err(CityPulseError::parse(format!("Invalid population for '{}'", city)))
    }
}

/// Parse location metadata, keeping at most `limit` records in file order
pub fn parse_locations(text: &str, limit: usize) -> Result<Vec<LocationDescriptor>> {
    let entries: Vec<CityEntry> = serde_json::from_str(text)?;
    let available = entries.len();
    if available > limit {
        info!(available, limit, "Truncating location list");
    }

    let locations = entries
        .into_iter()
        .take(limit)
        .map(CityEntry::into_descriptor)
        .collect::<Result<Vec<_>>>()?;

    if locations.is_empty() {
        warn!("Location metadata contains no records");
    }
    Ok(locations)
}

// Invalid byte sequences are skipped so they never reach queries or headers
fn decode_dropping_invalid(bytes: &[u8]) -> String {
    let mut text = String::with_capacity(bytes.len());
    let mut dropped = 0;
    for chunk in bytes.utf8_chunks() {
        text.push_str(chunk.valid());
        dropped += chunk.invalid().len();
    }
    if dropped > 0 {
        warn!(dropped, "Dropped invalid UTF-8 bytes from location metadata");
    }
    text
}

/// Load location metadata from a file; invalid UTF-8 bytes are dropped, not rejected
#[instrument(fields(path = %path.display()))]
pub fn load_locations(path: &Path, limit: usize) -> Result<Vec<LocationDescriptor>> {
    let bytes = fs::read(path)?;
    let text = decode_dropping_invalid(&bytes);
    let locations = parse_locations(&text, limit)?;
    info!(count = locations.len(), "Loaded location metadata");
    Ok(locations)
}
