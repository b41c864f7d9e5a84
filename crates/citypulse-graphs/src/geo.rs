//! Boundary geometry for the map background

use std::fs;
use std::path::Path;

use citypulse_common::{CityPulseError, Result};
use serde_json::Value;
use tracing::{info, instrument};

/// A closed ring of `(longitude, latitude)` points
pub type Ring = Vec<(f64, f64)>;

/// Longitude/latitude extent
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoBounds {
    /// Western edge
    pub min_lon: f64,
    /// Eastern edge
    pub max_lon: f64,
    /// Southern edge
    pub min_lat: f64,
    /// Northern edge
    pub max_lat: f64,
}

impl GeoBounds {
    /// Smallest extent containing every point, `None` for no points
    pub fn from_points<I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = (f64, f64)>,
    {
        points
            .into_iter()
            .filter(|(lon, lat)| lon.is_finite() && lat.is_finite())
            .fold(None, |bounds: Option<Self>, (lon, lat)| {
                Some(match bounds {
                    None => Self {
                        min_lon: lon,
                        max_lon: lon,
                        min_lat: lat,
                        max_lat: lat,
                    },
                    Some(b) => Self {
                        min_lon: b.min_lon.min(lon),
                        max_lon: b.max_lon.max(lon),
                        min_lat: b.min_lat.min(lat),
                        max_lat: b.max_lat.max(lat),
                    },
                })
            })
    }

    /// Extent grown to cover `other`
    pub fn union(self, other: Self) -> Self {
        Self {
            min_lon: self.min_lon.min(other.min_lon),
            max_lon: self.max_lon.max(other.max_lon),
            min_lat: self.min_lat.min(other.min_lat),
            max_lat: self.max_lat.max(other.max_lat),
        }
    }

    /// Extent padded by `fraction` of its size on every side, and by at least
    /// half a degree so a single point still spans an area
    pub fn padded(self, fraction: f64) -> Self {
        let pad_lon = ((self.max_lon - self.min_lon) * fraction).max(0.5);
        let pad_lat = ((self.max_lat - self.min_lat) * fraction).max(0.5);
        Self {
            min_lon: self.min_lon - pad_lon,
            max_lon: self.max_lon + pad_lon,
            min_lat: self.min_lat - pad_lat,
            max_lat: self.max_lat + pad_lat,
        }
    }
}

/// Polygon outlines drawn behind the map markers
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Boundary {
    rings: Vec<Ring>,
}

impl Boundary {
    /// A boundary from explicit rings
    pub fn from_rings(rings: Vec<Ring>) -> Self {
        Self { rings }
    }

    /// Parse GeoJSON: a `FeatureCollection`, a `Feature` or a bare geometry.
    ///
    /// `Polygon`, `MultiPolygon` and `GeometryCollection` members contribute
    /// rings; other geometry types are skipped.
    pub fn from_geojson_str(text: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(text)?;
        let mut rings = Vec::new();
        collect_rings(&value, &mut rings)?;
        Ok(Self { rings })
    }

    /// Outer and inner rings in file order
    pub fn rings(&self) -> &[Ring] {
        &self.rings
    }

    /// Whether there is nothing to draw
    pub fn is_empty(&self) -> bool {
        self.rings.is_empty()
    }

    /// Extent of all rings
    pub fn bounds(&self) -> Option<GeoBounds> {
        GeoBounds::from_points(self.rings.iter().flatten().copied())
    }
}

/// Load a GeoJSON boundary file
#[instrument(fields(path = %path.display()))]
pub fn load_boundary(path: &Path) -> Result<Boundary> {
    let text = fs::read_to_string(path)?;
    let boundary = Boundary::from_geojson_str(&text)?;
    info!(rings = boundary.rings().len(), "Loaded boundary");
    Ok(boundary)
}

fn collect_rings(value: &Value, rings: &mut Vec<Ring>) -> Result<()> {
    let kind = value
        .get("type")
        .and_then(Value::as_str)
        .ok_or_else(|| CityPulseError::parse("GeoJSON object without a type"))?;

    match kind {
        "FeatureCollection" => {
            for feature in array_field(value, "features")? {
                collect_rings(feature, rings)?;
            }
        }
        "Feature" => {
            if let Some(geometry) = value.get("geometry").filter(|g| !g.is_null()) {
                collect_rings(geometry, rings)?;
            }
        }
        "GeometryCollection" => {
            for geometry in array_field(value, "geometries")? {
                collect_rings(geometry, rings)?;
            }
        }
        "Polygon" => {
            for ring in array_field(value, "coordinates")? {
                rings.push(parse_ring(ring)?);
            }
        }
        "MultiPolygon" => {
            for polygon in array_field(value, "coordinates")? {
                let polygon = polygon
                    .as_array()
                    .ok_or_else(|| CityPulseError::parse("MultiPolygon member is not an array"))?;
                for ring in polygon {
                    rings.push(parse_ring(ring)?);
                }
            }
        }
        _ => {}
    }
    Ok(())
}

fn array_field<'a>(value: &'a Value, field: &str) -> Result<&'a Vec<Value>> {
    value
        .get(field)
        .and_then(Value::as_array)
        .ok_or_else(|| CityPulseError::parse(format!("GeoJSON '{}' must be an array", field)))
}

fn parse_ring(ring: &Value) -> Result<Ring> {
    ring.as_array()
        .ok_or_else(|| CityPulseError::parse("Ring is not an array"))?
        .iter()
        .map(|position| {
            let lon = position.get(0).and_then(Value::as_f64);
            let lat = position.get(1).and_then(Value::as_f64);
            lon.zip(lat)
                .ok_or_else(|| CityPulseError::parse("Position needs numeric longitude and latitude"))
        })
        .collect()
}
