//! Drawable panel state
//!
//! A surface holds everything a rasterizer needs to draw one panel. Surfaces
//! are plain data: the frame update engine mutates them, the raster module
//! reads them.

use citypulse_common::{CityPulseError, Result, Timestamp};
use citypulse_data::EntityRecord;

use crate::geo::{Boundary, GeoBounds};

/// One entity's complete series on the trend panel
#[derive(Debug, Clone, PartialEq)]
pub struct TrendLine {
    /// Legend label
    pub name: String,
    /// `(time, count)` points in axis order
    pub points: Vec<(Timestamp, u64)>,
}

impl TrendLine {
    /// Line for an entity, optionally dropping the last `skip_last` buckets
    pub fn from_record(record: &EntityRecord, skip_last: usize) -> Self {
        let keep = record.len().saturating_sub(skip_last);
        Self {
            name: record.name().to_string(),
            points: record
                .times()
                .iter()
                .copied()
                .zip(record.counts().iter().copied())
                .take(keep)
                .collect(),
        }
    }
}

/// A labeled vertical dashed marker at a fixed instant
#[derive(Debug, Clone, PartialEq)]
pub struct EventMarker {
    /// Annotation text
    pub label: String,
    /// Marker position
    pub at: Timestamp,
}

/// Time on x, counts on y, one line per entity plus an optional cursor
#[derive(Debug, Clone, PartialEq)]
pub struct TrendSurface {
    lines: Vec<TrendLine>,
    y_label: String,
    cursor: Option<Timestamp>,
    markers: Vec<EventMarker>,
}

impl TrendSurface {
    /// A surface with its lines and no cursor
    pub fn new(lines: Vec<TrendLine>, y_label: impl Into<String>) -> Self {
        Self {
            lines,
            y_label: y_label.into(),
            cursor: None,
            markers: Vec::new(),
        }
    }

    /// Add event markers
    pub fn with_markers(mut self, markers: Vec<EventMarker>) -> Self {
        self.markers = markers;
        self
    }

    /// Lines in cohort order
    pub fn lines(&self) -> &[TrendLine] {
        &self.lines
    }

    /// Y axis description
    pub fn y_label(&self) -> &str {
        &self.y_label
    }

    /// Current cursor position
    pub fn cursor(&self) -> Option<Timestamp> {
        self.cursor
    }

    /// Move the cursor
    pub fn set_cursor(&mut self, at: Timestamp) {
        self.cursor = Some(at);
    }

    /// Event markers
    pub fn markers(&self) -> &[EventMarker] {
        &self.markers
    }

    /// Earliest and latest instant across lines, markers excluded
    pub fn time_range(&self) -> Option<(Timestamp, Timestamp)> {
        let mut times = self.lines.iter().flat_map(|l| l.points.iter().map(|(t, _)| *t));
        let first = times.next()?;
        Some(times.fold((first, first), |(lo, hi), t| (lo.min(t), hi.max(t))))
    }

    /// Largest count on any line
    pub fn max_count(&self) -> u64 {
        self.lines
            .iter()
            .flat_map(|l| l.points.iter().map(|(_, c)| *c))
            .max()
            .unwrap_or(0)
    }
}

/// Fixed per-entity map decoration
#[derive(Debug, Clone, PartialEq)]
pub struct MapAnchor {
    /// Label text
    pub name: String,
    /// Longitude in degrees
    pub longitude: f64,
    /// Latitude in degrees
    pub latitude: f64,
}

impl From<&EntityRecord> for MapAnchor {
    fn from(record: &EntityRecord) -> Self {
        Self {
            name: record.name().to_string(),
            longitude: record.longitude(),
            latitude: record.latitude(),
        }
    }
}

/// Boundary background, one anchor and one activity marker per entity, and a caption
#[derive(Debug, Clone, PartialEq)]
pub struct MapSurface {
    boundary: Boundary,
    anchors: Vec<MapAnchor>,
    activity_sizes: Vec<f64>,
    caption: String,
}

impl MapSurface {
    /// A surface with zero-sized activity markers
    pub fn new(boundary: Boundary, anchors: Vec<MapAnchor>) -> Self {
        let activity_sizes = vec![0.0; anchors.len()];
        Self {
            boundary,
            anchors,
            activity_sizes,
            caption: String::new(),
        }
    }

    /// Background geometry
    pub fn boundary(&self) -> &Boundary {
        &self.boundary
    }

    /// Anchors in cohort order
    pub fn anchors(&self) -> &[MapAnchor] {
        &self.anchors
    }

    /// Activity marker areas in cohort order
    pub fn activity_sizes(&self) -> &[f64] {
        &self.activity_sizes
    }

    /// Replace every activity size at once; the count must match the anchors
    pub fn set_activity_sizes(&mut self, sizes: Vec<f64>) -> Result<()> {
        if sizes.len() != self.anchors.len() {
            return Err(CityPulseError::render(format!(
                "Expected {} marker sizes, got {}",
                self.anchors.len(),
                sizes.len()
            )));
        }
        self.activity_sizes = sizes;
        Ok(())
    }

    /// Panel caption
    pub fn caption(&self) -> &str {
        &self.caption
    }

    /// Replace the caption
    pub fn set_caption(&mut self, caption: impl Into<String>) {
        self.caption = caption.into();
    }

    /// Drawing extent: boundary and anchors, padded
    pub fn bounds(&self) -> GeoBounds {
        let anchors = GeoBounds::from_points(self.anchors.iter().map(|a| (a.longitude, a.latitude)));
        let extent = match (self.boundary.bounds(), anchors) {
            (Some(b), Some(a)) => b.union(a),
            (Some(b), None) => b,
            (None, Some(a)) => a,
            (None, None) => GeoBounds {
                min_lon: -180.0,
                max_lon: 180.0,
                min_lat: -90.0,
                max_lat: 90.0,
            },
        };
        extent.padded(0.03)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use citypulse_data::testing::record;
    use chrono::{Duration, TimeZone, Utc};

    fn anchors() -> Vec<MapAnchor> {
        vec![
            MapAnchor {
                name: "Kyiv".to_string(),
                longitude: 30.52,
                latitude: 50.45,
            },
            MapAnchor {
                name: "Lviv".to_string(),
                longitude: 24.03,
                latitude: 49.84,
            },
        ]
    }

    #[test]
    fn test_trend_line_skip_last() {
        let t0 = Utc.with_ymd_and_hms(2022, 2, 24, 0, 0, 0).unwrap();
        let times = [t0, t0 + Duration::hours(1), t0 + Duration::hours(2)];
        let entity = record("Kyiv", 10, &times, &[4, 9, 1]).unwrap();

        assert_eq!(TrendLine::from_record(&entity, 0).points.len(), 3);
        let trimmed = TrendLine::from_record(&entity, 1);
        assert_eq!(trimmed.points, vec![(times[0], 4), (times[1], 9)]);
        assert!(TrendLine::from_record(&entity, 5).points.is_empty());
    }

    #[test]
    fn test_trend_ranges() {
        let t0 = Utc.with_ymd_and_hms(2022, 2, 24, 0, 0, 0).unwrap();
        let surface = TrendSurface::new(
            vec![
                TrendLine {
                    name: "A".to_string(),
                    points: vec![(t0, 1), (t0 + Duration::hours(2), 7)],
                },
                TrendLine {
                    name: "B".to_string(),
                    points: vec![(t0 + Duration::hours(1), 3)],
                },
            ],
            "mentions",
        );

        assert_eq!(surface.time_range(), Some((t0, t0 + Duration::hours(2))));
        assert_eq!(surface.max_count(), 7);
        assert_eq!(surface.cursor(), None);
        assert_eq!(TrendSurface::new(Vec::new(), "").time_range(), None);
    }

    #[test]
    fn test_sizes_replaced_whole() {
        let mut map = MapSurface::new(Boundary::default(), anchors());
        assert_eq!(map.activity_sizes(), &[0.0, 0.0]);

        map.set_activity_sizes(vec![1.5, 2.5]).unwrap();
        assert_eq!(map.activity_sizes(), &[1.5, 2.5]);

        assert!(map.set_activity_sizes(vec![1.0]).is_err());
        assert_eq!(map.activity_sizes(), &[1.5, 2.5]);
    }

    #[test]
    fn test_bounds_cover_anchors() {
        let map = MapSurface::new(Boundary::default(), anchors());
        let bounds = map.bounds();
        assert!(bounds.min_lon < 24.03 && bounds.max_lon > 30.52);
        assert!(bounds.min_lat < 49.84 && bounds.max_lat > 50.45);
    }
}
