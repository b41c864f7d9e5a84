//! Frame update engine: one frame index drives both panels

use citypulse_common::{format_timestamp, CityPulseError, Result};
use citypulse_data::{AlignedCohort, EntityRecord};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::geo::Boundary;
use crate::surfaces::{MapAnchor, MapSurface, TrendLine, TrendSurface};

/// Default frame the cursor sits on before the first advance
pub const DEFAULT_CURSOR_WARMUP: usize = 10;

/// Constants of the activity marker encoding.
///
/// `size = (reference_population / population) * (count / count_scale_factor)`
/// is a relative visual weight, not a per-capita rate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MarkerScaling {
    /// Population that maps counts one to one before the scale factor
    pub reference_population: f64,
    /// Divisor applied to raw counts
    pub count_scale_factor: f64,
}

impl Default for MarkerScaling {
    fn default() -> Self {
        Self {
            reference_population: 3_000_000.0,
            count_scale_factor: 3.0,
        }
    }
}

impl MarkerScaling {
    /// Marker area for `count` mentions in a location of `population`
    pub fn marker_size(&self, population: u64, count: u64) -> f64 {
        (self.reference_population / population as f64) * (count as f64 / self.count_scale_factor)
    }

    /// Marker areas of every entity at `frame`
    fn sizes_at(&self, entities: &[EntityRecord], frame: usize) -> Vec<f64> {
        entities
            .iter()
            .map(|e| self.marker_size(e.population(), e.counts()[frame]))
            .collect()
    }
}

/// Construction options of the engine
#[derive(Debug, Clone, PartialEq)]
pub struct EngineOptions {
    /// Frame the cursor starts on; clamped to the last frame
    pub cursor_warmup: usize,
    /// Marker encoding
    pub scaling: MarkerScaling,
    /// Trend panel y axis description
    pub y_label: String,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            cursor_warmup: DEFAULT_CURSOR_WARMUP,
            scaling: MarkerScaling::default(),
            y_label: "Number of twitter mentions".to_string(),
        }
    }
}

/// Keeps the trend cursor, the map markers and the map caption on one frame.
///
/// Construct once per animation, then call [`advance_to`](Self::advance_to)
/// for each frame. The engine has no timer; a driver decides when to advance
/// and when to rasterize.
#[derive(Debug)]
pub struct FrameUpdateEngine<'a> {
    cohort: &'a AlignedCohort,
    scaling: MarkerScaling,
    trend: TrendSurface,
    map: MapSurface,
    frame: Option<usize>,
}

impl<'a> FrameUpdateEngine<'a> {
    /// Draw the full series and place the initial cursor, sizes and caption
    pub fn new(cohort: &'a AlignedCohort, boundary: Boundary, options: &EngineOptions) -> Result<Self> {
        let entities = cohort.entities();
        let lines = entities.iter().map(|e| TrendLine::from_record(e, 0)).collect();
        let mut trend = TrendSurface::new(lines, options.y_label.clone());

        let warmup = options.cursor_warmup.min(cohort.frame_count() - 1);
        trend.set_cursor(cohort.time_axis()[warmup]);

        let mut map = MapSurface::new(boundary, entities.iter().map(MapAnchor::from).collect());
        map.set_activity_sizes(options.scaling.sizes_at(entities, 0))?;
        map.set_caption(format_timestamp(&cohort.time_axis()[0]));

        debug!(
            entities = cohort.entity_count(),
            frames = cohort.frame_count(),
            warmup,
            "Frame update engine ready"
        );

        Ok(Self {
            cohort,
            scaling: options.scaling,
            trend,
            map,
            frame: None,
        })
    }

    /// Move both panels to `frame`.
    ///
    /// Fails with `FrameIndexOutOfRange` when `frame` is past the last index;
    /// the surfaces are untouched in that case.
    pub fn advance_to(&mut self, frame: usize) -> Result<()> {
        let len = self.cohort.frame_count();
        if frame >= len {
            return Err(CityPulseError::frame_out_of_range(frame, len));
        }

        let at = self.cohort.time_axis()[frame];
        self.map
            .set_activity_sizes(self.scaling.sizes_at(self.cohort.entities(), frame))?;
        self.trend.set_cursor(at);
        self.map.set_caption(format_timestamp(&at));
        self.frame = Some(frame);

        trace!(frame, "Advanced");
        Ok(())
    }

    /// Last frame advanced to, `None` before the first advance
    pub fn current_frame(&self) -> Option<usize> {
        self.frame
    }

    /// Number of frames on the shared axis
    pub fn frame_count(&self) -> usize {
        self.cohort.frame_count()
    }

    /// Trend panel state
    pub fn trend(&self) -> &TrendSurface {
        &self.trend
    }

    /// Map panel state
    pub fn map(&self) -> &MapSurface {
        &self.map
    }

    /// Marker encoding in use
    pub fn scaling(&self) -> MarkerScaling {
        self.scaling
    }
}
