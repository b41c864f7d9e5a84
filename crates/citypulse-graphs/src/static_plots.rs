//! One-shot PNG renderers

use std::path::Path;

use citypulse_common::{Result, StagedOutput};
use citypulse_data::AlignedCohort;
use plotters::coord::Shift;
use plotters::prelude::*;
use tracing::info;

use crate::geo::Boundary;
use crate::raster::{draw_map, draw_trend};
use crate::style::ChartStyle;
use crate::surfaces::{EventMarker, MapAnchor, MapSurface, TrendLine, TrendSurface};

/// A non-animated chart of a whole cohort
pub trait StaticRenderer {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Render the chart for `cohort` into a staged PNG that becomes `path`
    /// on persist
    fn stage_to_file(&self, cohort: &AlignedCohort, path: &Path) -> Result<StagedOutput>;

    /// Render the chart for `cohort` as a PNG at `path`
    fn render_to_file(&self, cohort: &AlignedCohort, path: &Path) -> Result<()> {
        self.stage_to_file(cohort, path)?.persist()?;
        info!("Successfully rendered {} chart to {}", self.name(), path.display());
        Ok(())
    }
}

/// Size, caption and styling common to the static renderers
#[derive(Debug, Clone, PartialEq)]
pub struct StaticChartConfig {
    /// Image width in pixels
    pub width: u32,
    /// Image height in pixels
    pub height: u32,
    /// Chart caption
    pub title: String,
    /// Y axis description of trend charts
    pub y_label: String,
    /// Colors and fonts
    pub style: ChartStyle,
}

impl Default for StaticChartConfig {
    fn default() -> Self {
        Self {
            width: 1200,
            height: 700,
            title: "Ukrainian city mentions on twitter".to_string(),
            y_label: "Number of twitter mentions".to_string(),
            style: ChartStyle::default(),
        }
    }
}

// BitMapBackend picks the encoder from the extension, so the staged file keeps `.png`
fn stage_png<F>(path: &Path, size: (u32, u32), draw: F) -> Result<StagedOutput>
where
    F: FnOnce(&DrawingArea<BitMapBackend<'_>, Shift>) -> Result<()>,
{
    let staged = StagedOutput::create(path, ".png")?;
    {
        let root = BitMapBackend::new(staged.path(), size).into_drawing_area();
        draw(&root)?;
        root.present()?;
    }
    Ok(staged)
}

/// Full series of every entity on one chart
#[derive(Debug, Clone, Default)]
pub struct TimelineRenderer {
    config: StaticChartConfig,
}

impl TimelineRenderer {
    /// Create a renderer
    pub fn new(config: StaticChartConfig) -> Self {
        Self { config }
    }

    /// Surface drawn by this renderer
    pub fn surface(&self, cohort: &AlignedCohort) -> TrendSurface {
        let lines = cohort.entities().iter().map(|e| TrendLine::from_record(e, 0)).collect();
        TrendSurface::new(lines, self.config.y_label.clone())
    }
}

impl StaticRenderer for TimelineRenderer {
    fn name(&self) -> &'static str {
        "timeline"
    }

    fn stage_to_file(&self, cohort: &AlignedCohort, path: &Path) -> Result<StagedOutput> {
        let surface = self.surface(cohort);
        let style = &self.config.style;
        stage_png(path, (self.config.width, self.config.height), |root| {
            root.fill(&style.background())?;
            draw_trend(root, &surface, style, Some(self.config.title.as_str()))
        })
    }
}

/// Map with each entity's last raw count as its marker area
#[derive(Debug, Clone)]
pub struct MapSnapshotRenderer {
    config: StaticChartConfig,
    boundary: Boundary,
}

impl MapSnapshotRenderer {
    /// Create a renderer
    pub fn new(config: StaticChartConfig, boundary: Boundary) -> Self {
        Self { config, boundary }
    }

    /// Surface drawn by this renderer
    pub fn surface(&self, cohort: &AlignedCohort) -> Result<MapSurface> {
        let entities = cohort.entities();
        let mut map = MapSurface::new(
            self.boundary.clone(),
            entities.iter().map(MapAnchor::from).collect(),
        );
        let last = cohort.frame_count() - 1;
        map.set_activity_sizes(entities.iter().map(|e| e.counts()[last] as f64).collect())?;
        map.set_caption(self.config.title.clone());
        Ok(map)
    }
}

impl StaticRenderer for MapSnapshotRenderer {
    fn name(&self) -> &'static str {
        "map snapshot"
    }

    fn stage_to_file(&self, cohort: &AlignedCohort, path: &Path) -> Result<StagedOutput> {
        let surface = self.surface(cohort)?;
        let style = &self.config.style;
        stage_png(path, (self.config.width, self.config.height), |root| {
            root.fill(&style.background())?;
            draw_map(root, &surface, style)
        })
    }
}

/// Timeline with dashed markers for named events.
///
/// The last bucket of every series is left out since it usually covers an
/// interval that was still open when the counts were fetched.
#[derive(Debug, Clone)]
pub struct KeyEventsRenderer {
    config: StaticChartConfig,
    events: Vec<EventMarker>,
}

impl KeyEventsRenderer {
    /// Create a renderer
    pub fn new(config: StaticChartConfig, events: Vec<EventMarker>) -> Self {
        Self { config, events }
    }

    /// Surface drawn by this renderer
    pub fn surface(&self, cohort: &AlignedCohort) -> TrendSurface {
        let lines = cohort.entities().iter().map(|e| TrendLine::from_record(e, 1)).collect();
        TrendSurface::new(lines, self.config.y_label.clone()).with_markers(self.events.clone())
    }
}

impl StaticRenderer for KeyEventsRenderer {
    fn name(&self) -> &'static str {
        "key events"
    }

    fn stage_to_file(&self, cohort: &AlignedCohort, path: &Path) -> Result<StagedOutput> {
        let surface = self.surface(cohort);
        let style = &self.config.style;
        stage_png(path, (self.config.width, self.config.height), |root| {
            root.fill(&style.background())?;
            draw_trend(root, &surface, style, Some(self.config.title.as_str()))
        })
    }
}
