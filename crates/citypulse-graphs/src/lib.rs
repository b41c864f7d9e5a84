//! # CityPulse Graphs
//!
//! Trend and map surfaces, the frame update engine that keeps them on one
//! frame, the GIF animation driver and the static PNG renderers.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod animation;
pub mod engine;
pub mod geo;
pub mod raster;
pub mod static_plots;
pub mod style;
pub mod surfaces;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use animation::{AnimationDriver, AnimationSettings};
pub use engine::{EngineOptions, FrameUpdateEngine, MarkerScaling, DEFAULT_CURSOR_WARMUP};
pub use geo::{load_boundary, Boundary, GeoBounds};
pub use static_plots::{
    KeyEventsRenderer, MapSnapshotRenderer, StaticChartConfig, StaticRenderer, TimelineRenderer,
};
pub use style::{ChartStyle, ColorScheme};
pub use surfaces::{EventMarker, MapAnchor, MapSurface, TrendLine, TrendSurface};
