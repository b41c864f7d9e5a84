//! Animated GIF driver for the frame update engine

use std::path::Path;

use citypulse_common::{CityPulseError, Result, StagedOutput};
use plotters::prelude::*;
use tracing::{debug, info, instrument};

use crate::engine::FrameUpdateEngine;
use crate::raster::draw_figure;
use crate::style::ChartStyle;

/// Figure size, title and timing of the animation
#[derive(Debug, Clone, PartialEq)]
pub struct AnimationSettings {
    /// Figure width in pixels
    pub width: u32,
    /// Figure height in pixels
    pub height: u32,
    /// Delay between frames
    pub frame_delay_ms: u32,
    /// Figure title
    pub title: String,
    /// Colors and fonts
    pub style: ChartStyle,
}

impl Default for AnimationSettings {
    fn default() -> Self {
        Self {
            width: 800,
            height: 1000,
            frame_delay_ms: 200,
            title: "Ukrainian city mentions on twitter".to_string(),
            style: ChartStyle::default(),
        }
    }
}

/// Steps an engine through every frame and appends each one to a GIF
#[derive(Debug, Clone, Default)]
pub struct AnimationDriver {
    settings: AnimationSettings,
}

impl AnimationDriver {
    /// Create a driver
    pub fn new(settings: AnimationSettings) -> Self {
        Self { settings }
    }

    /// Current settings
    pub fn settings(&self) -> &AnimationSettings {
        &self.settings
    }

    /// Render frames `0..N` in order into a staged GIF that becomes `path`
    /// on persist.
    #[instrument(skip(self, engine), fields(path = %path.display(), frames = engine.frame_count()))]
    pub fn stage_gif(&self, engine: &mut FrameUpdateEngine<'_>, path: &Path) -> Result<StagedOutput> {
        let staged = StagedOutput::create(path, ".gif")?;

        {
            let backend = BitMapBackend::gif(
                staged.path(),
                (self.settings.width, self.settings.height),
                self.settings.frame_delay_ms,
            )
            .map_err(|e| CityPulseError::render_with_source("Failed to open GIF encoder", e))?;
            let root = backend.into_drawing_area();

            for frame in 0..engine.frame_count() {
                engine.advance_to(frame)?;
                draw_figure(
                    &root,
                    &self.settings.title,
                    engine.trend(),
                    engine.map(),
                    &self.settings.style,
                )?;
                root.present()?;
                debug!(frame, "Wrote frame");
            }
        }

        Ok(staged)
    }

    /// Render frames `0..N` in order to `path` and return the frame count.
    ///
    /// `path` is replaced only after the last frame was written.
    pub fn render_gif(&self, engine: &mut FrameUpdateEngine<'_>, path: &Path) -> Result<usize> {
        self.stage_gif(engine, path)?.persist()?;
        let frames = engine.frame_count();
        info!(frames, path = %path.display(), "Animation written");
        Ok(frames)
    }
}
