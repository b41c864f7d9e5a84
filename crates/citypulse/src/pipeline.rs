//! End-to-end run: locations, acquisition, alignment, export, animation

use std::path::{Path, PathBuf};

use chrono::{NaiveDate, Utc};
use citypulse_common::{persist_all, Result, StagedOutput};
use citypulse_config::{AnimationConfig, Config, KeyEventConfig};
use citypulse_data::{
    load_locations, AlignedCohort, AlignedExporter, CohortAssembler, CountsClient, MentionSource,
};
use citypulse_graphs::{
    load_boundary, AnimationDriver, AnimationSettings, Boundary, ChartStyle, EngineOptions,
    EventMarker, FrameUpdateEngine, KeyEventsRenderer, MapSnapshotRenderer, MarkerScaling,
    StaticChartConfig, StaticRenderer, TimelineRenderer,
};
use tracing::{info, instrument};

/// Files written by a successful run
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    /// Number of entities in the cohort
    pub entities: usize,
    /// Number of frames on the shared axis
    pub frames: usize,
    /// Aligned export
    pub export_path: PathBuf,
    /// Animated GIF
    pub animation_path: PathBuf,
    /// Static charts that were requested and written
    pub static_outputs: Vec<PathBuf>,
}

/// One configured run of the whole pipeline
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: Config,
}

impl Pipeline {
    /// Create a pipeline from validated configuration
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Configuration in use
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Run against the counts API, dating the export with today's date
    pub async fn run(&self) -> Result<RunSummary> {
        let client = CountsClient::new(&self.config.api)?;
        self.run_with_source(client, Utc::now().date_naive()).await
    }

    /// Run against any mention source.
    ///
    /// Outputs are persisted together once the cohort is aligned and every
    /// file has been rendered; a failed run writes nothing.
    #[instrument(skip(self, source))]
    pub async fn run_with_source<S: MentionSource>(&self, source: S, run_date: NaiveDate) -> Result<RunSummary> {
        let inputs = &self.config.inputs;
        let locations = load_locations(Path::new(&inputs.cities_file), inputs.max_locations)?;
        let boundary = load_boundary(Path::new(&inputs.boundary_file))?;

        info!(locations = locations.len(), "Acquiring mention counts");
        let assembler = CohortAssembler::new(source, self.config.api.query_start_time)
            .with_concurrency(self.config.api.max_concurrent_requests);
        let cohort = AlignedCohort::new(assembler.assemble(locations).await?)?;
        let (first, last) = cohort.time_span();
        info!(
            entities = cohort.entity_count(),
            frames = cohort.frame_count(),
            %first,
            %last,
            "Cohort aligned"
        );

        // outputs stay staged until every one of them has been rendered
        let export = AlignedExporter::new().stage_in_dir(
            &cohort,
            Path::new(&self.config.output.export_dir),
            run_date,
        )?;
        let export_path = export.target().to_path_buf();

        let animation = &self.config.animation;
        let animation_path = PathBuf::from(&self.config.output.animation_file);
        let mut engine = FrameUpdateEngine::new(&cohort, boundary.clone(), &engine_options(animation))?;
        let gif = AnimationDriver::new(animation_settings(animation)).stage_gif(&mut engine, &animation_path)?;

        let charts = self.stage_static(&cohort, boundary)?;
        let static_outputs: Vec<PathBuf> = charts.iter().map(|c| c.target().to_path_buf()).collect();

        let mut staged = vec![export, gif];
        staged.extend(charts);
        let written = persist_all(staged)?;
        info!(files = written.len(), "Outputs written");

        Ok(RunSummary {
            entities: cohort.entity_count(),
            frames: cohort.frame_count(),
            export_path,
            animation_path,
            static_outputs,
        })
    }

    fn stage_static(&self, cohort: &AlignedCohort, boundary: Boundary) -> Result<Vec<StagedOutput>> {
        let output = &self.config.output;
        let chart = static_chart_config(&self.config.animation);

        let mut jobs: Vec<(Box<dyn StaticRenderer>, &str)> = Vec::new();
        if let Some(path) = &output.timeline_file {
            let renderer: Box<dyn StaticRenderer> = Box::new(TimelineRenderer::new(chart.clone()));
            jobs.push((renderer, path.as_str()));
        }
        if let Some(path) = &output.snapshot_file {
            let renderer: Box<dyn StaticRenderer> = Box::new(MapSnapshotRenderer::new(chart.clone(), boundary));
            jobs.push((renderer, path.as_str()));
        }
        if let Some(path) = &output.events_file {
            let events = key_events(&self.config.events);
            let renderer: Box<dyn StaticRenderer> = Box::new(KeyEventsRenderer::new(chart, events));
            jobs.push((renderer, path.as_str()));
        }

        let mut staged = Vec::with_capacity(jobs.len());
        for (renderer, path) in jobs {
            let path = Path::new(path);
            info!(chart = renderer.name(), path = %path.display(), "Rendering static chart");
            staged.push(renderer.stage_to_file(cohort, path)?);
        }
        Ok(staged)
    }
}

/// Engine options from the animation section
pub fn engine_options(animation: &AnimationConfig) -> EngineOptions {
    EngineOptions {
        cursor_warmup: animation.cursor_warmup_frames,
        scaling: MarkerScaling {
            reference_population: animation.reference_population,
            count_scale_factor: animation.count_scale_factor,
        },
        y_label: animation.y_label.clone(),
    }
}

/// Driver settings from the animation section
pub fn animation_settings(animation: &AnimationConfig) -> AnimationSettings {
    AnimationSettings {
        width: animation.width,
        height: animation.height,
        frame_delay_ms: animation.frame_delay_ms,
        title: animation.title.clone(),
        style: ChartStyle::default(),
    }
}

fn static_chart_config(animation: &AnimationConfig) -> StaticChartConfig {
    StaticChartConfig {
        title: animation.title.clone(),
        y_label: animation.y_label.clone(),
        ..StaticChartConfig::default()
    }
}

/// Event markers from configuration
pub fn key_events(events: &[KeyEventConfig]) -> Vec<EventMarker> {
    events
        .iter()
        .map(|e| EventMarker {
            label: e.label.clone(),
            at: e.at,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use citypulse_config::default_key_events;

    #[test]
    fn test_engine_options_follow_config() {
        let animation = AnimationConfig {
            cursor_warmup_frames: 4,
            reference_population: 1_000_000.0,
            count_scale_factor: 2.0,
            ..AnimationConfig::default()
        };

        let options = engine_options(&animation);

        assert_eq!(options.cursor_warmup, 4);
        assert_eq!(options.scaling.marker_size(1_000_000, 10), 5.0);
        assert_eq!(options.y_label, "Number of twitter mentions");
    }

    #[test]
    fn test_animation_settings_follow_config() {
        let settings = animation_settings(&AnimationConfig::default());
        assert_eq!((settings.width, settings.height), (800, 1000));
        assert_eq!(settings.frame_delay_ms, 200);
    }

    #[test]
    fn test_key_events_keep_order() {
        let markers = key_events(&default_key_events());
        assert_eq!(markers.len(), 4);
        assert_eq!(markers[0].label, "Initial attacks");
        assert!(markers.windows(2).all(|w| w[0].at <= w[1].at));
    }
}
