//! Application configuration structures

use chrono::{TimeZone, Utc};
use citypulse_common::{LogFormat, LoggingConfig as SubscriberConfig, Timestamp};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::loader::ConfigError;

/// Placeholder every query template must contain; replaced by the city name
pub const CITY_PLACEHOLDER: &str = "{city}";

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct Config {
    /// Counts API access
    #[validate(nested)]
    pub api: ApiConfig,

    /// Input files
    #[validate(nested)]
    pub inputs: InputConfig,

    /// Output locations
    #[validate(nested)]
    pub output: OutputConfig,

    /// Animation layout and marker scaling
    #[validate(nested)]
    pub animation: AnimationConfig,

    /// Named events drawn on the event timeline
    pub events: Vec<KeyEventConfig>,

    /// Logging configuration
    #[validate(nested)]
    pub logging: LoggingSettings,
}

/// Counts API configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct ApiConfig {
    /// API base URL
    #[validate(url(message = "API base URL must be a valid URL"))]
    pub base_url: String,

    /// Bearer token; never logged
    pub bearer_token: String,

    /// Search query with a `{city}` placeholder
    #[validate(length(min = 1, message = "Query template cannot be empty"))]
    pub query_template: String,

    /// Shared temporal anchor for every entity's query
    pub query_start_time: Timestamp,

    /// Bucket size requested from the API
    pub granularity: Granularity,

    /// Request timeout in seconds
    #[validate(range(min = 1, max = 300, message = "Timeout must be between 1 and 300 seconds"))]
    pub timeout_seconds: u64,

    /// Rate limit: requests per second
    #[validate(range(min = 1, max = 100, message = "Rate limit must be between 1 and 100 requests per second"))]
    pub rate_limit_per_sec: u32,

    /// Number of entities acquired concurrently; 1 means strictly sequential
    #[validate(range(min = 1, max = 16, message = "Concurrent requests must be between 1 and 16"))]
    pub max_concurrent_requests: usize,
}

/// Bucket granularity understood by the counts endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    /// One bucket per minute
    Minute,
    /// One bucket per hour
    #[default]
    Hour,
    /// One bucket per day
    Day,
}

impl Granularity {
    /// Query parameter value
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Minute => "minute",
            Self::Hour => "hour",
            Self::Day => "day",
        }
    }
}

/// Input file configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct InputConfig {
    /// City metadata (JSON array of `city`, `lat`, `lng`, `population`)
    #[validate(length(min = 1, message = "Cities file cannot be empty"))]
    pub cities_file: String,

    /// GeoJSON boundary drawn behind the map panel
    #[validate(length(min = 1, message = "Boundary file cannot be empty"))]
    pub boundary_file: String,

    /// Number of leading metadata records that are tracked
    #[validate(range(min = 1, max = 1000, message = "Max locations must be between 1 and 1000"))]
    pub max_locations: usize,
}

/// Output configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory receiving `<run-date>.csv`
    #[validate(length(min = 1, message = "Export directory cannot be empty"))]
    pub export_dir: String,

    /// Animated GIF path
    #[validate(length(min = 1, message = "Animation file cannot be empty"))]
    pub animation_file: String,

    /// Optional full-timeline PNG
    pub timeline_file: Option<String>,

    /// Optional last-frame map PNG
    pub snapshot_file: Option<String>,

    /// Optional event-annotated timeline PNG
    pub events_file: Option<String>,
}

/// Animation configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct AnimationConfig {
    /// Frame width in pixels
    #[validate(range(min = 200, max = 4000, message = "Width must be between 200 and 4000 pixels"))]
    pub width: u32,

    /// Frame height in pixels
    #[validate(range(min = 200, max = 4000, message = "Height must be between 200 and 4000 pixels"))]
    pub height: u32,

    /// Delay between frames in milliseconds
    #[validate(range(min = 10, max = 10000, message = "Frame delay must be between 10 and 10000 ms"))]
    pub frame_delay_ms: u32,

    /// Frame index the trend cursor is parked at before the first update
    pub cursor_warmup_frames: usize,

    /// Reference population a marker size is normalized against
    pub reference_population: f64,

    /// Divisor applied to raw counts before scaling
    pub count_scale_factor: f64,

    /// Figure title
    pub title: String,

    /// Trend panel y-axis label
    pub y_label: String,
}

/// A named event drawn as a vertical marker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyEventConfig {
    /// Annotation text
    pub label: String,
    /// Instant of the event
    pub at: Timestamp,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct LoggingSettings {
    /// Log level or filter directive
    #[validate(length(min = 1, message = "Log level cannot be empty"))]
    pub level: String,

    /// Optional log file path
    pub file: Option<String>,

    /// Output format: pretty, compact or json
    pub format: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api: ApiConfig::default(),
            inputs: InputConfig::default(),
            output: OutputConfig::default(),
            animation: AnimationConfig::default(),
            events: default_key_events(),
            logging: LoggingSettings::default(),
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.twitter.com".to_string(),
            bearer_token: String::new(),
            query_template: format!("#Ukraine {}", CITY_PLACEHOLDER),
            query_start_time: default_query_start(),
            granularity: Granularity::Hour,
            timeout_seconds: 30,
            rate_limit_per_sec: 1,
            max_concurrent_requests: 1,
        }
    }
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            cities_file: "geodata/ua.json".to_string(),
            boundary_file: "geodata/custom.geo.json".to_string(),
            max_locations: 15,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            export_dir: "data".to_string(),
            animation_file: "media/animation.gif".to_string(),
            timeline_file: None,
            snapshot_file: None,
            events_file: None,
        }
    }
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            width: 800,
            height: 1000,
            frame_delay_ms: 200,
            cursor_warmup_frames: 10,
            reference_population: 3_000_000.0,
            count_scale_factor: 3.0,
            title: "Ukrainian city mentions on twitter".to_string(),
            y_label: "Number of twitter mentions".to_string(),
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
            format: "pretty".to_string(),
        }
    }
}

impl LoggingSettings {
    /// Subscriber configuration for `citypulse_common::init_logging`
    pub fn to_subscriber_config(&self) -> SubscriberConfig {
        let format = match self.format.as_str() {
            "json" => LogFormat::Json,
            "compact" => LogFormat::Compact,
            _ => LogFormat::Pretty,
        };
        SubscriberConfig {
            level: self.level.clone(),
            format,
            file_path: self.file.clone(),
            ..SubscriberConfig::default()
        }
    }
}

/// Anchor used by the original data collection, shortly after the invasion began
fn default_query_start() -> Timestamp {
    Utc.with_ymd_and_hms(2022, 2, 28, 0, 0, 0)
        .single()
        .unwrap_or_default()
}

/// Events of the 2022 invasion timeline shown on the event chart by default
pub fn default_key_events() -> Vec<KeyEventConfig> {
    let at = |d: u32, h: u32| Utc.with_ymd_and_hms(2022, 2, d, h, 0, 0).single().unwrap_or_default();
    vec![
        KeyEventConfig { label: "Initial attacks".to_string(), at: at(24, 3) },
        KeyEventConfig { label: "Kyiv attacks".to_string(), at: at(25, 4) },
        KeyEventConfig { label: "Kyiv attacks".to_string(), at: at(26, 0) },
        KeyEventConfig { label: "Kharkiv pipeline".to_string(), at: at(27, 3) },
    ]
}

impl Config {
    /// Comprehensive validation of the entire configuration
    pub fn validate_all(&self) -> Result<(), ConfigError> {
        self.validate()?;

        if self.api.bearer_token.trim().is_empty() {
            return Err(ConfigError::Invalid("API bearer token is required".to_string()));
        }
        if !self.api.query_template.contains(CITY_PLACEHOLDER) {
            return Err(ConfigError::Invalid(format!(
                "Query template must contain the {} placeholder",
                CITY_PLACEHOLDER
            )));
        }
        if !(self.animation.reference_population > 0.0) {
            return Err(ConfigError::Invalid("Reference population must be greater than zero".to_string()));
        }
        if !(self.animation.count_scale_factor > 0.0) {
            return Err(ConfigError::Invalid("Count scale factor must be greater than zero".to_string()));
        }
        validate_log_level(&self.logging.level)?;
        match self.logging.format.as_str() {
            "pretty" | "compact" | "json" => {}
            other => {
                return Err(ConfigError::Invalid(format!(
                    "Log format must be one of: pretty, compact, json (got '{}')",
                    other
                )))
            }
        }

        Ok(())
    }
}

fn validate_log_level(level: &str) -> Result<(), ConfigError> {
    // Plain levels only; directives such as `citypulse_data=debug` pass through to EnvFilter
    if level.contains('=') {
        return Ok(());
    }
    match level {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Invalid(
            "Log level must be one of: trace, debug, info, warn, error".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> Config {
        let mut config = Config::default();
        config.api.bearer_token = "token".to_string();
        config
    }

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.inputs.max_locations, 15);
        assert_eq!(config.animation.frame_delay_ms, 200);
        assert_eq!(config.animation.reference_population, 3_000_000.0);
        assert_eq!(config.animation.count_scale_factor, 3.0);
        assert_eq!(config.api.granularity, Granularity::Hour);
    }

    #[test]
    fn test_default_requires_token() {
        let config = Config::default();
        assert!(matches!(config.validate_all(), Err(ConfigError::Invalid(_))));
        assert!(valid_config().validate_all().is_ok());
    }

    #[test]
    fn test_config_serialization() {
        let config = valid_config();

        let yaml = serde_yaml::to_string(&config).expect("Failed to serialize to YAML");
        assert!(yaml.contains("api:"));
        assert!(yaml.contains("animation:"));
        assert!(yaml.contains("granularity: hour"));

        let deserialized: Config = serde_yaml::from_str(&yaml).expect("Failed to deserialize from YAML");
        assert_eq!(deserialized.api.query_start_time, config.api.query_start_time);
        assert_eq!(deserialized.animation.width, config.animation.width);
    }

    #[test]
    fn test_api_config_validation() {
        let mut config = valid_config();
        config.api.base_url = "not_a_url".to_string();
        assert!(config.validate().is_err());

        let mut config = valid_config();
        config.api.rate_limit_per_sec = 0;
        assert!(config.validate().is_err());

        let mut config = valid_config();
        config.api.max_concurrent_requests = 17;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_query_template_needs_placeholder() {
        let mut config = valid_config();
        config.api.query_template = "#Ukraine".to_string();
        assert!(matches!(config.validate_all(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_scaling_must_be_positive() {
        let mut config = valid_config();
        config.animation.count_scale_factor = 0.0;
        assert!(config.validate_all().is_err());

        let mut config = valid_config();
        config.animation.reference_population = f64::NAN;
        assert!(config.validate_all().is_err());
    }

    #[test]
    fn test_logging_validation() {
        let mut config = valid_config();
        for level in ["trace", "debug", "info", "warn", "error", "citypulse_data=debug"] {
            config.logging.level = level.to_string();
            assert!(config.validate_all().is_ok(), "Level {} should be valid", level);
        }

        config.logging.level = "loud".to_string();
        assert!(config.validate_all().is_err());

        config.logging.level = "info".to_string();
        config.logging.format = "xml".to_string();
        assert!(config.validate_all().is_err());
    }

    #[test]
    fn test_logging_settings_conversion() {
        let settings = LoggingSettings {
            level: "debug".to_string(),
            file: Some("logs/citypulse.log".to_string()),
            format: "json".to_string(),
        };
        let subscriber = settings.to_subscriber_config();
        assert_eq!(subscriber.level, "debug");
        assert_eq!(subscriber.format, LogFormat::Json);
        assert_eq!(subscriber.file_path.as_deref(), Some("logs/citypulse.log"));
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let yaml = r"
api:
  bearer_token: 'abc'
  granularity: day
animation:
  frame_delay_ms: 100
";
        let config: Config = serde_yaml::from_str(yaml).expect("Failed to parse partial config");
        assert!(config.validate_all().is_ok());
        assert_eq!(config.api.granularity, Granularity::Day);
        assert_eq!(config.api.timeout_seconds, 30);
        assert_eq!(config.animation.frame_delay_ms, 100);
        assert_eq!(config.animation.width, 800);
        assert_eq!(config.events, default_key_events());
    }

    #[test]
    fn test_default_key_events() {
        let events = default_key_events();
        assert_eq!(events.len(), 4);
        assert_eq!(events[0].label, "Initial attacks");
        assert!(events.windows(2).all(|w| w[0].at < w[1].at));
    }
}
