//! Configuration loading utilities

use crate::Config;
use citypulse_common::Result as CityPulseResult;
use std::env;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};

/// Environment variable pointing at an explicit configuration file
pub const CONFIG_PATH_VAR: &str = "CITYPULSE_CONFIG_PATH";

/// Configuration file names probed in the working directory
const DEFAULT_CONFIG_FILES: [&str; 2] = ["citypulse.yaml", "citypulse.yml"];

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O error when reading configuration file
    #[error("Failed to read configuration file: {0}")]
    IoError(#[from] std::io::Error),

    /// YAML parsing error
    #[error("Failed to parse YAML configuration: {0}")]
    ParseError(#[from] serde_yaml::Error),

    /// Field-level validation error
    #[error("Configuration validation failed: {0}")]
    ValidationError(#[from] validator::ValidationErrors),

    /// Cross-field or semantic validation error
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    /// Environment variable parsing error
    #[error("Failed to parse environment variable '{var}': {source}")]
    EnvParseError {
        var: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl From<ConfigError> for citypulse_common::CityPulseError {
    fn from(err: ConfigError) -> Self {
        citypulse_common::CityPulseError::config_with_source("Failed to load configuration", err)
    }
}

/// Configuration loader for the application
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from a YAML file with environment variable overrides
    pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
        debug!("Reading configuration from {}", path.as_ref().display());
        let content = std::fs::read_to_string(path.as_ref())?;
        let mut config: Config = serde_yaml::from_str(&content)?;

        Self::apply_env_overrides(&mut config)?;
        config.validate_all()?;

        Ok(config)
    }

    /// Load configuration from the environment and the first configuration file found
    pub fn load() -> CityPulseResult<Config> {
        if let Ok(config_path) = env::var(CONFIG_PATH_VAR) {
            info!("Loading configuration from {}", config_path);
            return Ok(Self::load_config(&config_path)?);
        }

        for candidate in DEFAULT_CONFIG_FILES {
            if Path::new(candidate).exists() {
                info!("Loading configuration from {}", candidate);
                return Ok(Self::load_config(candidate)?);
            }
        }

        info!("No configuration file found, using defaults with environment overrides");
        let mut config = Config::default();
        Self::apply_env_overrides(&mut config)?;
        config.validate_all()?;
        Ok(config)
    }

    /// Load configuration from a specific file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> CityPulseResult<Config> {
        Ok(Self::load_config(path)?)
    }

    /// Apply environment variable overrides to configuration
    fn apply_env_overrides(config: &mut Config) -> Result<(), ConfigError> {
        Self::apply_overrides_from(config, |var| env::var(var).ok())
    }

    /// Apply overrides looked up through `lookup`, keyed by environment variable name
    pub fn apply_overrides_from<F>(config: &mut Config, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(token) = lookup("CITYPULSE_BEARER_TOKEN") {
            config.api.bearer_token = token;
        }

        if let Some(url) = lookup("CITYPULSE_API_URL") {
            config.api.base_url = url;
        }

        if let Some(dir) = lookup("CITYPULSE_EXPORT_DIR") {
            config.output.export_dir = dir;
        }

        if let Some(max) = lookup("CITYPULSE_MAX_LOCATIONS") {
            config.inputs.max_locations = parse_var("CITYPULSE_MAX_LOCATIONS", &max)?;
        }

        if let Some(delay) = lookup("CITYPULSE_FRAME_DELAY_MS") {
            config.animation.frame_delay_ms = parse_var("CITYPULSE_FRAME_DELAY_MS", &delay)?;
        }

        if let Some(level) = lookup("LOG_LEVEL") {
            config.logging.level = level;
        }

        if let Some(file) = lookup("LOG_FILE") {
            config.logging.file = Some(file);
        }

        Ok(())
    }
}

fn parse_var<T>(var: &str, value: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    value.trim().parse().map_err(|e| ConfigError::EnvParseError {
        var: var.to_string(),
        source: Box::new(e),
    })
}
