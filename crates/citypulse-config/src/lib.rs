//! # CityPulse Config
//!
//! YAML configuration with environment overrides and validation.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod loader;
pub mod settings;

pub use loader::{ConfigError, ConfigLoader, CONFIG_PATH_VAR};
pub use settings::{
    default_key_events, AnimationConfig, ApiConfig, Config, Granularity, InputConfig, KeyEventConfig,
    LoggingSettings, OutputConfig, CITY_PLACEHOLDER,
};
