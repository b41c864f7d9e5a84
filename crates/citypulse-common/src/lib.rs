//! # CityPulse Common
//!
//! Shared types, utilities, and common functionality for CityPulse.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod logging;
pub mod output;
pub mod time;

#[cfg(feature = "testing")]
pub mod test_utils;

// Re-export commonly used types
pub use error::{CityPulseError, Result};
pub use logging::{init_default_logging, init_logging, LogFormat, LoggingConfig};
pub use output::{persist_all, StagedOutput};
pub use time::{format_axis_label, format_timestamp, parse_api_timestamp, Timestamp};
