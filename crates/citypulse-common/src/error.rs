//! Error types and utilities for CityPulse

use thiserror::Error;

/// Result type alias for CityPulse operations
pub type Result<T> = std::result::Result<T, CityPulseError>;

/// Boxed error used as the `source` of wrapped failures
pub type BoxedSource = Box<dyn std::error::Error + Send + Sync>;

/// Main error type for CityPulse operations
#[derive(Error, Debug)]
pub enum CityPulseError {
    /// The acquisition source returned no observations for an entity
    #[error("No observations available for '{entity}'")]
    DataUnavailable {
        /// Entity whose series came back empty
        entity: String,
    },

    /// Acquisition failed for one entity after earlier entities succeeded
    #[error("Cohort assembly aborted at '{entity}' after {completed} completed entities: {source}")]
    PartialCohort {
        /// Entity whose acquisition failed
        entity: String,
        /// Number of entities acquired before the failure
        completed: usize,
        /// Underlying acquisition failure
        #[source]
        source: BoxedSource,
    },

    /// Entities in a cohort do not share one time axis
    #[error("Misaligned cohort: {reason}")]
    MisalignedCohort {
        /// Which length or timestamp differs
        reason: String,
    },

    /// A frame index outside the shared time axis was requested
    #[error("Frame index {index} is out of range for {len} frames")]
    FrameIndexOutOfRange {
        /// Requested frame
        index: usize,
        /// Number of frames on the axis
        len: usize,
    },

    /// An entity was constructed with a zero population
    #[error("Population of '{entity}' must be greater than zero")]
    InvalidPopulation {
        /// Offending entity
        entity: String,
    },

    /// The shared time axis is neither ascending nor descending
    #[error("Time axis of '{entity}' is not in chronological order")]
    UnorderedTimeAxis {
        /// Entity whose axis was checked
        entity: String,
    },

    /// Configuration related errors
    #[error("Configuration error: {message}")]
    Config {
        /// Error description
        message: String,
        /// Underlying error, if any
        #[source]
        source: Option<BoxedSource>,
    },

    /// I/O related errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Network related errors (HTTP requests, etc.)
    #[error("Network error: {message}")]
    Network {
        /// Error description
        message: String,
        /// Underlying error, if any
        #[source]
        source: Option<BoxedSource>,
    },

    /// Counts API answered with an error
    #[error("Counts API error: {message}")]
    Api {
        /// Error description
        message: String,
        /// HTTP status, when the error came from a response
        status_code: Option<u16>,
    },

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Malformed input values (timestamps, numeric strings, geometry)
    #[error("Parse error: {message}")]
    Parse {
        /// Error description
        message: String,
        /// Underlying error, if any
        #[source]
        source: Option<BoxedSource>,
    },

    /// Chart and animation rendering errors
    #[error("Render error: {message}")]
    Render {
        /// Error description
        message: String,
        /// Underlying error, if any
        #[source]
        source: Option<BoxedSource>,
    },

    /// Validation errors for input data
    #[error("Validation error: {message}")]
    Validation {
        /// Error description
        message: String,
        /// Name of the invalid field
        field: Option<String>,
    },
}

impl CityPulseError {
    /// Create a data-unavailable error for an entity
    pub fn data_unavailable(entity: impl Into<String>) -> Self {
        Self::DataUnavailable {
            entity: entity.into(),
        }
    }

    /// Create a partial-cohort error wrapping the failure of one entity
    pub fn partial_cohort(
        entity: impl Into<String>,
        completed: usize,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::PartialCohort {
            entity: entity.into(),
            completed,
            source: Box::new(source),
        }
    }

    /// Create a misaligned-cohort error
    pub fn misaligned(reason: impl Into<String>) -> Self {
        Self::MisalignedCohort {
            reason: reason.into(),
        }
    }

    /// Create a frame-index error
    pub fn frame_out_of_range(index: usize, len: usize) -> Self {
        Self::FrameIndexOutOfRange { index, len }
    }

    /// Create an invalid-population error
    pub fn invalid_population(entity: impl Into<String>) -> Self {
        Self::InvalidPopulation {
            entity: entity.into(),
        }
    }

    /// Create an unordered-time-axis error
    pub fn unordered_axis(entity: impl Into<String>) -> Self {
        Self::UnorderedTimeAxis {
            entity: entity.into(),
        }
    }

    /// Create a new configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
            source: None,
        }
    }

    /// Create a new configuration error with source
    pub fn config_with_source(
        msg: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Config {
            message: msg.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a new network error
    pub fn network(msg: impl Into<String>) -> Self {
        Self::Network {
            message: msg.into(),
            source: None,
        }
    }

    /// Create a new network error with source
    pub fn network_with_source(
        msg: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Network {
            message: msg.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a new counts API error
    pub fn api(msg: impl Into<String>) -> Self {
        Self::Api {
            message: msg.into(),
            status_code: None,
        }
    }

    /// Create a new counts API error with HTTP status
    pub fn api_with_status(msg: impl Into<String>, status: u16) -> Self {
        Self::Api {
            message: msg.into(),
            status_code: Some(status),
        }
    }

    /// Create a new parse error
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse {
            message: msg.into(),
            source: None,
        }
    }

    /// Create a new parse error with source
    pub fn parse_with_source(
        msg: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Parse {
            message: msg.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a new render error
    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render {
            message: msg.into(),
            source: None,
        }
    }

    /// Create a new render error with source
    pub fn render_with_source(
        msg: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Render {
            message: msg.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a new validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
            field: None,
        }
    }

    /// Create a new validation error with field name
    pub fn validation_field(msg: impl Into<String>, field: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
            field: Some(field.into()),
        }
    }
}

// Error conversion implementations for external types

/// Convert from reqwest::Error to CityPulseError
impl From<reqwest::Error> for CityPulseError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::network_with_source("Request timeout", err)
        } else if err.is_connect() {
            Self::network_with_source("Connection failed", err)
        } else if err.is_status() {
            let status_code = err.status().map(|s| s.as_u16()).unwrap_or(0);
            Self::network_with_source(format!("HTTP error: {}", status_code), err)
        } else {
            Self::network_with_source("Network request failed", err)
        }
    }
}

/// Convert from csv::Error to CityPulseError
impl From<csv::Error> for CityPulseError {
    fn from(err: csv::Error) -> Self {
        if err.is_io_error() {
            match err.into_kind() {
                csv::ErrorKind::Io(io) => Self::Io(io),
                other => Self::parse(format!("CSV error: {:?}", other)),
            }
        } else {
            Self::parse_with_source("CSV error", err)
        }
    }
}

#[cfg(feature = "plotters")]
/// Convert from plotters drawing errors to CityPulseError
impl<T> From<plotters::drawing::DrawingAreaErrorKind<T>> for CityPulseError
where
    T: std::error::Error + Send + Sync + 'static,
{
    fn from(err: plotters::drawing::DrawingAreaErrorKind<T>) -> Self {
        Self::render_with_source("Chart rendering failed", err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{error::Error, io};

    #[test]
    fn test_core_error_messages() {
        let err = CityPulseError::data_unavailable("Kyiv");
        assert_eq!(err.to_string(), "No observations available for 'Kyiv'");

        let err = CityPulseError::frame_out_of_range(12, 12);
        assert_eq!(err.to_string(), "Frame index 12 is out of range for 12 frames");

        let err = CityPulseError::misaligned("length 10 != 11");
        assert!(err.to_string().starts_with("Misaligned cohort"));

        let err = CityPulseError::invalid_population("Lviv");
        assert!(err.to_string().contains("Lviv"));
    }

    #[test]
    fn test_partial_cohort_keeps_source() {
        let cause = CityPulseError::api_with_status("rate limited", 429);
        let err = CityPulseError::partial_cohort("Odesa", 3, cause);

        assert!(err.to_string().contains("Odesa"));
        assert!(err.to_string().contains("3 completed"));
        let source = err.source().expect("source is kept");
        assert!(source.to_string().contains("rate limited"));
    }

    #[test]
    fn test_error_with_source() {
        let io_error = io::Error::new(io::ErrorKind::PermissionDenied, "Access denied");
        let err = CityPulseError::config_with_source("Config loading failed", io_error);

        assert_eq!(err.to_string(), "Configuration error: Config loading failed");
        assert!(err.source().is_some());
    }

    #[test]
    fn test_io_error_conversion() {
        let io_error = io::Error::new(io::ErrorKind::NotFound, "File not found");
        let err: CityPulseError = io_error.into();

        assert!(err.to_string().contains("I/O error"));
        assert!(err.source().is_some());
    }

    #[test]
    fn test_serde_error_conversion() {
        let serde_error = serde_json::from_str::<serde_json::Value>(r#"{"invalid": json}"#).unwrap_err();
        let err: CityPulseError = serde_error.into();

        assert!(err.to_string().contains("Serialization error"));
    }

    #[test]
    fn test_validation_field() {
        let err = CityPulseError::validation_field("not a number", "population");
        match err {
            CityPulseError::Validation { field, .. } => assert_eq!(field.as_deref(), Some("population")),
            other => panic!("unexpected variant: {other:?}"),
        }
    }
}
