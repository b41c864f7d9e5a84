//! # CityPulse
//!
//! Tracks how often a fixed set of cities is mentioned over time and renders
//! the counts as a timeline synchronized with an animated map.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod pipeline;

pub use pipeline::{Pipeline, RunSummary};
