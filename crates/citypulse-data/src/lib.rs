//! # CityPulse Data
//!
//! Entity records, cohort assembly and the aligned export.
//!
//! Data flows one way: a [`MentionSource`] yields raw observations, the
//! series builder turns them into [`EntityRecord`]s, the [`CohortAssembler`]
//! collects one record per location, and [`AlignedCohort`] proves that all
//! records share one time axis before anything indexes them by frame.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod cohort;
pub mod counts_client;
pub mod entity;
pub mod export;
pub mod locations;
pub mod series;
pub mod source;

#[cfg(feature = "testing")]
pub mod testing;

pub use cohort::{AlignedCohort, Cohort, CohortAssembler};
pub use counts_client::{observations_from_response, CountsClient, CountsResponse};
pub use entity::{EntityRecord, LocationDescriptor, RawObservation};
pub use export::{export_path, AlignedExporter};
pub use locations::{load_locations, parse_locations};
pub use series::build_series;
pub use source::MentionSource;
