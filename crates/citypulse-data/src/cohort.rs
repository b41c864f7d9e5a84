//! Cohort assembly and the aligned-cohort factory

use std::collections::HashSet;

use citypulse_common::{format_timestamp, CityPulseError, Result, Timestamp};
use futures::stream::{self, StreamExt};
use tracing::{debug, info, instrument, warn};

use crate::{build_series, EntityRecord, LocationDescriptor, MentionSource};

/// Entity records in input order, as produced by the assembler
pub type Cohort = Vec<EntityRecord>;

/// Drives the series builder once per location against one query start time
pub struct CohortAssembler<S> {
    source: S,
    query_start: Timestamp,
    max_concurrent: usize,
}

impl<S: MentionSource> CohortAssembler<S> {
    /// Create a strictly sequential assembler
    pub fn new(source: S, query_start: Timestamp) -> Self {
        Self {
            source,
            query_start,
            max_concurrent: 1,
        }
    }

    /// Allow up to `max_concurrent` acquisitions in flight; results keep input order
    pub fn with_concurrency(mut self, max_concurrent: usize) -> Self {
        self.max_concurrent = max_concurrent.max(1);
        self
    }

    /// The shared temporal anchor
    pub fn query_start(&self) -> Timestamp {
        self.query_start
    }

    /// Acquire and build a record for every location, in input order.
    ///
    /// The first failure aborts the batch: an empty response surfaces as
    /// `DataUnavailable`, any source error as `PartialCohort` carrying the
    /// number of entities completed before it.
    #[instrument(skip_all, fields(locations = locations.len(), concurrency = self.max_concurrent))]
    pub async fn assemble(&self, locations: Vec<LocationDescriptor>) -> Result<Cohort> {
        info!(start = %self.query_start, "Assembling cohort");
        warn_on_duplicate_names(&locations);

        let query_start = self.query_start;
        let source = &self.source;
        let mut results = stream::iter(locations)
            .map(|location| async move {
                let fetched = source.fetch_counts(location.name(), query_start).await;
                (location, fetched)
            })
            .buffered(self.max_concurrent);

        let mut cohort = Cohort::new();
        while let Some((location, fetched)) = results.next().await {
            let observations = match fetched {
                Ok(observations) => observations,
                Err(e) => {
                    warn!(entity = location.name(), completed = cohort.len(), "Acquisition failed: {}", e);
                    return Err(CityPulseError::partial_cohort(location.name(), cohort.len(), e));
                }
            };
            debug!(entity = location.name(), observations = observations.len(), "Acquired counts");
            cohort.push(build_series(location, observations)?);
        }

        info!(entities = cohort.len(), "Cohort assembled");
        Ok(cohort)
    }
}

fn warn_on_duplicate_names(locations: &[LocationDescriptor]) {
    let mut seen = HashSet::new();
    for location in locations {
        if !seen.insert(location.name()) {
            warn!(entity = location.name(), "Duplicate location name in cohort");
        }
    }
}

/// A cohort whose entities provably share one chronological time axis.
///
/// Every consumer that indexes entities by a shared frame index takes this
/// type instead of a bare [`Cohort`].
#[derive(Debug, Clone, PartialEq)]
pub struct AlignedCohort {
    entities: Vec<EntityRecord>,
}

impl AlignedCohort {
    /// Validate a cohort.
    ///
    /// Rejects empty cohorts and entities whose lengths or timestamps differ
    /// with `MisalignedCohort`. A strictly descending axis is reversed for
    /// every entity; an axis in no consistent order fails with
    /// `UnorderedTimeAxis`.
    pub fn new(mut entities: Cohort) -> Result<Self> {
        let (first, rest) = entities
            .split_first()
            .ok_or_else(|| CityPulseError::misaligned("cohort is empty"))?;

        if first.is_empty() {
            return Err(CityPulseError::data_unavailable(first.name()));
        }

        for other in rest {
            if other.len() != first.len() {
                return Err(CityPulseError::misaligned(format!(
                    "'{}' has {} observations but '{}' has {}",
                    other.name(),
                    other.len(),
                    first.name(),
                    first.len()
                )));
            }
            if let Some(index) = first
                .times()
                .iter()
                .zip(other.times())
                .position(|(a, b)| a != b)
            {
                return Err(CityPulseError::misaligned(format!(
                    "'{}' and '{}' disagree at frame {}: {} vs {}",
                    first.name(),
                    other.name(),
                    index,
                    format_timestamp(&first.times()[index]),
                    format_timestamp(&other.times()[index])
                )));
            }
        }

        match axis_order(first.times()) {
            AxisOrder::Ascending => {}
            AxisOrder::Descending => {
                warn!("Time axis arrived newest-first, reversing every series");
                entities.iter_mut().for_each(EntityRecord::reverse_series);
            }
            AxisOrder::Unordered => return Err(CityPulseError::unordered_axis(first.name())),
        }

        Ok(Self { entities })
    }

    /// Entities in cohort order
    pub fn entities(&self) -> &[EntityRecord] {
        &self.entities
    }

    /// Number of entities
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Number of frames on the shared axis
    pub fn frame_count(&self) -> usize {
        self.entities[0].len()
    }

    /// The shared time axis
    pub fn time_axis(&self) -> &[Timestamp] {
        self.entities[0].times()
    }

    /// Timestamp of `frame`, if in range
    pub fn time_at(&self, frame: usize) -> Option<Timestamp> {
        self.time_axis().get(frame).copied()
    }

    /// First and last instant of the axis
    pub fn time_span(&self) -> (Timestamp, Timestamp) {
        let axis = self.time_axis();
        (axis[0], axis[axis.len() - 1])
    }

    /// Largest count of any entity at any frame
    pub fn max_count(&self) -> u64 {
        self.entities.iter().map(EntityRecord::max_count).max().unwrap_or(0)
    }

    /// Entity names in cohort order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entities.iter().map(EntityRecord::name)
    }

    /// Give the records back
    pub fn into_entities(self) -> Cohort {
        self.entities
    }
}

impl TryFrom<Cohort> for AlignedCohort {
    type Error = CityPulseError;

    fn try_from(cohort: Cohort) -> Result<Self> {
        Self::new(cohort)
    }
}

#[derive(Debug, PartialEq, Eq)]
enum AxisOrder {
    Ascending,
    Descending,
    Unordered,
}

fn axis_order(axis: &[Timestamp]) -> AxisOrder {
    if axis.windows(2).all(|w| w[0] < w[1]) {
        AxisOrder::Ascending
    } else if axis.windows(2).all(|w| w[0] > w[1]) {
        AxisOrder::Descending
    } else {
        AxisOrder::Unordered
    }
}
