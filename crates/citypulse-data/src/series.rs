//! Series builder: raw observations to an entity record

use citypulse_common::{CityPulseError, Result};
use tracing::debug;

use crate::{EntityRecord, LocationDescriptor, RawObservation};

/// Build the record for one location from observations in receipt order.
///
/// The series keeps the exact order of `observations`; nothing is sorted,
/// deduplicated or gap-filled. An empty input fails with `DataUnavailable`.
pub fn build_series<I>(location: LocationDescriptor, observations: I) -> Result<EntityRecord>
where
    I: IntoIterator<Item = RawObservation>,
{
    let mut record = EntityRecord::new(location);
    for observation in observations {
        record.push(observation);
    }

    if record.is_empty() {
        return Err(CityPulseError::data_unavailable(record.name()));
    }

    debug!(entity = record.name(), observations = record.len(), "Built series");
    Ok(record)
}
