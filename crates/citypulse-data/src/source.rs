//! Acquisition seam between cohort assembly and the counts API

use async_trait::async_trait;
use citypulse_common::{Result, Timestamp};

use crate::RawObservation;

/// A source of per-location mention counts.
///
/// Implementations return observations in the order the upstream service
/// produced them; callers must not assume more than that.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MentionSource: Send + Sync {
    /// Fetch every bucket for `location` starting at `start`
    async fn fetch_counts(&self, location: &str, start: Timestamp) -> Result<Vec<RawObservation>>;
}
