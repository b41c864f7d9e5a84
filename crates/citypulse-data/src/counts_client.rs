//! Counts API client with rate limiting
//!
//! Fetches per-bucket mention counts from the `tweets/counts/recent` endpoint
//! and turns them into [`RawObservation`]s. Requests are throttled by a
//! per-second quota; failures are reported as-is, there is no retry.

use std::{fmt, num::NonZeroU32, sync::Arc, time::Duration};

use async_trait::async_trait;
use chrono::SecondsFormat;
use citypulse_common::{parse_api_timestamp, CityPulseError, Result, Timestamp};
use citypulse_config::{ApiConfig, Granularity, CITY_PLACEHOLDER};
use governor::{DefaultDirectRateLimiter, Quota};
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, error, instrument};

use crate::{MentionSource, RawObservation};

/// Path of the recent-counts endpoint below the base URL
pub const COUNTS_ENDPOINT: &str = "2/tweets/counts/recent";

/// One bucket of the counts response
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct CountBucket {
    /// Bucket start, ISO-8601
    pub start: String,
    /// Bucket end, ISO-8601
    pub end: String,
    /// Mentions inside the bucket
    pub tweet_count: u64,
}

/// Response metadata
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct CountsMeta {
    /// Sum of all bucket counts
    #[serde(default)]
    pub total_tweet_count: Option<u64>,
}

/// An error object reported in the response body
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ApiProblem {
    /// Human-readable summary
    #[serde(default)]
    pub title: Option<String>,
    /// Details
    #[serde(default)]
    pub detail: Option<String>,
}

impl ApiProblem {
    fn message(&self) -> &str {
        self.detail
            .as_deref()
            .or(self.title.as_deref())
            .unwrap_or("unknown error")
    }
}

/// Body of a counts response
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct CountsResponse {
    /// Buckets in the order the service returned them
    #[serde(default)]
    pub data: Option<Vec<CountBucket>>,
    /// Totals
    #[serde(default)]
    pub meta: Option<CountsMeta>,
    /// Errors reported alongside or instead of data
    #[serde(default)]
    pub errors: Option<Vec<ApiProblem>>,
}

/// Convert a response into observations keyed by bucket end, in response order.
///
/// A response with errors and no data is an API failure; a response without
/// data and without errors yields no observations.
pub fn observations_from_response(response: CountsResponse) -> Result<Vec<RawObservation>> {
    match (response.data, response.errors) {
        (Some(buckets), _) => buckets
            .into_iter()
            .map(|bucket| Ok(RawObservation::new(parse_api_timestamp(&bucket.end)?, bucket.tweet_count)))
            .collect(),
        (None, Some(problems)) if !problems.is_empty() => {
            let messages: Vec<&str> = problems.iter().map(ApiProblem::message).collect();
            Err(CityPulseError::api(messages.join("; ")))
        }
        (None, _) => Ok(Vec::new()),
    }
}

/// Rate-limited client for the counts endpoint
#[derive(Clone)]
pub struct CountsClient {
    client: Client,
    base_url: String,
    bearer_token: String,
    query_template: String,
    granularity: Granularity,
    rate_limiter: Arc<DefaultDirectRateLimiter>,
}

impl fmt::Debug for CountsClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CountsClient")
            .field("base_url", &self.base_url)
            .field("bearer_token", &"<redacted>")
            .field("query_template", &self.query_template)
            .field("granularity", &self.granularity)
            .finish()
    }
}

impl CountsClient {
    /// Create a client from the API section of the configuration
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| CityPulseError::network_with_source("Failed to create HTTP client", e))?;

        let quota = Quota::per_second(
            NonZeroU32::new(config.rate_limit_per_sec)
                .ok_or_else(|| CityPulseError::config("Rate limit must be greater than 0"))?,
        );

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            bearer_token: config.bearer_token.clone(),
            query_template: config.query_template.clone(),
            granularity: config.granularity,
            rate_limiter: Arc::new(DefaultDirectRateLimiter::direct(quota)),
        })
    }

    /// Search query for a location
    pub fn query_for(&self, location: &str) -> String {
        self.query_template.replace(CITY_PLACEHOLDER, location)
    }

    /// Full URL of the counts endpoint
    pub fn endpoint_url(&self) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), COUNTS_ENDPOINT)
    }

    #[instrument(skip(self), fields(query = %query))]
    async fn request_counts(&self, query: &str, start: Timestamp) -> Result<CountsResponse> {
        self.rate_limiter.until_ready().await;

        let url = self.endpoint_url();
        let start_time = start.to_rfc3339_opts(SecondsFormat::Secs, true);
        debug!("Requesting counts from {}", url);

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.bearer_token)
            .query(&[
                ("query", query),
                ("start_time", start_time.as_str()),
                ("granularity", self.granularity.as_str()),
            ])
            .send()
            .await
            .map_err(|e| CityPulseError::network_with_source("Counts request failed", e))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| CityPulseError::network_with_source("Failed to read response body", e))?;

        if !status.is_success() {
            error!("Counts API returned {}", status);
            return Err(CityPulseError::api_with_status(
                format!("Counts API returned {}: {}", status, text.trim()),
                status.as_u16(),
            ));
        }

        debug!(bytes = text.len(), "Received counts response");
        Ok(serde_json::from_str(&text)?)
    }
}

#[async_trait]
impl MentionSource for CountsClient {
    async fn fetch_counts(&self, location: &str, start: Timestamp) -> Result<Vec<RawObservation>> {
        let query = self.query_for(location);
        let response = self.request_counts(&query, start).await?;
        if let Some(total) = response.meta.as_ref().and_then(|m| m.total_tweet_count) {
            debug!(location, total, "Counts total");
        }
        observations_from_response(response)
    }
}
