//! Async client for NASA's NeoWs REST API (feature `neows-download`).
//!
//! Two endpoints are used:
//!
//! * `GET /neo/rest/v1/feed?start_date=…&end_date=…` – objects approaching in a date range
//!   (at most 7 days).
//! * `GET /neo/rest/v1/neo/{id}` – full object, including `orbital_data.orbit_uncertainty`.
//!
//! The feed does not carry the orbit uncertainty class, so [`NeoWsClient::fetch_records`]
//! looks every object up individually before flattening it into a [`NeoRecord`].
use hifitime::{Epoch, Unit};
use reqwest::Client;
use tracing::{debug, info};

use crate::impactor_errors::ImpactorError;

use super::{utc_date, NeoFeed, NeoObject, NeoRecord};

pub const NEOWS_BASE_URL: &str = "https://api.nasa.gov/neo/rest/v1";

/// Key used when `NEO_API_KEY` is not set (heavily rate limited).
pub const DEMO_API_KEY: &str = "DEMO_KEY";

/// Maximum span of a feed request, in days.
pub const MAX_FEED_DAYS: f64 = 7.0;

#[derive(Debug, Clone)]
pub struct NeoWsClient {
    http_client: Client,
    base_url: String,
    api_key: String,
}

impl NeoWsClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        NeoWsClient {
            http_client: Client::new(),
            base_url: NEOWS_BASE_URL.to_string(),
            api_key: api_key.into(),
        }
    }

    /// Client keyed from the `NEO_API_KEY` environment variable, `DEMO_KEY` otherwise.
    pub fn from_env() -> Self {
        let key = std::env::var("NEO_API_KEY").unwrap_or_else(|_| DEMO_API_KEY.to_string());
        Self::new(key)
    }

    /// Point the client to another server (mirror or test double).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetch the feed between two epochs (dates taken in UTC, both inclusive).
    ///
    /// Arguments
    /// -----------------
    /// * `start`: First day of the range.
    /// * `end`: Last day of the range, no more than [`MAX_FEED_DAYS`] after `start`.
    ///
    /// Return
    /// ----------
    /// * The parsed [`NeoFeed`], or `InvalidParameter` for a reversed or too long range.
    pub async fn fetch_feed(&self, start: Epoch, end: Epoch) -> Result<NeoFeed, ImpactorError> {
        let span_days = (end - start).to_unit(Unit::Day);
        if !(0.0..=MAX_FEED_DAYS).contains(&span_days) {
            return Err(ImpactorError::InvalidParameter(format!(
                "feed range must span 0 to {MAX_FEED_DAYS} days, got {span_days:.2}"
            )));
        }

        let (start_date, end_date) = (utc_date(start), utc_date(end));
        debug!(%start_date, %end_date, "requesting NeoWs feed");

        let feed = self
            .http_client
            .get(format!("{}/feed", self.base_url))
            .query(&[
                ("start_date", start_date.as_str()),
                ("end_date", end_date.as_str()),
                ("api_key", self.api_key.as_str()),
            ])
            .send()
            .await?
            .error_for_status()?
            .json::<NeoFeed>()
            .await?;

        info!(element_count = feed.element_count, "NeoWs feed received");
        Ok(feed)
    }

    /// Fetch one object by NeoWs id.
    pub async fn fetch_lookup(&self, neo_id: &str) -> Result<NeoObject, ImpactorError> {
        debug!(neo_id, "requesting NeoWs lookup");
        Ok(self
            .http_client
            .get(format!("{}/neo/{}", self.base_url, neo_id))
            .query(&[("api_key", self.api_key.as_str())])
            .send()
            .await?
            .error_for_status()?
            .json::<NeoObject>()
            .await?)
    }

    /// Feed of the range, every object looked up and flattened.
    ///
    /// Objects without close-approach data are skipped.
    pub async fn fetch_records(
        &self,
        start: Epoch,
        end: Epoch,
    ) -> Result<Vec<NeoRecord>, ImpactorError> {
        let feed = self.fetch_feed(start, end).await?;
        let mut records = Vec::new();
        for id in feed.ids() {
            let object = self.fetch_lookup(&id).await?;
            if let Some(record) = NeoRecord::from_object(&object)? {
                records.push(record);
            }
        }
        info!(records = records.len(), "NeoWs records flattened");
        Ok(records)
    }

    /// Records of the last 24 hours.
    pub async fn fetch_last_day(&self) -> Result<Vec<NeoRecord>, ImpactorError> {
        let end = Epoch::now().map_err(|e| ImpactorError::TimeError(e.to_string()))?;
        self.fetch_records(end - Unit::Day * 1, end).await
    }
}

/// Blocking wrapper around [`NeoWsClient::fetch_last_day`] for synchronous callers.
pub fn fetch_last_day_blocking(client: &NeoWsClient) -> Result<Vec<NeoRecord>, ImpactorError> {
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(client.fetch_last_day())
}
