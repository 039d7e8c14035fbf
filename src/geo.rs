//! IP geolocation lookups.
//!
//! The default provider queries the ip-api.com JSON endpoint. Whatever the
//! service answers, or fails to answer, is folded into a display string so
//! that describing a request can never fail because of the lookup.

use crate::core::{error_chain, GeoLocator, GeoLookupResult, UNKNOWN_LOCATION};
use crate::internal_metrics;
use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;
use tracing::{error, info, instrument, warn};

pub const DEFAULT_BASE_URL: &str = "http://ip-api.com";

/// Field selection sent with every lookup.
const FIELDS: &str = "status,message,country,regionName,city,lat,lon";

#[derive(Error, Debug)]
pub enum GeoError {
    #[error(transparent)]
    Request(#[from] reqwest::Error),
}

/// Raw body returned by ip-api.com.
#[derive(Debug, Deserialize)]
struct IpApiResponse {
    status: String,
    message: Option<String>,
    country: Option<String>,
    #[serde(rename = "regionName")]
    region_name: Option<String>,
    city: Option<String>,
    lat: Option<f64>,
    lon: Option<f64>,
}

impl From<IpApiResponse> for GeoLookupResult {
    fn from(body: IpApiResponse) -> Self {
        if body.status != "success" {
            return GeoLookupResult::Failure {
                reason: body.message.filter(|m| !m.is_empty()),
            };
        }
        GeoLookupResult::Success {
            city: body.city.unwrap_or_default(),
            region: body.region_name.unwrap_or_default(),
            country: body.country.unwrap_or_default(),
            lat: body.lat.unwrap_or_default(),
            lon: body.lon.unwrap_or_default(),
        }
    }
}

/// A `GeoLocator` backed by the ip-api.com JSON API.
#[derive(Debug, Clone)]
pub struct IpApiLocator {
    client: reqwest::Client,
    base_url: String,
}

impl IpApiLocator {
    /// Creates a locator that queries `base_url` (e.g. `http://ip-api.com`).
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Performs the lookup and returns the service's answer.
    ///
    /// The address is sent as-is; forwarded-for chains are not split.
    pub async fn lookup(&self, address: &str) -> Result<GeoLookupResult, GeoError> {
        let url = format!("{}/json/{}", self.base_url, address);
        let body: IpApiResponse = self
            .client
            .get(url)
            .query(&[("fields", FIELDS)])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(body.into())
    }
}

impl Default for IpApiLocator {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

#[async_trait]
impl GeoLocator for IpApiLocator {
    #[instrument(skip(self))]
    async fn locate(&self, address: &str) -> String {
        info!("Looking up location for {}", address);
        match self.lookup(address).await {
            Ok(result) => {
                let location = result.display();
                match &result {
                    GeoLookupResult::Success { lat, lon, .. } => {
                        info!(lat, lon, "Location found for {}: {}", address, location);
                        internal_metrics::record_geo_lookup("success");
                    }
                    GeoLookupResult::Failure { .. } => {
                        warn!("Location lookup for {} failed: {}", address, location);
                        internal_metrics::record_geo_lookup("failed");
                    }
                }
                location
            }
            Err(e) => {
                let cause = error_chain(&e);
                error!(error = %cause, "Location lookup request for {} failed", address);
                internal_metrics::record_geo_lookup("error");
                format!("{} (Error: {})", UNKNOWN_LOCATION, cause)
            }
        }
    }
}

/// A `GeoLocator` that never leaves the process. Used when lookups are
/// disabled in the configuration.
#[derive(Debug, Clone, Default)]
pub struct NoOpLocator;

#[async_trait]
impl GeoLocator for NoOpLocator {
    async fn locate(&self, _address: &str) -> String {
        UNKNOWN_LOCATION.to_string()
    }
}
