//! Batched elevation lookups against the Open-Meteo elevation API.

use std::thread;
use std::time::Duration;

use ev_core::geo::LatLng;
use ev_planner::providers::{ElevationProvider, ProviderError};
use log::{debug, warn};
use reqwest::StatusCode;
use reqwest::blocking::Client;
use serde::Deserialize;

use crate::HttpProviderError;

const ELEVATION_URL: &str = "https://api.open-meteo.com/v1/elevation";
pub const BATCH_SIZE: usize = 50;

#[derive(Debug, Deserialize)]
struct ElevationResponse {
    #[serde(default)]
    elevation: Vec<Option<f64>>,
}

/// Elevation client that splits requests into batches and backs off on rate limits.
///
/// The first failed batch aborts the lookup; callers decide how to fall back.
#[derive(Debug, Clone)]
pub struct OpenMeteoElevation {
    client: Client,
    base_url: String,
    batch_size: usize,
    pacing: Duration,
    max_attempts: usize,
}

impl OpenMeteoElevation {
    pub fn new() -> Result<Self, HttpProviderError> {
        Ok(Self {
            client: Client::builder().timeout(Duration::from_secs(20)).build()?,
            base_url: ELEVATION_URL.to_string(),
            batch_size: BATCH_SIZE,
            pacing: Duration::from_millis(250),
            max_attempts: 2,
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_pacing(mut self, pacing: Duration) -> Self {
        self.pacing = pacing;
        self
    }

    fn fetch_batch(&self, batch: &[LatLng]) -> Result<Vec<f64>, HttpProviderError> {
        let (lats, lngs) = batch_query(batch);
        for attempt in 0..self.max_attempts {
            if attempt > 0 {
                thread::sleep(Duration::from_secs(attempt as u64 + 1));
            }
            let response = self
                .client
                .get(&self.base_url)
                .query(&[("latitude", lats.as_str()), ("longitude", lngs.as_str())])
                .send()?;
            if response.status() == StatusCode::TOO_MANY_REQUESTS {
                warn!("elevation API rate limit hit (attempt {})", attempt + 1);
                thread::sleep(Duration::from_secs(2 * (attempt as u64 + 1)));
                continue;
            }
            let body = response.error_for_status()?.text()?;
            return parse_elevations(&body, batch.len());
        }
        Err(HttpProviderError::RateLimited {
            attempts: self.max_attempts,
        })
    }
}

/// Comma-joined latitude and longitude lists at 4-decimal precision.
pub fn batch_query(points: &[LatLng]) -> (String, String) {
    let lats = points
        .iter()
        .map(|p| format!("{:.4}", p.lat))
        .collect::<Vec<_>>()
        .join(",");
    let lngs = points
        .iter()
        .map(|p| format!("{:.4}", p.lng))
        .collect::<Vec<_>>()
        .join(",");
    (lats, lngs)
}

/// Decode a response into exactly `expected` values; nulls and missing tail entries read as 0.
pub fn parse_elevations(body: &str, expected: usize) -> Result<Vec<f64>, HttpProviderError> {
    let response: ElevationResponse = serde_json::from_str(body)?;
    let mut values: Vec<f64> = response
        .elevation
        .into_iter()
        .map(|v| v.unwrap_or(0.0))
        .take(expected)
        .collect();
    values.resize(expected, 0.0);
    Ok(values)
}

impl ElevationProvider for OpenMeteoElevation {
    fn elevations(&self, points: &[LatLng]) -> Result<Vec<f64>, ProviderError> {
        let mut results = Vec::with_capacity(points.len());
        for batch in points.chunks(self.batch_size.max(1)) {
            thread::sleep(self.pacing);
            let values = self
                .fetch_batch(batch)
                .map_err(|err| err.into_provider_error("open-meteo"))?;
            results.extend(values);
        }
        debug!("fetched {} elevation samples", results.len());
        Ok(results)
    }
}
