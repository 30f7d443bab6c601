//! Concrete collaborators for the trip planner: HTTP clients, caches, and offline stand-ins.

pub mod cache;
pub mod catalog;
pub mod constant;
pub mod mapbox;
pub mod open_meteo;
pub mod openweather;
pub mod straight;

pub use cache::CachedElevation;
pub use catalog::{CatalogError, ChargerCatalog};
pub use constant::{FixedTemperature, FlatTerrain};
pub use mapbox::{GeocodedPlace, MapboxDirections, MapboxGeocoder};
pub use open_meteo::OpenMeteoElevation;
pub use openweather::OpenWeather;
pub use straight::StraightLineRouter;

use ev_planner::providers::ProviderError;
use thiserror::Error;

/// Transport-level failures of the HTTP collaborators.
#[derive(Debug, Error)]
pub enum HttpProviderError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("invalid request url: {0}")]
    InvalidUrl(String),
    #[error("rate limited after {attempts} attempt(s)")]
    RateLimited { attempts: usize },
    #[error("unexpected response: {0}")]
    Decode(#[from] serde_json::Error),
}

impl HttpProviderError {
    /// Attach the provider name and lift into the planner's error type.
    pub fn into_provider_error(self, provider: &'static str) -> ProviderError {
        match self {
            HttpProviderError::Decode(err) => ProviderError::Malformed {
                provider,
                message: err.to_string(),
            },
            other => ProviderError::Upstream {
                provider,
                message: other.to_string(),
            },
        }
    }
}
