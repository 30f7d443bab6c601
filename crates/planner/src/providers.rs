//! Contracts for the external collaborators the planner depends on.
//!
//! Route geometry, elevation, weather, and charger data all come from outside the
//! simulation core. Implementations are blocking; the planner calls them in sequence.

use ev_core::geo::LatLng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Best route returned by a directions provider.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteGeometry {
    /// Ordered polyline from start to end.
    pub points: Vec<LatLng>,
    pub distance_m: f64,
    pub duration_s: f64,
    /// Distance of each leg between consecutive requested coordinates.
    pub leg_distances_m: Vec<f64>,
}

/// A charging station offered by the charger lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChargerCandidate {
    pub id: String,
    pub name: String,
    pub operator: String,
    pub location: LatLng,
    pub power_kw: f64,
}

/// Parameters of a nearby-charger search.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChargerQuery {
    pub center: LatLng,
    pub radius_km: f64,
    pub min_power_kw: f64,
    pub limit: usize,
}

/// Failures reported by collaborators.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("no route found between the requested coordinates")]
    NoRoute,
    #[error("{provider} request failed: {message}")]
    Upstream {
        provider: &'static str,
        message: String,
    },
    #[error("{provider} returned a malformed response: {message}")]
    Malformed {
        provider: &'static str,
        message: String,
    },
}

/// Turn-by-turn geometry between an ordered list of coordinates.
pub trait RouteProvider {
    fn route(&self, coordinates: &[LatLng]) -> Result<RouteGeometry, ProviderError>;
}

/// One elevation (metres) per input point, same order and length.
pub trait ElevationProvider {
    fn elevations(&self, points: &[LatLng]) -> Result<Vec<f64>, ProviderError>;
}

/// Ambient temperature (°C) at a coordinate.
pub trait WeatherProvider {
    fn temperature_c(&self, location: LatLng) -> Result<f64, ProviderError>;
}

/// Chargers around a coordinate, sorted by ascending distance. An empty list is valid.
pub trait ChargerLookup {
    fn find_near(&self, query: &ChargerQuery) -> Result<Vec<ChargerCandidate>, ProviderError>;
}
