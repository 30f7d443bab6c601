//! Fixed-value collaborators for offline runs and tests.

use ev_core::geo::LatLng;
use ev_planner::providers::{ElevationProvider, ProviderError, WeatherProvider};

/// Sea-level terrain everywhere.
#[derive(Debug, Clone, Copy, Default)]
pub struct FlatTerrain;

impl ElevationProvider for FlatTerrain {
    fn elevations(&self, points: &[LatLng]) -> Result<Vec<f64>, ProviderError> {
        Ok(vec![0.0; points.len()])
    }
}

/// The same ambient temperature at every location (°C).
#[derive(Debug, Clone, Copy)]
pub struct FixedTemperature(pub f64);

impl Default for FixedTemperature {
    fn default() -> Self {
        Self(25.0)
    }
}

impl WeatherProvider for FixedTemperature {
    fn temperature_c(&self, _location: LatLng) -> Result<f64, ProviderError> {
        Ok(self.0)
    }
}
