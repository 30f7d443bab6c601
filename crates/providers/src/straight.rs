//! Offline router that follows great circles between the requested coordinates.

use ev_core::geo::LatLng;
use ev_core::units::kmh_to_ms;
use ev_planner::providers::{ProviderError, RouteGeometry, RouteProvider};

/// Densified great-circle legs with a constant travel speed.
#[derive(Debug, Clone, Copy)]
pub struct StraightLineRouter {
    /// Maximum spacing between generated polyline points (metres).
    pub step_m: f64,
    pub speed_kmh: f64,
}

impl Default for StraightLineRouter {
    fn default() -> Self {
        Self {
            step_m: 1_000.0,
            speed_kmh: 80.0,
        }
    }
}

impl RouteProvider for StraightLineRouter {
    fn route(&self, coordinates: &[LatLng]) -> Result<RouteGeometry, ProviderError> {
        if coordinates.len() < 2 {
            return Err(ProviderError::NoRoute);
        }

        let mut points = vec![coordinates[0]];
        let mut legs = Vec::with_capacity(coordinates.len() - 1);
        for pair in coordinates.windows(2) {
            let (from, to) = (pair[0], pair[1]);
            let length = from.distance_m(&to);
            let steps = (length / self.step_m).ceil().max(1.0) as usize;
            points.extend((1..=steps).map(|k| from.interpolate(&to, k as f64 / steps as f64)));
            legs.push(length);
        }

        let distance_m: f64 = legs.iter().sum();
        Ok(RouteGeometry {
            points,
            distance_m,
            duration_s: distance_m / kmh_to_ms(self.speed_kmh),
            leg_distances_m: legs,
        })
    }
}
