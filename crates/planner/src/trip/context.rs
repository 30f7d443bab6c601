//! Gathers route geometry, elevation, and weather for one simulation round.

use ev_config::PlannerPolicy;
use ev_core::geo::LatLng;
use ev_physics::SegmentParams;
use ev_route::{Segment, sample_points, segment_grade, segment_polyline};
use log::{debug, warn};

use super::waypoints::Waypoint;
use super::{PlanError, TripProviders};
use crate::providers::RouteGeometry;

/// Everything a simulator pass needs about the road ahead. Owned by one round.
#[derive(Debug, Clone)]
pub struct RouteContext {
    pub geometry: RouteGeometry,
    pub segments: Vec<Segment>,
    /// Elevation at the start of each segment; all zeros when the lookup failed.
    pub elevations_m: Vec<f64>,
    pub temperature_c: f64,
    pub speed_kmh: f64,
}

impl RouteContext {
    /// Grade of segment `index` from the pre-fetched elevation samples.
    pub fn grade(&self, index: usize) -> f64 {
        segment_grade(&self.elevations_m, &self.segments, index)
    }

    pub fn elevation(&self, index: usize) -> f64 {
        self.elevations_m.get(index).copied().unwrap_or(0.0)
    }

    /// Physics inputs for segment `index`.
    pub fn segment_params(&self, index: usize) -> SegmentParams {
        SegmentParams {
            distance_m: self.segments[index].distance_m,
            grade: self.grade(index),
            speed_kmh: self.speed_kmh,
            temperature_c: self.temperature_c,
        }
    }
}

/// Fetch and segment the route through `waypoints`, then attach elevation and weather.
///
/// Only the route lookup is fatal. Elevation failures fall back to flat terrain and
/// weather failures to the policy's default temperature.
pub fn prepare(
    start: LatLng,
    waypoints: &[Waypoint],
    end: LatLng,
    providers: &TripProviders<'_>,
    policy: &PlannerPolicy,
) -> Result<RouteContext, PlanError> {
    let mut coordinates = Vec::with_capacity(waypoints.len() + 2);
    coordinates.push(start);
    coordinates.extend(waypoints.iter().map(|wp| wp.location));
    coordinates.push(end);

    let geometry = providers.route.route(&coordinates)?;
    let segments = segment_polyline(&geometry.points, policy.segment_length_m);
    if segments.is_empty() {
        return Err(PlanError::EmptyRoute);
    }
    debug!(
        "route through {} waypoint(s): {:.1} km in {} segments",
        waypoints.len(),
        geometry.distance_m / 1_000.0,
        segments.len()
    );

    let samples = sample_points(&segments);
    let elevations_m = match providers.elevation.elevations(&samples) {
        Ok(values) if values.len() == samples.len() => values,
        Ok(values) => {
            warn!(
                "elevation lookup returned {} values for {} points; assuming flat terrain",
                values.len(),
                samples.len()
            );
            vec![0.0; samples.len()]
        }
        Err(err) => {
            warn!("elevation lookup failed, assuming flat terrain: {err}");
            vec![0.0; samples.len()]
        }
    };

    let midpoint = segments[segments.len() / 2].start();
    let temperature_c = match providers.weather.temperature_c(midpoint) {
        Ok(t) => t,
        Err(err) => {
            warn!(
                "weather lookup failed, using {:.1} °C: {err}",
                policy.default_temperature_c
            );
            policy.default_temperature_c
        }
    };

    Ok(RouteContext {
        geometry,
        segments,
        elevations_m,
        temperature_c,
        speed_kmh: policy.cruise_speed_kmh,
    })
}
