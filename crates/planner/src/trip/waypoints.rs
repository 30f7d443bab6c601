//! Waypoint bookkeeping shared by the simulator passes and the rescue planner.

use ev_config::WaypointPolicy;
use ev_core::geo::LatLng;
use serde::Serialize;

use crate::providers::ChargerCandidate;

/// Where a waypoint came from.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WaypointOrigin {
    /// Supplied by the caller.
    User,
    /// Inserted by the rescue planner.
    Charger { id: String, name: String },
}

/// An intermediate stop on the trip.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Waypoint {
    pub location: LatLng,
    pub origin: WaypointOrigin,
}

impl Waypoint {
    pub fn user(location: LatLng) -> Self {
        Self {
            location,
            origin: WaypointOrigin::User,
        }
    }

    pub fn charger(charger: &ChargerCandidate) -> Self {
        Self {
            location: charger.location,
            origin: WaypointOrigin::Charger {
                id: charger.id.clone(),
                name: charger.name.clone(),
            },
        }
    }
}

/// Stable sort by geodesic distance from `origin`, so stops follow route order.
pub fn sort_by_distance_from(waypoints: &mut [Waypoint], origin: LatLng) {
    waypoints.sort_by(|a, b| {
        origin
            .distance_m(&a.location)
            .total_cmp(&origin.distance_m(&b.location))
    });
}

/// True when `location` lies within `tolerance_deg` of an existing waypoint on both axes.
pub fn is_duplicate(waypoints: &[Waypoint], location: LatLng, tolerance_deg: f64) -> bool {
    waypoints.iter().any(|wp| {
        (wp.location.lat - location.lat).abs() < tolerance_deg
            && (wp.location.lng - location.lng).abs() < tolerance_deg
    })
}

/// Decides when the vehicle has reached (or driven past) the pending waypoint.
///
/// A stop counts as reached when the vehicle comes within the strict radius, or when the
/// distance starts growing again after a close approach. The second rule absorbs the
/// offset between a stop's coordinate and the nearest vertex of the route geometry.
#[derive(Debug, Clone, Default)]
pub struct PassDetector {
    previous_m: Option<f64>,
    closest_m: Option<f64>,
}

impl PassDetector {
    /// Feed the distance from the current position to the pending waypoint.
    pub fn observe(&mut self, distance_m: f64, policy: &WaypointPolicy) -> bool {
        let receding = match (self.previous_m, self.closest_m) {
            (Some(previous), Some(closest)) => {
                distance_m > previous && closest < policy.pass_band_m && distance_m < policy.pass_limit_m
            }
            _ => false,
        };
        let strict = distance_m < policy.strict_radius_m;

        self.previous_m = Some(distance_m);
        self.closest_m = Some(self.closest_m.map_or(distance_m, |c| c.min(distance_m)));

        receding || strict
    }

    /// Forget the approach history; called when moving on to the next waypoint.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
