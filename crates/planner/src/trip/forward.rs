//! Forward pass: walks the route, virtually charging at stops, and reports the first panic.

use ev_config::PlannerPolicy;
use ev_core::geo::LatLng;
use ev_physics::PhysicsEngine;
use log::{debug, info};

use super::context::RouteContext;
use super::waypoints::{PassDetector, Waypoint};

/// Mutable state of a single simulator pass. Created and dropped inside the pass.
#[derive(Debug, Clone)]
pub struct SimulationState {
    pub battery_kwh: f64,
    pub distance_m: f64,
    /// Index into the waypoint list of the next stop not yet reached.
    pub next_waypoint: usize,
}

impl SimulationState {
    pub fn new(battery_kwh: f64) -> Self {
        Self {
            battery_kwh,
            distance_m: 0.0,
            next_waypoint: 0,
        }
    }
}

/// Where and how the forward pass gave up.
#[derive(Debug, Clone, PartialEq)]
pub struct Panic {
    pub segment_index: usize,
    /// Start of the panic segment; the charger search is centred here.
    pub location: LatLng,
    pub battery_kwh: f64,
    pub soc_percent: f64,
    pub distance_m: f64,
}

/// Result of the forward pass.
#[derive(Debug, Clone, PartialEq)]
pub enum ForwardOutcome {
    Completed,
    Panic(Panic),
}

/// Run the forward pass.
///
/// Reaching a pending waypoint fills the battery to usable capacity instantly: this pass
/// only answers whether the current stops solve the range problem. The panic check skips
/// the final `tail_segments` segments, and a low SoC is tolerated only while a pending
/// stop is close enough and the battery is above the floor. Heading to the destination
/// never suppresses it.
pub fn simulate(
    context: &RouteContext,
    engine: &PhysicsEngine<'_>,
    waypoints: &[Waypoint],
    start_battery_kwh: f64,
    destination: LatLng,
    policy: &PlannerPolicy,
) -> ForwardOutcome {
    let vehicle = engine.vehicle();
    let mut state = SimulationState::new(start_battery_kwh);
    let mut detector = PassDetector::default();
    let segment_count = context.segments.len();

    for (i, segment) in context.segments.iter().enumerate() {
        let energy = engine.segment_energy(&context.segment_params(i));
        state.battery_kwh -= energy;
        state.distance_m += segment.distance_m;

        let position = segment.end();

        if let Some(target) = waypoints.get(state.next_waypoint) {
            let distance = position.distance_m(&target.location);
            if detector.observe(distance, &policy.waypoints) {
                if state.battery_kwh < vehicle.usable_capacity_kwh {
                    state.battery_kwh = vehicle.usable_capacity_kwh;
                }
                debug!(
                    "forward pass reached waypoint {} at {:.1} km",
                    state.next_waypoint,
                    state.distance_m / 1_000.0
                );
                state.next_waypoint += 1;
                detector.reset();
            }
        }

        if i + policy.panic.tail_segments < segment_count {
            let soc = vehicle.soc_percent(state.battery_kwh);
            if soc < policy.panic.soc_threshold_percent {
                let suppress = waypoints.get(state.next_waypoint).is_some_and(|wp| {
                    position.distance_km(&wp.location) < policy.panic.suppress_radius_km
                        && soc > policy.panic.suppress_floor_percent
                });
                if suppress {
                    debug!("SoC {soc:.1}% tolerated: pending stop is close");
                    continue;
                }

                let remaining_km = position.distance_km(&destination);
                info!(
                    "panic at segment {i} ({:.1} km, SoC {soc:.1}%, {remaining_km:.0} km to destination)",
                    state.distance_m / 1_000.0
                );
                return ForwardOutcome::Panic(Panic {
                    segment_index: i,
                    location: segment.start(),
                    battery_kwh: state.battery_kwh,
                    soc_percent: soc,
                    distance_m: state.distance_m,
                });
            }
        }
    }

    ForwardOutcome::Completed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::RouteGeometry;
    use ev_route::Segment;
    use ev_vehicle::VehicleProfile;

    const KM_PER_DEG: f64 = 111.195;

    fn vehicle() -> VehicleProfile {
        VehicleProfile {
            name: "Test Car".into(),
            battery_capacity_kwh: 40.5,
            usable_capacity_kwh: 39.0,
            drag_coefficient: 0.33,
            frontal_area_m2: 2.3,
            mass_kg: 1400.0,
            rolling_resistance: 0.01,
            motor_efficiency: 0.90,
            regen_efficiency: 0.70,
            thermal_coefficient_heat: 0.015,
            thermal_coefficient_cold: 0.010,
        }
    }

    fn at_km(km: f64) -> LatLng {
        LatLng::new(0.0, km / KM_PER_DEG)
    }

    /// Flat equatorial road of `count` 5 km segments (≈1.45 % SoC each for the test car).
    fn road(count: usize) -> RouteContext {
        let points: Vec<LatLng> = (0..=count).map(|i| at_km(i as f64 * 5.0)).collect();
        let segments: Vec<Segment> = points
            .windows(2)
            .map(|w| Segment {
                points: w.to_vec(),
                distance_m: w[0].distance_m(&w[1]),
            })
            .collect();
        let distance_m = segments.iter().map(|s| s.distance_m).sum();
        RouteContext {
            geometry: RouteGeometry {
                points,
                distance_m,
                duration_s: distance_m / (80.0 / 3.6),
                leg_distances_m: vec![distance_m],
            },
            elevations_m: vec![0.0; segments.len()],
            segments,
            temperature_c: 25.0,
            speed_kmh: 80.0,
        }
    }

    fn run(segments: usize, soc: f64, stops: &[f64]) -> ForwardOutcome {
        let vehicle = vehicle();
        let engine = PhysicsEngine::new(&vehicle);
        let context = road(segments);
        let waypoints: Vec<Waypoint> = stops.iter().map(|&km| Waypoint::user(at_km(km))).collect();
        simulate(
            &context,
            &engine,
            &waypoints,
            vehicle.energy_at_soc(soc),
            at_km(segments as f64 * 5.0),
            &PlannerPolicy::default(),
        )
    }

    fn expect_panic(outcome: ForwardOutcome) -> Panic {
        match outcome {
            ForwardOutcome::Panic(panic) => panic,
            ForwardOutcome::Completed => panic!("expected a panic"),
        }
    }

    #[test]
    fn low_charge_without_stops_panics_at_the_first_segment() {
        let panic = expect_panic(run(20, 26.0, &[]));
        assert_eq!(panic.segment_index, 0);
        assert!(panic.soc_percent < 25.0 && panic.soc_percent > 24.0);
        assert!((panic.distance_m - 5_000.0).abs() < 1.0);
    }

    #[test]
    fn nearby_destination_never_suppresses_panic() {
        // Destination is 45 km away after the first segment
        let panic = expect_panic(run(10, 26.0, &[]));
        assert_eq!(panic.segment_index, 0);
    }

    #[test]
    fn close_pending_stop_tolerates_low_charge() {
        // Stop at 60 km refills the battery before the floor is reached
        assert_eq!(run(20, 26.0, &[60.0]), ForwardOutcome::Completed);
    }

    #[test]
    fn distant_pending_stop_does_not_suppress_panic() {
        let panic = expect_panic(run(24, 26.0, &[100.0]));
        assert_eq!(panic.segment_index, 0);
    }

    #[test]
    fn suppression_ends_at_the_soc_floor() {
        // 5.5 % after one segment is tolerated, 4.1 % after two is not
        let panic = expect_panic(run(20, 7.0, &[30.0]));
        assert_eq!(panic.segment_index, 1);
        assert!(panic.soc_percent < 5.0);
    }

    #[test]
    fn final_segments_are_exempt() {
        let panic = expect_panic(run(3, 20.0, &[]));
        assert_eq!(panic.segment_index, 0);
        assert_eq!(run(2, 20.0, &[]), ForwardOutcome::Completed);
    }

    #[test]
    fn panic_is_located_at_the_segment_start() {
        let context = road(20);
        let panic = expect_panic(run(20, 7.0, &[30.0]));
        assert_eq!(panic.location, context.segments[1].start());
        assert_eq!(panic.location, at_km(5.0));
    }
}
