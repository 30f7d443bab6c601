//! Confirmation pass: replays the confirmed plan and records the reported trace.

use ev_config::{ChargingPolicy, PlannerPolicy};
use ev_physics::{EnergyBreakdown, PhysicsEngine};
use serde::Serialize;

use super::context::RouteContext;
use super::waypoints::Waypoint;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TraceKind {
    Drive,
    Charge,
}

/// One row of the reported energy trace.
///
/// Charge rows have zero distance and negative energy (energy added to the battery).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TraceEntry {
    pub kind: TraceKind,
    pub distance_m: f64,
    pub cumulative_distance_m: f64,
    pub energy_kwh: f64,
    pub elevation_m: f64,
    pub grade: f64,
    pub soc_percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChargeEvent {
    pub waypoint_index: usize,
    pub distance_m: f64,
    pub arrival_soc_percent: f64,
    pub added_kwh: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FinalPass {
    pub trace: Vec<TraceEntry>,
    pub charge_events: Vec<ChargeEvent>,
    pub battery_kwh: f64,
    /// Sum of drive-segment energy; charging is not counted.
    pub energy_consumed_kwh: f64,
    pub breakdown: EnergyBreakdown,
    pub min_soc_percent: f64,
}

/// Energy to add at a stop, or `None` when the smart-charging rule declines.
///
/// Charging is skipped once the battery is healthy or already full, so applying it twice
/// at the same stop adds nothing the second time.
pub fn charge_to_full(battery_kwh: f64, usable_kwh: f64, policy: &ChargingPolicy) -> Option<f64> {
    let soc = battery_kwh / usable_kwh * 100.0;
    if soc < policy.smart_charge_below_percent && battery_kwh < usable_kwh {
        Some(usable_kwh - battery_kwh)
    } else {
        None
    }
}

/// Walk every segment with the confirmed waypoints, charging at stops.
///
/// A stop is consumed as soon as the vehicle is within the charging radius, whether or
/// not the smart-charging rule lets it charge. This pass never panics.
pub fn simulate(
    context: &RouteContext,
    engine: &PhysicsEngine<'_>,
    waypoints: &[Waypoint],
    start_battery_kwh: f64,
    policy: &PlannerPolicy,
) -> FinalPass {
    let vehicle = engine.vehicle();
    let usable = vehicle.usable_capacity_kwh;
    let mut battery = start_battery_kwh;
    let mut distance = 0.0;
    let mut next_waypoint = 0;
    let mut trace = Vec::with_capacity(context.segments.len() + waypoints.len());
    let mut charge_events = Vec::new();
    let mut consumed = 0.0;
    let mut breakdown = EnergyBreakdown::default();
    let mut min_soc = vehicle.soc_percent(battery);

    for (i, segment) in context.segments.iter().enumerate() {
        let params = context.segment_params(i);
        let energy = engine.segment_energy(&params);
        breakdown.accumulate(&engine.breakdown(&params));
        battery -= energy;
        distance += segment.distance_m;
        consumed += energy;

        let soc = vehicle.soc_percent(battery);
        min_soc = min_soc.min(soc);
        trace.push(TraceEntry {
            kind: TraceKind::Drive,
            distance_m: segment.distance_m,
            cumulative_distance_m: distance,
            energy_kwh: energy,
            elevation_m: context.elevation(i),
            grade: params.grade,
            soc_percent: soc,
        });

        let Some(target) = waypoints.get(next_waypoint) else {
            continue;
        };
        if segment.end().distance_m(&target.location) >= policy.charging.stop_radius_m {
            continue;
        }

        if let Some(added) = charge_to_full(battery, usable, &policy.charging) {
            charge_events.push(ChargeEvent {
                waypoint_index: next_waypoint,
                distance_m: distance,
                arrival_soc_percent: soc,
                added_kwh: added,
            });
            battery += added;
            trace.push(TraceEntry {
                kind: TraceKind::Charge,
                distance_m: 0.0,
                cumulative_distance_m: distance,
                energy_kwh: -added,
                elevation_m: context.elevation(i),
                grade: 0.0,
                soc_percent: vehicle.soc_percent(battery),
            });
        }
        next_waypoint += 1;
    }

    FinalPass {
        trace,
        charge_events,
        battery_kwh: battery,
        energy_consumed_kwh: consumed,
        breakdown,
        min_soc_percent: min_soc,
    }
}
