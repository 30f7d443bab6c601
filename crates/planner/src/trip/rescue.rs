//! Charger selection after a panic.

use ev_config::RescuePolicy;
use ev_core::geo::LatLng;
use log::{debug, info, warn};
use serde::Serialize;

use super::forward::Panic;
use super::waypoints::{Waypoint, is_duplicate, sort_by_distance_from};
use crate::providers::{ChargerCandidate, ChargerLookup, ChargerQuery};

/// How the winning charger was chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionMode {
    /// Lowest progress score among reachable candidates.
    Scored,
    /// Nothing passed the reachability gate; nearest candidate taken instead.
    Desperate,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RescueChoice {
    pub charger: ChargerCandidate,
    pub mode: SelectionMode,
    /// `detour_weight · g + h`; `None` in desperate mode.
    pub score: Option<f64>,
    pub distance_from_panic_km: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RescueOutcome {
    Selected(RescueChoice),
    /// The lookup returned nothing (or failed).
    NoChargers,
    /// Every candidate duplicated an existing stop.
    NoSuitableCharger,
}

/// Search parameters centred on the panic location.
pub fn charger_query(center: LatLng, policy: &RescuePolicy) -> ChargerQuery {
    ChargerQuery {
        center,
        radius_km: policy.search_radius_km,
        min_power_kw: policy.min_power_kw,
        limit: policy.result_limit,
    }
}

/// Pick the charger that best resolves `panic`.
///
/// Candidates within the duplicate tolerance of an existing waypoint are skipped. The
/// reachability gate uses a fleet-average efficiency rather than the vehicle model.
pub fn select_charger(
    candidates: &[ChargerCandidate],
    panic: &Panic,
    destination: LatLng,
    waypoints: &[Waypoint],
    policy: &RescuePolicy,
) -> RescueOutcome {
    if candidates.is_empty() {
        return RescueOutcome::NoChargers;
    }

    let safe_range_km = panic.battery_kwh.max(0.0) * policy.range_km_per_kwh * policy.safety_margin;
    let mut closest: Option<(&ChargerCandidate, f64)> = None;
    let mut best: Option<(&ChargerCandidate, f64, f64)> = None;

    for candidate in candidates {
        if is_duplicate(waypoints, candidate.location, policy.duplicate_tolerance_deg) {
            debug!("skipping {}: already a stop", candidate.name);
            continue;
        }

        let g = panic.location.distance_km(&candidate.location);
        if closest.is_none_or(|(_, d)| g < d) {
            closest = Some((candidate, g));
        }

        if g > safe_range_km {
            continue;
        }

        let h = candidate.location.distance_km(&destination);
        let score = policy.detour_weight * g + h;
        if best.is_none_or(|(_, s, _)| score < s) {
            best = Some((candidate, score, g));
        }
    }

    match (best, closest) {
        (Some((charger, score, g)), _) => RescueOutcome::Selected(RescueChoice {
            charger: charger.clone(),
            mode: SelectionMode::Scored,
            score: Some(score),
            distance_from_panic_km: g,
        }),
        (None, Some((charger, g))) => {
            warn!(
                "no charger within the safe range of {safe_range_km:.0} km; falling back to nearest ({}, {g:.1} km)",
                charger.name
            );
            RescueOutcome::Selected(RescueChoice {
                charger: charger.clone(),
                mode: SelectionMode::Desperate,
                score: None,
                distance_from_panic_km: g,
            })
        }
        (None, None) => RescueOutcome::NoSuitableCharger,
    }
}

/// Query the lookup around the panic point and select a stop. Lookup failures count as
/// "no chargers".
pub fn plan_rescue(
    lookup: &dyn ChargerLookup,
    panic: &Panic,
    destination: LatLng,
    waypoints: &[Waypoint],
    policy: &RescuePolicy,
) -> RescueOutcome {
    let query = charger_query(panic.location, policy);
    let candidates = match lookup.find_near(&query) {
        Ok(found) => found,
        Err(err) => {
            warn!("charger lookup failed: {err}");
            Vec::new()
        }
    };
    debug!(
        "{} charger candidate(s) within {:.0} km of the panic point",
        candidates.len(),
        policy.search_radius_km
    );

    let outcome = select_charger(&candidates, panic, destination, waypoints, policy);
    if let RescueOutcome::Selected(choice) = &outcome {
        info!(
            "rescue stop {} ({:.0} kW, {:.1} km from panic point)",
            choice.charger.name, choice.charger.power_kw, choice.distance_from_panic_km
        );
    }
    outcome
}

/// Add the stop and restore route order.
pub fn insert_stop(waypoints: &mut Vec<Waypoint>, charger: &ChargerCandidate, start: LatLng) {
    waypoints.push(Waypoint::charger(charger));
    sort_by_distance_from(waypoints, start);
}
