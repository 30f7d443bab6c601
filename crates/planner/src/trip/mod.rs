//! Trip planning pipeline: forward pass, rescue-stop insertion, and confirmation pass.

pub mod context;
pub mod final_pass;
pub mod forward;
pub mod rescue;
pub mod waypoints;

use ev_config::{ConfigError, PlannerPolicy};
use ev_core::geo::LatLng;
use ev_core::units::{m_to_km, seconds_to_minutes};
use ev_physics::{EnergyBreakdown, PhysicsEngine};
use ev_route::{elevation_gain_loss, route_complexity};
use ev_vehicle::VehicleProfile;
use log::{info, warn};
use serde::Serialize;
use thiserror::Error;

use self::final_pass::{ChargeEvent, TraceEntry};
use self::forward::ForwardOutcome;
use self::rescue::RescueOutcome;
use self::waypoints::{Waypoint, sort_by_distance_from};
use crate::providers::{
    ChargerCandidate, ChargerLookup, ElevationProvider, ProviderError, RouteProvider,
    WeatherProvider,
};
use crate::vehicle::{self, VehicleError};

/// Inputs for one trip calculation.
#[derive(Debug, Clone)]
pub struct TripRequest {
    pub start: LatLng,
    pub end: LatLng,
    /// User-supplied intermediate stops, in any order.
    pub waypoints: Vec<LatLng>,
    pub vehicle: VehicleProfile,
    pub start_soc_percent: f64,
}

/// The external collaborators used by [`plan_trip`].
#[derive(Clone, Copy)]
pub struct TripProviders<'a> {
    pub route: &'a dyn RouteProvider,
    pub elevation: &'a dyn ElevationProvider,
    pub weather: &'a dyn WeatherProvider,
    pub chargers: &'a dyn ChargerLookup,
}

/// Why a plan could not be completed with the stops it has.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InfeasibleReason {
    NoChargersInRange,
    NoSuitableCharger,
    StopLimitReached,
}

impl std::fmt::Display for InfeasibleReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            InfeasibleReason::NoChargersInRange => "no chargers found near the low-battery point",
            InfeasibleReason::NoSuitableCharger => "no usable charger near the low-battery point",
            InfeasibleReason::StopLimitReached => "stop limit reached before the trip became feasible",
        };
        f.write_str(text)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum Feasibility {
    Feasible,
    /// The trace is best effort and may dip below a safe SoC.
    Infeasible(InfeasibleReason),
}

impl Feasibility {
    pub fn is_feasible(&self) -> bool {
        matches!(self, Feasibility::Feasible)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TripEnvironment {
    pub temperature_c: f64,
    pub elevation_gain_m: f64,
    pub elevation_loss_m: f64,
}

/// Result of [`plan_trip`].
#[derive(Debug, Clone, Serialize)]
pub struct TripPlan {
    pub distance_km: f64,
    pub duration_min: f64,
    pub energy_consumed_kwh: f64,
    pub final_soc_percent: f64,
    pub min_soc_percent: f64,
    pub trace: Vec<TraceEntry>,
    pub charge_events: Vec<ChargeEvent>,
    /// Chargers added by the rescue planner, in route order.
    pub injected_stops: Vec<ChargerCandidate>,
    pub waypoints: Vec<Waypoint>,
    pub environment: TripEnvironment,
    pub breakdown: EnergyBreakdown,
    pub route_complexity: f64,
    pub rescue_iterations: usize,
    pub feasibility: Feasibility,
    #[serde(skip)]
    pub geometry: Vec<LatLng>,
}

#[derive(Debug, Error)]
pub enum PlanError {
    #[error("{role} coordinate ({lat}, {lng}) is out of range")]
    InvalidCoordinate {
        role: &'static str,
        lat: f64,
        lng: f64,
    },
    #[error("start state of charge {0} is outside 0-100 %")]
    InvalidStateOfCharge(f64),
    #[error("vehicle profile rejected: {0}")]
    Vehicle(#[from] VehicleError),
    #[error("planner policy rejected: {0}")]
    Policy(#[from] ConfigError),
    #[error("route lookup failed: {0}")]
    Route(#[from] ProviderError),
    #[error("route geometry is too short to simulate")]
    EmptyRoute,
}

fn check_coordinate(role: &'static str, point: LatLng) -> Result<(), PlanError> {
    if point.is_valid() {
        Ok(())
    } else {
        Err(PlanError::InvalidCoordinate {
            role,
            lat: point.lat,
            lng: point.lng,
        })
    }
}

fn validate_request(request: &TripRequest) -> Result<(), PlanError> {
    check_coordinate("start", request.start)?;
    check_coordinate("end", request.end)?;
    for wp in &request.waypoints {
        check_coordinate("waypoint", *wp)?;
    }
    let soc = request.start_soc_percent;
    if !(0.0..=100.0).contains(&soc) {
        return Err(PlanError::InvalidStateOfCharge(soc));
    }
    vehicle::validate(&request.vehicle)?;
    Ok(())
}

/// Plan a trip, inserting charging stops until the forward pass completes without panic.
///
/// Each round re-fetches the route through the current waypoint set. Rounds stop when
/// the forward pass completes, when the waypoint cap is hit, or when no charger can be
/// selected; in the latter two cases the plan is returned marked infeasible with the
/// confirmation trace of the last round.
pub fn plan_trip(
    request: &TripRequest,
    providers: &TripProviders<'_>,
    policy: &PlannerPolicy,
) -> Result<TripPlan, PlanError> {
    policy.validate()?;
    validate_request(request)?;

    let vehicle = &request.vehicle;
    let engine = PhysicsEngine::new(vehicle);
    let start_battery = vehicle.energy_at_soc(request.start_soc_percent);

    let mut waypoints: Vec<Waypoint> = request.waypoints.iter().copied().map(Waypoint::user).collect();
    sort_by_distance_from(&mut waypoints, request.start);
    let mut injected: Vec<ChargerCandidate> = Vec::new();
    let mut rescue_iterations = 0;

    let (context, feasibility) = loop {
        let context = context::prepare(request.start, &waypoints, request.end, providers, policy)?;
        let outcome = forward::simulate(
            &context,
            &engine,
            &waypoints,
            start_battery,
            request.end,
            policy,
        );
        let panic = match outcome {
            ForwardOutcome::Completed => break (context, Feasibility::Feasible),
            ForwardOutcome::Panic(panic) => panic,
        };

        if waypoints.len() >= policy.rescue.max_waypoints {
            warn!(
                "panic at {:.1} km but {} stops are already planned; giving up",
                m_to_km(panic.distance_m),
                waypoints.len()
            );
            break (context, Feasibility::Infeasible(InfeasibleReason::StopLimitReached));
        }

        match rescue::plan_rescue(providers.chargers, &panic, request.end, &waypoints, &policy.rescue) {
            RescueOutcome::Selected(choice) => {
                rescue::insert_stop(&mut waypoints, &choice.charger, request.start);
                injected.push(choice.charger);
                rescue_iterations += 1;
            }
            RescueOutcome::NoChargers => {
                warn!("no chargers near the panic point; trip is infeasible as planned");
                break (context, Feasibility::Infeasible(InfeasibleReason::NoChargersInRange));
            }
            RescueOutcome::NoSuitableCharger => {
                warn!("every nearby charger is already a stop; trip is infeasible as planned");
                break (context, Feasibility::Infeasible(InfeasibleReason::NoSuitableCharger));
            }
        }
    };

    let confirmed = final_pass::simulate(&context, &engine, &waypoints, start_battery, policy);

    injected.sort_by(|a, b| {
        request
            .start
            .distance_m(&a.location)
            .total_cmp(&request.start.distance_m(&b.location))
    });

    let (elevation_gain_m, elevation_loss_m) = elevation_gain_loss(&context.elevations_m);
    let final_soc_percent = vehicle.soc_percent(confirmed.battery_kwh).clamp(0.0, 100.0);

    info!(
        "planned {:.1} km with {} injected stop(s), arriving at {:.1}% SoC",
        m_to_km(context.geometry.distance_m),
        injected.len(),
        final_soc_percent
    );

    Ok(TripPlan {
        distance_km: m_to_km(context.geometry.distance_m),
        duration_min: seconds_to_minutes(context.geometry.duration_s),
        energy_consumed_kwh: confirmed.energy_consumed_kwh,
        final_soc_percent,
        min_soc_percent: confirmed.min_soc_percent,
        trace: confirmed.trace,
        charge_events: confirmed.charge_events,
        injected_stops: injected,
        waypoints,
        environment: TripEnvironment {
            temperature_c: context.temperature_c,
            elevation_gain_m,
            elevation_loss_m,
        },
        breakdown: confirmed.breakdown,
        route_complexity: route_complexity(&context.geometry.points),
        rescue_iterations,
        feasibility,
        geometry: context.geometry.points,
    })
}
