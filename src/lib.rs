//! Electric-vehicle trip planning: energy simulation and automatic charging-stop insertion.
//!
//! The heavy lifting lives in the workspace crates; this library re-exports them so
//! front-ends (CLI, services, tests) can depend on a single package.

pub use ev_config as config;
pub use ev_core as geo_core;
pub use ev_export as export;
pub use ev_physics as physics;
pub use ev_planner as planner;
pub use ev_providers as providers;
pub use ev_route as route;
pub use ev_vehicle as vehicle;

pub use ev_planner::{
    Feasibility, InfeasibleReason, PlanError, TripPlan, TripProviders, TripRequest, plan_trip,
};

/// Returns the version of the library for smoke tests.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
