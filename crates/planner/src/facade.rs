//! Re-exported APIs for consumers of the planner crate.

pub use crate::diagnostics::{CriticalSegment, DiagnosticsConfig, RouteDiagnostics, profile_route};
pub use crate::trip::final_pass::{ChargeEvent, TraceEntry, TraceKind};
pub use crate::trip::waypoints::{Waypoint, WaypointOrigin};
pub use crate::trip::{
    Feasibility, InfeasibleReason, PlanError, TripEnvironment, TripPlan, TripProviders,
    TripRequest, plan_trip,
};
pub use ev_physics::EnergyBreakdown;
pub use ev_vehicle::VehicleProfile;

pub mod vehicle {
    use ev_config::VehicleConfig;
    use ev_vehicle::VehicleProfile;
    use thiserror::Error;

    /// Errors surfaced when selecting or converting vehicles.
    #[derive(Debug, Error)]
    pub enum VehicleError {
        #[error("vehicle '{0}' not found in catalog")]
        NotFound(String),
        #[error("vehicle catalog is empty")]
        EmptyCatalog,
        #[error("vehicle '{name}': {reason}")]
        Invalid { name: String, reason: String },
    }

    fn invalid(profile: &VehicleProfile, reason: impl Into<String>) -> VehicleError {
        VehicleError::Invalid {
            name: profile.name.clone(),
            reason: reason.into(),
        }
    }

    /// Check the physical invariants the simulator relies on.
    pub fn validate(profile: &VehicleProfile) -> Result<(), VehicleError> {
        let usable = profile.usable_capacity_kwh;
        if !(usable.is_finite() && usable > 0.0) {
            return Err(invalid(profile, "usable capacity must be positive"));
        }
        if usable > profile.battery_capacity_kwh {
            return Err(invalid(profile, "usable capacity exceeds battery capacity"));
        }
        let efficiencies = [
            ("motor efficiency", profile.motor_efficiency),
            ("regen efficiency", profile.regen_efficiency),
        ];
        for (label, value) in efficiencies {
            if !(value > 0.0 && value <= 1.0) {
                return Err(invalid(profile, format!("{label} must lie in (0, 1] (got {value})")));
            }
        }
        if profile.mass_kg <= 0.0 {
            return Err(invalid(profile, "mass must be positive"));
        }
        Ok(())
    }

    /// Convert a `VehicleConfig` into a validated runtime profile.
    pub fn from_config(config: &VehicleConfig) -> Result<VehicleProfile, VehicleError> {
        let profile = VehicleProfile {
            name: config.name.clone(),
            battery_capacity_kwh: config.battery_capacity_kwh,
            usable_capacity_kwh: config.usable_capacity_kwh,
            drag_coefficient: config.drag_coefficient,
            frontal_area_m2: config.frontal_area_m2,
            mass_kg: config.mass_kg,
            rolling_resistance: config.rolling_resistance,
            motor_efficiency: config.motor_efficiency,
            regen_efficiency: config.regen_efficiency,
            thermal_coefficient_heat: config.thermal_coefficient_heat,
            thermal_coefficient_cold: config.thermal_coefficient_cold,
        };
        validate(&profile)?;
        Ok(profile)
    }

    /// Select a vehicle from the catalog by optional name, defaulting to the first entry.
    pub fn select(
        configs: &[VehicleConfig],
        requested: Option<&str>,
    ) -> Result<VehicleProfile, VehicleError> {
        let Some(first) = configs.first() else {
            return Err(VehicleError::EmptyCatalog);
        };

        let chosen = match requested {
            Some(name) => {
                let upper = name.to_uppercase();
                configs
                    .iter()
                    .find(|cfg| cfg.name.to_uppercase() == upper)
                    .ok_or_else(|| VehicleError::NotFound(name.to_string()))?
            }
            None => first,
        };

        from_config(chosen)
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        fn config(name: &str, usable: f64) -> VehicleConfig {
            VehicleConfig {
                name: name.into(),
                make: None,
                model: None,
                year: None,
                battery_capacity_kwh: 40.5,
                usable_capacity_kwh: usable,
                drag_coefficient: 0.32,
                frontal_area_m2: 2.35,
                mass_kg: 1450.0,
                rolling_resistance: 0.015,
                motor_efficiency: 0.88,
                regen_efficiency: 0.65,
                thermal_coefficient_heat: 0.015,
                thermal_coefficient_cold: 0.02,
            }
        }

        #[test]
        fn selects_by_case_insensitive_name() {
            let configs = vec![config("Tata Nexon EV LR", 39.0), config("MG ZS EV", 39.0)];
            let profile = select(&configs, Some("mg zs ev")).expect("vehicle found");
            assert_eq!(profile.name, "MG ZS EV");
            assert_eq!(select(&configs, None).expect("default").name, "Tata Nexon EV LR");
        }

        #[test]
        fn reports_missing_and_empty_catalogs() {
            let configs = vec![config("Tata Nexon EV LR", 39.0)];
            assert!(matches!(select(&configs, Some("Kona")), Err(VehicleError::NotFound(_))));
            assert!(matches!(select(&[], None), Err(VehicleError::EmptyCatalog)));
        }

        #[test]
        fn rejects_usable_capacity_above_battery() {
            let err = from_config(&config("Broken", 50.0)).unwrap_err();
            assert!(err.to_string().contains("exceeds battery capacity"));
            assert!(from_config(&config("Empty", 0.0)).is_err());
        }
    }
}
