//! Vehicle physical profiles and battery state helpers.

use serde::Serialize;

/// Immutable physical description of a vehicle, loaded once per calculation.
#[derive(Debug, Clone, Serialize)]
pub struct VehicleProfile {
    pub name: String,
    pub battery_capacity_kwh: f64,
    pub usable_capacity_kwh: f64,
    pub drag_coefficient: f64,
    pub frontal_area_m2: f64,
    pub mass_kg: f64,
    pub rolling_resistance: f64,
    /// Drivetrain efficiency while propelling, in (0, 1].
    pub motor_efficiency: f64,
    /// Fraction of braking energy recovered, in (0, 1].
    pub regen_efficiency: f64,
    /// Consumption penalty per °C above 25 °C.
    pub thermal_coefficient_heat: f64,
    /// Consumption penalty per °C below 15 °C.
    pub thermal_coefficient_cold: f64,
}

impl VehicleProfile {
    /// Battery energy (kWh) corresponding to a state-of-charge percentage of usable capacity.
    pub fn energy_at_soc(&self, soc_percent: f64) -> f64 {
        soc_percent / 100.0 * self.usable_capacity_kwh
    }

    /// State of charge (%) for a given battery energy.
    pub fn soc_percent(&self, battery_kwh: f64) -> f64 {
        battery_kwh / self.usable_capacity_kwh * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nexon() -> VehicleProfile {
        VehicleProfile {
            name: "Nexon".into(),
            battery_capacity_kwh: 40.5,
            usable_capacity_kwh: 39.0,
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
    fn soc_round_trips_through_usable_capacity() {
        let v = nexon();
        assert_eq!(v.energy_at_soc(50.0), 19.5);
        assert_eq!(v.soc_percent(19.5), 50.0);
    }
}
