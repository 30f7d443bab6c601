//! Road-load energy model: aerodynamic drag, rolling resistance, grade, and thermal load.

use ev_core::constants::{G, RHO_AIR};
use ev_core::units::{joules_to_kwh, kmh_to_ms};
use ev_vehicle::VehicleProfile;
use serde::Serialize;

/// Driving conditions for a single road segment.
#[derive(Debug, Clone, Copy)]
pub struct SegmentParams {
    pub distance_m: f64,
    /// Rise over run, e.g. 0.05 for a 5 % climb.
    pub grade: f64,
    pub speed_kmh: f64,
    pub temperature_c: f64,
}

/// Attribution of segment energy to flat running, grade, and thermal load (kWh).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct EnergyBreakdown {
    pub base_kwh: f64,
    pub gradient_kwh: f64,
    pub thermal_kwh: f64,
}

impl EnergyBreakdown {
    pub fn total_kwh(&self) -> f64 {
        self.base_kwh + self.gradient_kwh + self.thermal_kwh
    }

    pub fn accumulate(&mut self, other: &EnergyBreakdown) {
        self.base_kwh += other.base_kwh;
        self.gradient_kwh += other.gradient_kwh;
        self.thermal_kwh += other.thermal_kwh;
    }
}

/// Stateless energy model bound to one vehicle profile.
#[derive(Debug, Clone, Copy)]
pub struct PhysicsEngine<'a> {
    vehicle: &'a VehicleProfile,
}

impl<'a> PhysicsEngine<'a> {
    pub fn new(vehicle: &'a VehicleProfile) -> Self {
        Self { vehicle }
    }

    pub fn vehicle(&self) -> &VehicleProfile {
        self.vehicle
    }

    /// Aerodynamic drag `0.5 · Cd · A · ρ · v²` in newtons.
    pub fn aero_force(&self, speed_kmh: f64) -> f64 {
        let v = kmh_to_ms(speed_kmh);
        0.5 * self.vehicle.drag_coefficient * self.vehicle.frontal_area_m2 * RHO_AIR * v * v
    }

    /// Rolling resistance `Crr · m · g` in newtons.
    pub fn rolling_force(&self) -> f64 {
        self.vehicle.rolling_resistance * self.vehicle.mass_kg * G
    }

    /// Grade resistance `m · g · sin(atan(grade))` in newtons; negative downhill.
    pub fn grade_force(&self, grade: f64) -> f64 {
        self.vehicle.mass_kg * G * grade.atan().sin()
    }

    /// Fractional consumption penalty for ambient temperature; zero inside 15–25 °C.
    pub fn thermal_penalty(&self, temperature_c: f64) -> f64 {
        if temperature_c > 25.0 {
            (temperature_c - 25.0) * self.vehicle.thermal_coefficient_heat
        } else if temperature_c < 15.0 {
            (15.0 - temperature_c) * self.vehicle.thermal_coefficient_cold
        } else {
            0.0
        }
    }

    /// Net traction energy (kWh) before thermal load; negative when regeneration dominates.
    pub fn traction_energy(&self, distance_m: f64, grade: f64, speed_kmh: f64) -> f64 {
        let force = self.aero_force(speed_kmh) + self.rolling_force() + self.grade_force(grade);
        let joules = if force > 0.0 {
            force * distance_m / self.vehicle.motor_efficiency
        } else {
            force * distance_m * self.vehicle.regen_efficiency
        };
        joules_to_kwh(joules)
    }

    /// Net segment energy in kWh: positive when consuming, negative when regenerating.
    ///
    /// The thermal multiplier `(1 + penalty)` only scales consumption; regenerative
    /// segments are returned without it.
    pub fn segment_energy(&self, params: &SegmentParams) -> f64 {
        let traction = self.traction_energy(params.distance_m, params.grade, params.speed_kmh);
        if traction > 0.0 {
            traction * (1.0 + self.thermal_penalty(params.temperature_c))
        } else {
            traction
        }
    }

    /// Split the segment energy into flat-road, grade, and thermal contributions.
    ///
    /// The three parts always sum to [`PhysicsEngine::segment_energy`].
    pub fn breakdown(&self, params: &SegmentParams) -> EnergyBreakdown {
        let base = self.traction_energy(params.distance_m, 0.0, params.speed_kmh);
        let traction = self.traction_energy(params.distance_m, params.grade, params.speed_kmh);
        let total = self.segment_energy(params);
        EnergyBreakdown {
            base_kwh: base,
            gradient_kwh: traction - base,
            thermal_kwh: total - traction,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn test_vehicle() -> VehicleProfile {
        VehicleProfile {
            name: "Test Car".into(),
            battery_capacity_kwh: 30.2,
            usable_capacity_kwh: 28.5,
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

    #[test]
    fn aero_and_rolling_forces() {
        let vehicle = test_vehicle();
        let engine = PhysicsEngine::new(&vehicle);
        assert_relative_eq!(engine.aero_force(80.0), 229.6, epsilon = 0.1);
        assert_relative_eq!(engine.rolling_force(), 137.3, epsilon = 0.1);
    }

    #[test]
    fn uphill_grade_force_is_positive() {
        let vehicle = test_vehicle();
        let engine = PhysicsEngine::new(&vehicle);
        assert!(engine.grade_force(0.05) > 0.0);
        assert!(engine.grade_force(-0.05) < 0.0);
        // sin(atan(1)) differs from the small-angle approximation at steep grades
        assert_relative_eq!(
            engine.grade_force(1.0),
            1400.0 * 9.81 * std::f64::consts::FRAC_1_SQRT_2,
            epsilon = 1e-9
        );
    }

    #[test]
    fn regen_segments_skip_thermal_penalty() {
        let vehicle = test_vehicle();
        let engine = PhysicsEngine::new(&vehicle);
        let mild = SegmentParams {
            distance_m: 1_000.0,
            grade: -0.05,
            speed_kmh: 60.0,
            temperature_c: 25.0,
        };
        let hot = SegmentParams {
            temperature_c: 40.0,
            ..mild
        };
        assert!(engine.segment_energy(&mild) < 0.0);
        assert_eq!(engine.segment_energy(&mild), engine.segment_energy(&hot));
    }

    #[test]
    fn breakdown_sums_to_segment_energy() {
        let vehicle = test_vehicle();
        let engine = PhysicsEngine::new(&vehicle);
        let params = SegmentParams {
            distance_m: 5_000.0,
            grade: 0.03,
            speed_kmh: 80.0,
            temperature_c: 5.0,
        };
        let parts = engine.breakdown(&params);
        assert!(parts.gradient_kwh > 0.0);
        assert!(parts.thermal_kwh > 0.0);
        assert_relative_eq!(parts.total_kwh(), engine.segment_energy(&params), epsilon = 1e-12);
    }
}
