//! Fine-grained energy profile of a single route, without stops or rescue planning.

use ev_core::geo::LatLng;
use ev_core::units::m_to_km;
use ev_physics::{PhysicsEngine, SegmentParams};
use ev_route::{
    DIAGNOSTIC_SEGMENT_LENGTH_M, elevation_gain_loss, sample_points, segment_grade,
    segment_polyline,
};
use ev_vehicle::VehicleProfile;
use log::warn;
use serde::Serialize;

use crate::providers::ElevationProvider;

/// Fixed driving conditions for a profile run.
#[derive(Debug, Clone, Copy)]
pub struct DiagnosticsConfig {
    pub segment_length_m: f64,
    pub speed_kmh: f64,
    pub temperature_c: f64,
    /// Absolute grade above which a segment is reported as critical.
    pub critical_grade: f64,
    pub max_critical_segments: usize,
}

impl Default for DiagnosticsConfig {
    fn default() -> Self {
        Self {
            segment_length_m: DIAGNOSTIC_SEGMENT_LENGTH_M,
            speed_kmh: 80.0,
            temperature_c: 25.0,
            critical_grade: 0.05,
            max_critical_segments: 50,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CriticalSegment {
    pub index: usize,
    pub start: LatLng,
    pub distance_m: f64,
    pub grade: f64,
    pub energy_kwh: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteDiagnostics {
    pub distance_km: f64,
    pub segment_count: usize,
    pub total_energy_kwh: f64,
    /// Share of usable capacity needed for the whole route (%).
    pub battery_usage_percent: f64,
    pub elevation_gain_m: f64,
    pub elevation_loss_m: f64,
    pub max_grade: f64,
    pub min_grade: f64,
    pub efficiency_kwh_per_km: f64,
    pub critical_segments: Vec<CriticalSegment>,
    pub requires_charging: bool,
}

/// Walk `points` at diagnostic resolution and summarise energy and terrain.
///
/// Elevation failures are logged and treated as flat terrain.
pub fn profile_route(
    points: &[LatLng],
    vehicle: &VehicleProfile,
    elevation: &dyn ElevationProvider,
    config: &DiagnosticsConfig,
) -> RouteDiagnostics {
    let engine = PhysicsEngine::new(vehicle);
    let segments = segment_polyline(points, config.segment_length_m);
    let samples = sample_points(&segments);
    let elevations = match elevation.elevations(&samples) {
        Ok(values) if values.len() == samples.len() => values,
        Ok(_) => {
            warn!("elevation lookup returned the wrong number of samples; assuming flat terrain");
            vec![0.0; samples.len()]
        }
        Err(err) => {
            warn!("elevation lookup failed, assuming flat terrain: {err}");
            vec![0.0; samples.len()]
        }
    };

    let mut total_energy = 0.0;
    let mut distance = 0.0;
    let mut max_grade = f64::NEG_INFINITY;
    let mut min_grade = f64::INFINITY;
    let mut critical = Vec::new();

    for (i, segment) in segments.iter().enumerate() {
        let grade = segment_grade(&elevations, &segments, i);
        max_grade = max_grade.max(grade);
        min_grade = min_grade.min(grade);

        let energy = engine.segment_energy(&SegmentParams {
            distance_m: segment.distance_m,
            grade,
            speed_kmh: config.speed_kmh,
            temperature_c: config.temperature_c,
        });
        total_energy += energy;
        distance += segment.distance_m;

        if grade.abs() > config.critical_grade && critical.len() < config.max_critical_segments {
            critical.push(CriticalSegment {
                index: i,
                start: segment.start(),
                distance_m: segment.distance_m,
                grade,
                energy_kwh: energy,
            });
        }
    }

    if segments.is_empty() {
        max_grade = 0.0;
        min_grade = 0.0;
    }

    let (elevation_gain_m, elevation_loss_m) = elevation_gain_loss(&elevations);
    let distance_km = m_to_km(distance);

    RouteDiagnostics {
        distance_km,
        segment_count: segments.len(),
        total_energy_kwh: total_energy,
        battery_usage_percent: vehicle.soc_percent(total_energy),
        elevation_gain_m,
        elevation_loss_m,
        max_grade,
        min_grade,
        efficiency_kwh_per_km: if distance_km > 0.0 { total_energy / distance_km } else { 0.0 },
        critical_segments: critical,
        requires_charging: total_energy > vehicle.usable_capacity_kwh,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::ProviderError;

    struct Ramp;

    impl ElevationProvider for Ramp {
        fn elevations(&self, points: &[LatLng]) -> Result<Vec<f64>, ProviderError> {
            // 0.09° of longitude ≈ 10 km: climb 800 m over the first half, flat after
            Ok(points
                .iter()
                .map(|p| if p.lng < 0.045 { p.lng / 0.045 * 800.0 } else { 800.0 })
                .collect())
        }
    }

    struct Offline;

    impl ElevationProvider for Offline {
        fn elevations(&self, _points: &[LatLng]) -> Result<Vec<f64>, ProviderError> {
            Err(ProviderError::Upstream {
                provider: "test",
                message: "offline".into(),
            })
        }
    }

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

    fn line() -> Vec<LatLng> {
        (0..=90).map(|i| LatLng::new(0.0, i as f64 * 0.001)).collect()
    }

    #[test]
    fn steep_climb_is_reported_as_critical() {
        let report = profile_route(&line(), &vehicle(), &Ramp, &DiagnosticsConfig::default());
        assert!(report.segment_count >= 8);
        assert!(report.max_grade > 0.05);
        assert!(!report.critical_segments.is_empty());
        assert!(report.critical_segments.iter().all(|c| c.grade.abs() > 0.05));
        assert!(report.elevation_gain_m > 700.0);
        assert!(!report.requires_charging);
    }

    #[test]
    fn elevation_outage_yields_a_flat_profile() {
        let report = profile_route(&line(), &vehicle(), &Offline, &DiagnosticsConfig::default());
        assert_eq!(report.max_grade, 0.0);
        assert!(report.critical_segments.is_empty());
        assert!((report.efficiency_kwh_per_km - 0.1133).abs() < 0.001);
    }
}
