//! Configuration models and loaders for the EV trip planner.

use std::fs::File;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

/// Vehicle configuration parsed from catalog files.
#[derive(Debug, Deserialize, Clone)]
pub struct VehicleConfig {
    pub name: String,
    #[serde(default)]
    pub make: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub year: Option<u16>,
    pub battery_capacity_kwh: f64,
    pub usable_capacity_kwh: f64,
    pub drag_coefficient: f64,
    pub frontal_area_m2: f64,
    pub mass_kg: f64,
    pub rolling_resistance: f64,
    #[serde(default = "default_motor_efficiency")]
    pub motor_efficiency: f64,
    #[serde(default = "default_regen_efficiency")]
    pub regen_efficiency: f64,
    #[serde(default = "default_thermal_heat")]
    pub thermal_coefficient_heat: f64,
    #[serde(default = "default_thermal_cold")]
    pub thermal_coefficient_cold: f64,
}

fn default_motor_efficiency() -> f64 {
    0.90
}

fn default_regen_efficiency() -> f64 {
    0.70
}

fn default_thermal_heat() -> f64 {
    0.015
}

fn default_thermal_cold() -> f64 {
    0.010
}

/// Tunable business policy for the simulator and rescue planner.
///
/// Every field has a reference default; configuration files only need to name
/// the values they override.
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct PlannerPolicy {
    /// Target length of trip-planning road segments (metres).
    pub segment_length_m: f64,
    /// Constant cruise speed fed to the physics model (km/h).
    pub cruise_speed_kmh: f64,
    /// Ambient temperature used when the weather lookup fails (°C).
    pub default_temperature_c: f64,
    pub panic: PanicPolicy,
    pub waypoints: WaypointPolicy,
    pub rescue: RescuePolicy,
    pub charging: ChargingPolicy,
}

/// Thresholds that decide when the forward pass gives up on the current plan.
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct PanicPolicy {
    /// SoC below which the panic check runs (%).
    pub soc_threshold_percent: f64,
    /// SoC that must still be exceeded for a nearby stop to suppress panic (%).
    pub suppress_floor_percent: f64,
    /// Straight-line distance under which a pending stop suppresses panic (km).
    pub suppress_radius_km: f64,
    /// Number of trailing segments exempt from the panic check.
    pub tail_segments: usize,
}

/// Pass-through detection tolerances used by the forward pass.
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct WaypointPolicy {
    /// Distance under which a stop counts as reached (metres).
    pub strict_radius_m: f64,
    /// Closest approach that arms the "started receding" detector (metres).
    pub pass_band_m: f64,
    /// Receding distance beyond which the detector ignores the stop (metres).
    pub pass_limit_m: f64,
}

/// Charger search and scoring constants.
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct RescuePolicy {
    pub search_radius_km: f64,
    pub min_power_kw: f64,
    pub result_limit: usize,
    /// Coordinate tolerance for treating a charger as an existing stop (degrees).
    pub duplicate_tolerance_deg: f64,
    /// Fleet-average efficiency used only for the reachability gate (km/kWh).
    pub range_km_per_kwh: f64,
    pub safety_margin: f64,
    /// Weight of the panic-to-charger leg in the progress score.
    pub detour_weight: f64,
    /// Waypoint count at which no further rescue stops are inserted.
    pub max_waypoints: usize,
}

/// Charging behaviour applied by the confirmation pass.
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct ChargingPolicy {
    /// Distance under which a confirmed stop triggers charging (metres).
    pub stop_radius_m: f64,
    /// Only charge when SoC is below this value (%).
    pub smart_charge_below_percent: f64,
}

impl Default for PlannerPolicy {
    fn default() -> Self {
        Self {
            segment_length_m: 5_000.0,
            cruise_speed_kmh: 80.0,
            default_temperature_c: 25.0,
            panic: PanicPolicy::default(),
            waypoints: WaypointPolicy::default(),
            rescue: RescuePolicy::default(),
            charging: ChargingPolicy::default(),
        }
    }
}

impl Default for PanicPolicy {
    fn default() -> Self {
        Self {
            soc_threshold_percent: 25.0,
            suppress_floor_percent: 5.0,
            suppress_radius_km: 75.0,
            tail_segments: 2,
        }
    }
}

impl Default for WaypointPolicy {
    fn default() -> Self {
        Self {
            strict_radius_m: 3_000.0,
            pass_band_m: 5_000.0,
            pass_limit_m: 10_000.0,
        }
    }
}

impl Default for RescuePolicy {
    fn default() -> Self {
        Self {
            search_radius_km: 150.0,
            min_power_kw: 50.0,
            result_limit: 50,
            duplicate_tolerance_deg: 0.02,
            range_km_per_kwh: 4.0,
            safety_margin: 0.95,
            detour_weight: 0.1,
            max_waypoints: 5,
        }
    }
}

impl Default for ChargingPolicy {
    fn default() -> Self {
        Self {
            stop_radius_m: 5_000.0,
            smart_charge_below_percent: 60.0,
        }
    }
}

impl PlannerPolicy {
    /// Reject values that would make the simulation meaningless.
    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("segment_length_m", self.segment_length_m)?;
        positive("cruise_speed_kmh", self.cruise_speed_kmh)?;
        positive("waypoints.strict_radius_m", self.waypoints.strict_radius_m)?;
        positive("charging.stop_radius_m", self.charging.stop_radius_m)?;
        positive("rescue.search_radius_km", self.rescue.search_radius_km)?;
        positive("rescue.range_km_per_kwh", self.rescue.range_km_per_kwh)?;
        fraction("rescue.safety_margin", self.rescue.safety_margin)?;
        percent("panic.soc_threshold_percent", self.panic.soc_threshold_percent)?;
        percent("panic.suppress_floor_percent", self.panic.suppress_floor_percent)?;
        percent(
            "charging.smart_charge_below_percent",
            self.charging.smart_charge_below_percent,
        )?;
        if self.rescue.result_limit == 0 {
            return Err(ConfigError::Invalid {
                field: "rescue.result_limit",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

fn positive(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Invalid {
            field,
            reason: format!("must be positive (got {value})"),
        })
    }
}

fn fraction(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 && value <= 1.0 {
        Ok(())
    } else {
        Err(ConfigError::Invalid {
            field,
            reason: format!("must lie in (0, 1] (got {value})"),
        })
    }
}

fn percent(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if (0.0..=100.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::Invalid {
            field,
            reason: format!("must lie in [0, 100] (got {value})"),
        })
    }
}

/// Errors that can occur while loading configuration files.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse YAML: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("failed to parse TOML: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("invalid value for `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Load vehicle configurations from a YAML list, a TOML file, or a directory of TOML files.
pub fn load_vehicle_configs<P: AsRef<Path>>(path: P) -> Result<Vec<VehicleConfig>, ConfigError> {
    load_records(path)
}

/// Load a planner policy from a YAML or TOML file and validate it.
pub fn load_policy<P: AsRef<Path>>(path: P) -> Result<PlannerPolicy, ConfigError> {
    let path = path.as_ref();
    let policy: PlannerPolicy = if is_toml(path) {
        toml::from_str(&std::fs::read_to_string(path)?)?
    } else {
        serde_yaml::from_reader(File::open(path)?)?
    };
    policy.validate()?;
    Ok(policy)
}

fn load_records<T, P>(path: P) -> Result<Vec<T>, ConfigError>
where
    T: for<'de> Deserialize<'de>,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    if path.is_dir() {
        read_dir_records(path)
    } else if is_toml(path) {
        let contents = std::fs::read_to_string(path)?;
        let record: T = toml::from_str(&contents)?;
        Ok(vec![record])
    } else {
        let reader = File::open(path)?;
        Ok(serde_yaml::from_reader(reader)?)
    }
}

fn read_dir_records<T>(dir: &Path) -> Result<Vec<T>, ConfigError>
where
    T: for<'de> Deserialize<'de>,
{
    let mut records = Vec::new();
    let mut entries: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| is_toml(path))
        .collect();
    entries.sort();
    for path in entries {
        let contents = std::fs::read_to_string(&path)?;
        let record: T = toml::from_str(&contents)?;
        records.push(record);
    }
    Ok(records)
}

fn is_toml(path: &Path) -> bool {
    path.extension().map(|ext| ext == "toml").unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn partial_policy_keeps_reference_defaults() {
        let policy: PlannerPolicy = toml::from_str(
            r#"
            cruise_speed_kmh = 90.0

            [rescue]
            min_power_kw = 25.0
            "#,
        )
        .expect("policy toml");
        assert_eq!(policy.cruise_speed_kmh, 90.0);
        assert_eq!(policy.rescue.min_power_kw, 25.0);
        assert_eq!(policy.rescue.search_radius_km, 150.0);
        assert_eq!(policy.panic.soc_threshold_percent, 25.0);
        assert_eq!(policy.charging.smart_charge_below_percent, 60.0);
    }

    #[test]
    fn validate_rejects_non_positive_segment_length() {
        let policy = PlannerPolicy {
            segment_length_m: 0.0,
            ..PlannerPolicy::default()
        };
        assert!(matches!(
            policy.validate(),
            Err(ConfigError::Invalid {
                field: "segment_length_m",
                ..
            })
        ));
    }

    #[test]
    fn vehicle_defaults_fill_optional_coefficients() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("car.toml");
        let mut file = File::create(&path).expect("create");
        writeln!(
            file,
            r#"
name = "Test Car"
battery_capacity_kwh = 30.2
usable_capacity_kwh = 28.5
drag_coefficient = 0.33
frontal_area_m2 = 2.3
mass_kg = 1400.0
rolling_resistance = 0.01
"#
        )
        .expect("write");

        let vehicles = load_vehicle_configs(dir.path()).expect("load dir");
        assert_eq!(vehicles.len(), 1);
        assert_eq!(vehicles[0].motor_efficiency, 0.90);
        assert_eq!(vehicles[0].regen_efficiency, 0.70);
        assert_eq!(vehicles[0].thermal_coefficient_cold, 0.010);
    }
}
