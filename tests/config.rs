use ev_trip_planner::config::{ConfigError, PlannerPolicy, load_policy, load_vehicle_configs};
use ev_trip_planner::planner::vehicle::{VehicleError, select};
use ev_trip_planner::providers::ChargerCatalog;
use std::fs::File;
use std::io::Write;

#[test]
fn bundled_vehicle_catalog_loads_and_validates() {
    let configs = load_vehicle_configs("configs/vehicles").expect("vehicle catalog");
    assert_eq!(configs.len(), 5);

    let names: Vec<&str> = configs.iter().map(|c| c.name.as_str()).collect();
    assert!(names.contains(&"Tata Nexon.ev Long Range"));
    assert!(names.contains(&"Hyundai Ioniq 5"));

    for config in &configs {
        let profile = select(&configs, Some(&config.name)).expect("valid profile");
        assert!(profile.usable_capacity_kwh <= profile.battery_capacity_kwh);
    }

    // Directory entries load in file-name order
    assert_eq!(select(&configs, None).expect("default").name, "BYD Atto 3");
    assert!(matches!(
        select(&configs, Some("Cybertruck")),
        Err(VehicleError::NotFound(_))
    ));
}

#[test]
fn bundled_policy_matches_reference_defaults() {
    let policy = load_policy("configs/policy.toml").expect("policy");
    assert_eq!(policy, PlannerPolicy::default());
}

#[test]
fn yaml_policy_overrides_and_is_validated() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("policy.yaml");
    let mut file = File::create(&path).expect("create");
    writeln!(file, "cruise_speed_kmh: 100.0\nrescue:\n  max_waypoints: 3").expect("write");

    let policy = load_policy(&path).expect("yaml policy");
    assert_eq!(policy.cruise_speed_kmh, 100.0);
    assert_eq!(policy.rescue.max_waypoints, 3);
    assert_eq!(policy.rescue.min_power_kw, 50.0);

    let bad = dir.path().join("bad.toml");
    std::fs::write(&bad, "[rescue]\nsafety_margin = 1.5\n").expect("write");
    assert!(matches!(
        load_policy(&bad),
        Err(ConfigError::Invalid {
            field: "rescue.safety_margin",
            ..
        })
    ));
}

#[test]
fn bundled_charger_catalog_is_usable() {
    let catalog = ChargerCatalog::from_path("data/chargers.csv").expect("chargers");
    assert!(catalog.len() >= 10);
    assert!(catalog.iter().all(|c| c.location.is_valid()));
    assert!(catalog.iter().filter(|c| c.power_kw >= 50.0).count() >= 10);
}
