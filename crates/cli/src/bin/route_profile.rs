use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use ev_cli::{MAPBOX_TOKEN_ENV, env_credential, init_logging, resolve_location};
use ev_trip_planner::config::load_vehicle_configs;
use ev_trip_planner::planner::providers::{ElevationProvider, RouteProvider};
use ev_trip_planner::planner::vehicle as trip_vehicle;
use ev_trip_planner::planner::{DiagnosticsConfig, profile_route};
use ev_trip_planner::providers::{
    FlatTerrain, MapboxDirections, MapboxGeocoder, OpenMeteoElevation, StraightLineRouter,
};

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Energy and terrain profile of a single route at 1 km resolution"
)]
struct Cli {
    #[arg(long)]
    from: String,

    #[arg(long)]
    to: String,

    #[arg(long)]
    via: Vec<String>,

    #[arg(long)]
    vehicle: Option<String>,

    #[arg(long, default_value = "configs/vehicles")]
    vehicles: PathBuf,

    #[arg(long, default_value_t = 80.0)]
    speed: f64,

    #[arg(long, default_value_t = 25.0)]
    temperature: f64,

    /// Straight-line routing over flat terrain
    #[arg(long, default_value_t = false)]
    offline: bool,

    /// Print the report as JSON instead of text
    #[arg(long, default_value_t = false)]
    json: bool,

    #[arg(short, long, default_value_t = false)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let catalog = load_vehicle_configs(&cli.vehicles)
        .with_context(|| format!("loading vehicles from {}", cli.vehicles.display()))?;
    let vehicle = trip_vehicle::select(&catalog, cli.vehicle.as_deref())?;

    let token = if cli.offline {
        None
    } else {
        Some(env_credential(MAPBOX_TOKEN_ENV).with_context(|| {
            format!("{MAPBOX_TOKEN_ENV} is not set; pass --offline to profile without network access")
        })?)
    };
    let geocoder = match &token {
        Some(t) => Some(MapboxGeocoder::new(t.clone())?),
        None => None,
    };

    let mut coordinates = vec![resolve_location(&cli.from, geocoder.as_ref())?];
    for via in &cli.via {
        coordinates.push(resolve_location(via, geocoder.as_ref())?);
    }
    coordinates.push(resolve_location(&cli.to, geocoder.as_ref())?);

    let (router, elevation): (Box<dyn RouteProvider>, Box<dyn ElevationProvider>) = match &token {
        Some(t) => (
            Box::new(MapboxDirections::new(t.clone())?),
            Box::new(OpenMeteoElevation::new()?),
        ),
        None => (
            Box::new(StraightLineRouter {
                speed_kmh: cli.speed,
                ..StraightLineRouter::default()
            }),
            Box::new(FlatTerrain),
        ),
    };

    let route = router.route(&coordinates)?;
    let config = DiagnosticsConfig {
        speed_kmh: cli.speed,
        temperature_c: cli.temperature,
        ..DiagnosticsConfig::default()
    };
    let report = profile_route(&route.points, &vehicle, elevation.as_ref(), &config);

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("Vehicle: {} ({:.1} kWh usable)", vehicle.name, vehicle.usable_capacity_kwh);
    println!("Distance: {:.1} km in {} segments", report.distance_km, report.segment_count);
    println!("Total energy: {:.2} kWh", report.total_energy_kwh);
    println!("Battery usage: {:.1}%", report.battery_usage_percent);
    println!("Elevation gain: {:.0} m", report.elevation_gain_m);
    println!("Max grade: {:.1}%", report.max_grade * 100.0);
    println!("Min grade: {:.1}%", report.min_grade * 100.0);
    println!("Efficiency: {:.3} kWh/km", report.efficiency_kwh_per_km);
    println!("Critical segments: {}", report.critical_segments.len());
    for seg in &report.critical_segments {
        println!(
            "  #{:<4} grade {:>6.1}%  energy {:>7.3} kWh  ({})",
            seg.index,
            seg.grade * 100.0,
            seg.energy_kwh,
            if seg.grade > 0.0 { "climb" } else { "descent" }
        );
    }
    if report.requires_charging {
        println!("Charging required: route needs more than the usable capacity");
    } else {
        println!("Charging required: no");
    }

    Ok(())
}
