use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use ev_cli::{
    MAPBOX_TOKEN_ENV, OPENWEATHER_KEY_ENV, env_credential, init_logging, resolve_location,
};
use ev_trip_planner::config::{PlannerPolicy, load_policy, load_vehicle_configs};
use ev_trip_planner::export::{summary, trace, writer_for_path};
use ev_trip_planner::planner::providers::{
    ChargerLookup, ElevationProvider, RouteProvider, WeatherProvider,
};
use ev_trip_planner::planner::vehicle as trip_vehicle;
use ev_trip_planner::providers::{
    CachedElevation, ChargerCatalog, FixedTemperature, FlatTerrain, MapboxDirections,
    MapboxGeocoder, OpenMeteoElevation, OpenWeather, StraightLineRouter,
};
use ev_trip_planner::{Feasibility, TripProviders, TripRequest, plan_trip};
use log::warn;

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Plan an EV road trip, inserting charging stops where the battery runs low"
)]
struct Cli {
    /// Start as "lat,lng" or an address (address lookup needs MAPBOX_ACCESS_TOKEN)
    #[arg(long)]
    from: String,

    /// Destination as "lat,lng" or an address
    #[arg(long)]
    to: String,

    /// Intermediate stop; repeat for several
    #[arg(long)]
    via: Vec<String>,

    /// Vehicle name from the catalog (defaults to the first entry)
    #[arg(long)]
    vehicle: Option<String>,

    /// Starting state of charge in percent of usable capacity
    #[arg(long, default_value_t = 80.0)]
    soc: f64,

    /// Vehicle catalog: YAML/TOML file or directory of TOML files
    #[arg(long, default_value = "configs/vehicles")]
    vehicles: PathBuf,

    /// Charger catalog CSV
    #[arg(long, default_value = "data/chargers.csv")]
    chargers: PathBuf,

    /// Planner policy overrides (TOML or YAML)
    #[arg(long)]
    policy: Option<PathBuf>,

    /// Use straight-line routing, flat terrain, and a fixed temperature
    #[arg(long, default_value_t = false)]
    offline: bool,

    /// Ambient temperature for offline runs (°C)
    #[arg(long, default_value_t = 25.0)]
    temperature: f64,

    /// Write the segment trace CSV here (`-` for stdout)
    #[arg(long)]
    trace_csv: Option<PathBuf>,

    /// Write the JSON trip summary here (`-` for stdout)
    #[arg(long)]
    summary_json: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, default_value_t = false)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let policy = match &cli.policy {
        Some(path) => load_policy(path).with_context(|| format!("loading {}", path.display()))?,
        None => PlannerPolicy::default(),
    };
    let catalog = load_vehicle_configs(&cli.vehicles)
        .with_context(|| format!("loading vehicles from {}", cli.vehicles.display()))?;
    let vehicle = trip_vehicle::select(&catalog, cli.vehicle.as_deref())?;
    let chargers = ChargerCatalog::from_path(&cli.chargers)
        .with_context(|| format!("loading chargers from {}", cli.chargers.display()))?;

    let mapbox_token = if cli.offline {
        None
    } else {
        Some(env_credential(MAPBOX_TOKEN_ENV).with_context(|| {
            format!("{MAPBOX_TOKEN_ENV} is not set; pass --offline to plan without network access")
        })?)
    };
    let geocoder = match &mapbox_token {
        Some(token) => Some(MapboxGeocoder::new(token.clone())?),
        None => None,
    };

    let start = resolve_location(&cli.from, geocoder.as_ref())?;
    let end = resolve_location(&cli.to, geocoder.as_ref())?;
    let waypoints = cli
        .via
        .iter()
        .map(|v| resolve_location(v, geocoder.as_ref()))
        .collect::<anyhow::Result<Vec<_>>>()?;

    let (route, elevation, weather): (
        Box<dyn RouteProvider>,
        Box<dyn ElevationProvider>,
        Box<dyn WeatherProvider>,
    ) = match &mapbox_token {
        None => (
            Box::new(StraightLineRouter {
                speed_kmh: policy.cruise_speed_kmh,
                ..StraightLineRouter::default()
            }),
            Box::new(FlatTerrain),
            Box::new(FixedTemperature(cli.temperature)),
        ),
        Some(token) => {
            let weather: Box<dyn WeatherProvider> = match env_credential(OPENWEATHER_KEY_ENV) {
                Some(key) => Box::new(OpenWeather::new(key)?),
                None => {
                    warn!("{OPENWEATHER_KEY_ENV} is not set; using {:.1} °C", policy.default_temperature_c);
                    Box::new(FixedTemperature(policy.default_temperature_c))
                }
            };
            (
                Box::new(MapboxDirections::new(token.clone())?),
                Box::new(CachedElevation::new(OpenMeteoElevation::new()?)),
                weather,
            )
        }
    };
    let charger_lookup: &dyn ChargerLookup = &chargers;

    let providers = TripProviders {
        route: route.as_ref(),
        elevation: elevation.as_ref(),
        weather: weather.as_ref(),
        chargers: charger_lookup,
    };
    let request = TripRequest {
        start,
        end,
        waypoints,
        vehicle: vehicle.clone(),
        start_soc_percent: cli.soc,
    };

    let plan = plan_trip(&request, &providers, &policy)?;

    println!("Vehicle: {}", vehicle.name);
    println!("Distance: {:.1} km", plan.distance_km);
    println!("Duration: {:.0} min", plan.duration_min);
    println!("Energy consumed: {:.2} kWh", plan.energy_consumed_kwh);
    println!(
        "Temperature: {:.1} °C, climb {:.0} m, descent {:.0} m",
        plan.environment.temperature_c,
        plan.environment.elevation_gain_m,
        plan.environment.elevation_loss_m
    );
    println!(
        "Final SoC: {:.1}% (minimum {:.1}%)",
        plan.final_soc_percent, plan.min_soc_percent
    );
    println!("Injected stops: {}", plan.injected_stops.len());
    for stop in &plan.injected_stops {
        println!(
            "  - {} [{}] {:.0} kW at ({:.4}, {:.4})",
            stop.name, stop.operator, stop.power_kw, stop.location.lat, stop.location.lng
        );
    }
    match plan.feasibility {
        Feasibility::Feasible => println!("Status: feasible"),
        Feasibility::Infeasible(reason) => println!("Status: infeasible ({reason})"),
    }

    if let Some(path) = &cli.trace_csv {
        let mut writer = writer_for_path(path)?;
        trace::write_trace(writer.as_mut(), &plan.trace)?;
    }
    if let Some(path) = &cli.summary_json {
        let meta = summary::Metadata {
            vehicle: &vehicle.name,
            origin: &cli.from,
            destination: &cli.to,
            start_soc_percent: cli.soc,
        };
        summary::write_summary(path, &meta, &plan)?;
    }

    Ok(())
}
