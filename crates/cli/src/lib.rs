//! Shared helpers for the command-line binaries.

use anyhow::{Context, anyhow};
use ev_trip_planner::geo_core::geo::LatLng;
use ev_trip_planner::providers::MapboxGeocoder;
use log::{LevelFilter, info};
use simplelog::{ColorChoice, Config, TermLogger, TerminalMode};

pub const MAPBOX_TOKEN_ENV: &str = "MAPBOX_ACCESS_TOKEN";
pub const OPENWEATHER_KEY_ENV: &str = "OPENWEATHER_API_KEY";

/// Route log output to stderr; `--verbose` enables debug records.
pub fn init_logging(verbose: bool) {
    let level = if verbose { LevelFilter::Debug } else { LevelFilter::Info };
    // A logger may already be installed when running under a test harness.
    if let Err(err) =
        TermLogger::init(level, Config::default(), TerminalMode::Stderr, ColorChoice::Auto)
    {
        eprintln!("logging not initialised: {err}");
    }
}

/// Parse `"lat,lng"`; returns `None` for anything that is not two numbers.
pub fn parse_lat_lng(text: &str) -> Option<LatLng> {
    let (lat, lng) = text.split_once(',')?;
    let point = LatLng::new(lat.trim().parse().ok()?, lng.trim().parse().ok()?);
    Some(point)
}

/// Read a credential from the environment, ignoring blank values.
pub fn env_credential(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Resolve a coordinate literal, or geocode it when a geocoder is available.
pub fn resolve_location(text: &str, geocoder: Option<&MapboxGeocoder>) -> anyhow::Result<LatLng> {
    if let Some(point) = parse_lat_lng(text) {
        return Ok(point);
    }
    let geocoder = geocoder.ok_or_else(|| {
        anyhow!("'{text}' is not a \"lat,lng\" pair and address lookup needs {MAPBOX_TOKEN_ENV}")
    })?;
    let place = geocoder
        .geocode(text)
        .with_context(|| format!("geocoding '{text}'"))?
        .ok_or_else(|| anyhow!("no place found for '{text}'"))?;
    info!("resolved '{text}' to {} ({:.4}, {:.4})", place.place_name, place.location.lat, place.location.lng);
    Ok(place.location)
}
