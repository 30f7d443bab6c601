//! Mapbox directions and forward geocoding.

use ev_core::geo::LatLng;
use ev_planner::providers::{ProviderError, RouteGeometry, RouteProvider};
use log::debug;
use reqwest::blocking::Client;
use serde::Deserialize;

use crate::HttpProviderError;

const DIRECTIONS_URL: &str = "https://api.mapbox.com/directions/v5/mapbox";
const GEOCODING_URL: &str = "https://api.mapbox.com/geocoding/v5/mapbox.places";
const PROVIDER: &str = "mapbox";

#[derive(Debug, Deserialize)]
struct DirectionsResponse {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    routes: Vec<DirectionsRoute>,
}

#[derive(Debug, Deserialize)]
struct DirectionsRoute {
    geometry: LineString,
    distance: f64,
    duration: f64,
    #[serde(default)]
    legs: Vec<DirectionsLeg>,
}

#[derive(Debug, Deserialize)]
struct LineString {
    coordinates: Vec<[f64; 2]>,
}

#[derive(Debug, Deserialize)]
struct DirectionsLeg {
    distance: f64,
}

/// Driving directions with full GeoJSON overview geometry.
#[derive(Debug, Clone)]
pub struct MapboxDirections {
    client: Client,
    token: String,
    base_url: String,
}

impl MapboxDirections {
    pub fn new(token: impl Into<String>) -> Result<Self, HttpProviderError> {
        Ok(Self {
            client: Client::builder().build()?,
            token: token.into(),
            base_url: DIRECTIONS_URL.to_string(),
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn fetch(&self, coordinates: &[LatLng]) -> Result<String, HttpProviderError> {
        let path = coordinates
            .iter()
            .map(|c| format!("{},{}", c.lng, c.lat))
            .collect::<Vec<_>>()
            .join(";");
        let url = format!("{}/driving/{}", self.base_url, path);
        debug!("requesting directions for {} coordinates", coordinates.len());
        let body = self
            .client
            .get(url)
            .query(&[
                ("geometries", "geojson"),
                ("overview", "full"),
                ("access_token", self.token.as_str()),
            ])
            .send()?
            .error_for_status()?
            .text()?;
        Ok(body)
    }
}

/// Decode a directions response, taking the first (best) route.
pub fn parse_directions(body: &str) -> Result<RouteGeometry, ProviderError> {
    let response: DirectionsResponse =
        serde_json::from_str(body).map_err(|err| HttpProviderError::from(err).into_provider_error(PROVIDER))?;
    let Some(route) = response.routes.into_iter().next() else {
        debug!("directions returned code {:?} without routes", response.code);
        return Err(ProviderError::NoRoute);
    };
    Ok(RouteGeometry {
        points: route
            .geometry
            .coordinates
            .into_iter()
            .map(LatLng::from_lng_lat)
            .collect(),
        distance_m: route.distance,
        duration_s: route.duration,
        leg_distances_m: route.legs.iter().map(|leg| leg.distance).collect(),
    })
}

impl RouteProvider for MapboxDirections {
    fn route(&self, coordinates: &[LatLng]) -> Result<RouteGeometry, ProviderError> {
        if coordinates.len() < 2 {
            return Err(ProviderError::NoRoute);
        }
        let body = self
            .fetch(coordinates)
            .map_err(|err| err.into_provider_error(PROVIDER))?;
        parse_directions(&body)
    }
}

/// First match of a forward geocoding query.
#[derive(Debug, Clone, PartialEq)]
pub struct GeocodedPlace {
    pub location: LatLng,
    pub place_name: String,
}

#[derive(Debug, Deserialize)]
struct GeocodingResponse {
    #[serde(default)]
    features: Vec<GeocodingFeature>,
}

#[derive(Debug, Deserialize)]
struct GeocodingFeature {
    center: [f64; 2],
    #[serde(default)]
    place_name: String,
}

#[derive(Debug, Clone)]
pub struct MapboxGeocoder {
    client: Client,
    token: String,
    base_url: String,
}

impl MapboxGeocoder {
    pub fn new(token: impl Into<String>) -> Result<Self, HttpProviderError> {
        Ok(Self {
            client: Client::builder().build()?,
            token: token.into(),
            base_url: GEOCODING_URL.to_string(),
        })
    }

    /// Resolve a free-text address. Blank queries and empty results yield `None`.
    pub fn geocode(&self, query: &str) -> Result<Option<GeocodedPlace>, HttpProviderError> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(None);
        }
        let mut url = reqwest::Url::parse(&self.base_url)
            .map_err(|err| HttpProviderError::InvalidUrl(err.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| HttpProviderError::InvalidUrl(self.base_url.clone()))?
            .push(&format!("{query}.json"));

        let body = self
            .client
            .get(url)
            .query(&[("access_token", self.token.as_str()), ("limit", "1")])
            .send()?
            .error_for_status()?
            .text()?;
        parse_geocoding(&body)
    }
}

pub fn parse_geocoding(body: &str) -> Result<Option<GeocodedPlace>, HttpProviderError> {
    let response: GeocodingResponse = serde_json::from_str(body)?;
    Ok(response.features.into_iter().next().map(|feature| GeocodedPlace {
        location: LatLng::from_lng_lat(feature.center),
        place_name: feature.place_name,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directions_take_the_first_route() {
        let body = r#"{
            "code": "Ok",
            "routes": [{
                "geometry": {"type": "LineString", "coordinates": [[76.95, 11.01], [77.0, 11.1]]},
                "distance": 12500.0,
                "duration": 900.0,
                "legs": [{"distance": 12500.0, "duration": 900.0, "summary": "NH544"}]
            }]
        }"#;
        let route = parse_directions(body).expect("route parsed");
        assert_eq!(route.points[0], LatLng::new(11.01, 76.95));
        assert_eq!(route.distance_m, 12_500.0);
        assert_eq!(route.leg_distances_m, vec![12_500.0]);
    }

    #[test]
    fn empty_route_list_means_no_route() {
        let err = parse_directions(r#"{"code": "NoRoute", "routes": []}"#).unwrap_err();
        assert!(matches!(err, ProviderError::NoRoute));
        let err = parse_directions("not json").unwrap_err();
        assert!(matches!(err, ProviderError::Malformed { .. }));
    }

    #[test]
    fn geocoding_returns_first_feature() {
        let body = r#"{"features": [{"center": [80.27, 13.08], "place_name": "Chennai, Tamil Nadu, India"}]}"#;
        let place = parse_geocoding(body).expect("parsed").expect("feature");
        assert_eq!(place.location, LatLng::new(13.08, 80.27));
        assert!(parse_geocoding(r#"{"features": []}"#).expect("parsed").is_none());
    }
}
