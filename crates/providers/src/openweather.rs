//! Current temperature from OpenWeather.

use ev_core::geo::LatLng;
use ev_planner::providers::{ProviderError, WeatherProvider};
use reqwest::blocking::Client;
use serde::Deserialize;

use crate::HttpProviderError;

const WEATHER_URL: &str = "https://api.openweathermap.org/data/2.5/weather";

#[derive(Debug, Deserialize)]
struct WeatherResponse {
    main: MainBlock,
}

#[derive(Debug, Deserialize)]
struct MainBlock {
    temp: f64,
}

#[derive(Debug, Clone)]
pub struct OpenWeather {
    client: Client,
    api_key: String,
    base_url: String,
}

impl OpenWeather {
    pub fn new(api_key: impl Into<String>) -> Result<Self, HttpProviderError> {
        Ok(Self {
            client: Client::builder().build()?,
            api_key: api_key.into(),
            base_url: WEATHER_URL.to_string(),
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn fetch(&self, location: LatLng) -> Result<f64, HttpProviderError> {
        let body = self
            .client
            .get(&self.base_url)
            .query(&[
                ("lat", location.lat.to_string()),
                ("lon", location.lng.to_string()),
                ("units", "metric".to_string()),
                ("appid", self.api_key.clone()),
            ])
            .send()?
            .error_for_status()?
            .text()?;
        parse_temperature(&body)
    }
}

/// Temperature in °C from a metric-units current-weather response.
pub fn parse_temperature(body: &str) -> Result<f64, HttpProviderError> {
    let response: WeatherResponse = serde_json::from_str(body)?;
    Ok(response.main.temp)
}

impl WeatherProvider for OpenWeather {
    fn temperature_c(&self, location: LatLng) -> Result<f64, ProviderError> {
        self.fetch(location)
            .map_err(|err| err.into_provider_error("openweather"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_main_temperature() {
        let body = r#"{"weather": [{"main": "Clear"}], "main": {"temp": 31.4, "humidity": 60}}"#;
        assert_eq!(parse_temperature(body).expect("parsed"), 31.4);
        assert!(parse_temperature(r#"{"cod": 401}"#).is_err());
    }
}
