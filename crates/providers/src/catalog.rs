//! CSV-backed charging-station catalog.

use std::io::Read;
use std::path::Path;

use ev_core::geo::LatLng;
use ev_planner::providers::{ChargerCandidate, ChargerLookup, ChargerQuery, ProviderError};
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read charger catalog: {0}")]
    Csv(#[from] csv::Error),
    #[error("charger '{id}' has an invalid coordinate ({lat}, {lng})")]
    InvalidCoordinate { id: String, lat: f64, lng: f64 },
}

#[derive(Debug, Deserialize)]
struct ChargerRecord {
    id: String,
    name: String,
    #[serde(default)]
    operator: String,
    lat: f64,
    lng: f64,
    power_kw: f64,
    #[serde(default = "default_operational")]
    operational: bool,
}

fn default_operational() -> bool {
    true
}

/// Operational chargers loaded from `id,name,operator,lat,lng,power_kw[,operational]` rows.
#[derive(Debug, Clone, Default)]
pub struct ChargerCatalog {
    chargers: Vec<ChargerCandidate>,
}

impl ChargerCatalog {
    pub fn new(chargers: Vec<ChargerCandidate>) -> Self {
        Self { chargers }
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, CatalogError> {
        let reader = csv::Reader::from_path(path)?;
        Self::from_csv(reader)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, CatalogError> {
        Self::from_csv(csv::Reader::from_reader(reader))
    }

    fn from_csv<R: Read>(mut reader: csv::Reader<R>) -> Result<Self, CatalogError> {
        let mut chargers = Vec::new();
        for row in reader.deserialize() {
            let record: ChargerRecord = row?;
            if !record.operational {
                continue;
            }
            let location = LatLng::new(record.lat, record.lng);
            if !location.is_valid() {
                return Err(CatalogError::InvalidCoordinate {
                    id: record.id,
                    lat: record.lat,
                    lng: record.lng,
                });
            }
            chargers.push(ChargerCandidate {
                id: record.id,
                name: record.name,
                operator: record.operator,
                location,
                power_kw: record.power_kw,
            });
        }
        Ok(Self { chargers })
    }

    pub fn len(&self) -> usize {
        self.chargers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chargers.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ChargerCandidate> {
        self.chargers.iter()
    }

    /// Chargers within `query.radius_km` meeting the power floor, nearest first.
    pub fn nearby(&self, query: &ChargerQuery) -> Vec<ChargerCandidate> {
        let mut hits: Vec<(f64, &ChargerCandidate)> = self
            .chargers
            .iter()
            .filter(|c| c.power_kw >= query.min_power_kw)
            .map(|c| (query.center.distance_km(&c.location), c))
            .filter(|(d, _)| *d <= query.radius_km)
            .collect();
        hits.sort_by(|a, b| a.0.total_cmp(&b.0));
        hits.into_iter()
            .take(query.limit)
            .map(|(_, c)| c.clone())
            .collect()
    }

    /// Chargers within `corridor_km` of any vertex of the route polyline, in catalog order.
    pub fn along_route(&self, route: &[LatLng], corridor_km: f64) -> Vec<ChargerCandidate> {
        if route.is_empty() {
            return Vec::new();
        }

        let (mut min_lat, mut max_lat, mut min_lng, mut max_lng) = (90.0_f64, -90.0_f64, 180.0_f64, -180.0_f64);
        for p in route {
            min_lat = min_lat.min(p.lat);
            max_lat = max_lat.max(p.lat);
            min_lng = min_lng.min(p.lng);
            max_lng = max_lng.max(p.lng);
        }
        let lat_buffer = corridor_km / 111.0;
        let lng_buffer = corridor_km / (111.0 * min_lat.to_radians().cos().max(1e-6));

        self.chargers
            .iter()
            .filter(|c| {
                let p = c.location;
                p.lat >= min_lat - lat_buffer
                    && p.lat <= max_lat + lat_buffer
                    && p.lng >= min_lng - lng_buffer
                    && p.lng <= max_lng + lng_buffer
            })
            .filter(|c| route.iter().any(|p| p.distance_km(&c.location) <= corridor_km))
            .cloned()
            .collect()
    }
}

impl ChargerLookup for ChargerCatalog {
    fn find_near(&self, query: &ChargerQuery) -> Result<Vec<ChargerCandidate>, ProviderError> {
        Ok(self.nearby(query))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CSV: &str = "\
id,name,operator,lat,lng,power_kw,operational
cbe-1,Coimbatore Hub,Zeon,11.0168,76.9558,60,true
slm-1,Salem Bypass,Tata Power,11.6643,78.1460,50,true
slm-2,Salem Town,Statiq,11.6500,78.1600,25,true
krr-1,Karur Plaza,Zeon,10.9601,78.0766,120,false
";

    fn catalog() -> ChargerCatalog {
        ChargerCatalog::from_reader(CSV.as_bytes()).expect("catalog")
    }

    #[test]
    fn skips_non_operational_rows() {
        assert_eq!(catalog().len(), 3);
    }

    #[test]
    fn nearby_filters_power_and_sorts_by_distance() {
        let query = ChargerQuery {
            center: LatLng::new(11.6, 78.0),
            radius_km: 150.0,
            min_power_kw: 50.0,
            limit: 50,
        };
        let hits = catalog().nearby(&query);
        let ids: Vec<&str> = hits.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["slm-1", "cbe-1"]);

        let limited = catalog().nearby(&ChargerQuery { limit: 1, ..query });
        assert_eq!(limited.len(), 1);
    }

    #[test]
    fn corridor_search_keeps_chargers_near_the_route() {
        let route = vec![LatLng::new(11.0, 76.9), LatLng::new(11.02, 77.0)];
        let hits = catalog().along_route(&route, 10.0);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "cbe-1");
    }

    #[test]
    fn loads_from_a_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("chargers.csv");
        std::fs::write(&path, CSV).expect("write");
        let loaded = ChargerCatalog::from_path(&path).expect("catalog");
        assert_eq!(loaded.len(), 3);
        assert!(ChargerCatalog::from_path(dir.path().join("missing.csv")).is_err());
    }

    #[test]
    fn rejects_out_of_range_coordinates() {
        let bad = "id,name,operator,lat,lng,power_kw\nx,Bad,,95.0,10.0,50\n";
        assert!(matches!(
            ChargerCatalog::from_reader(bad.as_bytes()),
            Err(CatalogError::InvalidCoordinate { .. })
        ));
    }
}
