//! Core units, constants, and shared primitives for the EV trip planner workspace.

/// Physical constants expressed in SI units (unless stated otherwise).
pub mod constants {
    /// Gravitational acceleration used by the road-load model (m/s²).
    pub const G: f64 = 9.81;
    /// Air density at sea level (kg/m³).
    pub const RHO_AIR: f64 = 1.225;
    /// Mean Earth radius used for Haversine distances (metres).
    pub const EARTH_RADIUS_M: f64 = 6_371_000.0;
    /// Joules per kilowatt-hour.
    pub const JOULES_PER_KWH: f64 = 3_600_000.0;
}

/// Basic unit conversion helpers.
pub mod units {
    use super::constants::JOULES_PER_KWH;

    /// Convert metres to kilometres.
    #[inline]
    pub fn m_to_km(v: f64) -> f64 {
        v / 1_000.0
    }

    /// Convert kilometres per hour to metres per second.
    #[inline]
    pub fn kmh_to_ms(v: f64) -> f64 {
        v / 3.6
    }

    /// Convert joules to kilowatt-hours.
    #[inline]
    pub fn joules_to_kwh(v: f64) -> f64 {
        v / JOULES_PER_KWH
    }

    /// Convert seconds to minutes.
    #[inline]
    pub fn seconds_to_minutes(v: f64) -> f64 {
        v / 60.0
    }
}

/// Geographic coordinates and great-circle distances.
pub mod geo {
    use serde::{Deserialize, Serialize};

    use super::constants::EARTH_RADIUS_M;

    /// A WGS84 coordinate in decimal degrees.
    #[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
    pub struct LatLng {
        pub lat: f64,
        pub lng: f64,
    }

    impl LatLng {
        pub const fn new(lat: f64, lng: f64) -> Self {
            Self { lat, lng }
        }

        /// Build from a GeoJSON-style `[lng, lat]` pair.
        pub const fn from_lng_lat(pair: [f64; 2]) -> Self {
            Self {
                lat: pair[1],
                lng: pair[0],
            }
        }

        /// GeoJSON-style `[lng, lat]` pair.
        pub const fn to_lng_lat(self) -> [f64; 2] {
            [self.lng, self.lat]
        }

        /// True when both components are finite and inside the WGS84 ranges.
        pub fn is_valid(&self) -> bool {
            self.lat.is_finite()
                && self.lng.is_finite()
                && (-90.0..=90.0).contains(&self.lat)
                && (-180.0..=180.0).contains(&self.lng)
        }

        /// Haversine distance to `other` in metres.
        pub fn distance_m(&self, other: &LatLng) -> f64 {
            haversine_m(*self, *other)
        }

        /// Haversine distance to `other` in kilometres.
        pub fn distance_km(&self, other: &LatLng) -> f64 {
            haversine_m(*self, *other) / 1_000.0
        }

        /// Point a fraction `t` of the way along the great circle towards `other`.
        pub fn interpolate(&self, other: &LatLng, t: f64) -> LatLng {
            let lat1 = self.lat.to_radians();
            let lng1 = self.lng.to_radians();
            let lat2 = other.lat.to_radians();
            let lng2 = other.lng.to_radians();
            let delta = haversine_m(*self, *other) / EARTH_RADIUS_M;
            if delta < 1e-12 {
                return *self;
            }
            let a = ((1.0 - t) * delta).sin() / delta.sin();
            let b = (t * delta).sin() / delta.sin();
            let x = a * lat1.cos() * lng1.cos() + b * lat2.cos() * lng2.cos();
            let y = a * lat1.cos() * lng1.sin() + b * lat2.cos() * lng2.sin();
            let z = a * lat1.sin() + b * lat2.sin();
            LatLng {
                lat: z.atan2((x * x + y * y).sqrt()).to_degrees(),
                lng: y.atan2(x).to_degrees(),
            }
        }
    }

    /// Great-circle distance in metres between two coordinates.
    pub fn haversine_m(a: LatLng, b: LatLng) -> f64 {
        let d_lat = (b.lat - a.lat).to_radians();
        let d_lng = (b.lng - a.lng).to_radians();
        let lat1 = a.lat.to_radians();
        let lat2 = b.lat.to_radians();

        let h = (d_lat / 2.0).sin().powi(2) + (d_lng / 2.0).sin().powi(2) * lat1.cos() * lat2.cos();
        let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());
        EARTH_RADIUS_M * c
    }

    /// Sum of consecutive Haversine distances along a polyline (metres).
    pub fn polyline_length_m(points: &[LatLng]) -> f64 {
        points.windows(2).map(|w| haversine_m(w[0], w[1])).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::geo::{LatLng, haversine_m, polyline_length_m};
    use approx::assert_relative_eq;

    #[test]
    fn one_degree_of_longitude_at_equator() {
        let d = haversine_m(LatLng::new(0.0, 0.0), LatLng::new(0.0, 1.0));
        assert_relative_eq!(d, 111_194.93, epsilon = 1.0);
    }

    #[test]
    fn interpolation_stays_on_the_great_circle() {
        let a = LatLng::new(13.0827, 80.2707);
        let b = LatLng::new(11.4102, 76.6950);
        let mid = a.interpolate(&b, 0.5);
        let total = a.distance_m(&b);
        assert_relative_eq!(a.distance_m(&mid), total / 2.0, epsilon = 1.0);
        assert_relative_eq!(polyline_length_m(&[a, mid, b]), total, epsilon = 1.0);
    }

    #[test]
    fn rejects_out_of_range_coordinates() {
        assert!(LatLng::new(45.0, 7.0).is_valid());
        assert!(!LatLng::new(91.0, 7.0).is_valid());
        assert!(!LatLng::new(45.0, f64::NAN).is_valid());
    }
}
