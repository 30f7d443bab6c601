//! In-memory elevation cache with gap interpolation.

use std::collections::HashMap;
use std::sync::Mutex;

use ev_core::geo::LatLng;
use ev_planner::providers::{ElevationProvider, ProviderError};
use log::debug;

/// Maximum look-ahead (in points) when bridging a gap between two cached samples.
pub const BRIDGE_LIMIT: usize = 300;

type Key = (i64, i64);

fn key(point: LatLng) -> Key {
    ((point.lat * 1e4).round() as i64, (point.lng * 1e4).round() as i64)
}

/// Wraps an elevation provider with a process-local cache.
///
/// Points are keyed at 4-decimal precision. Before calling the inner provider, gaps
/// between two known samples less than [`BRIDGE_LIMIT`] points apart are filled by
/// linear interpolation; only the remaining points are fetched. Failed or short
/// lookups are passed on to the caller and leave the cache untouched.
#[derive(Debug)]
pub struct CachedElevation<P> {
    inner: P,
    cache: Mutex<HashMap<Key, f64>>,
}

impl<P: ElevationProvider> CachedElevation<P> {
    pub fn new(inner: P) -> Self {
        Self {
            inner,
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn inner(&self) -> &P {
        &self.inner
    }

    pub fn len(&self) -> usize {
        self.cache.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Seed the cache with known samples.
    pub fn insert_many(&self, samples: impl IntoIterator<Item = (LatLng, f64)>) {
        let mut cache = self.cache.lock().unwrap_or_else(|e| e.into_inner());
        for (point, elevation) in samples {
            cache.insert(key(point), elevation);
        }
    }
}

/// Fill `None` entries lying between two known values within the bridge limit.
fn bridge_gaps(values: &mut [Option<f64>]) -> usize {
    let known: Vec<Option<f64>> = values.to_vec();
    let mut last_known: Option<(usize, f64)> = None;
    let mut filled = 0;

    for i in 0..values.len() {
        if let Some(v) = known[i] {
            last_known = Some((i, v));
            continue;
        }
        let Some((before_idx, before_val)) = last_known else {
            continue;
        };
        let upper = (i + BRIDGE_LIMIT).min(values.len());
        let next = ((i + 1)..upper).find_map(|j| known[j].map(|v| (j, v)));
        if let Some((after_idx, after_val)) = next {
            let t = (i - before_idx) as f64 / (after_idx - before_idx) as f64;
            values[i] = Some(before_val + (after_val - before_val) * t);
            filled += 1;
        }
    }
    filled
}

impl<P: ElevationProvider> ElevationProvider for CachedElevation<P> {
    fn elevations(&self, points: &[LatLng]) -> Result<Vec<f64>, ProviderError> {
        let mut values: Vec<Option<f64>> = {
            let cache = self.cache.lock().unwrap_or_else(|e| e.into_inner());
            points.iter().map(|p| cache.get(&key(*p)).copied()).collect()
        };

        let interpolated = bridge_gaps(&mut values);
        if interpolated > 0 {
            debug!("interpolated {interpolated} elevation sample(s) from cached neighbours");
        }

        let missing: Vec<usize> = (0..points.len()).filter(|&i| values[i].is_none()).collect();
        if !missing.is_empty() {
            let query: Vec<LatLng> = missing.iter().map(|&i| points[i]).collect();
            let fetched = self.inner.elevations(&query)?;
            if fetched.len() != query.len() {
                return Err(ProviderError::Malformed {
                    provider: "elevation cache",
                    message: format!("{} values for {} points", fetched.len(), query.len()),
                });
            }
            let mut cache = self.cache.lock().unwrap_or_else(|e| e.into_inner());
            for (&i, value) in missing.iter().zip(fetched) {
                cache.insert(key(points[i]), value);
                values[i] = Some(value);
            }
        }

        Ok(values.into_iter().map(|v| v.unwrap_or(0.0)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Elevation equals 1000 × longitude; counts every point it is asked for.
    #[derive(Default)]
    struct Counting {
        requested: AtomicUsize,
    }

    impl ElevationProvider for Counting {
        fn elevations(&self, points: &[LatLng]) -> Result<Vec<f64>, ProviderError> {
            self.requested.fetch_add(points.len(), Ordering::SeqCst);
            Ok(points.iter().map(|p| p.lng * 1000.0).collect())
        }
    }

    fn line(n: usize) -> Vec<LatLng> {
        (0..n).map(|i| LatLng::new(10.0, 0.01 * i as f64)).collect()
    }

    #[test]
    fn second_lookup_is_served_from_memory() {
        let cached = CachedElevation::new(Counting::default());
        let points = line(5);
        let first = cached.elevations(&points).expect("first");
        let second = cached.elevations(&points).expect("second");
        assert_eq!(first, second);
        assert_eq!(cached.inner().requested.load(Ordering::SeqCst), 5);
        assert_eq!(cached.len(), 5);
    }

    #[test]
    fn gaps_between_known_samples_are_interpolated() {
        let cached = CachedElevation::new(Counting::default());
        let points = line(5);
        cached.insert_many([(points[0], 100.0), (points[4], 500.0)]);
        let values = cached.elevations(&points).expect("values");
        assert_eq!(cached.inner().requested.load(Ordering::SeqCst), 0);
        assert!((values[2] - 300.0).abs() < 1e-9);
    }

    struct Outage;

    impl ElevationProvider for Outage {
        fn elevations(&self, _points: &[LatLng]) -> Result<Vec<f64>, ProviderError> {
            Err(ProviderError::Upstream {
                provider: "test",
                message: "503".into(),
            })
        }
    }

    struct Truncating;

    impl ElevationProvider for Truncating {
        fn elevations(&self, points: &[LatLng]) -> Result<Vec<f64>, ProviderError> {
            Ok(vec![900.0; points.len() / 2])
        }
    }

    #[test]
    fn failed_lookups_are_not_cached() {
        let cached = CachedElevation::new(Outage);
        assert!(cached.elevations(&line(4)).is_err());
        assert!(cached.is_empty());

        let cached = CachedElevation::new(Truncating);
        assert!(matches!(
            cached.elevations(&line(4)),
            Err(ProviderError::Malformed { .. })
        ));
        assert!(cached.is_empty());
    }

    #[test]
    fn open_ended_gaps_are_fetched() {
        let mut values = vec![Some(1.0), None, None];
        assert_eq!(bridge_gaps(&mut values), 0);
        let mut values = vec![None, Some(2.0), None, Some(4.0)];
        assert_eq!(bridge_gaps(&mut values), 1);
        assert_eq!(values[0], None);
        assert_eq!(values[2], Some(3.0));
    }
}
