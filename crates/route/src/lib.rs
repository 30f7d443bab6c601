//! Route geometry helpers: fixed-length segmentation, grade derivation, and sinuosity.

use ev_core::geo::{LatLng, haversine_m};

/// Segment length used by trip planning (metres).
pub const TRIP_SEGMENT_LENGTH_M: f64 = 5_000.0;
/// Finer segment length used by route diagnostics (metres).
pub const DIAGNOSTIC_SEGMENT_LENGTH_M: f64 = 1_000.0;

/// A contiguous slice of the route polyline.
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    pub points: Vec<LatLng>,
    /// Haversine length of `points` (metres).
    pub distance_m: f64,
}

impl Segment {
    /// First point of the segment; elevation is sampled here.
    pub fn start(&self) -> LatLng {
        self.points[0]
    }

    /// Last point of the segment; used as the vehicle position after driving it.
    pub fn end(&self) -> LatLng {
        self.points[self.points.len() - 1]
    }
}

/// Split a polyline into consecutive segments of at least `target_length_m`.
///
/// Points are accumulated greedily; once the running distance reaches the target the
/// segment is closed and the next one starts from its last point, so neighbours share a
/// boundary point. A trailing remainder is kept only when it holds more than one point.
/// `target_length_m` must be positive.
pub fn segment_polyline(points: &[LatLng], target_length_m: f64) -> Vec<Segment> {
    let mut segments = Vec::new();
    let Some(first) = points.first() else {
        return segments;
    };

    let mut current = vec![*first];
    let mut distance = 0.0;

    for pair in points.windows(2) {
        distance += haversine_m(pair[0], pair[1]);
        current.push(pair[1]);

        if distance >= target_length_m {
            segments.push(Segment {
                points: std::mem::replace(&mut current, vec![pair[1]]),
                distance_m: distance,
            });
            distance = 0.0;
        }
    }

    if current.len() > 1 {
        segments.push(Segment {
            points: current,
            distance_m: distance,
        });
    }

    segments
}

/// Start point of every segment, in order. These are the elevation sample locations.
pub fn sample_points(segments: &[Segment]) -> Vec<LatLng> {
    segments.iter().map(Segment::start).collect()
}

/// Rise over run for segment `index`, using the elevation sampled at its start and at the
/// start of the following segment (the last segment reuses its own sample, i.e. flat).
pub fn segment_grade(elevations_m: &[f64], segments: &[Segment], index: usize) -> f64 {
    if elevations_m.is_empty() {
        return 0.0;
    }
    let here = elevations_m[index.min(elevations_m.len() - 1)];
    let next = elevations_m[(index + 1).min(elevations_m.len() - 1)];
    let run = segments[index].distance_m;
    if run > 0.0 { (next - here) / run } else { 0.0 }
}

/// Cumulative climb and descent (metres) across consecutive elevation samples.
pub fn elevation_gain_loss(elevations_m: &[f64]) -> (f64, f64) {
    elevations_m
        .windows(2)
        .fold((0.0, 0.0), |(gain, loss), w| {
            let delta = w[1] - w[0];
            if delta > 0.0 {
                (gain + delta, loss)
            } else {
                (gain, loss - delta)
            }
        })
}

/// Sinuosity score in [0, 1]: 0 for a straight line, 1 once the path is 1.5× the chord.
pub fn route_complexity(points: &[LatLng]) -> f64 {
    if points.len() < 2 {
        return 0.0;
    }
    let straight = haversine_m(points[0], points[points.len() - 1]);
    if straight == 0.0 {
        return 0.0;
    }
    let actual = ev_core::geo::polyline_length_m(points);
    ((actual / straight - 1.0) * 2.0).clamp(0.0, 1.0)
}
