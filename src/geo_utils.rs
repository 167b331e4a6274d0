//! # Geographic Utilities
//!
//! Distance and speed computations used by the stop detector.
//!
//! ## Overview
//!
//! | Function | Description |
//! |----------|-------------|
//! | [`haversine_distance`] | Great-circle distance between two GPS points, in meters |
//! | [`average_speed`] | Average speed over an interval, infinite for zero-length intervals |
//! | [`polyline_length`] | Total length of a sequence of GPS points in meters |
//!
//! ## Example
//!
//! ```rust
//! use stop_detector::{GpsPoint, geo_utils};
//!
//! let a = GpsPoint::new(-23.5505, -46.6333);
//! let b = GpsPoint::new(-23.5510, -46.6333);
//!
//! let dist = geo_utils::haversine_distance(&a, &b);
//! let speed = geo_utils::average_speed(dist, 10.0);
//! println!("{:.1}m in 10s = {:.2}m/s", dist, speed);
//!
//! // Two fixes with the same timestamp never describe a stop
//! assert_eq!(geo_utils::average_speed(dist, 0.0), f64::INFINITY);
//! ```
//!
//! ## Algorithm Notes
//!
//! ### Haversine Formula
//!
//! The haversine formula calculates the great-circle distance between two points on a sphere.
//! The Earth radius is fixed at 6371 km rather than geo's default IUGG mean radius of
//! 6371.0088 km, so distances match the reference values the thresholds were tuned on.
//!
//! Reference: [Haversine formula (Wikipedia)](https://en.wikipedia.org/wiki/Haversine_formula)

use geo::{Distance, HaversineMeasure, Point};

use crate::GpsPoint;

/// Earth radius used by [`haversine_distance`], in kilometers.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

// =============================================================================
// Distance Functions
// =============================================================================

/// Calculate the great-circle distance between two GPS points using the Haversine formula.
///
/// The distance is measured on a sphere of radius [`EARTH_RADIUS_KM`] and returned in
/// meters. Identical points give exactly 0; NaN coordinates give NaN.
///
/// # Example
///
/// ```rust
/// use stop_detector::{GpsPoint, geo_utils};
///
/// let london = GpsPoint::new(51.5074, -0.1278);
/// let paris = GpsPoint::new(48.8566, 2.3522);
///
/// let distance = geo_utils::haversine_distance(&london, &paris);
/// assert!((distance - 343_560.0).abs() < 1000.0); // ~344 km
/// ```
#[inline]
pub fn haversine_distance(p1: &GpsPoint, p2: &GpsPoint) -> f64 {
    let point1 = Point::new(p1.longitude, p1.latitude);
    let point2 = Point::new(p2.longitude, p2.latitude);
    HaversineMeasure::new(EARTH_RADIUS_KM * 1000.0).distance(point1, point2)
}

/// Calculate the total length of a polyline in meters.
///
/// Sums the haversine distance between consecutive points. Empty or single-point
/// input returns 0.0.
pub fn polyline_length(points: &[GpsPoint]) -> f64 {
    if points.len() < 2 {
        return 0.0;
    }

    points
        .windows(2)
        .map(|w| haversine_distance(&w[0], &w[1]))
        .sum()
}

// =============================================================================
// Speed Functions
// =============================================================================

/// Average speed in m/s of covering `distance` meters in `elapsed` seconds.
///
/// A zero (or negative) elapsed time yields `f64::INFINITY`, so the interval can
/// never pass a "below the speed threshold" test and no division fault occurs.
#[inline]
pub fn average_speed(distance: f64, elapsed: f64) -> f64 {
    if elapsed > 0.0 {
        distance / elapsed
    } else {
        f64::INFINITY
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f64, b: f64, epsilon: f64) -> bool {
        (a - b).abs() < epsilon
    }

    #[test]
    fn test_haversine_distance_same_point() {
        let p = GpsPoint::new(-23.5505, -46.6333);
        assert_eq!(haversine_distance(&p, &p), 0.0);
    }

    #[test]
    fn test_haversine_distance_known_value() {
        // London to Paris is approximately 344 km
        let london = GpsPoint::new(51.5074, -0.1278);
        let paris = GpsPoint::new(48.8566, 2.3522);
        let dist = haversine_distance(&london, &paris);
        assert!(approx_eq(dist, 343_560.0, 5000.0)); // Within 5km
    }

    #[test]
    fn test_haversine_one_degree_of_latitude() {
        // One degree along a meridian is R * pi / 180
        let a = GpsPoint::new(0.0, 0.0);
        let b = GpsPoint::new(1.0, 0.0);
        let expected = EARTH_RADIUS_KM * 1000.0 * std::f64::consts::PI / 180.0;
        assert!(approx_eq(haversine_distance(&a, &b), expected, 1e-6));
    }

    #[test]
    fn test_haversine_sub_meter() {
        // 1e-6 degrees of latitude is about 11cm
        let a = GpsPoint::new(-23.5505, -46.6333);
        let b = GpsPoint::new(-23.550501, -46.6333);
        let dist = haversine_distance(&a, &b);
        assert!(dist > 0.05 && dist < 0.2);
    }

    #[test]
    fn test_haversine_antipodal() {
        let a = GpsPoint::new(0.0, 0.0);
        let b = GpsPoint::new(0.0, 180.0);
        let half_circumference = EARTH_RADIUS_KM * 1000.0 * std::f64::consts::PI;
        assert!(approx_eq(haversine_distance(&a, &b), half_circumference, 1e-3));
    }

    #[test]
    fn test_haversine_symmetric() {
        let a = GpsPoint::new(-23.5505, -46.6333);
        let b = GpsPoint::new(-23.5605, -46.6433);
        assert_eq!(haversine_distance(&a, &b), haversine_distance(&b, &a));
    }

    #[test]
    fn test_haversine_nan_propagates() {
        let a = GpsPoint::new(-23.5505, -46.6333);
        let bad_lat = GpsPoint::new(f64::NAN, -46.6333);
        let bad_lng = GpsPoint::new(-23.5505, f64::NAN);
        assert!(haversine_distance(&a, &bad_lat).is_nan());
        assert!(haversine_distance(&bad_lng, &a).is_nan());
    }

    #[test]
    fn test_polyline_length_empty() {
        let empty: Vec<GpsPoint> = vec![];
        assert_eq!(polyline_length(&empty), 0.0);
    }

    #[test]
    fn test_polyline_length_single_point() {
        let single = vec![GpsPoint::new(-23.5505, -46.6333)];
        assert_eq!(polyline_length(&single), 0.0);
    }

    #[test]
    fn test_polyline_length_sums_legs() {
        let track = vec![
            GpsPoint::new(-23.5505, -46.6333),
            GpsPoint::new(-23.5510, -46.6333),
            GpsPoint::new(-23.5510, -46.6340),
        ];
        let expected = haversine_distance(&track[0], &track[1]) + haversine_distance(&track[1], &track[2]);
        assert_eq!(polyline_length(&track), expected);
    }

    #[test]
    fn test_average_speed() {
        assert_eq!(average_speed(50.0, 10.0), 5.0);
        assert_eq!(average_speed(0.0, 10.0), 0.0);
    }

    #[test]
    fn test_average_speed_zero_elapsed_is_infinite() {
        assert_eq!(average_speed(0.0, 0.0), f64::INFINITY);
        assert_eq!(average_speed(12.0, 0.0), f64::INFINITY);
        assert_eq!(average_speed(12.0, -1.0), f64::INFINITY);
    }
}
