//! # Stop Detector
//!
//! CB-SMoT (Clustering-Based Stops and Moves of Trajectories) stop detection for
//! GPS trajectories of moving vehicles.
//!
//! This library provides:
//! - Haversine distance and inter-fix speed estimation
//! - A speed/duration threshold state machine that splits a trajectory into stops
//! - A lazy iterator mode that emits each stop as soon as it closes
//! - Batch processing of many vehicles, optionally in parallel
//!
//! ## Features
//!
//! - **`parallel`** - Enable parallel batch processing with rayon
//! - **`serde`** - Serialize fixes, segments and configuration
//! - **`full`** - Enable all features
//!
//! ## Quick Start
//!
//! ```rust
//! use chrono::{TimeZone, Utc};
//! use stop_detector::{detect_stops, Fix, StopConfig};
//!
//! let t0 = Utc.with_ymd_and_hms(2017, 6, 8, 12, 0, 0).unwrap();
//!
//! // A bus waiting at a stop for two minutes, one fix every 10 seconds
//! let fixes: Vec<Fix> = (0..13)
//!     .map(|i| Fix::new(t0 + chrono::Duration::seconds(i * 10), -23.5505, -46.6333))
//!     .collect();
//!
//! let config = StopConfig::new(0.5, 60.0);
//! let stops = detect_stops(&fixes, &config).unwrap();
//!
//! assert_eq!(stops.len(), 1);
//! assert_eq!(stops[0].duration_seconds, 120.0);
//! ```
//!
//! ## Input Contract
//!
//! Fixes must belong to a single moving object and be sorted ascending by
//! timestamp. Out-of-order input is not detected; the resulting segments are
//! unspecified.

use chrono::{DateTime, Utc};

pub mod error;
pub use error::{ConfigError, DetectError};

pub mod geo_utils;

pub mod segment;
pub use segment::{Segment, SegmentBuilder};

pub mod detector;
pub use detector::{
    detect_stops, DetectionReport, DetectionStats, Segmenter, StopDetector, StopSegments,
};

pub mod batch;
pub use batch::{detect_stops_batch, TrackStops, VehicleTrack};

#[cfg(feature = "parallel")]
pub use batch::detect_stops_parallel;

// ============================================================================
// Core Types
// ============================================================================

/// A GPS coordinate with latitude and longitude.
///
/// # Example
/// ```
/// use stop_detector::GpsPoint;
/// let point = GpsPoint::new(-23.5505, -46.6333); // São Paulo
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GpsPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GpsPoint {
    /// Position from a latitude and a longitude, both in degrees.
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    /// Whether both coordinates are finite and inside their degree ranges.
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && self.latitude >= -90.0
            && self.latitude <= 90.0
            && self.longitude >= -180.0
            && self.longitude <= 180.0
    }
}

/// Axis-aligned latitude/longitude box around a stop or a track.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Bounds {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lng: f64,
    pub max_lng: f64,
}

impl Bounds {
    /// Smallest box enclosing `points`, `None` when there are none.
    pub fn from_points(points: &[GpsPoint]) -> Option<Self> {
        if points.is_empty() {
            return None;
        }
        let mut min_lat = f64::MAX;
        let mut max_lat = f64::MIN;
        let mut min_lng = f64::MAX;
        let mut max_lng = f64::MIN;

        for p in points {
            min_lat = min_lat.min(p.latitude);
            max_lat = max_lat.max(p.latitude);
            min_lng = min_lng.min(p.longitude);
            max_lng = max_lng.max(p.longitude);
        }

        Some(Self { min_lat, max_lat, min_lng, max_lng })
    }

    /// Midpoint of the box in both axes.
    pub fn center(&self) -> GpsPoint {
        GpsPoint::new(
            (self.min_lat + self.max_lat) / 2.0,
            (self.min_lng + self.max_lng) / 2.0,
        )
    }
}

/// One timestamped position sample of a moving object.
///
/// The `payload` is never inspected by the detector. Use it to carry the
/// identity of the stored record (a database id, a vehicle prefix, ...) through
/// to the detected segments.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Fix<T = ()> {
    pub timestamp: DateTime<Utc>,
    pub position: GpsPoint,
    pub payload: T,
}

impl Fix {
    /// Create a fix without a payload.
    pub fn new(timestamp: DateTime<Utc>, latitude: f64, longitude: f64) -> Self {
        Self::with_payload(timestamp, latitude, longitude, ())
    }
}

impl<T> Fix<T> {
    /// Create a fix carrying an opaque payload.
    pub fn with_payload(timestamp: DateTime<Utc>, latitude: f64, longitude: f64, payload: T) -> Self {
        Self {
            timestamp,
            position: GpsPoint::new(latitude, longitude),
            payload,
        }
    }

    /// Elapsed seconds from `earlier` to this fix.
    ///
    /// Microsecond precision; falls back to milliseconds for spans too large to
    /// count in microseconds.
    pub fn seconds_since<U>(&self, earlier: &Fix<U>) -> f64 {
        let delta = self.timestamp - earlier.timestamp;
        match delta.num_microseconds() {
            Some(us) => us as f64 / 1_000_000.0,
            None => delta.num_milliseconds() as f64 / 1_000.0,
        }
    }
}

/// Configuration for stop detection.
///
/// All three thresholds are passed by name; there is no positional form.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct StopConfig {
    /// Speed (m/s) strictly below which an inter-fix interval counts as stopped.
    /// Default: 3.0
    pub max_average_speed: f64,

    /// A closed segment is kept only if its duration (s) is strictly greater than this.
    /// Default: 60.0
    pub min_time: f64,

    /// Raw gap (s) between consecutive fixes at or above which the interval is
    /// always treated as moving, whatever its speed. Stops GPS dropouts from
    /// being merged into a stop.
    /// Default: 20.0
    pub max_fix_gap: f64,
}

/// Default gap between fixes, in seconds, that always breaks a stop.
pub const DEFAULT_MAX_FIX_GAP: f64 = 20.0;

impl Default for StopConfig {
    fn default() -> Self {
        Self {
            max_average_speed: 3.0,
            min_time: 60.0,
            max_fix_gap: DEFAULT_MAX_FIX_GAP,
        }
    }
}

impl StopConfig {
    /// Create a configuration with the default fix gap.
    pub fn new(max_average_speed: f64, min_time: f64) -> Self {
        Self {
            max_average_speed,
            min_time,
            max_fix_gap: DEFAULT_MAX_FIX_GAP,
        }
    }

    /// Override the maximum gap between fixes.
    pub fn with_max_fix_gap(mut self, max_fix_gap: f64) -> Self {
        self.max_fix_gap = max_fix_gap;
        self
    }

    /// Check that every threshold is finite and in range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.max_average_speed.is_finite() && self.max_average_speed > 0.0) {
            return Err(ConfigError::InvalidMaxAverageSpeed(self.max_average_speed));
        }
        if !(self.min_time.is_finite() && self.min_time >= 0.0) {
            return Err(ConfigError::InvalidMinTime(self.min_time));
        }
        if !(self.max_fix_gap.is_finite() && self.max_fix_gap > 0.0) {
            return Err(ConfigError::InvalidMaxFixGap(self.max_fix_gap));
        }
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
