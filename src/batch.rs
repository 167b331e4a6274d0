//! Stop detection over many vehicles.
//!
//! Each vehicle's trajectory is an independent sequential pass with no shared state, so
//! batches fan out trivially. [`detect_stops_parallel`] (feature `parallel`) spreads the
//! vehicles over rayon's thread pool; results come back in input order either way.

use std::time::Instant;

use log::{info, warn};

use crate::detector::{DetectionReport, DetectionStats, StopDetector};
use crate::{ConfigError, DetectError, Fix, StopConfig};

/// All fixes of one vehicle, sorted by timestamp.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VehicleTrack<T = ()> {
    pub vehicle_id: String,
    pub fixes: Vec<Fix<T>>,
}

impl<T> VehicleTrack<T> {
    pub fn new(vehicle_id: impl Into<String>, fixes: Vec<Fix<T>>) -> Self {
        Self {
            vehicle_id: vehicle_id.into(),
            fixes,
        }
    }
}

/// Detection outcome for one vehicle.
///
/// A malformed trajectory fails on its own; the rest of the batch is unaffected.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackStops<T = ()> {
    pub vehicle_id: String,
    pub result: Result<DetectionReport<T>, DetectError>,
}

impl<T> TrackStops<T> {
    /// Number of stops found, 0 for a failed trajectory.
    pub fn stop_count(&self) -> usize {
        self.result.as_ref().map_or(0, |r| r.segments.len())
    }
}

fn detect_track<T: Clone>(detector: &StopDetector, track: &VehicleTrack<T>) -> TrackStops<T> {
    let result = detector.detect_with_stats(&track.fixes);
    if let Err(ref e) = result {
        warn!("Vehicle {}: {}", track.vehicle_id, e);
    }
    TrackStops {
        vehicle_id: track.vehicle_id.clone(),
        result,
    }
}

fn log_summary<T>(results: &[TrackStops<T>], elapsed: std::time::Duration) {
    let mut totals = DetectionStats::default();
    let mut failed = 0;
    for r in results {
        match &r.result {
            Ok(report) => {
                totals.candidates += report.stats.candidates;
                totals.emitted += report.stats.emitted;
                totals.discarded += report.stats.discarded;
            }
            Err(_) => failed += 1,
        }
    }
    info!(
        "Detected {} stops ({} short candidates discarded) across {} vehicles ({} failed) in {:?}",
        totals.emitted,
        totals.discarded,
        results.len(),
        failed,
        elapsed
    );
}

/// Detect stops for every vehicle, one after another.
///
/// # Example
/// ```
/// use chrono::{Duration, TimeZone, Utc};
/// use stop_detector::{detect_stops_batch, Fix, StopConfig, VehicleTrack};
///
/// let t0 = Utc.with_ymd_and_hms(2017, 6, 8, 12, 0, 0).unwrap();
/// let parked: Vec<Fix> = (0..10)
///     .map(|i| Fix::new(t0 + Duration::seconds(i * 10), -23.5505, -46.6333))
///     .collect();
///
/// let tracks = vec![
///     VehicleTrack::new("bus-3345", parked),
///     VehicleTrack::new("bus-1021", vec![]),
/// ];
///
/// let results = detect_stops_batch(&tracks, &StopConfig::new(0.5, 60.0)).unwrap();
/// assert_eq!(results[0].stop_count(), 1);
/// assert_eq!(results[1].stop_count(), 0);
/// ```
pub fn detect_stops_batch<T: Clone>(
    tracks: &[VehicleTrack<T>],
    config: &StopConfig,
) -> Result<Vec<TrackStops<T>>, ConfigError> {
    let detector = StopDetector::new(*config)?;
    let start = Instant::now();

    let results: Vec<TrackStops<T>> = tracks
        .iter()
        .map(|track| detect_track(&detector, track))
        .collect();

    log_summary(&results, start.elapsed());
    Ok(results)
}

/// Detect stops for every vehicle using parallel processing.
///
/// Same as [`detect_stops_batch`] but each vehicle runs on rayon's thread pool.
/// Recommended for large fleets.
#[cfg(feature = "parallel")]
pub fn detect_stops_parallel<T: Clone + Send + Sync>(
    tracks: &[VehicleTrack<T>],
    config: &StopConfig,
) -> Result<Vec<TrackStops<T>>, ConfigError> {
    use rayon::prelude::*;

    let detector = StopDetector::new(*config)?;
    let start = Instant::now();

    let results: Vec<TrackStops<T>> = tracks
        .par_iter()
        .map(|track| detect_track(&detector, track))
        .collect();

    log_summary(&results, start.elapsed());
    Ok(results)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn track(vehicle_id: &str, lat: f64, parked_from: i64, parked_to: i64) -> VehicleTrack {
        let t0 = Utc.with_ymd_and_hms(2017, 6, 8, 12, 0, 0).unwrap();
        let fixes = (0..30)
            .map(|i| {
                // ~111m per step while moving, stationary inside the parked window
                let step = i.min(parked_from) + (i - parked_to).max(0);
                Fix::new(t0 + Duration::seconds(i * 10), lat + step as f64 * 0.001, -46.6333)
            })
            .collect();
        VehicleTrack::new(vehicle_id, fixes)
    }

    fn fleet() -> Vec<VehicleTrack> {
        vec![
            track("bus-1", -23.55, 5, 15),
            track("bus-2", -23.60, 0, 29),
            track("bus-3", -23.65, 10, 12),
            VehicleTrack::new("bus-4", vec![]),
        ]
    }

    #[test]
    fn test_batch_results_in_input_order() {
        let config = StopConfig::new(0.5, 60.0);
        let results = detect_stops_batch(&fleet(), &config).unwrap();

        let ids: Vec<&str> = results.iter().map(|r| r.vehicle_id.as_str()).collect();
        assert_eq!(ids, vec!["bus-1", "bus-2", "bus-3", "bus-4"]);

        let counts: Vec<usize> = results.iter().map(|r| r.stop_count()).collect();
        assert_eq!(counts, vec![1, 1, 0, 0]);

        let bus3 = results[2].result.as_ref().unwrap();
        assert_eq!(bus3.stats, DetectionStats { candidates: 1, emitted: 0, discarded: 1 });
    }

    #[test]
    fn test_batch_matches_single_runs() {
        let config = StopConfig::new(0.5, 60.0);
        let tracks = fleet();
        let results = detect_stops_batch(&tracks, &config).unwrap();

        for (track, result) in tracks.iter().zip(&results) {
            let single = crate::detect_stops(&track.fixes, &config).unwrap();
            assert_eq!(result.result.as_ref().unwrap().segments, single);
        }
    }

    #[test]
    fn test_batch_isolates_bad_track() {
        let config = StopConfig::new(0.5, 60.0);
        let mut tracks = fleet();
        tracks[0].fixes[3].position.latitude = f64::NAN;

        let results = detect_stops_batch(&tracks, &config).unwrap();
        assert_eq!(results[0].result, Err(DetectError::NonFiniteDistance { index: 3 }));
        assert_eq!(results[0].stop_count(), 0);
        assert_eq!(results[1].stop_count(), 1);
    }

    #[test]
    fn test_batch_rejects_bad_config() {
        let err = detect_stops_batch(&fleet(), &StopConfig::new(1.0, 60.0).with_max_fix_gap(-5.0));
        assert_eq!(err, Err(ConfigError::InvalidMaxFixGap(-5.0)));
    }

    #[cfg(feature = "parallel")]
    #[test]
    fn test_parallel_matches_sequential() {
        let config = StopConfig::new(0.5, 60.0);
        let mut tracks = fleet();
        for i in 0..20 {
            tracks.push(track(&format!("bus-x{}", i), -23.0 - i as f64 * 0.1, i % 7, 20));
        }

        let sequential = detect_stops_batch(&tracks, &config).unwrap();
        let parallel = detect_stops_parallel(&tracks, &config).unwrap();
        assert_eq!(sequential, parallel);
    }
}
