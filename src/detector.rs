//! # CB-SMoT Stop Detection
//!
//! Splits a time-ordered trajectory into stops using the speed between consecutive fixes.
//!
//! ## Algorithm
//! 1. For each consecutive pair of fixes, compute the elapsed time and haversine distance
//! 2. The interval is "stopped" if the gap is below `max_fix_gap` AND the speed is below
//!    `max_average_speed` (a zero-length interval has infinite speed, so it is moving)
//! 3. The first stopped interval opens a segment seeded with the earlier fix of the pair
//! 4. Every further stopped interval appends its later fix
//! 5. The first moving interval (or the end of the trajectory) closes the segment, which is
//!    kept only if its duration is strictly greater than `min_time`
//!
//! Only one segment is open at a time and closed segments are never revisited, so a
//! trajectory can be processed as a stream: [`StopSegments`] pulls one fix at a time and
//! yields each stop as soon as it closes.
//!
//! ## Surfaces
//! - [`detect_stops`] / [`StopDetector::detect`]: slice in, `Vec` out
//! - [`StopDetector::stream`]: lazy iterator over any fix iterator
//! - [`Segmenter`]: push-based, for fixes arriving one by one (e.g. from a live feed)

use std::iter::FusedIterator;

use log::{debug, warn};

use crate::geo_utils::{average_speed, haversine_distance};
use crate::segment::{Segment, SegmentBuilder};
use crate::{ConfigError, DetectError, Fix, StopConfig};

/// Counts of candidate segments seen during a run.
///
/// Every candidate ends up either emitted or discarded for being too short, except the
/// one still open when a run is aborted by an error.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DetectionStats {
    /// Segments opened
    pub candidates: u32,
    /// Segments closed with a duration above `min_time`
    pub emitted: u32,
    /// Segments closed with a duration at or below `min_time`
    pub discarded: u32,
}

/// Segments of one trajectory along with the run's statistics.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectionReport<T = ()> {
    pub segments: Vec<Segment<T>>,
    pub stats: DetectionStats,
}

// ============================================================================
// State Machine
// ============================================================================

#[derive(Debug, Clone)]
enum State<T> {
    Idle,
    Accumulating(SegmentBuilder<T>),
}

/// Push-based stop segmentation of a single trajectory.
///
/// # Example
/// ```
/// use chrono::{Duration, TimeZone, Utc};
/// use stop_detector::{Fix, Segmenter, StopConfig};
///
/// let t0 = Utc.with_ymd_and_hms(2017, 6, 8, 12, 0, 0).unwrap();
/// let mut segmenter = Segmenter::new(StopConfig::new(0.5, 30.0)).unwrap();
///
/// for i in 0..5 {
///     let fix = Fix::new(t0 + Duration::seconds(i * 10), -23.5505, -46.6333);
///     assert!(segmenter.push(fix).unwrap().is_none());
/// }
///
/// let stop = segmenter.finish().unwrap();
/// assert_eq!(stop.len(), 5);
/// assert_eq!(stop.duration_seconds, 40.0);
/// ```
#[derive(Debug, Clone)]
pub struct Segmenter<T = ()> {
    config: StopConfig,
    previous: Option<Fix<T>>,
    state: State<T>,
    index: usize,
    stats: DetectionStats,
}

impl<T> Segmenter<T> {
    /// Create a segmenter, rejecting out-of-range thresholds.
    pub fn new(config: StopConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::with_validated(config))
    }

    fn with_validated(config: StopConfig) -> Self {
        Self {
            config,
            previous: None,
            state: State::Idle,
            index: 0,
            stats: DetectionStats::default(),
        }
    }

    pub fn config(&self) -> &StopConfig {
        &self.config
    }

    /// Statistics accumulated since the segmenter was created.
    pub fn stats(&self) -> DetectionStats {
        self.stats
    }

    /// True while a segment is open.
    pub fn is_accumulating(&self) -> bool {
        matches!(self.state, State::Accumulating(_))
    }

    /// End the current trajectory, returning the open segment if it is long enough.
    ///
    /// The segmenter is reset and can be fed the next trajectory; statistics keep counting.
    pub fn finish(&mut self) -> Option<Segment<T>> {
        self.previous = None;
        self.index = 0;
        self.close()
    }

    /// Close the open segment, if any, applying the `min_time` filter.
    fn close(&mut self) -> Option<Segment<T>> {
        let builder = match std::mem::replace(&mut self.state, State::Idle) {
            State::Idle => return None,
            State::Accumulating(builder) => builder,
        };

        let segment = builder.finalize();
        if segment.duration_seconds > self.config.min_time {
            self.stats.emitted += 1;
            debug!(
                "Stop emitted: {} fixes, {:.0}s, {:.1}m ({} -> {})",
                segment.len(),
                segment.duration_seconds,
                segment.total_distance,
                segment.start_time,
                segment.end_time
            );
            Some(segment)
        } else {
            self.stats.discarded += 1;
            debug!(
                "Stop discarded: {:.0}s is not above min_time {:.0}s ({} fixes)",
                segment.duration_seconds,
                self.config.min_time,
                segment.len()
            );
            None
        }
    }
}

impl<T: Clone> Segmenter<T> {
    /// Feed the next fix of the trajectory.
    ///
    /// Returns the segment closed by this fix, if any. Fixes must arrive in non-decreasing
    /// timestamp order; out-of-order fixes give unspecified segments.
    ///
    /// A non-finite distance (malformed coordinates) returns an error and drops the open
    /// segment. The malformed fix is skipped: the next fix is measured against the last
    /// well-formed one, so one bad fix costs exactly one error.
    pub fn push(&mut self, fix: Fix<T>) -> Result<Option<Segment<T>>, DetectError> {
        let index = self.index;
        self.index += 1;

        let previous = match self.previous.take() {
            Some(previous) => previous,
            None => {
                self.previous = Some(fix);
                return Ok(None);
            }
        };

        let elapsed = fix.seconds_since(&previous);
        let distance = haversine_distance(&previous.position, &fix.position);

        if !distance.is_finite() {
            warn!("Non-finite distance at fix {}, abandoning open segment", index);
            self.state = State::Idle;
            // Re-anchor on whichever side of the pair is well-formed
            let finite = |f: &Fix<T>| f.position.latitude.is_finite() && f.position.longitude.is_finite();
            self.previous = if finite(&fix) {
                Some(fix)
            } else if finite(&previous) {
                Some(previous)
            } else {
                None
            };
            return Err(DetectError::NonFiniteDistance { index });
        }

        let speed = average_speed(distance, elapsed);
        let stopped = elapsed < self.config.max_fix_gap && speed < self.config.max_average_speed;

        let closed = if stopped {
            self.state = match std::mem::replace(&mut self.state, State::Idle) {
                State::Idle => {
                    self.stats.candidates += 1;
                    debug!("Stop opened at {} (fix {})", previous.timestamp, index - 1);
                    let mut builder = SegmentBuilder::open(previous);
                    builder.append(fix.clone(), distance);
                    State::Accumulating(builder)
                }
                State::Accumulating(mut builder) => {
                    builder.append(fix.clone(), distance);
                    State::Accumulating(builder)
                }
            };
            None
        } else {
            self.close()
        };

        self.previous = Some(fix);
        Ok(closed)
    }
}

// ============================================================================
// Lazy Iterator
// ============================================================================

/// Lazy stop detection over an iterator of fixes.
///
/// Holds only the previous fix and the open segment. Each stop is yielded as soon as the
/// fix that closes it is pulled, so unbounded feeds work; stop pulling to cancel.
/// After an error or the end of the input the iterator yields `None`.
#[derive(Debug, Clone)]
pub struct StopSegments<I, T = ()> {
    fixes: I,
    segmenter: Segmenter<T>,
    done: bool,
}

impl<I, T> StopSegments<I, T> {
    /// Statistics so far.
    pub fn stats(&self) -> DetectionStats {
        self.segmenter.stats()
    }
}

impl<I, T> Iterator for StopSegments<I, T>
where
    I: Iterator<Item = Fix<T>>,
    T: Clone,
{
    type Item = Result<Segment<T>, DetectError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        for fix in self.fixes.by_ref() {
            match self.segmenter.push(fix) {
                Ok(Some(segment)) => return Some(Ok(segment)),
                Ok(None) => {}
                Err(e) => {
                    self.done = true;
                    return Some(Err(e));
                }
            }
        }

        self.done = true;
        self.segmenter.finish().map(Ok)
    }
}

impl<I, T> FusedIterator for StopSegments<I, T>
where
    I: Iterator<Item = Fix<T>>,
    T: Clone,
{
}

// ============================================================================
// Detector
// ============================================================================

/// Stop detector with a validated configuration.
///
/// # Example
/// ```
/// use stop_detector::{StopConfig, StopDetector};
///
/// let detector = StopDetector::new(StopConfig::new(0.5, 60.0)).unwrap();
/// assert!(StopDetector::new(StopConfig::new(-1.0, 60.0)).is_err());
///
/// let stops = detector.detect::<()>(&[]).unwrap();
/// assert!(stops.is_empty());
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StopDetector {
    config: StopConfig,
}

impl StopDetector {
    pub fn new(config: StopConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &StopConfig {
        &self.config
    }

    /// A fresh push-based segmenter using this configuration.
    pub fn segmenter<T>(&self) -> Segmenter<T> {
        Segmenter::with_validated(self.config)
    }

    /// Detect stops lazily over any sequence of fixes of one object.
    pub fn stream<I, T>(&self, fixes: I) -> StopSegments<I::IntoIter, T>
    where
        I: IntoIterator<Item = Fix<T>>,
    {
        StopSegments {
            fixes: fixes.into_iter(),
            segmenter: self.segmenter(),
            done: false,
        }
    }

    /// Detect all stops of one trajectory.
    pub fn detect<T: Clone>(&self, fixes: &[Fix<T>]) -> Result<Vec<Segment<T>>, DetectError> {
        Ok(self.detect_with_stats(fixes)?.segments)
    }

    /// Detect all stops of one trajectory, also reporting how many candidates were
    /// discarded for being too short.
    pub fn detect_with_stats<T: Clone>(&self, fixes: &[Fix<T>]) -> Result<DetectionReport<T>, DetectError> {
        let mut stream = self.stream(fixes.iter().cloned());
        let segments = stream.by_ref().collect::<Result<Vec<_>, _>>()?;

        Ok(DetectionReport {
            segments,
            stats: stream.stats(),
        })
    }
}

/// Detect the stops of one trajectory.
///
/// Empty and single-fix trajectories yield no stops. Every returned segment has a
/// duration strictly greater than `config.min_time`, in the order the segments closed.
///
/// # Example
/// ```
/// use chrono::{Duration, TimeZone, Utc};
/// use stop_detector::{detect_stops, Fix, StopConfig};
///
/// let t0 = Utc.with_ymd_and_hms(2017, 6, 8, 12, 0, 0).unwrap();
///
/// // Moving north at ~11 m/s the whole time
/// let fixes: Vec<Fix> = (0..10)
///     .map(|i| Fix::new(t0 + Duration::seconds(i * 10), -23.55 + i as f64 * 0.001, -46.63))
///     .collect();
///
/// assert!(detect_stops(&fixes, &StopConfig::default()).unwrap().is_empty());
/// ```
pub fn detect_stops<T: Clone>(fixes: &[Fix<T>], config: &StopConfig) -> Result<Vec<Segment<T>>, DetectError> {
    StopDetector::new(*config)?.detect(fixes)
}

// ============================================================================
// Tests
// ============================================================================
