//! Stop segments and the accumulator that builds them.
//!
//! A [`SegmentBuilder`] owns the segment that is currently open. The state machine in
//! [`crate::detector`] opens it with the fix preceding the first slow interval, appends
//! every fix that keeps the object slow, and finalizes it into an immutable [`Segment`]
//! when the object starts moving again or the trajectory ends.

use chrono::{DateTime, Utc};
use geo::{Coord, LineString};

use crate::{Bounds, Fix, GpsPoint};

/// A detected stop: a contiguous run of fixes during which the object stayed slow.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Segment<T = ()> {
    /// Member fixes in trajectory order
    pub fixes: Vec<Fix<T>>,
    /// Timestamp of the first member
    pub start_time: DateTime<Utc>,
    /// Timestamp of the last member
    pub end_time: DateTime<Utc>,
    /// Sum of the time deltas between consecutive members, in seconds
    pub duration_seconds: f64,
    /// Sum of the distances between consecutive members, in meters
    pub total_distance: f64,
}

impl<T> Segment<T> {
    /// Number of member fixes.
    pub fn len(&self) -> usize {
        self.fixes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fixes.is_empty()
    }

    /// Average speed over the whole stop in m/s, 0 for a zero-length stop.
    pub fn average_speed(&self) -> f64 {
        if self.duration_seconds > 0.0 {
            self.total_distance / self.duration_seconds
        } else {
            0.0
        }
    }

    /// Positions of the member fixes.
    pub fn points(&self) -> Vec<GpsPoint> {
        self.fixes.iter().map(|f| f.position).collect()
    }

    /// Line geometry through the valid member positions (x = longitude, y = latitude).
    ///
    /// Returns `None` if fewer than 2 valid points remain, since a line needs two.
    pub fn to_line_string(&self) -> Option<LineString<f64>> {
        let coords: Vec<Coord> = self
            .fixes
            .iter()
            .map(|f| f.position)
            .filter(|p| p.is_valid())
            .map(|p| Coord { x: p.longitude, y: p.latitude })
            .collect();

        if coords.len() < 2 {
            return None;
        }

        Some(LineString::new(coords))
    }

    /// Bounding box of the member positions.
    pub fn bounds(&self) -> Option<Bounds> {
        Bounds::from_points(&self.points())
    }

    /// Center of the bounding box, a cheap stand-in for "where the object stopped".
    pub fn center(&self) -> Option<GpsPoint> {
        self.bounds().map(|b| b.center())
    }
}

/// Incremental builder for the single open segment.
#[derive(Debug, Clone)]
pub struct SegmentBuilder<T> {
    fixes: Vec<Fix<T>>,
    total_distance: f64,
    duration_seconds: f64,
}

impl<T> SegmentBuilder<T> {
    /// Open a segment at `seed`, the position where the object started to stop.
    ///
    /// The seed contributes no distance and no duration.
    pub fn open(seed: Fix<T>) -> Self {
        Self {
            fixes: vec![seed],
            total_distance: 0.0,
            duration_seconds: 0.0,
        }
    }

    /// Append the next fix, `distance` meters from the last member.
    pub fn append(&mut self, fix: Fix<T>, distance: f64) {
        // `open` always seeds one member
        if let Some(last) = self.fixes.last() {
            self.duration_seconds += fix.seconds_since(last);
        }
        self.total_distance += distance;
        self.fixes.push(fix);
    }

    /// Number of members so far, never less than the seed.
    pub fn fix_count(&self) -> usize {
        self.fixes.len()
    }

    /// Accumulated duration so far, in seconds.
    pub fn duration_seconds(&self) -> f64 {
        self.duration_seconds
    }

    /// Accumulated distance so far, in meters.
    pub fn total_distance(&self) -> f64 {
        self.total_distance
    }

    /// Close the segment.
    pub fn finalize(self) -> Segment<T> {
        let start_time = self.fixes[0].timestamp;
        let end_time = self.fixes[self.fixes.len() - 1].timestamp;

        Segment {
            fixes: self.fixes,
            start_time,
            end_time,
            duration_seconds: self.duration_seconds,
            total_distance: self.total_distance,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
