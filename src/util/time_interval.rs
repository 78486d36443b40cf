use chrono::{DateTime, TimeDelta, Utc};
use serde::Serialize;
use std::fmt::{Display, Formatter};

/// A half-open time interval `[start, end)` with `end > start`.
///
/// The ordering invariant is established in [`TimeInterval::new`], so every value of this type
/// has a strictly positive duration. Durations are always derived from the bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct TimeInterval {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl TimeInterval {
    /// Creates a new interval.
    ///
    /// # Arguments
    /// - `start`: The inclusive start of the interval.
    /// - `end`: The exclusive end of the interval.
    ///
    /// # Returns
    /// `Some(TimeInterval)` if `end > start`, `None` otherwise.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Option<Self> {
        if end > start { Some(Self { start, end }) } else { None }
    }

    /// Creates an interval starting at `start` with the given length.
    ///
    /// # Returns
    /// `None` if `duration` is not positive or the end is not representable.
    pub fn with_duration(start: DateTime<Utc>, duration: TimeDelta) -> Option<Self> {
        Self::new(start, start.checked_add_signed(duration)?)
    }

    pub fn start(&self) -> DateTime<Utc> { self.start }

    pub fn end(&self) -> DateTime<Utc> { self.end }

    pub fn duration(&self) -> TimeDelta { self.end - self.start }

    pub fn duration_secs(&self) -> f64 { delta_secs(self.duration()) }

    pub fn center(&self) -> DateTime<Utc> { self.start + self.duration() / 2 }

    /// Checks whether `t` lies in `[start, end)`.
    pub fn contains(&self, t: DateTime<Utc>) -> bool { self.start <= t && t < self.end }

    /// Checks whether `other` lies completely inside `self`.
    pub fn contains_interval(&self, other: &TimeInterval) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    /// Checks whether the two intervals share a non-empty stretch of time.
    pub fn overlaps(&self, other: &TimeInterval) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// Checks whether the two intervals overlap or touch each other end to start.
    pub fn touches(&self, other: &TimeInterval) -> bool {
        self.start <= other.end && other.start <= self.end
    }

    /// Returns the common part of both intervals, if any.
    pub fn intersection(&self, other: &TimeInterval) -> Option<TimeInterval> {
        Self::new(self.start.max(other.start), self.end.min(other.end))
    }

    /// Length of the common part of both intervals, zero if they are disjoint.
    pub fn overlap(&self, other: &TimeInterval) -> TimeDelta {
        self.intersection(other).map_or(TimeDelta::zero(), |i| i.duration())
    }

    /// The smallest interval containing both `self` and `other`.
    pub fn hull(&self, other: &TimeInterval) -> TimeInterval {
        Self { start: self.start.min(other.start), end: self.end.max(other.end) }
    }

    /// Splits the interval at the given fraction points, e.g. `(0.1, 0.9)`.
    ///
    /// # Returns
    /// The three consecutive sub-intervals, each `None` when it would be empty.
    #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
    pub fn split_ratio(
        &self,
        head: f64,
        tail: f64,
    ) -> (Option<TimeInterval>, Option<TimeInterval>, Option<TimeInterval>) {
        let total_ns = self.duration().num_nanoseconds().unwrap_or(i64::MAX) as f64;
        let head_cut = self.start + TimeDelta::nanoseconds((total_ns * head).round() as i64);
        let tail_cut = self.end - TimeDelta::nanoseconds((total_ns * tail).round() as i64);
        (
            Self::new(self.start, head_cut),
            Self::new(head_cut, tail_cut),
            Self::new(tail_cut, self.end),
        )
    }
}

impl Display for TimeInterval {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[{} - {})",
            self.start.format("%Y-%m-%d %H:%M:%S%.3f"),
            self.end.format("%Y-%m-%d %H:%M:%S%.3f")
        )
    }
}

/// Converts a [`TimeDelta`] into fractional seconds.
#[allow(clippy::cast_precision_loss)]
pub fn delta_secs(dt: TimeDelta) -> f64 {
    dt.num_nanoseconds()
        .map_or(dt.num_milliseconds() as f64 / 1000.0, |ns| ns as f64 / 1e9)
}

/// Converts fractional seconds into a [`TimeDelta`] with microsecond resolution.
#[allow(clippy::cast_possible_truncation)]
pub fn secs_delta(secs: f64) -> TimeDelta { TimeDelta::microseconds((secs * 1e6).round() as i64) }
