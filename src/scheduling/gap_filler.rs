use crate::util::TimeInterval;
use itertools::Itertools;
use serde::Serialize;
use strum_macros::Display;

#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum SegmentOrigin {
    Real,
    Virtual,
}

/// A segment of a [`Timeline`]. Real segments carry a payload, virtual ones never do.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimelineSegment<P> {
    interval: TimeInterval,
    origin: SegmentOrigin,
    #[serde(skip_serializing_if = "Option::is_none")]
    payload: Option<P>,
}

impl<P> TimelineSegment<P> {
    fn real(interval: TimeInterval, payload: P) -> Self {
        Self { interval, origin: SegmentOrigin::Real, payload: Some(payload) }
    }

    fn filler(interval: TimeInterval) -> Self { Self { interval, origin: SegmentOrigin::Virtual, payload: None } }

    pub fn interval(&self) -> TimeInterval { self.interval }

    pub fn origin(&self) -> SegmentOrigin { self.origin }

    pub fn payload(&self) -> Option<&P> { self.payload.as_ref() }

    pub fn is_real(&self) -> bool { self.origin == SegmentOrigin::Real }
}

/// An ordered, gap free and non-overlapping cover of `window`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Timeline<P> {
    window: TimeInterval,
    segments: Vec<TimelineSegment<P>>,
}

#[derive(Debug, Display, Clone, PartialEq, Eq)]
pub enum TimelineError {
    /// A real segment reaches outside the timeline window.
    SegmentOutsideWindow(TimeInterval),
    /// Two real segments share time.
    OverlappingSegments(TimeInterval, TimeInterval),
}

impl std::error::Error for TimelineError {}

impl<P> Timeline<P> {
    /// Builds the timeline for `window` from the given real segments, inserting virtual filler
    /// segments for every uncovered stretch.
    ///
    /// # Arguments
    /// - `window`: The interval the timeline has to cover.
    /// - `real`: Real segments with their payloads, in any order.
    ///
    /// # Returns
    /// The timeline, or a [`TimelineError`] if a segment leaves the window or two segments overlap.
    pub fn fill_gaps(
        window: TimeInterval,
        real: impl IntoIterator<Item = (TimeInterval, P)>,
    ) -> Result<Self, TimelineError> {
        let real = real.into_iter().sorted_by_key(|(interval, _)| *interval).collect::<Vec<_>>();
        if let Some((outside, _)) = real.iter().find(|(i, _)| !window.contains_interval(i)) {
            return Err(TimelineError::SegmentOutsideWindow(*outside));
        }
        if let Some(((a, _), (b, _))) = real.iter().tuple_windows().find(|((a, _), (b, _))| a.overlaps(b)) {
            return Err(TimelineError::OverlappingSegments(*a, *b));
        }

        let mut segments = Vec::with_capacity(real.len() * 2 + 1);
        let mut cursor = window.start();
        for (interval, payload) in real {
            if let Some(gap) = TimeInterval::new(cursor, interval.start()) {
                segments.push(TimelineSegment::filler(gap));
            }
            cursor = interval.end();
            segments.push(TimelineSegment::real(interval, payload));
        }
        if let Some(gap) = TimeInterval::new(cursor, window.end()) {
            segments.push(TimelineSegment::filler(gap));
        }

        let timeline = Self { window, segments };
        debug_assert!(timeline.is_contiguous());
        Ok(timeline)
    }

    pub fn window(&self) -> TimeInterval { self.window }

    pub fn segments(&self) -> &[TimelineSegment<P>] { &self.segments }

    pub fn real_count(&self) -> usize { self.segments.iter().filter(|s| s.is_real()).count() }

    pub fn virtual_count(&self) -> usize { self.segments.len() - self.real_count() }

    /// Payloads of all real segments in timeline order.
    pub fn real_payloads(&self) -> impl Iterator<Item = &P> { self.segments.iter().filter_map(|s| s.payload.as_ref()) }

    /// Mutable payloads of all real segments in timeline order.
    pub fn real_payloads_mut(&mut self) -> impl Iterator<Item = &mut P> {
        self.segments.iter_mut().filter_map(|s| s.payload.as_mut())
    }

    /// Checks that the segments cover the window exactly, in order and without overlap.
    pub fn is_contiguous(&self) -> bool {
        let (Some(first), Some(last)) = (self.segments.first(), self.segments.last()) else {
            return false;
        };
        first.interval.start() == self.window.start()
            && last.interval.end() == self.window.end()
            && self.segments.iter().tuple_windows().all(|(a, b)| a.interval.end() == b.interval.start())
    }
}
