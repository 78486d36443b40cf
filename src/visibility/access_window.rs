use crate::providers::RawAccessWindow;
use crate::util::{TimeInterval, parse_text};
use crate::warn;
use itertools::Itertools;
use serde::Serialize;

/// A period during which an observer can see a target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct AccessWindow {
    interval: TimeInterval,
}

/// Result of parsing the raw windows of one observer/target pair.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedWindows {
    pub windows: Vec<AccessWindow>,
    pub skipped: usize,
}

impl AccessWindow {
    pub fn new(interval: TimeInterval) -> Self { Self { interval } }

    pub fn interval(&self) -> TimeInterval { self.interval }

    /// Parses the textual windows reported by the engine, skipping and counting malformed or
    /// empty ones. The result is sorted by start time.
    pub fn parse_all(raw: &[RawAccessWindow]) -> ParsedWindows {
        let mut skipped = 0;
        let windows = raw
            .iter()
            .filter_map(|w| {
                let parsed = parse_text(&w.start)
                    .and_then(|start| parse_text(&w.end).map(|end| TimeInterval::new(start, end)));
                match parsed {
                    Ok(Some(interval)) => Some(Self::new(interval)),
                    Ok(None) => {
                        warn!("Dropping empty access window {} - {}", w.start, w.end);
                        skipped += 1;
                        None
                    }
                    Err(e) => {
                        warn!("Dropping unparseable access window: {e:?}");
                        skipped += 1;
                        None
                    }
                }
            })
            .sorted()
            .collect();
        ParsedWindows { windows, skipped }
    }

    /// Merges overlapping or touching windows into single windows.
    pub fn merge_touching(windows: &[AccessWindow]) -> Vec<AccessWindow> {
        windows
            .iter()
            .sorted()
            .copied()
            .coalesce(|a, b| {
                if a.interval.touches(&b.interval) {
                    Ok(Self::new(a.interval.hull(&b.interval)))
                } else {
                    Err((a, b))
                }
            })
            .collect()
    }
}
