use crate::util::TimeInterval;
use chrono::{DateTime, TimeDelta, Utc};

/// Chooses the instants at which positions are sampled inside `interval`.
///
/// Short intervals (at most two steps long) are sampled at their bounds only. Longer ones are
/// stepped from the start with the end always included. If this exceeds `max_samples`, every
/// `ceil(n / max_samples)`-th instant is kept and the last kept one is replaced by the end.
///
/// # Returns
/// Strictly ascending instants, starting with `interval.start()` and ending with `interval.end()`.
pub fn sample_times(interval: TimeInterval, step: TimeDelta, max_samples: usize) -> Vec<DateTime<Utc>> {
    let (start, end) = (interval.start(), interval.end());
    let mut times = if step <= TimeDelta::zero() || interval.duration() <= step * 2 {
        vec![start, end]
    } else {
        let mut stepped = Vec::new();
        let mut cursor = start;
        while cursor < end {
            stepped.push(cursor);
            cursor += step;
        }
        stepped.push(end);
        stepped
    };

    if max_samples >= 2 && times.len() > max_samples {
        let stride = times.len().div_ceil(max_samples);
        let mut picked = times.iter().copied().step_by(stride).collect::<Vec<_>>();
        // the replaced index is the largest picked one, so the order is kept
        if let Some(tail) = picked.last_mut() {
            *tail = end;
        }
        times = picked;
    }
    times.dedup();
    times
}
