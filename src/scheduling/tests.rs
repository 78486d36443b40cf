use super::{
    AtomicTask, MetaTaskEntry, PhaseResolver, PhaseSource, PlanningCycle, ResolvedTrajectory,
    SegmentOrigin, TaskGrid, TaskKind, Timeline, TimelineError,
};
use crate::providers::{TargetTrajectory, TrajectorySample};
use crate::util::{PhaseConfig, RawTimestamp, StandardizationConfig, TargetPositionConfig, TimeInterval};
use crate::{info, log};
use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use itertools::Itertools;
use rand::Rng;

fn t0() -> DateTime<Utc> { Utc.with_ymd_and_hms(2025, 7, 23, 4, 0, 0).unwrap() }

fn secs(s: i64) -> TimeDelta { TimeDelta::seconds(s) }

fn iv(start: i64, end: i64) -> TimeInterval { TimeInterval::new(t0() + secs(start), t0() + secs(end)).unwrap() }

fn sample(time: RawTimestamp, altitude_km: f64) -> TrajectorySample {
    TrajectorySample { time, altitude_km, latitude: 10.0, longitude: 20.0 }
}

/// Symmetric arc peaking at `peak_km`, one sample every `step` seconds, relative to launch.
fn arc_trajectory(id: &str, duration: i64, step: i64, peak_km: f64) -> TargetTrajectory {
    #[allow(clippy::cast_precision_loss)]
    let samples = (0..=duration / step)
        .map(|i| {
            let t = (i * step) as f64;
            let alt = peak_km * (std::f64::consts::PI * t / duration as f64).sin();
            sample(RawTimestamp::Seconds(t), alt.max(0.0))
        })
        .collect();
    TargetTrajectory {
        target_id: id.to_string(),
        launch_time: Some(RawTimestamp::Text("2025-07-23T04:00:00Z".to_string())),
        samples,
    }
}

#[test]
fn test_grid_contiguity_random_windows() {
    info!("Running Task Grid Contiguity Test");
    let mut rng = rand::rng();
    for _ in 0..200 {
        let len = rng.random_range(1..20_000);
        let width = rng.random_range(1..1_000);
        let window = iv(0, len);
        let grid = TaskGrid::generate(window, secs(width), usize::MAX).unwrap();
        let slots = grid.slots();
        assert_eq!(slots.first().unwrap().start(), window.start());
        assert_eq!(slots.last().unwrap().end(), window.end());
        assert!(slots.iter().tuple_windows().all(|(a, b)| a.end() == b.start()));
        let (last, full) = slots.split_last().unwrap();
        assert!(full.iter().all(|s| s.duration() == secs(width)));
        assert!(last.duration() <= secs(width));
        assert!(!grid.truncated());
    }
}

#[test]
fn test_grid_clips_last_slot_and_formats_ids() {
    let grid = TaskGrid::generate(iv(0, 1000), secs(300), 1000).unwrap();
    assert_eq!(grid.len(), 4);
    assert_eq!(grid.slots()[3], iv(900, 1000));
    let tasks = grid.tasks_for("missile_01", &iv(350, 650));
    let ids = tasks.iter().map(AtomicTask::id).collect::<Vec<_>>();
    assert_eq!(ids, ["atomic_task_001", "atomic_task_002", "atomic_task_003", "atomic_task_004"]);
    assert_eq!(tasks[0].sequence_index(), 1);
    let kinds = tasks.iter().map(AtomicTask::kind).collect::<Vec<_>>();
    assert_eq!(kinds, [TaskKind::Virtual, TaskKind::Real, TaskKind::Real, TaskKind::Virtual]);
    assert!(tasks.iter().all(|t| t.owner_target_id() == "missile_01"));
}

#[test]
fn test_grid_phase_touching_slot_is_virtual() {
    let grid = TaskGrid::generate(iv(0, 900), secs(300), 10).unwrap();
    let tasks = grid.tasks_for("m", &iv(300, 600));
    let kinds = tasks.iter().map(AtomicTask::kind).collect::<Vec<_>>();
    assert_eq!(kinds, [TaskKind::Virtual, TaskKind::Real, TaskKind::Virtual]);
}

#[test]
fn test_grid_cap_truncates() {
    let grid = TaskGrid::generate(iv(0, 3000), secs(300), 4).unwrap();
    assert_eq!(grid.len(), 4);
    assert!(grid.truncated());
    assert_eq!(grid.slots().last().unwrap().end(), t0() + secs(1200));
    assert!(TaskGrid::generate(iv(0, 3000), TimeDelta::zero(), 4).is_none());
}

#[test]
fn test_grid_wider_than_time_range_is_one_slot() {
    let grid = TaskGrid::generate(iv(0, 3000), secs(10_000_000_000_000), 1000).unwrap();
    assert_eq!(grid.slots(), [iv(0, 3000)]);
    assert!(!grid.truncated());
}

#[test]
fn test_resolver_altitude_analysis() {
    let raw = arc_trajectory("missile_01", 1800, 60, 400.0);
    let trajectory = ResolvedTrajectory::from_raw(&raw);
    assert_eq!(trajectory.skipped_samples(), 0);
    let phases = PhaseResolver::new(PhaseConfig::default()).resolve(&trajectory).unwrap();
    log!("Resolved phases: {phases:?}");
    assert_eq!(phases.source, PhaseSource::AltitudeAnalysis);
    // 400 * sin(pi * t / 1800) >= 100 first holds for the sample at 180s, last at 1620s
    assert_eq!(phases.critical, iv(180, 1620));
    assert_eq!(phases.boost, Some(iv(0, 180)));
    assert_eq!(phases.terminal, Some(iv(1620, 1800)));
}

#[test]
fn test_resolver_skips_malformed_samples() {
    let mut raw = arc_trajectory("missile_01", 1800, 60, 400.0);
    raw.samples.push(sample(RawTimestamp::Text("not a time".to_string()), 150.0));
    raw.samples.push(sample(RawTimestamp::Seconds(f64::INFINITY), 150.0));
    raw.samples.push(sample(RawTimestamp::Seconds(900.0), f64::NAN));
    let trajectory = ResolvedTrajectory::from_raw(&raw);
    assert_eq!(trajectory.skipped_samples(), 3);
    let phases = PhaseResolver::new(PhaseConfig::default()).resolve(&trajectory).unwrap();
    assert_eq!(phases.critical, iv(180, 1620));
}

#[test]
fn test_out_of_range_offset_is_skipped_alone() {
    let mut raw = arc_trajectory("missile_01", 1800, 60, 400.0);
    raw.samples.truncate(1);
    raw.samples.push(sample(RawTimestamp::Seconds(1e13), 150.0));
    raw.samples.push(sample(RawTimestamp::Seconds(600.0), 150.0));
    let trajectory = ResolvedTrajectory::from_raw(&raw);
    assert_eq!(trajectory.skipped_samples(), 1);
    assert_eq!(trajectory.observed_span(), Some(iv(0, 600)));
}

#[test]
fn test_resolver_low_arc_falls_back_to_ratio() {
    let raw = arc_trajectory("low", 1000, 50, 80.0);
    let trajectory = ResolvedTrajectory::from_raw(&raw);
    let phases = PhaseResolver::new(PhaseConfig::default()).resolve(&trajectory).unwrap();
    assert_eq!(phases.source, PhaseSource::ObservedSpanRatio);
    assert_eq!(phases.critical, iv(100, 900));
    assert_eq!(phases.boost, Some(iv(0, 100)));
    assert_eq!(phases.terminal, Some(iv(900, 1000)));
}

#[test]
fn test_resolver_short_high_span_falls_back_to_ratio() {
    // only the samples at 400s and 600s exceed the threshold, span below the 300s minimum
    let raw = TargetTrajectory {
        target_id: "short".to_string(),
        launch_time: Some(RawTimestamp::Text("23 Jul 2025 04:00:00.000".to_string())),
        samples: [(0.0, 10.0), (200.0, 50.0), (400.0, 120.0), (600.0, 110.0), (1000.0, 5.0)]
            .into_iter()
            .map(|(t, alt)| sample(RawTimestamp::Seconds(t), alt))
            .collect(),
    };
    let phases =
        PhaseResolver::new(PhaseConfig::default()).resolve(&ResolvedTrajectory::from_raw(&raw)).unwrap();
    assert_eq!(phases.source, PhaseSource::ObservedSpanRatio);
    assert_eq!(phases.critical, iv(100, 900));
}

#[test]
fn test_resolver_nominal_flight_and_unresolvable() {
    let resolver = PhaseResolver::new(PhaseConfig::default());
    let launch_only = TargetTrajectory {
        target_id: "dark".to_string(),
        launch_time: Some(RawTimestamp::Text("2025-07-23 04:00:00".to_string())),
        samples: vec![sample(RawTimestamp::Seconds(10.0), 1.0)],
    };
    let phases = resolver.resolve(&ResolvedTrajectory::from_raw(&launch_only)).unwrap();
    assert_eq!(phases.source, PhaseSource::NominalFlightRatio);
    assert_eq!(phases.critical, iv(180, 1620));

    let nothing = TargetTrajectory { target_id: "lost".to_string(), launch_time: None, samples: vec![] };
    assert!(resolver.resolve(&ResolvedTrajectory::from_raw(&nothing)).is_none());

    // relative samples without a launch time cannot be placed in time
    let relative_only = TargetTrajectory {
        target_id: "floating".to_string(),
        launch_time: None,
        samples: vec![sample(RawTimestamp::Seconds(0.0), 200.0), sample(RawTimestamp::Seconds(600.0), 200.0)],
    };
    let trajectory = ResolvedTrajectory::from_raw(&relative_only);
    assert_eq!(trajectory.skipped_samples(), 2);
    assert!(resolver.resolve(&trajectory).is_none());
}

#[test]
fn test_cycle_is_hull_of_phases() {
    let resolver = PhaseResolver::new(PhaseConfig::default());
    let a = resolver.resolve(&ResolvedTrajectory::from_raw(&arc_trajectory("a", 1800, 60, 400.0))).unwrap();
    let mut b_raw = arc_trajectory("b", 1800, 60, 400.0);
    b_raw.launch_time = Some(RawTimestamp::Text("2025-07-23T04:10:00Z".to_string()));
    let b = resolver.resolve(&ResolvedTrajectory::from_raw(&b_raw)).unwrap();

    let cycle = PlanningCycle::from_phases(&[b, a], &StandardizationConfig::default()).unwrap();
    assert_eq!(cycle.interval(), iv(180, 2220));
    assert_eq!(cycle.original(), cycle.interval());
    assert!(!cycle.standardized());
    assert_eq!(cycle.earliest_target(), "a");
    assert_eq!(cycle.latest_target(), "b");
    assert!(cycle.per_target_phase().values().all(|p| cycle.interval().contains_interval(p)));
    assert!(PlanningCycle::from_phases(&[], &StandardizationConfig::default()).is_none());
}

#[test]
fn test_standardization_contains_union_with_margin() {
    let config = StandardizationConfig { enabled: true, ..StandardizationConfig::default() };
    // short hull is widened to the 1800s minimum around its center
    let short = PlanningCycle::standardize(iv(1000, 1600), &config);
    assert_eq!(short, iv(400, 2200));
    // mid-size hull is widened to the standard length
    let mid = PlanningCycle::standardize(iv(0, 1800), &config);
    assert_eq!(mid, iv(-300, 2100));
    // standard length leaves less than the margin, both ends get the margin
    let tight = PlanningCycle::standardize(iv(0, 2000), &config);
    assert_eq!(tight, iv(-300, 2300));
    // long hull would be contracted to the maximum, instead it keeps its length plus margin
    let long = PlanningCycle::standardize(iv(0, 4000), &config);
    assert_eq!(long, iv(-300, 4300));
    for hull in [iv(1000, 1600), iv(0, 2000), iv(0, 2350), iv(0, 4000)] {
        let std = PlanningCycle::standardize(hull, &config);
        assert!(std.contains_interval(&hull));
        assert!(hull.start() - std.start() >= secs(config.overlap_secs));
        assert!(std.end() - hull.end() >= secs(config.overlap_secs));
    }
}

#[test]
fn test_gap_filler_empty_window() {
    let window = iv(0, 100);
    let timeline = Timeline::<()>::fill_gaps(window, []).unwrap();
    assert_eq!(timeline.segments().len(), 1);
    assert_eq!(timeline.segments()[0].interval(), window);
    assert_eq!(timeline.segments()[0].origin(), SegmentOrigin::Virtual);
    assert!(timeline.is_contiguous());
}

#[test]
fn test_gap_filler_full_and_adjacent() {
    let full = Timeline::fill_gaps(iv(0, 100), [(iv(0, 100), "all")]).unwrap();
    assert_eq!(full.virtual_count(), 0);
    assert_eq!(full.segments()[0].payload(), Some(&"all"));

    let adjacent = Timeline::fill_gaps(iv(0, 300), [(iv(100, 200), 2), (iv(0, 100), 1), (iv(200, 300), 3)]).unwrap();
    assert_eq!(adjacent.virtual_count(), 0);
    assert_eq!(adjacent.real_payloads().copied().collect::<Vec<_>>(), [1, 2, 3]);
}

#[test]
fn test_gap_filler_general_case() {
    let timeline =
        Timeline::fill_gaps(iv(0, 1000), [(iv(600, 700), "b".to_string()), (iv(100, 300), "a".to_string())]).unwrap();
    let layout = timeline.segments().iter().map(|s| (s.interval(), s.origin())).collect::<Vec<_>>();
    assert_eq!(
        layout,
        [
            (iv(0, 100), SegmentOrigin::Virtual),
            (iv(100, 300), SegmentOrigin::Real),
            (iv(300, 600), SegmentOrigin::Virtual),
            (iv(600, 700), SegmentOrigin::Real),
            (iv(700, 1000), SegmentOrigin::Virtual),
        ]
    );
    assert!(timeline.segments().iter().filter(|s| !s.is_real()).all(|s| s.payload().is_none()));
    assert!(timeline.is_contiguous());
}

#[test]
fn test_gap_filler_rejects_invalid_input() {
    assert_eq!(
        Timeline::fill_gaps(iv(0, 100), [(iv(50, 150), ())]),
        Err(TimelineError::SegmentOutsideWindow(iv(50, 150)))
    );
    assert_eq!(
        Timeline::fill_gaps(iv(0, 100), [(iv(10, 50), ()), (iv(40, 60), ())]),
        Err(TimelineError::OverlappingSegments(iv(10, 50), iv(40, 60)))
    );
}

#[test]
fn test_gap_filler_random_covers_window() {
    let mut rng = rand::rng();
    for _ in 0..100 {
        let window = iv(0, 10_000);
        let mut cursor = 0;
        let mut real = Vec::new();
        while cursor < 9_000 {
            let gap = rng.random_range(0..500);
            let len = rng.random_range(1..500);
            let start = cursor + gap;
            let end = (start + len).min(10_000);
            if start >= end {
                break;
            }
            real.push((iv(start, end), start));
            cursor = end;
        }
        let count = real.len();
        let timeline = Timeline::fill_gaps(window, real).unwrap();
        assert!(timeline.is_contiguous());
        assert_eq!(timeline.real_count(), count);
        assert!(timeline.segments().iter().tuple_windows().all(|(a, b)| a.is_real() || b.is_real()));
    }
}

#[test]
fn test_target_position_lookup() {
    let trajectory = ResolvedTrajectory::from_raw(&arc_trajectory("m", 1800, 60, 400.0));
    let config = TargetPositionConfig::default();

    let exact = trajectory.position_at(t0() + secs(120), &config).unwrap();
    assert!(!exact.interpolated);
    assert!(exact.sample_distance_secs.abs() < f64::EPSILON);

    let near = trajectory.position_at(t0() + secs(130), &config).unwrap();
    assert!(!near.interpolated);
    assert!((near.sample_distance_secs - 10.0).abs() < 1e-9);

    let between = trajectory.position_at(t0() + secs(150), &config).unwrap();
    assert!(between.interpolated);
    let low = trajectory.points()[2].altitude_km;
    let high = trajectory.points()[3].altitude_km;
    assert!((between.altitude_km - (low + high) / 2.0).abs() < 1e-9);

    // past the last sample only nearest lookup within the limit is possible
    let after = trajectory.position_at(t0() + secs(1800 + 100), &config).unwrap();
    assert!(!after.interpolated);
    assert!(trajectory.position_at(t0() + secs(1800 + 601), &config).is_none());
}

#[test]
fn test_meta_task_entry_positions() {
    let trajectory = ResolvedTrajectory::from_raw(&arc_trajectory("m", 1800, 60, 400.0));
    let config = TargetPositionConfig::default();
    let task = AtomicTask::new(1, iv(300, 600), "m", &iv(180, 1620));
    let entry = MetaTaskEntry::new(task.clone(), Some(&trajectory), &config);
    assert!(entry.has_position_data());
    assert_eq!(entry.start_position.unwrap().time, t0() + secs(300));
    let without = MetaTaskEntry::new(task, None, &config);
    assert!(!without.has_position_data());
}
