use super::{AccessWindow, ConstellationSummary, VisibilityClassifier};
use crate::providers::RawAccessWindow;
use crate::scheduling::{AtomicTask, TaskGrid, Timeline};
use crate::util::{CoveragePolicy, TimeInterval, VisibilityConfig};
use crate::{info, log};
use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use rand::Rng;

fn t0() -> DateTime<Utc> { Utc.with_ymd_and_hms(2025, 7, 23, 0, 0, 0).unwrap() }

fn iv(start: i64, end: i64) -> TimeInterval {
    TimeInterval::new(t0() + TimeDelta::seconds(start), t0() + TimeDelta::seconds(end)).unwrap()
}

fn window(start: i64, end: i64) -> AccessWindow { AccessWindow::new(iv(start, end)) }

fn tasks(len: i64) -> Vec<AtomicTask> {
    TaskGrid::generate(iv(0, len), TimeDelta::seconds(300), 1000)
        .unwrap()
        .tasks_for("missile_01", &iv(0, len))
}

fn classifier(policy: CoveragePolicy, ratio: f64, merge: bool) -> VisibilityClassifier {
    VisibilityClassifier::new(&VisibilityConfig {
        coverage_policy: policy,
        minimum_overlap_ratio: ratio,
        merge_adjacent_windows: merge,
    })
}

#[test]
fn test_reference_scenario_complete_policy() {
    info!("Running Complete Coverage Scenario");
    let tasks = tasks(1200);
    let windows = [window(120, 540)];
    let pair = classifier(CoveragePolicy::Complete, 1.0, false).classify_pair("sat_01", "missile_01", &tasks, &windows);
    assert!(pair.records.iter().all(|r| !r.is_visible()));
    assert_eq!(pair.records[0].overlapping_windows(), [iv(120, 300)]);
    assert_eq!(pair.records[1].overlapping_windows(), [iv(300, 540)]);
    assert!((pair.records[0].coverage_ratio() - 0.6).abs() < 1e-12);
    assert!((pair.records[1].coverage_ratio() - 0.8).abs() < 1e-12);
    assert!(pair.records[2].overlapping_windows().is_empty());
    assert_eq!(pair.summary.visible, 0);
    assert_eq!(pair.summary.virtual_count, 4);
}

#[test]
fn test_reference_scenario_partial_policy() {
    let tasks = tasks(1200);
    let windows = [window(120, 540)];
    let pair = classifier(CoveragePolicy::Partial, 0.5, false).classify_pair("sat_01", "missile_01", &tasks, &windows);
    let visible = pair.records.iter().map(|r| r.is_visible()).collect::<Vec<_>>();
    assert_eq!(visible, [true, true, false, false]);
    assert_eq!(pair.summary.visible, 2);
    assert!((pair.summary.visibility_ratio - 0.5).abs() < f64::EPSILON);

    let strict = classifier(CoveragePolicy::Partial, 0.7, false).classify_pair("sat_01", "missile_01", &tasks, &windows);
    let visible = strict.records.iter().map(|r| r.is_visible()).collect::<Vec<_>>();
    assert_eq!(visible, [false, true, false, false]);
}

#[test]
fn test_contained_task_is_visible_with_full_ratio() {
    let tasks = tasks(1200);
    let record = classifier(CoveragePolicy::Complete, 1.0, false).classify(&tasks[1], &[window(250, 700)]);
    assert!(record.is_visible());
    assert!((record.coverage_ratio() - 1.0).abs() < f64::EPSILON);
    assert_eq!(record.overlapping_windows(), [iv(300, 600)]);
}

#[test]
fn test_no_windows_means_nothing_visible() {
    let tasks = tasks(900);
    for policy in [CoveragePolicy::Complete, CoveragePolicy::Partial] {
        let pair = classifier(policy, 0.1, false).classify_pair("sat_01", "missile_01", &tasks, &[]);
        assert!(pair.records.iter().all(|r| !r.is_visible() && r.coverage_ratio() == 0.0));
        assert_eq!(pair.summary.visible, 0);
    }
}

#[test]
fn test_back_to_back_windows_and_merging() {
    let tasks = tasks(600);
    let windows = [window(0, 400), window(400, 600)];
    let independent = classifier(CoveragePolicy::Complete, 1.0, false).classify(&tasks[1], &windows);
    assert!(!independent.is_visible());
    assert!((independent.coverage_ratio() - 1.0).abs() < f64::EPSILON);
    assert_eq!(independent.overlapping_windows(), [iv(300, 400), iv(400, 600)]);

    let merged = classifier(CoveragePolicy::Complete, 1.0, true).classify(&tasks[1], &windows);
    assert!(merged.is_visible());
    assert_eq!(merged.overlapping_windows(), [iv(300, 600)]);
}

#[test]
fn test_overlapping_windows_ratio_is_capped() {
    let tasks = tasks(300);
    let record = classifier(CoveragePolicy::Partial, 1.0, false)
        .classify(&tasks[0], &[window(0, 250), window(50, 300), window(100, 200)]);
    assert!((record.coverage_ratio() - 1.0).abs() < f64::EPSILON);
    assert!(record.is_visible());
}

#[test]
fn test_coverage_bounds_and_policy_consistency_random() {
    info!("Running Randomized Coverage Property Test");
    let mut rng = rand::rng();
    let tasks = tasks(6000);
    for _ in 0..100 {
        let windows = (0..rng.random_range(0..8))
            .map(|_| {
                let start = rng.random_range(-300..6000);
                window(start, start + rng.random_range(1..900))
            })
            .collect::<Vec<_>>();
        let ratio = rng.random_range(0.05..=1.0);
        let complete = classifier(CoveragePolicy::Complete, 1.0, false);
        let partial = classifier(CoveragePolicy::Partial, ratio, false);
        for task in &tasks {
            let c = complete.classify(task, &windows);
            let p = partial.classify(task, &windows);
            assert!((0.0..=1.0).contains(&c.coverage_ratio()));
            if c.is_visible() {
                assert!((c.coverage_ratio() - 1.0).abs() < f64::EPSILON);
                assert!(p.is_visible());
            }
            assert_eq!(p.is_visible(), p.coverage_ratio() >= ratio);
            assert!(c.overlapping_windows().iter().all(|w| task.interval().contains_interval(w)));
        }
    }
}

#[test]
fn test_classifier_and_filler_are_idempotent() {
    let tasks = tasks(3000);
    let windows = [window(100, 1300), window(1700, 2500)];
    let classifier = classifier(CoveragePolicy::Partial, 0.5, false);
    let build = || {
        let pair = classifier.classify_pair("sat_01", "missile_01", &tasks, &windows);
        let real = pair.records.iter().filter(|r| r.is_visible()).map(|r| (r.task().interval(), r.clone()));
        let timeline = Timeline::fill_gaps(iv(0, 3000), real).unwrap();
        serde_json::to_string(&timeline).unwrap()
    };
    let first = build();
    log!("Timeline JSON has {} bytes", first.len());
    assert_eq!(first, build());
}

#[test]
fn test_parse_windows_skips_malformed() {
    let raw = vec![
        RawAccessWindow { start: "23 Jul 2025 00:05:00.000".into(), end: "23 Jul 2025 00:10:00.000".into() },
        RawAccessWindow { start: "2025-07-23T00:01:00Z".into(), end: "2025-07-23T00:02:00Z".into() },
        RawAccessWindow { start: "garbage".into(), end: "23 Jul 2025 00:10:00.000".into() },
        RawAccessWindow { start: "23 Jul 2025 00:10:00.000".into(), end: "23 Jul 2025 00:10:00.000".into() },
    ];
    let parsed = AccessWindow::parse_all(&raw);
    assert_eq!(parsed.skipped, 2);
    assert_eq!(parsed.windows, [window(60, 120), window(300, 600)]);
}

#[test]
fn test_constellation_summary() {
    let tasks = tasks(1200);
    let c = classifier(CoveragePolicy::Complete, 1.0, false);
    let pairs = [
        c.classify_pair("sat_01", "missile_01", &tasks, &[window(0, 600)]),
        c.classify_pair("sat_02", "missile_01", &tasks, &[]),
    ];
    let summary = ConstellationSummary::from_pairs(&pairs);
    assert_eq!(summary.observer_count, 2);
    assert_eq!(summary.target_count, 1);
    assert_eq!(summary.total_visible, 2);
    assert_eq!(summary.total_virtual, 6);
    assert!((summary.visibility_ratio - 0.25).abs() < f64::EPSILON);
    assert!((summary.avg_visible_per_observer - 1.0).abs() < f64::EPSILON);
    assert!((summary.avg_virtual_per_observer - 3.0).abs() < f64::EPSILON);
}
