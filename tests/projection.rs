use std::path::PathBuf;

use chrono::NaiveDate;
use popcast::{
    scenario::ScenarioLoader, Group, GroupId, ProjectionError, ProjectionSettings, Projector,
    YearMonth,
};

fn scenario_loader() -> ScenarioLoader {
    ScenarioLoader::new(env!("CARGO_MANIFEST_DIR"))
}

fn scenario_path() -> PathBuf {
    PathBuf::from("scenarios/two_villages.yaml")
}

fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
}

fn reference_projector() -> Projector {
    let group = Group::new("valley", "Valley", 1_200.0)
        .with_life_expectancy(70.0)
        .with_sex_ratios(0.5, 0.5)
        .with_fraction_not_married(0.3)
        .with_avg_children_per_woman(2.0)
        .with_max_wives(1);
    let settings = ProjectionSettings::new(YearMonth::new(2024, 1).unwrap(), vec![group]);
    Projector::new(settings).expect("valid settings")
}

#[test]
fn scenario_loader_reads_fixture() {
    let scenario = scenario_loader().load(scenario_path()).expect("scenario parses");
    assert_eq!(scenario.name, "two_villages");
    assert_eq!(scenario.groups.len(), 3);
    assert_eq!(scenario.start, YearMonth::new(2024, 1).unwrap());
    assert_eq!(scenario.target, Some(YearMonth::new(2034, 1).unwrap()));
    assert_eq!(
        scenario.groups.iter().map(|g| g.initial_population).sum::<f64>(),
        2_000.0
    );
}

#[test]
fn start_month_returns_month_zero() {
    let projector = reference_projector();
    let valley = GroupId::new("valley");

    for target in [date(2024, 1, 1), date(2024, 1, 15), date(2024, 1, 31)] {
        let snapshot = projector.predict(target).expect("same month succeeds");
        assert_eq!(snapshot.months_elapsed, 0);
        assert_eq!(snapshot.population(&valley), Some(1_200.0));
    }
}

#[test]
fn earlier_day_in_start_month_is_not_an_error() {
    let group = Group::new("valley", "Valley", 90.0);
    let settings = ProjectionSettings::new(date(2024, 1, 20).into(), vec![group]);
    let projector = Projector::new(settings).unwrap();

    let snapshot = projector.predict(date(2024, 1, 3)).unwrap();
    assert_eq!(snapshot, projector.month_zero());
}

#[test]
fn one_month_matches_worked_example() {
    let snapshot = reference_projector()
        .predict(date(2024, 2, 1))
        .expect("one month ahead");
    let population = snapshot.population(&GroupId::new("valley")).unwrap();

    let post_death: f64 = 1_200.0 - 1_200.0 / (70.0 * 12.0);
    assert!((post_death - 1_198.571_428_571).abs() < 1e-6);
    let expected = post_death * 601.0 / 600.0;
    assert!(
        (population - expected).abs() < 1e-9,
        "expected {expected}, got {population}"
    );
    assert_eq!(snapshot.months_elapsed, 1);
}

#[test]
fn earlier_month_is_invalid_range() {
    let group = Group::new("valley", "Valley", 10.0);
    let settings = ProjectionSettings::new(YearMonth::new(2025, 6).unwrap(), vec![group]);
    let projector = Projector::new(settings).unwrap();

    assert_eq!(
        projector.predict(date(2025, 5, 31)),
        Err(ProjectionError::InvalidDateRange {
            start: YearMonth::new(2025, 6).unwrap(),
            target: YearMonth::new(2025, 5).unwrap(),
        })
    );
}

#[test]
fn no_groups_is_an_error() {
    let settings = ProjectionSettings::new(YearMonth::new(2024, 1).unwrap(), Vec::new());
    let projector = Projector::new(settings).unwrap();
    assert_eq!(
        projector.predict(date(2030, 1, 1)),
        Err(ProjectionError::NoGroupsConfigured)
    );
}

#[test]
fn projection_is_deterministic() {
    let scenario = scenario_loader().load(scenario_path()).unwrap();
    let projector = scenario.projector().unwrap();
    let target = scenario.target(None).unwrap();

    let first = projector.predict_month(target).unwrap();
    let second = projector.predict_month(target).unwrap();
    assert_eq!(first, second);
    assert_eq!(first.months_elapsed, 120);
}

#[test]
fn every_group_reported_and_non_negative() {
    let scenario = scenario_loader().load(scenario_path()).unwrap();
    let projector = scenario.projector().unwrap();
    let snapshot = projector
        .predict_month(YearMonth::new(2054, 1).unwrap())
        .unwrap();

    let ids: Vec<_> = snapshot.populations.keys().map(GroupId::as_str).collect();
    assert_eq!(ids, vec!["abandoned", "hillfolk", "riverside"]);
    assert!(snapshot.populations.values().all(|p| *p >= 0.0));
    assert_eq!(snapshot.population(&GroupId::new("abandoned")), Some(0.0));
}

#[test]
fn stepping_month_by_month_matches_direct_projection() {
    let projector = reference_projector();
    let direct = projector
        .predict_month(YearMonth::new(2026, 1).unwrap())
        .unwrap();

    let mut state = popcast::transition::initial_state(projector.groups());
    for _ in 0..24 {
        state = popcast::transition(&state, projector.groups());
    }
    assert_eq!(direct.populations, state);
}

#[test]
fn unreachable_far_future_is_date_arithmetic_failure() {
    let projector = reference_projector();
    let far = YearMonth::new(i32::MAX, 12).unwrap();

    let mut months_run = 0;
    let result = projector.predict_with_hook(far, |_, _| {
        months_run += 1;
        std::ops::ControlFlow::Continue(())
    });
    assert!(
        matches!(result, Err(ProjectionError::DateArithmeticFailure(_))),
        "expected date arithmetic failure, got {result:?}"
    );
    assert_eq!(months_run, 0, "no month should be simulated");
    assert!(matches!(
        projector.predict_month(far),
        Err(ProjectionError::DateArithmeticFailure(_))
    ));
}
