// End-to-end personal record flows through the service layer

use chrono::{DateTime, TimeZone, Utc};
use liftlog_app_lib::commands::AppState;
use liftlog_app_lib::db::DbPool;
use liftlog_app_lib::models::personal_record::{ExercisePrSummary, PrMetric};
use liftlog_app_lib::models::set_entry::SetCreateInput;
use liftlog_app_lib::models::settings::SettingsUpdateInput;
use tempfile::tempdir;

const USER: &str = "lifter-1";
const DEADLIFT: &str = "builtin-deadlift";
const SQUAT: &str = "builtin-back-squat";

fn setup_state() -> (AppState, tempfile::TempDir) {
    let dir = tempdir().expect("temp dir");
    let pool = DbPool::new(dir.path().join("records.sqlite")).expect("db pool");
    let state = AppState::new(pool);
    state
        .settings()
        .update(
            USER,
            SettingsUpdateInput {
                timezone: Some(Some("UTC".into())),
                ..Default::default()
            },
        )
        .expect("settings");
    (state, dir)
}

fn at(day: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, day, hour, 0, 0).unwrap()
}

fn set_input(exercise_id: &str, weight: f64, reps: u32, performed_at: DateTime<Utc>) -> SetCreateInput {
    SetCreateInput {
        exercise_id: exercise_id.into(),
        weight,
        reps,
        performed_at: Some(performed_at),
        ..Default::default()
    }
}

fn summary_for<'a>(summaries: &'a [ExercisePrSummary], exercise_id: &str) -> &'a ExercisePrSummary {
    summaries
        .iter()
        .find(|summary| summary.exercise_id == exercise_id)
        .expect("summary present")
}

#[test]
fn test_deadlift_records_only_move_up() {
    let (state, _dir) = setup_state();
    let sets = state.sets();
    let records = state.records();

    sets.log_set(USER, set_input(DEADLIFT, 180.0, 1, at(1, 10)))
        .expect("first set");
    assert!(records.recompute_all(USER).expect("recompute").is_applied());
    let summaries = records.summaries(USER).expect("summaries");
    let deadlift = summary_for(&summaries, DEADLIFT);
    assert_eq!(deadlift.exercise_name, "Deadlift");
    assert_eq!(deadlift.weight_pr.as_ref().unwrap().value, 180.0);
    // Epley credits a single rep with 1/30 of the load.
    assert!((deadlift.one_rm_pr.as_ref().unwrap().value - 186.0).abs() < 1e-9);

    let heavier = sets
        .log_set(USER, set_input(DEADLIFT, 185.0, 1, at(2, 10)))
        .expect("second set");
    let notification = heavier.notification.expect("new record");
    assert!(notification.metrics.contains(&PrMetric::Weight));
    assert!(notification.metrics.contains(&PrMetric::OneRm));

    let lighter = sets
        .log_set(USER, set_input(DEADLIFT, 170.0, 1, at(3, 10)))
        .expect("third set");
    assert!(lighter.notification.is_none());
    assert!(!lighter.records_stale);

    records.recompute_all(USER).expect("recompute");
    let summaries = records.summaries(USER).expect("summaries");
    let deadlift = summary_for(&summaries, DEADLIFT);
    assert_eq!(deadlift.weight_pr.as_ref().unwrap().value, 185.0);
    assert_eq!(
        deadlift.weight_pr.as_ref().unwrap().set_id.as_deref(),
        Some(heavier.set.id.as_str())
    );
    assert!((deadlift.one_rm_pr.as_ref().unwrap().value - 185.0 * 31.0 / 30.0).abs() < 1e-9);
}

#[test]
fn test_failed_set_never_becomes_a_record() {
    let (state, _dir) = setup_state();
    let sets = state.sets();

    sets.log_set(USER, set_input(SQUAT, 150.0, 5, at(1, 10)))
        .expect("working set");
    let failed = sets
        .log_set(
            USER,
            SetCreateInput {
                failed: true,
                ..set_input(SQUAT, 200.0, 1, at(1, 11))
            },
        )
        .expect("failed set");
    assert!(failed.notification.is_none());

    state.records().recompute_all(USER).expect("recompute");
    let summaries = state.records().summaries(USER).expect("summaries");
    let squat = summary_for(&summaries, SQUAT);
    assert_eq!(squat.weight_pr.as_ref().unwrap().value, 150.0);
    assert_eq!(squat.volume_pr.as_ref().unwrap().value, 750.0);
}

#[test]
fn test_volume_record_is_best_single_day() {
    let (state, _dir) = setup_state();
    let sets = state.sets();

    sets.log_set(USER, set_input(SQUAT, 50.0, 5, at(1, 9))).expect("a");
    sets.log_set(USER, set_input(SQUAT, 50.0, 5, at(1, 10))).expect("b");
    sets.log_set(USER, set_input(SQUAT, 100.0, 5, at(2, 9))).expect("c");

    let outcome = state.records().recompute_all(USER).expect("recompute");
    assert!(outcome.is_applied());
    let summaries = state.records().summaries(USER).expect("summaries");
    let volume = summary_for(&summaries, SQUAT).volume_pr.clone().unwrap();
    assert_eq!(volume.value, 500.0);
    assert_eq!(volume.date_iso, "2024-05-01T00:00:00.000Z");
}

#[test]
fn test_full_recompute_is_idempotent() {
    let (state, _dir) = setup_state();
    let sets = state.sets();
    sets.log_set(USER, set_input(SQUAT, 120.0, 5, at(1, 9))).expect("squat");
    sets.log_set(USER, set_input(DEADLIFT, 160.0, 3, at(1, 10))).expect("deadlift");

    let records = state.records();
    records.recompute_all(USER).expect("first recompute");
    let first = records.summaries(USER).expect("summaries");
    records.recompute_all(USER).expect("second recompute");
    let second = records.summaries(USER).expect("summaries");

    assert_eq!(first, second);
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
    assert_eq!(records.compute_summaries(USER).expect("compute"), first);
}

#[test]
fn test_incremental_and_full_recompute_agree() {
    let (state, _dir) = setup_state();
    let sets = state.sets();
    let history = [
        (SQUAT, 100.0, 5, at(1, 9)),
        (SQUAT, 110.0, 3, at(1, 10)),
        (DEADLIFT, 180.0, 2, at(2, 9)),
        (SQUAT, 90.0, 10, at(3, 9)),
        (SQUAT, 120.0, 1, at(4, 9)),
        (DEADLIFT, 175.0, 5, at(4, 10)),
    ];
    for (exercise_id, weight, reps, performed_at) in history {
        let logged = sets
            .log_set(USER, set_input(exercise_id, weight, reps, performed_at))
            .expect("log set");
        assert!(!logged.records_stale);
    }

    let incremental = state.records().summaries(USER).expect("summaries");
    state.records().recompute_all(USER).expect("recompute");
    let full = state.records().summaries(USER).expect("summaries");
    assert_eq!(incremental, full);
}

#[test]
fn test_editing_a_set_lowers_records_on_recompute() {
    let (state, _dir) = setup_state();
    let sets = state.sets();
    sets.log_set(USER, set_input(SQUAT, 140.0, 3, at(1, 9))).expect("log");
    let heavy = sets
        .log_set(USER, set_input(SQUAT, 160.0, 1, at(2, 9)))
        .expect("log");

    let changed = sets
        .update_set(
            USER,
            &heavy.set.id,
            liftlog_app_lib::models::set_entry::SetUpdateInput {
                weight: Some(130.0),
                unit: Some(liftlog_app_lib::utils::units::WeightUnit::Kg),
                ..Default::default()
            },
        )
        .expect("update");
    assert!(!changed.records_stale);

    let summaries = state.records().summaries(USER).expect("summaries");
    assert_eq!(summary_for(&summaries, SQUAT).weight_pr.as_ref().unwrap().value, 140.0);

    sets.delete_set(USER, &heavy.set.id).expect("delete");
    let summaries = state.records().summaries(USER).expect("summaries");
    assert_eq!(summaries.len(), 1);
}

#[test]
fn test_local_day_follows_viewer_timezone() {
    let (state, _dir) = setup_state();
    let sets = state.sets();
    // 02:00Z belongs to the previous evening in New York.
    sets.log_set(USER, set_input(SQUAT, 100.0, 5, at(2, 2))).expect("night");
    sets.log_set(USER, set_input(SQUAT, 100.0, 5, at(2, 14))).expect("day");

    let records = state.records();
    records.recompute_all(USER).expect("recompute");
    let utc = records.summaries(USER).expect("summaries");
    assert_eq!(summary_for(&utc, SQUAT).volume_pr.as_ref().unwrap().value, 1000.0);

    state
        .settings()
        .update(
            USER,
            SettingsUpdateInput {
                timezone: Some(Some("America/New_York".into())),
                ..Default::default()
            },
        )
        .expect("settings");
    records.recompute_all(USER).expect("recompute");
    let local = records.summaries(USER).expect("summaries");
    let volume = summary_for(&local, SQUAT).volume_pr.clone().unwrap();
    assert_eq!(volume.value, 500.0);
    assert_eq!(volume.date_iso, "2024-05-01T04:00:00.000Z");
}

#[test]
fn test_records_are_isolated_per_user() {
    let (state, _dir) = setup_state();
    state
        .sets()
        .log_set(USER, set_input(SQUAT, 100.0, 5, at(1, 9)))
        .expect("log");

    state.records().recompute_all("someone-else").expect("recompute");
    assert!(state.records().summaries("someone-else").unwrap().is_empty());
    assert_eq!(state.records().summaries(USER).unwrap().len(), 1);
}
