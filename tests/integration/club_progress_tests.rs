// 1000 lb club progress, pure and through the record pipeline

use std::sync::Arc;

use chrono::{TimeZone, Utc};
use liftlog_app_lib::commands::AppState;
use liftlog_app_lib::db::store::SqliteRecordStore;
use liftlog_app_lib::db::DbPool;
use liftlog_app_lib::models::club::{ClubCategory, THOUSAND_LB_TARGET_KG};
use liftlog_app_lib::models::exercise::ExerciseCreateInput;
use liftlog_app_lib::models::personal_record::{ExercisePrSummary, MetricStat};
use liftlog_app_lib::models::set_entry::SetCreateInput;
use liftlog_app_lib::services::club_progress::{
    compute_club_progress, ClubCategoryRule, ClubDefinition, NameMatcher,
};
use liftlog_app_lib::services::pr_service::PrService;
use liftlog_app_lib::services::settings_service::SettingsService;
use tempfile::tempdir;

const USER: &str = "club-member";

fn one_rm_summary(id: &str, name: &str, one_rm: f64) -> ExercisePrSummary {
    ExercisePrSummary {
        one_rm_pr: Some(MetricStat::new(one_rm, "2024-06-01T09:00:00.000Z", None)),
        ..ExercisePrSummary::empty(id, name)
    }
}

fn single(exercise_id: &str, weight: f64, day: u32) -> SetCreateInput {
    SetCreateInput {
        exercise_id: exercise_id.into(),
        weight,
        reps: 1,
        performed_at: Some(Utc.with_ymd_and_hms(2024, 6, day, 9, 0, 0).unwrap()),
        ..Default::default()
    }
}

#[test]
fn test_target_is_one_thousand_pounds() {
    assert!((THOUSAND_LB_TARGET_KG - 453.59237).abs() < 1e-9);
}

#[test]
fn test_squat_variants_are_excluded() {
    let progress = compute_club_progress(&[
        one_rm_summary("a", "Front Squat", 150.0),
        one_rm_summary("b", "Overhead Squat", 120.0),
    ]);
    assert_eq!(progress.squat_kg, None);
    assert_eq!(progress.category(ClubCategory::Squat), None);
    assert_eq!(progress.percent, 0.0);
}

#[test]
fn test_crossing_target_reports_full_percent() {
    let progress = compute_club_progress(&[
        one_rm_summary("a", "Bench Press", 140.0),
        one_rm_summary("b", "Deadlift", 220.0),
        one_rm_summary("c", "Back Squat", 180.0),
    ]);
    assert_eq!(progress.total_kg, 540.0);
    assert!(progress.reached_target);
    assert_eq!(progress.percent, 100.0);
}

#[test]
fn test_tied_candidates_keep_first_value() {
    let progress = compute_club_progress(&[
        one_rm_summary("a", "Bench Press", 120.0),
        one_rm_summary("b", "Close Grip Bench", 120.0),
        one_rm_summary("c", "Incline Bench", 110.0),
    ]);
    assert_eq!(progress.bench_kg, Some(120.0));
    assert_eq!(progress.total_kg, 120.0);
}

#[test]
fn test_summaries_without_one_rm_are_ignored() {
    let mut weight_only = ExercisePrSummary::empty("a", "Deadlift");
    weight_only.weight_pr = Some(MetricStat::new(200.0, "2024-06-01T09:00:00.000Z", None));
    let progress = compute_club_progress(&[weight_only]);
    assert_eq!(progress.deadlift_kg, None);
    assert_eq!(progress.total_kg, 0.0);
}

#[test]
fn test_logging_the_crossing_set_reports_club_reached() {
    let dir = tempdir().expect("temp dir");
    let state = AppState::new(DbPool::new(dir.path().join("club.sqlite")).expect("db pool"));
    let sets = state.sets();

    // Epley 1RMs: 144.67 + 206.67 = 351.33 kg before the squat.
    let bench = sets.log_set(USER, single("builtin-bench-press", 140.0, 1)).expect("bench");
    assert!(!bench.notification.unwrap().club_just_reached);
    sets.log_set(USER, single("builtin-deadlift", 200.0, 2)).expect("deadlift");

    let progress = state.records().club_progress(USER).expect("progress");
    assert!(!progress.reached_target);
    assert!(progress.percent > 0.0 && progress.percent < 100.0);

    let squat = sets.log_set(USER, single("builtin-back-squat", 100.0, 3)).expect("squat");
    let notification = squat.notification.expect("notification");
    assert!(notification.club_just_reached);
    assert!(notification.club.reached_target);
    assert_eq!(notification.club.percent, 100.0);

    let again = sets.log_set(USER, single("builtin-back-squat", 105.0, 4)).expect("squat");
    assert!(!again.notification.expect("new squat record").club_just_reached);

    let front = sets.log_set(USER, single("builtin-front-squat", 300.0, 5)).expect("front");
    let notification = front.notification.expect("front squat record");
    assert!(!notification.club_just_reached);
    assert!((notification.club.squat_kg.unwrap() - 105.0 * 31.0 / 30.0).abs() < 1e-9);
}

#[test]
fn test_custom_club_definition_drives_progress() {
    let dir = tempdir().expect("temp dir");
    let pool = DbPool::new(dir.path().join("club.sqlite")).expect("db pool");
    let state = AppState::new(pool.clone());
    let press = state
        .exercises()
        .create_exercise(
            USER,
            ExerciseCreateInput {
                name: "Strict Press".into(),
                short_name: Some("Press".into()),
            },
        )
        .expect("exercise");
    state.sets().log_set(USER, single(&press.id, 60.0, 1)).expect("press");

    let settings = Arc::new(SettingsService::new(pool.clone()));
    let records = PrService::new(Arc::new(SqliteRecordStore::new(pool)), settings)
        .with_club_definition(ClubDefinition {
            rules: vec![ClubCategoryRule {
                category: ClubCategory::Bench,
                tiers: vec![NameMatcher::containing_any(&["press"]).excluding(&["bench"])],
            }],
            target_kg: 61.0,
        });

    let progress = records.club_progress(USER).expect("progress");
    assert!((progress.bench_kg.unwrap() - 62.0).abs() < 1e-9);
    assert!(progress.reached_target);
    assert_eq!(progress.deadlift_kg, None);
    assert_eq!(records.club_definition().target_kg, 61.0);
}
