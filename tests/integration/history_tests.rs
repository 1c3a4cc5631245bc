// History browsing and progress series

use chrono::{NaiveDate, TimeZone, Utc};
use liftlog_app_lib::commands::AppState;
use liftlog_app_lib::db::DbPool;
use liftlog_app_lib::error::AppError;
use liftlog_app_lib::models::history::Timeframe;
use liftlog_app_lib::models::set_entry::SetCreateInput;
use liftlog_app_lib::models::settings::SettingsUpdateInput;
use tempfile::tempdir;

const USER: &str = "history-user";

fn setup_state() -> (AppState, tempfile::TempDir) {
    let dir = tempdir().expect("temp dir");
    let state = AppState::new(DbPool::new(dir.path().join("history.sqlite")).expect("db pool"));
    state
        .settings()
        .update(
            USER,
            SettingsUpdateInput {
                timezone: Some(Some("Europe/London".into())),
                ..Default::default()
            },
        )
        .expect("settings");
    (state, dir)
}

fn log(
    state: &AppState,
    exercise_id: &str,
    weight: f64,
    reps: u32,
    at: (u32, u32, u32),
    failed: bool,
) {
    let (month, day, hour) = at;
    state
        .sets()
        .log_set(
            USER,
            SetCreateInput {
                exercise_id: exercise_id.into(),
                weight,
                reps,
                failed,
                performed_at: Some(Utc.with_ymd_and_hms(2024, month, day, hour, 0, 0).unwrap()),
                ..Default::default()
            },
        )
        .expect("log set");
}

fn date(month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, month, day).unwrap()
}

#[test]
fn test_recent_days_are_distinct_and_newest_first() {
    let (state, _dir) = setup_state();
    log(&state, "builtin-back-squat", 100.0, 5, (1, 2, 12), false);
    log(&state, "builtin-bench-press", 80.0, 5, (1, 2, 12), false);
    log(&state, "builtin-deadlift", 150.0, 3, (1, 4, 12), false);
    log(&state, "builtin-back-squat", 105.0, 5, (1, 9, 12), false);

    let history = state.history();
    assert_eq!(
        history.recent_days(USER, None).expect("days"),
        vec![date(1, 9), date(1, 4), date(1, 2)]
    );
    assert_eq!(
        history.recent_days(USER, Some(2)).expect("days"),
        vec![date(1, 9), date(1, 4)]
    );
    assert!(history.recent_days("nobody", None).expect("days").is_empty());
}

#[test]
fn test_sets_for_day_carry_exercise_labels() {
    let (state, _dir) = setup_state();
    log(&state, "builtin-bench-press", 80.0, 5, (1, 2, 9), false);
    log(&state, "builtin-deadlift", 150.0, 3, (1, 2, 10), false);
    log(&state, "builtin-deadlift", 160.0, 3, (1, 3, 12), false);

    let entries = state.history().sets_for_day(USER, date(1, 2)).expect("sets");
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].exercise_name, "Bench Press");
    assert_eq!(entries[0].exercise_label, "Bench");
    assert_eq!(entries[1].exercise_label, "Deadlift");
}

#[test]
fn test_badges_include_failed_sets() {
    let (state, _dir) = setup_state();
    log(&state, "builtin-overhead-press", 60.0, 5, (2, 5, 12), true);
    log(&state, "builtin-back-squat", 120.0, 5, (2, 5, 12), false);
    log(&state, "builtin-back-squat", 125.0, 5, (2, 5, 12), false);

    let badges = state
        .history()
        .exercise_badges(USER, &[date(2, 5), date(2, 6)])
        .expect("badges");
    assert_eq!(badges.len(), 2);
    assert_eq!(badges[0].labels, vec!["OHP".to_string(), "Squat".to_string()]);
    assert!(badges[1].labels.is_empty());
}

#[test]
fn test_progress_series_aggregates_days_and_skips_failed() {
    let (state, _dir) = setup_state();
    let squat = "builtin-back-squat";
    log(&state, squat, 100.0, 5, (3, 4, 12), false);
    log(&state, squat, 110.0, 3, (3, 4, 12), false);
    log(&state, squat, 200.0, 1, (3, 4, 12), true);
    log(&state, squat, 105.0, 5, (3, 11, 12), false);
    log(&state, squat, 115.0, 3, (3, 18, 12), false);

    let now = Utc.with_ymd_and_hms(2024, 3, 20, 12, 0, 0).unwrap();
    let points = state
        .history()
        .progress_series(USER, squat, Timeframe::OneMonth, now)
        .expect("series");

    assert_eq!(points.len(), 3);
    let first = &points[0];
    assert_eq!(first.day, date(3, 4));
    assert_eq!(first.heaviest, Some(110.0));
    assert!((first.one_rm.unwrap() - 121.0).abs() < 1e-9);
    assert_eq!(first.volume, 830.0);
    assert_eq!(first.trend, None);

    // Weekly heaviest 110, 105, 115 regress to 112.5 at the last week.
    let last_trend = points[2].trend.expect("trend");
    assert!((last_trend - 112.5).abs() < 1e-9);
}

#[test]
fn test_progress_series_respects_timeframe() {
    let (state, _dir) = setup_state();
    let squat = "builtin-back-squat";
    log(&state, squat, 90.0, 5, (1, 10, 12), false);
    log(&state, squat, 100.0, 5, (3, 10, 12), false);

    let now = Utc.with_ymd_and_hms(2024, 3, 20, 12, 0, 0).unwrap();
    let history = state.history();
    assert_eq!(
        history
            .progress_series(USER, squat, Timeframe::OneMonth, now)
            .expect("series")
            .len(),
        1
    );
    assert_eq!(
        history
            .progress_series(USER, squat, Timeframe::All, now)
            .expect("series")
            .len(),
        2
    );
}

#[test]
fn test_progress_series_for_unknown_exercise() {
    let (state, _dir) = setup_state();
    let result = state
        .history()
        .progress_series(USER, "no-such-exercise", Timeframe::All, Utc::now());
    assert!(matches!(result, Err(AppError::NotFound)));
}
