// Failure handling of the record pipeline and error mapping

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{TimeZone, Utc};
use liftlog_app_lib::commands::records::records_list;
use liftlog_app_lib::commands::{AppState, CommandError};
use liftlog_app_lib::db::store::{PersonalRecordStore, SqliteRecordStore};
use liftlog_app_lib::db::DbPool;
use liftlog_app_lib::error::{AppError, AppResult};
use liftlog_app_lib::models::personal_record::{
    ExercisePrSummary, IncrementalPrOutcome, MetricStat, PrMetric,
};
use liftlog_app_lib::models::set_entry::{SetCreateInput, SetRecord};
use liftlog_app_lib::utils::local_day::ViewerTimezone;
use tempfile::tempdir;

const USER: &str = "user-errors";

/// Delegates to SQLite but can be told to fail specific operations.
struct FlakyStore {
    inner: SqliteRecordStore,
    fail_incremental: AtomicBool,
    fail_everything: AtomicBool,
}

impl FlakyStore {
    fn new(pool: DbPool) -> Self {
        Self {
            inner: SqliteRecordStore::new(pool),
            fail_incremental: AtomicBool::new(false),
            fail_everything: AtomicBool::new(false),
        }
    }

    fn check(&self) -> AppResult<()> {
        if self.fail_everything.load(Ordering::SeqCst) {
            return Err(AppError::store_unavailable("connection refused"));
        }
        Ok(())
    }
}

impl PersonalRecordStore for FlakyStore {
    fn list_all_sets(&self, user_id: &str) -> AppResult<Vec<SetRecord>> {
        self.check()?;
        self.inner.list_all_sets(user_id)
    }

    fn exercise_names(&self, user_id: &str) -> AppResult<HashMap<String, String>> {
        self.check()?;
        self.inner.exercise_names(user_id)
    }

    fn read_pr_summaries(&self, user_id: &str) -> AppResult<Vec<ExercisePrSummary>> {
        self.check()?;
        self.inner.read_pr_summaries(user_id)
    }

    fn replace_pr_summaries(
        &self,
        user_id: &str,
        summaries: &[ExercisePrSummary],
    ) -> AppResult<()> {
        self.check()?;
        self.inner.replace_pr_summaries(user_id, summaries)
    }

    fn upsert_incremental_pr(
        &self,
        user_id: &str,
        set_id: &str,
        timezone: &ViewerTimezone,
    ) -> AppResult<IncrementalPrOutcome> {
        self.check()?;
        if self.fail_incremental.load(Ordering::SeqCst) {
            return Err(AppError::database("incremental upsert not available"));
        }
        self.inner.upsert_incremental_pr(user_id, set_id, timezone)
    }
}

fn setup() -> (AppState, Arc<FlakyStore>, DbPool, tempfile::TempDir) {
    let dir = tempdir().expect("temp dir");
    let pool = DbPool::new(dir.path().join("errors.sqlite")).expect("db pool");
    let store = Arc::new(FlakyStore::new(pool.clone()));
    let state = AppState::with_store(pool.clone(), store.clone());
    (state, store, pool, dir)
}

fn squat(weight: f64, day: u32) -> SetCreateInput {
    SetCreateInput {
        exercise_id: "builtin-back-squat".into(),
        weight,
        reps: 3,
        performed_at: Some(Utc.with_ymd_and_hms(2024, 7, day, 18, 0, 0).unwrap()),
        ..Default::default()
    }
}

#[test]
fn test_incremental_failure_falls_back_to_full_recompute() {
    let (state, store, _pool, _dir) = setup();
    store.fail_incremental.store(true, Ordering::SeqCst);

    let first = state.sets().log_set(USER, squat(100.0, 1)).expect("log");
    assert!(!first.records_stale);
    let notification = first.notification.expect("first record detected by diff");
    assert_eq!(
        notification.metrics,
        vec![PrMetric::Weight, PrMetric::OneRm, PrMetric::Volume]
    );
    assert_eq!(notification.exercise_name, "Back Squat");

    let second = state.sets().log_set(USER, squat(90.0, 2)).expect("log");
    assert!(second.notification.is_none());

    let summaries = state.records().summaries(USER).expect("summaries");
    assert_eq!(summaries.len(), 1);
    assert_eq!(summaries[0].weight_pr.as_ref().unwrap().value, 100.0);
}

#[test]
fn test_unavailable_store_keeps_the_set_and_flags_stale_records() {
    let (state, store, _pool, _dir) = setup();
    store.fail_everything.store(true, Ordering::SeqCst);

    let logged = state.sets().log_set(USER, squat(100.0, 1)).expect("log");
    assert!(logged.records_stale);
    assert!(logged.notification.is_none());
    assert_eq!(
        state.sets().get_set(USER, &logged.set.id).expect("stored").weight,
        100.0
    );

    let recompute = state.records().recompute_all(USER);
    assert!(matches!(recompute, Err(AppError::StoreUnavailable { .. })));
    assert!(recompute.unwrap_err().is_retryable());

    store.fail_everything.store(false, Ordering::SeqCst);
    assert!(state.records().recompute_all(USER).expect("recompute").is_applied());
    assert_eq!(state.records().summaries(USER).unwrap().len(), 1);
}

#[tokio::test]
async fn test_store_unavailable_surfaces_as_retryable_command_error() {
    let (state, store, _pool, _dir) = setup();
    store.fail_everything.store(true, Ordering::SeqCst);

    let error = records_list(&state, USER.to_string())
        .await
        .expect_err("store is down");
    assert_eq!(error.code, "STORE_UNAVAILABLE");
    assert!(error.is_retryable());
}

#[test]
fn test_failed_replace_leaves_previous_records_untouched() {
    let (state, _store, pool, _dir) = setup();
    state.sets().log_set(USER, squat(100.0, 1)).expect("log");
    let before = state.records().summaries(USER).expect("summaries");

    let store = SqliteRecordStore::new(pool);
    let mut good = ExercisePrSummary::empty("builtin-deadlift", "Deadlift");
    good.weight_pr = Some(MetricStat::new(200.0, "2024-07-02T18:00:00.000Z", None));
    let mut broken = ExercisePrSummary::empty("builtin-bench-press", "Bench Press");
    // SQLite stores NaN as NULL, which the NOT NULL column rejects.
    broken.weight_pr = Some(MetricStat::new(f64::NAN, "2024-07-02T18:00:00.000Z", None));

    let result = store.replace_pr_summaries(USER, &[good, broken]);
    assert!(result.is_err());
    assert_eq!(store.read_pr_summaries(USER).expect("summaries"), before);
}

#[test]
fn test_sqlite_errors_map_to_app_errors() {
    let busy = rusqlite::Error::SqliteFailure(
        rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_BUSY),
        None,
    );
    let mapped = AppError::from(busy);
    assert!(matches!(mapped, AppError::StoreUnavailable { .. }));
    assert!(mapped.is_retryable());

    let missing = AppError::from(rusqlite::Error::QueryReturnedNoRows);
    assert!(matches!(missing, AppError::NotFound));
    assert!(!missing.is_retryable());

    let command = CommandError::from(AppError::NotFound);
    assert_eq!(command.code, "NOT_FOUND");
    assert!(!command.is_retryable());
}

#[test]
fn test_unknown_set_is_not_found() {
    let (state, _store, _pool, _dir) = setup();
    let result = state.records().upsert_incremental(USER, "missing-set");
    assert!(matches!(result, Err(AppError::NotFound)));
}
