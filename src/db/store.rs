//! Contract between the personal-record engine and whatever persists it.
//!
//! The engine only ever talks to a [`PersonalRecordStore`]. [`SqliteRecordStore`]
//! is the bundled implementation over [`DbPool`].

use std::collections::HashMap;

use tracing::debug;

use crate::db::repositories::exercise_repository::ExerciseRepository;
use crate::db::repositories::personal_record_repository::PersonalRecordRepository;
use crate::db::repositories::set_repository::SetRepository;
use crate::db::DbPool;
use crate::error::{AppError, AppResult};
use crate::models::personal_record::{ExercisePrSummary, IncrementalPrOutcome, PrMetric};
use crate::models::set_entry::SetRecord;
use crate::services::pr_aggregator::{apply_incremental, UNKNOWN_EXERCISE_NAME};
use crate::utils::local_day::{to_iso, ViewerTimezone};

pub trait PersonalRecordStore: Send + Sync {
    /// Complete set history of `user_id`, failed sets included.
    fn list_all_sets(&self, user_id: &str) -> AppResult<Vec<SetRecord>>;

    /// Exercise id → display name for every exercise the user can log against.
    fn exercise_names(&self, user_id: &str) -> AppResult<HashMap<String, String>>;

    fn read_pr_summaries(&self, user_id: &str) -> AppResult<Vec<ExercisePrSummary>>;

    /// Atomically replaces every stored summary of `user_id`.
    fn replace_pr_summaries(&self, user_id: &str, summaries: &[ExercisePrSummary])
        -> AppResult<()>;

    /// Folds one freshly inserted set into the stored records of its exercise.
    /// The read-compare-write must be atomic with respect to other writers.
    /// Club fields of the outcome are left for the caller to fill.
    fn upsert_incremental_pr(
        &self,
        user_id: &str,
        set_id: &str,
        timezone: &ViewerTimezone,
    ) -> AppResult<IncrementalPrOutcome>;
}

#[derive(Clone, Debug)]
pub struct SqliteRecordStore {
    db: DbPool,
}

impl SqliteRecordStore {
    pub fn new(db: DbPool) -> Self {
        Self { db }
    }
}

impl PersonalRecordStore for SqliteRecordStore {
    fn list_all_sets(&self, user_id: &str) -> AppResult<Vec<SetRecord>> {
        self.db
            .with_connection(|conn| SetRepository::list_for_user(conn, user_id))
    }

    fn exercise_names(&self, user_id: &str) -> AppResult<HashMap<String, String>> {
        self.db
            .with_connection(|conn| ExerciseRepository::names_for_user(conn, user_id))
    }

    fn read_pr_summaries(&self, user_id: &str) -> AppResult<Vec<ExercisePrSummary>> {
        self.db
            .with_connection(|conn| PersonalRecordRepository::list_for_user(conn, user_id))
    }

    fn replace_pr_summaries(
        &self,
        user_id: &str,
        summaries: &[ExercisePrSummary],
    ) -> AppResult<()> {
        self.db.with_transaction(|conn| {
            PersonalRecordRepository::replace_all(conn, user_id, summaries)
        })?;
        debug!(target: "app::db", %user_id, count = summaries.len(), "personal records replaced");
        Ok(())
    }

    fn upsert_incremental_pr(
        &self,
        user_id: &str,
        set_id: &str,
        timezone: &ViewerTimezone,
    ) -> AppResult<IncrementalPrOutcome> {
        self.db.with_transaction(|conn| {
            let set = SetRepository::find_by_id(conn, user_id, set_id)?
                .ok_or_else(AppError::not_found)?
                .into_record()?;
            let exercise_name = ExerciseRepository::find_by_id(conn, &set.exercise_id)?
                .map(|row| row.name)
                .unwrap_or_else(|| UNKNOWN_EXERCISE_NAME.to_string());
            let current =
                PersonalRecordRepository::find_for_exercise(conn, user_id, &set.exercise_id)?;

            let day = timezone.local_date(&set.performed_or_created());
            let (start, end) = timezone.day_bounds(day);
            let day_sets = SetRepository::list_for_exercise_between(
                conn,
                user_id,
                &set.exercise_id,
                &to_iso(&start),
                &to_iso(&end),
            )?;

            let update =
                apply_incremental(current.as_ref(), &set, &day_sets, &exercise_name, timezone);
            for metric in &update.improved {
                if let Some(stat) = update.summary.metric(*metric) {
                    PersonalRecordRepository::upsert_metric(
                        conn,
                        user_id,
                        &set.exercise_id,
                        *metric,
                        stat,
                    )?;
                }
            }

            Ok(IncrementalPrOutcome {
                new_weight: update.improved.contains(&PrMetric::Weight),
                new_one_rm: update.improved.contains(&PrMetric::OneRm),
                new_volume: update.improved.contains(&PrMetric::Volume),
                club_total_kg: None,
                club_just_reached: None,
            })
        })
    }
}
