use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tracing::{info, warn};

use crate::db::repositories::exercise_repository::ExerciseRepository;
use crate::db::repositories::set_repository::{SetRepository, SetRow};
use crate::db::DbPool;
use crate::error::{AppError, AppResult};
use crate::models::personal_record::PrNotification;
use crate::models::set_entry::{SetCreateInput, SetRecord, SetUpdateInput};
use crate::services::pr_service::PrService;
use crate::services::settings_service::SettingsService;
use crate::utils::units::WeightUnit;

const MIN_RPE: f64 = 1.0;
const MAX_RPE: f64 = 10.0;

/// A stored set plus what it did to the user's records.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoggedSet {
    pub set: SetRecord,
    /// Present only when a record was broken or the club target crossed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notification: Option<PrNotification>,
    /// Records could not be refreshed; the stored summaries may lag behind.
    pub records_stale: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SetChange {
    pub set: SetRecord,
    pub records_stale: bool,
}

#[derive(Clone)]
pub struct SetService {
    db: DbPool,
    settings: Arc<SettingsService>,
    records: Arc<PrService>,
}

impl SetService {
    pub fn new(db: DbPool, settings: Arc<SettingsService>, records: Arc<PrService>) -> Self {
        Self {
            db,
            settings,
            records,
        }
    }

    /// Stores a new set and folds it into the user's records.
    ///
    /// A failure while updating records never fails the insert: it is logged
    /// and reported through `records_stale`.
    pub fn log_set(&self, user_id: &str, input: SetCreateInput) -> AppResult<LoggedSet> {
        let unit = self.resolve_unit(user_id, input.unit)?;
        ensure_valid_weight(input.weight)?;

        let record = SetRecord {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            exercise_id: input.exercise_id.trim().to_string(),
            weight: unit.to_kg(input.weight),
            reps: input.reps,
            rpe: input.rpe,
            failed: input.failed,
            created_at: Utc::now(),
            performed_at: input.performed_at,
        };
        validate_record(&record)?;

        let row = SetRow::from_record(&record);
        self.db.with_transaction(|conn| {
            ensure_exercise_visible(conn, user_id, &record.exercise_id)?;
            SetRepository::insert(conn, &row)
        })?;
        info!(
            target: "app::sets",
            set_id = %record.id,
            %user_id,
            exercise_id = %record.exercise_id,
            "set logged"
        );

        match self.records.process_new_set(user_id, &record) {
            Ok(notification) => Ok(LoggedSet {
                notification: notification.has_news().then_some(notification),
                set: record,
                records_stale: false,
            }),
            Err(err) => {
                warn!(
                    target: "app::sets",
                    set_id = %record.id,
                    error = %err,
                    "set stored but personal records were not refreshed"
                );
                Ok(LoggedSet {
                    set: record,
                    notification: None,
                    records_stale: true,
                })
            }
        }
    }

    pub fn update_set(
        &self,
        user_id: &str,
        id: &str,
        input: SetUpdateInput,
    ) -> AppResult<SetChange> {
        let mut existing = self.get_set(user_id, id)?;

        if let Some(exercise_id) = input.exercise_id {
            existing.exercise_id = exercise_id.trim().to_string();
        }
        if let Some(weight) = input.weight {
            ensure_valid_weight(weight)?;
            let unit = self.resolve_unit(user_id, input.unit)?;
            existing.weight = unit.to_kg(weight);
        }
        if let Some(reps) = input.reps {
            existing.reps = reps;
        }
        if let Some(rpe) = input.rpe {
            existing.rpe = rpe;
        }
        if let Some(failed) = input.failed {
            existing.failed = failed;
        }
        if let Some(performed_at) = input.performed_at {
            existing.performed_at = performed_at;
        }
        validate_record(&existing)?;

        let row = SetRow::from_record(&existing);
        self.db.with_transaction(|conn| {
            ensure_exercise_visible(conn, user_id, &existing.exercise_id)?;
            SetRepository::update(conn, &row)
        })?;
        info!(target: "app::sets", set_id = %existing.id, %user_id, "set updated");

        let records_stale = self.refresh_records(user_id, &existing.id);
        Ok(SetChange {
            set: existing,
            records_stale,
        })
    }

    pub fn delete_set(&self, user_id: &str, id: &str) -> AppResult<SetChange> {
        let existing = self.get_set(user_id, id)?;
        self.db
            .with_connection(|conn| SetRepository::delete(conn, user_id, id))?;
        info!(target: "app::sets", set_id = %id, %user_id, "set deleted");

        let records_stale = self.refresh_records(user_id, id);
        Ok(SetChange {
            set: existing,
            records_stale,
        })
    }

    pub fn get_set(&self, user_id: &str, id: &str) -> AppResult<SetRecord> {
        self.db
            .with_connection(|conn| SetRepository::find_by_id(conn, user_id, id))?
            .ok_or_else(AppError::not_found)?
            .into_record()
    }

    fn resolve_unit(&self, user_id: &str, unit: Option<WeightUnit>) -> AppResult<WeightUnit> {
        match unit {
            Some(unit) => Ok(unit),
            None => self.settings.weight_unit(user_id),
        }
    }

    /// Full recompute after an edit or delete. Returns whether records are stale.
    fn refresh_records(&self, user_id: &str, set_id: &str) -> bool {
        match self.records.recompute_all(user_id) {
            Ok(_) => false,
            Err(err) => {
                warn!(
                    target: "app::sets",
                    %set_id,
                    error = %err,
                    "personal records recompute failed after set change"
                );
                true
            }
        }
    }
}

fn ensure_valid_weight(weight: f64) -> AppResult<()> {
    if !weight.is_finite() || weight <= 0.0 {
        return Err(AppError::validation("weight must be a positive number"));
    }
    Ok(())
}

fn ensure_exercise_visible(
    conn: &rusqlite::Connection,
    user_id: &str,
    exercise_id: &str,
) -> AppResult<()> {
    if ExerciseRepository::find_visible(conn, user_id, exercise_id)?.is_none() {
        return Err(AppError::validation(format!(
            "unknown exercise: {exercise_id}"
        )));
    }
    Ok(())
}

fn validate_record(record: &SetRecord) -> AppResult<()> {
    if record.exercise_id.is_empty() {
        return Err(AppError::validation("exercise is required"));
    }
    ensure_valid_weight(record.weight)?;
    if record.reps == 0 {
        return Err(AppError::validation("reps must be at least 1"));
    }
    if let Some(rpe) = record.rpe {
        if !rpe.is_finite() || !(MIN_RPE..=MAX_RPE).contains(&rpe) {
            return Err(AppError::validation_with_details(
                "rpe must be between 1 and 10",
                serde_json::json!({ "field": "rpe", "min": MIN_RPE, "max": MAX_RPE }),
            ));
        }
    }
    Ok(())
}
