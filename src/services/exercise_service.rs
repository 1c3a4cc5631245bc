use chrono::Utc;
use tracing::info;

use crate::db::repositories::exercise_repository::{ExerciseRepository, ExerciseRow};
use crate::db::DbPool;
use crate::error::{AppError, AppResult};
use crate::models::exercise::{ExerciseCreateInput, ExerciseRecord};

#[derive(Clone)]
pub struct ExerciseService {
    db: DbPool,
}

impl ExerciseService {
    pub fn new(db: DbPool) -> Self {
        Self { db }
    }

    /// Creates a user-owned exercise. Names are unique, case-insensitively,
    /// across the user's own exercises and the built-in catalogue.
    pub fn create_exercise(
        &self,
        user_id: &str,
        input: ExerciseCreateInput,
    ) -> AppResult<ExerciseRecord> {
        let name = input.name.trim();
        if name.is_empty() {
            return Err(AppError::validation("exercise name is required"));
        }
        let short_name = input
            .short_name
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_string);

        let record = ExerciseRecord {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: Some(user_id.to_string()),
            name: name.to_string(),
            short_name,
            created_at: Utc::now(),
        };
        let row = ExerciseRow::from_record(&record);

        self.db.with_transaction(|conn| {
            let lowered = record.name.to_lowercase();
            let taken = ExerciseRepository::list_visible(conn, user_id)?
                .iter()
                .any(|existing| existing.name.to_lowercase() == lowered);
            if taken {
                return Err(AppError::conflict(format!(
                    "an exercise named '{}' already exists",
                    record.name
                )));
            }
            ExerciseRepository::insert(conn, &row)
        })?;

        info!(target: "app::exercises", exercise_id = %record.id, %user_id, "exercise created");
        Ok(record)
    }

    /// Built-in and user-owned exercises, sorted by name.
    pub fn list_exercises(&self, user_id: &str) -> AppResult<Vec<ExerciseRecord>> {
        self.db
            .with_connection(|conn| ExerciseRepository::list_visible(conn, user_id))?
            .into_iter()
            .map(ExerciseRow::into_record)
            .collect()
    }

    pub fn get_visible(&self, user_id: &str, exercise_id: &str) -> AppResult<ExerciseRecord> {
        self.db
            .with_connection(|conn| ExerciseRepository::find_visible(conn, user_id, exercise_id))?
            .ok_or_else(AppError::not_found)?
            .into_record()
    }
}
