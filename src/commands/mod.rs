pub mod exercises;
pub mod history;
pub mod records;
pub mod sets;
pub mod settings;

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value as JsonValue;
use tracing::{error, warn};

use crate::db::store::{PersonalRecordStore, SqliteRecordStore};
use crate::db::DbPool;
use crate::error::AppError;
use crate::services::exercise_service::ExerciseService;
use crate::services::history_service::HistoryService;
use crate::services::pr_service::PrService;
use crate::services::set_service::SetService;
use crate::services::settings_service::SettingsService;

#[derive(Clone)]
pub struct AppState {
    db_pool: DbPool,
    settings_service: Arc<SettingsService>,
    exercise_service: Arc<ExerciseService>,
    pr_service: Arc<PrService>,
    set_service: Arc<SetService>,
    history_service: Arc<HistoryService>,
}

impl AppState {
    pub fn new(db_pool: DbPool) -> Self {
        let store = Arc::new(SqliteRecordStore::new(db_pool.clone()));
        Self::with_store(db_pool, store)
    }

    /// Wires every service against `db_pool`, with personal records read and
    /// written through `store`.
    pub fn with_store(db_pool: DbPool, store: Arc<dyn PersonalRecordStore>) -> Self {
        let settings_service = Arc::new(SettingsService::new(db_pool.clone()));
        let exercise_service = Arc::new(ExerciseService::new(db_pool.clone()));
        let pr_service = Arc::new(PrService::new(store, Arc::clone(&settings_service)));
        let set_service = Arc::new(SetService::new(
            db_pool.clone(),
            Arc::clone(&settings_service),
            Arc::clone(&pr_service),
        ));
        let history_service = Arc::new(HistoryService::new(
            db_pool.clone(),
            Arc::clone(&settings_service),
        ));

        Self {
            db_pool,
            settings_service,
            exercise_service,
            pr_service,
            set_service,
            history_service,
        }
    }

    pub fn settings(&self) -> Arc<SettingsService> {
        Arc::clone(&self.settings_service)
    }

    pub fn exercises(&self) -> Arc<ExerciseService> {
        Arc::clone(&self.exercise_service)
    }

    pub fn records(&self) -> Arc<PrService> {
        Arc::clone(&self.pr_service)
    }

    pub fn sets(&self) -> Arc<SetService> {
        Arc::clone(&self.set_service)
    }

    pub fn history(&self) -> Arc<HistoryService> {
        Arc::clone(&self.history_service)
    }

    pub fn db(&self) -> DbPool {
        self.db_pool.clone()
    }
}

pub type CommandResult<T> = Result<T, CommandError>;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandError {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<JsonValue>,
}

impl CommandError {
    pub fn new(
        code: impl Into<String>,
        message: impl Into<String>,
        details: Option<JsonValue>,
    ) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details,
        }
    }

    pub fn is_retryable(&self) -> bool {
        self.details
            .as_ref()
            .and_then(|details| details.get("retryable"))
            .and_then(JsonValue::as_bool)
            .unwrap_or(false)
    }
}

impl From<AppError> for CommandError {
    fn from(error: AppError) -> Self {
        match error {
            AppError::Validation {
                message, details, ..
            } => CommandError::new("VALIDATION_ERROR", message, details),
            AppError::NotFound => {
                CommandError::new("NOT_FOUND", "the requested record does not exist", None)
            }
            AppError::Conflict { message } => CommandError::new("CONFLICT", message, None),
            AppError::StoreUnavailable { message } => {
                warn!(target: "app::command", %message, "record store unavailable in command");
                CommandError::new(
                    "STORE_UNAVAILABLE",
                    "the record store is temporarily unavailable, please retry",
                    Some(serde_json::json!({ "retryable": true, "cause": message })),
                )
            }
            AppError::Database { message } => {
                error!(target: "app::command", %message, "database error in command");
                CommandError::new("UNKNOWN", message, None)
            }
            AppError::Serialization(error) => {
                error!(target: "app::command", error = %error, "serialization error in command");
                CommandError::new("UNKNOWN", "serialization failed", None)
            }
            AppError::Io(error) => {
                error!(target: "app::command", error = %error, "io error in command");
                CommandError::new("UNKNOWN", "file system access failed", None)
            }
            AppError::Other(message) => {
                error!(target: "app::command", %message, "unexpected error in command");
                CommandError::new("UNKNOWN", message, None)
            }
        }
    }
}

/// Runs synchronous service work on tokio's blocking pool.
pub(crate) async fn run_blocking<T: Send + 'static>(
    task: impl FnOnce() -> Result<T, AppError> + Send + 'static,
) -> CommandResult<T> {
    tokio::task::spawn_blocking(task)
        .await
        .map_err(|err| CommandError::new("UNKNOWN", format!("command task failed: {err}"), None))?
        .map_err(CommandError::from)
}
