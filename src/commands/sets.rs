use chrono::NaiveDate;
use tracing::debug;

use crate::error::AppError;
use crate::models::set_entry::{SetCreateInput, SetUpdateInput, SetWithExercise};
use crate::services::set_service::{LoggedSet, SetChange};

use super::{run_blocking, AppState, CommandError, CommandResult};

pub async fn sets_log(
    state: &AppState,
    user_id: String,
    payload: SetCreateInput,
) -> CommandResult<LoggedSet> {
    let app_state = state.clone();
    run_blocking(move || app_state.sets().log_set(&user_id, payload)).await
}

pub async fn sets_update(
    state: &AppState,
    user_id: String,
    id: String,
    payload: SetUpdateInput,
) -> CommandResult<SetChange> {
    let app_state = state.clone();
    run_blocking(move || app_state.sets().update_set(&user_id, &id, payload)).await
}

pub async fn sets_delete(state: &AppState, user_id: String, id: String) -> CommandResult<SetChange> {
    let app_state = state.clone();
    run_blocking(move || app_state.sets().delete_set(&user_id, &id)).await
}

/// Sets of one local day; `day` is `YYYY-MM-DD`.
pub async fn sets_list_by_day(
    state: &AppState,
    user_id: String,
    day: String,
) -> CommandResult<Vec<SetWithExercise>> {
    let day = parse_day(&day)?;
    debug!(target: "app::command", %day, "listing sets for day");
    let app_state = state.clone();
    run_blocking(move || app_state.history().sets_for_day(&user_id, day)).await
}

pub(crate) fn parse_day(value: &str) -> Result<NaiveDate, CommandError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|err| {
        CommandError::from(AppError::validation_with_details(
            format!("invalid day '{value}': {err}"),
            serde_json::json!({ "field": "day", "expected": "YYYY-MM-DD" }),
        ))
    })
}
