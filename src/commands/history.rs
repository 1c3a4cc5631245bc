use chrono::{NaiveDate, Utc};

use crate::error::AppError;
use crate::models::history::{ExerciseBadges, ProgressPoint, Timeframe};

use super::sets::parse_day;
use super::{run_blocking, AppState, CommandError, CommandResult};

pub async fn history_recent_days(
    state: &AppState,
    user_id: String,
    limit: Option<usize>,
) -> CommandResult<Vec<NaiveDate>> {
    let app_state = state.clone();
    run_blocking(move || app_state.history().recent_days(&user_id, limit)).await
}

pub async fn history_day_badges(
    state: &AppState,
    user_id: String,
    days: Vec<String>,
) -> CommandResult<Vec<ExerciseBadges>> {
    let days = days
        .iter()
        .map(|day| parse_day(day))
        .collect::<Result<Vec<_>, _>>()?;
    let app_state = state.clone();
    run_blocking(move || app_state.history().exercise_badges(&user_id, &days)).await
}

/// Progress points for one exercise; `timeframe` defaults to six months.
pub async fn history_progress(
    state: &AppState,
    user_id: String,
    exercise_id: String,
    timeframe: Option<String>,
) -> CommandResult<Vec<ProgressPoint>> {
    let timeframe = match timeframe.as_deref() {
        Some(value) => Timeframe::try_from(value)
            .map_err(|message| CommandError::from(AppError::validation(message)))?,
        None => Timeframe::default(),
    };
    let app_state = state.clone();
    run_blocking(move || {
        app_state
            .history()
            .progress_series(&user_id, &exercise_id, timeframe, Utc::now())
    })
    .await
}
