use crate::models::club::ClubProgress;
use crate::models::personal_record::{ExercisePrSummary, RecomputeOutcome};

use super::{run_blocking, AppState, CommandResult};

pub async fn records_list(
    state: &AppState,
    user_id: String,
) -> CommandResult<Vec<ExercisePrSummary>> {
    let app_state = state.clone();
    run_blocking(move || app_state.records().summaries(&user_id)).await
}

/// Rebuilds every record from the full set history.
pub async fn records_recompute(
    state: &AppState,
    user_id: String,
) -> CommandResult<RecomputeOutcome> {
    let app_state = state.clone();
    run_blocking(move || app_state.records().recompute_all(&user_id)).await
}

pub async fn records_club_progress(state: &AppState, user_id: String) -> CommandResult<ClubProgress> {
    let app_state = state.clone();
    run_blocking(move || app_state.records().club_progress(&user_id)).await
}
