use crate::models::exercise::{ExerciseCreateInput, ExerciseRecord};

use super::{run_blocking, AppState, CommandResult};

pub async fn exercises_list(state: &AppState, user_id: String) -> CommandResult<Vec<ExerciseRecord>> {
    let app_state = state.clone();
    run_blocking(move || app_state.exercises().list_exercises(&user_id)).await
}

pub async fn exercises_create(
    state: &AppState,
    user_id: String,
    payload: ExerciseCreateInput,
) -> CommandResult<ExerciseRecord> {
    let app_state = state.clone();
    run_blocking(move || app_state.exercises().create_exercise(&user_id, payload)).await
}
