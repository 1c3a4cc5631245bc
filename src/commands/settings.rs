use crate::models::settings::{AppSettings, SettingsUpdateInput};

use super::{run_blocking, AppState, CommandResult};

pub async fn settings_get(state: &AppState, user_id: String) -> CommandResult<AppSettings> {
    let app_state = state.clone();
    run_blocking(move || app_state.settings().get(&user_id)).await
}

pub async fn settings_update(
    state: &AppState,
    user_id: String,
    payload: SettingsUpdateInput,
) -> CommandResult<AppSettings> {
    let app_state = state.clone();
    run_blocking(move || app_state.settings().update(&user_id, payload)).await
}
