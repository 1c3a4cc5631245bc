//! Workout log with a personal-record engine.
//!
//! Services are synchronous and operate on an opaque `user_id` supplied by
//! the caller. [`commands`] exposes them as async functions over an
//! [`commands::AppState`].

pub mod commands;
pub mod db;
pub mod error;
pub mod models;
pub mod services;
pub mod utils;

use std::path::PathBuf;

use tracing::info;

use crate::commands::AppState;
use crate::db::DbPool;
use crate::error::AppResult;

const DATABASE_FILE: &str = "liftlog.sqlite";
const LOG_DIR: &str = "logs";

/// Prepares `data_dir`, installs logging and opens the database.
pub fn init(data_dir: impl Into<PathBuf>) -> AppResult<AppState> {
    let data_dir = data_dir.into();
    std::fs::create_dir_all(&data_dir)?;

    crate::utils::logger::init_logging(&data_dir.join(LOG_DIR))?;

    let pool = DbPool::new(data_dir.join(DATABASE_FILE))?;
    info!(target: "app::init", data_dir = %data_dir.display(), "application state ready");
    Ok(AppState::new(pool))
}
