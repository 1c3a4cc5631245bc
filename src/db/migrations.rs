use chrono::{DateTime, Utc};
use rusqlite::{named_params, Connection, Row};
use tracing::info;

use crate::error::{AppError, AppResult};
use crate::utils::local_day::{parse_iso, to_iso};

const USER_VERSION: i32 = 2;

/// Exercises every user sees without creating them: (id, name, short name).
pub const BUILTIN_EXERCISES: &[(&str, &str, Option<&str>)] = &[
    ("builtin-back-squat", "Back Squat", Some("Squat")),
    ("builtin-front-squat", "Front Squat", None),
    ("builtin-bench-press", "Bench Press", Some("Bench")),
    ("builtin-deadlift", "Deadlift", None),
    ("builtin-overhead-press", "Overhead Press", Some("OHP")),
    ("builtin-barbell-row", "Barbell Row", Some("Row")),
    ("builtin-pull-up", "Pull-up", None),
];

#[derive(Debug)]
pub struct MigrationInfo {
    pub version: i32,
    pub description: String,
    pub applied_at: DateTime<Utc>,
}

impl TryFrom<&Row<'_>> for MigrationInfo {
    type Error = rusqlite::Error;

    fn try_from(row: &Row<'_>) -> Result<Self, Self::Error> {
        let applied_at: String = row.get("applied_at")?;
        let applied_at = parse_iso(&applied_at).map_err(|err| {
            rusqlite::Error::FromSqlConversionFailure(
                2,
                rusqlite::types::Type::Text,
                Box::new(std::io::Error::new(std::io::ErrorKind::InvalidData, err.to_string())),
            )
        })?;
        Ok(Self {
            version: row.get("version")?,
            description: row.get("description")?,
            applied_at,
        })
    }
}

pub fn run(conn: &Connection) -> AppResult<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS migration_history (
            version INTEGER PRIMARY KEY,
            description TEXT NOT NULL,
            applied_at TEXT NOT NULL
        );
        "#,
    )?;

    let mut current_version: i32 = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;

    if current_version < 1 {
        info!(target: "app::db", version = current_version, "running migration v1");
        migrate_to_v1(conn)?;
        current_version = 1;
        conn.execute(&format!("PRAGMA user_version = {}", current_version), [])?;
        record_migration(conn, 1, "Add set lookup indexes")?;
    }

    if current_version < 2 {
        info!(target: "app::db", version = current_version, "running migration v2");
        migrate_to_v2(conn)?;
        current_version = 2;
        conn.execute(&format!("PRAGMA user_version = {}", current_version), [])?;
        record_migration(conn, 2, "Seed built-in exercise catalogue")?;
    }

    if current_version > USER_VERSION {
        return Err(AppError::database(format!(
            "database schema v{current_version} is newer than supported v{USER_VERSION}"
        )));
    }

    Ok(())
}

pub fn applied_migrations(conn: &Connection) -> AppResult<Vec<MigrationInfo>> {
    let mut stmt = conn.prepare(
        "SELECT version, description, applied_at FROM migration_history ORDER BY version ASC",
    )?;

    let rows = stmt
        .query_map([], |row| MigrationInfo::try_from(row))?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(rows)
}

fn migrate_to_v1(conn: &Connection) -> AppResult<()> {
    conn.execute_batch(
        r#"
        CREATE INDEX IF NOT EXISTS idx_sets_user_performed
            ON sets (user_id, COALESCE(performed_at, created_at));
        CREATE INDEX IF NOT EXISTS idx_sets_user_exercise
            ON sets (user_id, exercise_id);
        "#,
    )?;
    Ok(())
}

fn migrate_to_v2(conn: &Connection) -> AppResult<()> {
    let now = to_iso(&Utc::now());
    let mut stmt = conn.prepare(
        r#"
            INSERT OR IGNORE INTO exercises (id, user_id, name, short_name, created_at)
            VALUES (:id, NULL, :name, :short_name, :created_at)
        "#,
    )?;

    for (id, name, short_name) in BUILTIN_EXERCISES {
        stmt.execute(named_params! {
            ":id": id,
            ":name": name,
            ":short_name": short_name,
            ":created_at": &now,
        })?;
    }

    Ok(())
}

fn record_migration(conn: &Connection, version: i32, description: &str) -> AppResult<()> {
    conn.execute(
        r#"
            INSERT OR REPLACE INTO migration_history (version, description, applied_at)
            VALUES (:version, :description, :applied_at)
        "#,
        named_params! {
            ":version": version,
            ":description": description,
            ":applied_at": to_iso(&Utc::now()),
        },
    )?;
    Ok(())
}
