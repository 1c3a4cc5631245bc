use std::convert::TryFrom;

use rusqlite::{named_params, Connection, OptionalExtension, Row};

use crate::error::{AppError, AppResult};
use crate::models::set_entry::SetRecord;
use crate::utils::local_day::{parse_iso, to_iso};

const SET_COLUMNS: &str =
    "id, user_id, exercise_id, weight, reps, rpe, failed, created_at, performed_at";

#[derive(Debug, Clone)]
pub struct SetRow {
    pub id: String,
    pub user_id: String,
    pub exercise_id: String,
    pub weight: f64,
    pub reps: i64,
    pub rpe: Option<f64>,
    pub failed: bool,
    pub created_at: String,
    pub performed_at: Option<String>,
}

impl SetRow {
    pub fn from_record(record: &SetRecord) -> Self {
        Self {
            id: record.id.clone(),
            user_id: record.user_id.clone(),
            exercise_id: record.exercise_id.clone(),
            weight: record.weight,
            reps: i64::from(record.reps),
            rpe: record.rpe,
            failed: record.failed,
            created_at: to_iso(&record.created_at),
            performed_at: record.performed_at.as_ref().map(to_iso),
        }
    }

    pub fn into_record(self) -> AppResult<SetRecord> {
        let reps = u32::try_from(self.reps)
            .map_err(|_| AppError::validation(format!("invalid stored reps: {}", self.reps)))?;
        let created_at = parse_iso(&self.created_at)?;
        let performed_at = match self.performed_at.as_deref() {
            Some(value) => Some(parse_iso(value)?),
            None => None,
        };

        Ok(SetRecord {
            id: self.id,
            user_id: self.user_id,
            exercise_id: self.exercise_id,
            weight: self.weight,
            reps,
            rpe: self.rpe,
            failed: self.failed,
            created_at,
            performed_at,
        })
    }
}

impl TryFrom<&Row<'_>> for SetRow {
    type Error = rusqlite::Error;

    fn try_from(row: &Row<'_>) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.get("id")?,
            user_id: row.get("user_id")?,
            exercise_id: row.get("exercise_id")?,
            weight: row.get("weight")?,
            reps: row.get("reps")?,
            rpe: row.get("rpe")?,
            failed: row.get("failed")?,
            created_at: row.get("created_at")?,
            performed_at: row.get("performed_at")?,
        })
    }
}

pub struct SetRepository;

impl SetRepository {
    pub fn insert(conn: &Connection, row: &SetRow) -> AppResult<()> {
        conn.execute(
            r#"
                INSERT INTO sets (
                    id, user_id, exercise_id, weight, reps, rpe, failed, created_at, performed_at
                ) VALUES (
                    :id, :user_id, :exercise_id, :weight, :reps, :rpe, :failed, :created_at, :performed_at
                )
            "#,
            named_params! {
                ":id": &row.id,
                ":user_id": &row.user_id,
                ":exercise_id": &row.exercise_id,
                ":weight": row.weight,
                ":reps": row.reps,
                ":rpe": row.rpe,
                ":failed": row.failed,
                ":created_at": &row.created_at,
                ":performed_at": &row.performed_at,
            },
        )?;

        Ok(())
    }

    pub fn update(conn: &Connection, row: &SetRow) -> AppResult<()> {
        let affected = conn.execute(
            r#"
                UPDATE sets SET
                    exercise_id = :exercise_id,
                    weight = :weight,
                    reps = :reps,
                    rpe = :rpe,
                    failed = :failed,
                    performed_at = :performed_at
                WHERE id = :id AND user_id = :user_id
            "#,
            named_params! {
                ":id": &row.id,
                ":user_id": &row.user_id,
                ":exercise_id": &row.exercise_id,
                ":weight": row.weight,
                ":reps": row.reps,
                ":rpe": row.rpe,
                ":failed": row.failed,
                ":performed_at": &row.performed_at,
            },
        )?;

        if affected == 0 {
            return Err(AppError::not_found());
        }

        Ok(())
    }

    pub fn delete(conn: &Connection, user_id: &str, id: &str) -> AppResult<()> {
        let affected = conn.execute(
            "DELETE FROM sets WHERE id = :id AND user_id = :user_id",
            named_params! {":id": id, ":user_id": user_id},
        )?;

        if affected == 0 {
            return Err(AppError::not_found());
        }

        Ok(())
    }

    pub fn find_by_id(conn: &Connection, user_id: &str, id: &str) -> AppResult<Option<SetRow>> {
        let sql = format!("SELECT {SET_COLUMNS} FROM sets WHERE id = :id AND user_id = :user_id");
        let mut stmt = conn.prepare(&sql)?;

        let row = stmt
            .query_row(named_params! {":id": id, ":user_id": user_id}, |row| {
                SetRow::try_from(row)
            })
            .optional()?;

        Ok(row)
    }

    /// Complete history, oldest first.
    pub fn list_for_user(conn: &Connection, user_id: &str) -> AppResult<Vec<SetRecord>> {
        let sql = format!(
            r#"
                SELECT {SET_COLUMNS}
                FROM sets
                WHERE user_id = :user_id
                ORDER BY COALESCE(performed_at, created_at) ASC, id ASC
            "#
        );
        Self::collect(conn, &sql, named_params! {":user_id": user_id})
    }

    pub fn list_for_exercise(
        conn: &Connection,
        user_id: &str,
        exercise_id: &str,
    ) -> AppResult<Vec<SetRecord>> {
        let sql = format!(
            r#"
                SELECT {SET_COLUMNS}
                FROM sets
                WHERE user_id = :user_id AND exercise_id = :exercise_id
                ORDER BY COALESCE(performed_at, created_at) ASC, id ASC
            "#
        );
        Self::collect(
            conn,
            &sql,
            named_params! {":user_id": user_id, ":exercise_id": exercise_id},
        )
    }

    /// Sets whose effective timestamp falls in `[start_iso, end_iso)`.
    pub fn list_between(
        conn: &Connection,
        user_id: &str,
        start_iso: &str,
        end_iso: &str,
    ) -> AppResult<Vec<SetRecord>> {
        let sql = format!(
            r#"
                SELECT {SET_COLUMNS}
                FROM sets
                WHERE user_id = :user_id
                    AND COALESCE(performed_at, created_at) >= :start
                    AND COALESCE(performed_at, created_at) < :end
                ORDER BY COALESCE(performed_at, created_at) ASC, id ASC
            "#
        );
        Self::collect(
            conn,
            &sql,
            named_params! {":user_id": user_id, ":start": start_iso, ":end": end_iso},
        )
    }

    pub fn list_for_exercise_between(
        conn: &Connection,
        user_id: &str,
        exercise_id: &str,
        start_iso: &str,
        end_iso: &str,
    ) -> AppResult<Vec<SetRecord>> {
        let sql = format!(
            r#"
                SELECT {SET_COLUMNS}
                FROM sets
                WHERE user_id = :user_id
                    AND exercise_id = :exercise_id
                    AND COALESCE(performed_at, created_at) >= :start
                    AND COALESCE(performed_at, created_at) < :end
                ORDER BY COALESCE(performed_at, created_at) ASC, id ASC
            "#
        );
        Self::collect(
            conn,
            &sql,
            named_params! {
                ":user_id": user_id,
                ":exercise_id": exercise_id,
                ":start": start_iso,
                ":end": end_iso,
            },
        )
    }

    /// Effective timestamps of the most recent sets, newest first.
    pub fn list_recent_timestamps(
        conn: &Connection,
        user_id: &str,
        limit: usize,
    ) -> AppResult<Vec<String>> {
        let mut stmt = conn.prepare(
            r#"
                SELECT COALESCE(performed_at, created_at) AS effective_at
                FROM sets
                WHERE user_id = :user_id
                ORDER BY effective_at DESC
                LIMIT :limit
            "#,
        )?;

        let rows = stmt
            .query_map(
                named_params! {":user_id": user_id, ":limit": limit as i64},
                |row| row.get::<_, String>("effective_at"),
            )?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(rows)
    }

    fn collect(
        conn: &Connection,
        sql: &str,
        params: &[(&str, &dyn rusqlite::ToSql)],
    ) -> AppResult<Vec<SetRecord>> {
        let mut stmt = conn.prepare(sql)?;

        let records = stmt
            .query_map(params, |row| SetRow::try_from(row))?
            .map(|row| row.map_err(AppError::from).and_then(|row| row.into_record()))
            .collect::<AppResult<Vec<_>>>()?;

        Ok(records)
    }
}
