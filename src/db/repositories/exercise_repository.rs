use std::collections::HashMap;
use std::convert::TryFrom;

use rusqlite::{named_params, Connection, OptionalExtension, Row};

use crate::error::AppResult;
use crate::models::exercise::ExerciseRecord;
use crate::utils::local_day::{parse_iso, to_iso};

#[derive(Debug, Clone)]
pub struct ExerciseRow {
    pub id: String,
    pub user_id: Option<String>,
    pub name: String,
    pub short_name: Option<String>,
    pub created_at: String,
}

impl ExerciseRow {
    pub fn from_record(record: &ExerciseRecord) -> Self {
        Self {
            id: record.id.clone(),
            user_id: record.user_id.clone(),
            name: record.name.clone(),
            short_name: record.short_name.clone(),
            created_at: to_iso(&record.created_at),
        }
    }

    pub fn into_record(self) -> AppResult<ExerciseRecord> {
        Ok(ExerciseRecord {
            created_at: parse_iso(&self.created_at)?,
            id: self.id,
            user_id: self.user_id,
            name: self.name,
            short_name: self.short_name,
        })
    }
}

impl TryFrom<&Row<'_>> for ExerciseRow {
    type Error = rusqlite::Error;

    fn try_from(row: &Row<'_>) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.get("id")?,
            user_id: row.get("user_id")?,
            name: row.get("name")?,
            short_name: row.get("short_name")?,
            created_at: row.get("created_at")?,
        })
    }
}

pub struct ExerciseRepository;

impl ExerciseRepository {
    pub fn insert(conn: &Connection, row: &ExerciseRow) -> AppResult<()> {
        conn.execute(
            r#"
                INSERT INTO exercises (id, user_id, name, short_name, created_at)
                VALUES (:id, :user_id, :name, :short_name, :created_at)
            "#,
            named_params! {
                ":id": &row.id,
                ":user_id": &row.user_id,
                ":name": &row.name,
                ":short_name": &row.short_name,
                ":created_at": &row.created_at,
            },
        )?;

        Ok(())
    }

    pub fn find_by_id(conn: &Connection, id: &str) -> AppResult<Option<ExerciseRow>> {
        let mut stmt = conn.prepare(
            "SELECT id, user_id, name, short_name, created_at FROM exercises WHERE id = :id",
        )?;

        let row = stmt
            .query_row(named_params! {":id": id}, |row| ExerciseRow::try_from(row))
            .optional()?;

        Ok(row)
    }

    /// Exercise `id` if it belongs to `user_id` or to the built-in catalogue.
    pub fn find_visible(
        conn: &Connection,
        user_id: &str,
        id: &str,
    ) -> AppResult<Option<ExerciseRow>> {
        let mut stmt = conn.prepare(
            r#"
                SELECT id, user_id, name, short_name, created_at
                FROM exercises
                WHERE id = :id AND (user_id = :user_id OR user_id IS NULL)
            "#,
        )?;

        let row = stmt
            .query_row(named_params! {":id": id, ":user_id": user_id}, |row| {
                ExerciseRow::try_from(row)
            })
            .optional()?;

        Ok(row)
    }

    pub fn list_visible(conn: &Connection, user_id: &str) -> AppResult<Vec<ExerciseRow>> {
        let mut stmt = conn.prepare(
            r#"
                SELECT id, user_id, name, short_name, created_at
                FROM exercises
                WHERE user_id = :user_id OR user_id IS NULL
                ORDER BY name COLLATE NOCASE ASC, id ASC
            "#,
        )?;

        let rows = stmt
            .query_map(named_params! {":user_id": user_id}, |row| {
                ExerciseRow::try_from(row)
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(rows)
    }

    /// Exercise id → display name for everything `user_id` can log against.
    pub fn names_for_user(conn: &Connection, user_id: &str) -> AppResult<HashMap<String, String>> {
        Ok(Self::list_visible(conn, user_id)?
            .into_iter()
            .map(|row| (row.id, row.name))
            .collect())
    }
}
