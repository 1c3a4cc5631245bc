use std::convert::TryFrom;

use rusqlite::{named_params, Connection, Row};

use crate::error::AppResult;

#[derive(Debug, Clone)]
pub struct UserSettingRow {
    pub key: String,
    pub value: String,
    pub updated_at: String,
}

impl TryFrom<&Row<'_>> for UserSettingRow {
    type Error = rusqlite::Error;

    fn try_from(row: &Row<'_>) -> Result<Self, Self::Error> {
        Ok(Self {
            key: row.get("key")?,
            value: row.get("value")?,
            updated_at: row.get("updated_at")?,
        })
    }
}

pub struct SettingsRepository;

impl SettingsRepository {
    pub fn list(conn: &Connection, user_id: &str) -> AppResult<Vec<UserSettingRow>> {
        let mut stmt = conn.prepare(
            r#"
                SELECT key, value, updated_at
                FROM user_settings
                WHERE user_id = :user_id
                ORDER BY key ASC
            "#,
        )?;

        let rows = stmt
            .query_map(named_params! {":user_id": user_id}, |row| {
                UserSettingRow::try_from(row)
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(rows)
    }

    pub fn upsert(conn: &Connection, user_id: &str, key: &str, value: &str) -> AppResult<()> {
        conn.execute(
            r#"
                INSERT INTO user_settings (user_id, key, value)
                VALUES (:user_id, :key, :value)
                ON CONFLICT(user_id, key) DO UPDATE SET
                    value = excluded.value,
                    updated_at = CURRENT_TIMESTAMP
            "#,
            named_params! {":user_id": user_id, ":key": key, ":value": value},
        )?;

        Ok(())
    }

    pub fn delete(conn: &Connection, user_id: &str, key: &str) -> AppResult<()> {
        conn.execute(
            "DELETE FROM user_settings WHERE user_id = :user_id AND key = :key",
            named_params! {":user_id": user_id, ":key": key},
        )?;
        Ok(())
    }
}
