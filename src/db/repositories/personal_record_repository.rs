use std::collections::BTreeMap;
use std::convert::TryFrom;

use rusqlite::{named_params, Connection, Row};

use crate::error::{AppError, AppResult};
use crate::models::personal_record::{ExercisePrSummary, MetricStat, PrMetric};
use crate::services::pr_aggregator::{sort_summaries, UNKNOWN_EXERCISE_NAME};

#[derive(Debug, Clone)]
pub struct PersonalRecordRow {
    pub exercise_id: String,
    pub exercise_name: Option<String>,
    pub metric: String,
    pub value: f64,
    pub performed_at: String,
    pub set_id: Option<String>,
}

impl TryFrom<&Row<'_>> for PersonalRecordRow {
    type Error = rusqlite::Error;

    fn try_from(row: &Row<'_>) -> Result<Self, Self::Error> {
        Ok(Self {
            exercise_id: row.get("exercise_id")?,
            exercise_name: row.get("exercise_name")?,
            metric: row.get("metric")?,
            value: row.get("value")?,
            performed_at: row.get("performed_at")?,
            set_id: row.get("set_id")?,
        })
    }
}

/// Folds one-row-per-metric storage back into per-exercise summaries.
pub fn group_rows(rows: Vec<PersonalRecordRow>) -> AppResult<Vec<ExercisePrSummary>> {
    let mut by_exercise: BTreeMap<String, ExercisePrSummary> = BTreeMap::new();

    for row in rows {
        let metric = PrMetric::try_from(row.metric.as_str()).map_err(AppError::validation)?;
        let name = row
            .exercise_name
            .unwrap_or_else(|| UNKNOWN_EXERCISE_NAME.to_string());
        let summary = by_exercise
            .entry(row.exercise_id.clone())
            .or_insert_with(|| ExercisePrSummary::empty(row.exercise_id, name));
        *summary.metric_mut(metric) = Some(MetricStat::new(row.value, row.performed_at, row.set_id));
    }

    let mut summaries: Vec<_> = by_exercise.into_values().collect();
    sort_summaries(&mut summaries);
    Ok(summaries)
}

pub struct PersonalRecordRepository;

impl PersonalRecordRepository {
    pub fn list_for_user(conn: &Connection, user_id: &str) -> AppResult<Vec<ExercisePrSummary>> {
        let mut stmt = conn.prepare(
            r#"
                SELECT
                    pr.exercise_id,
                    e.name AS exercise_name,
                    pr.metric,
                    pr.value,
                    pr.performed_at,
                    pr.set_id
                FROM personal_records pr
                LEFT JOIN exercises e ON e.id = pr.exercise_id
                WHERE pr.user_id = :user_id
            "#,
        )?;

        let rows = stmt
            .query_map(named_params! {":user_id": user_id}, |row| {
                PersonalRecordRow::try_from(row)
            })?
            .collect::<Result<Vec<_>, _>>()?;

        group_rows(rows)
    }

    pub fn find_for_exercise(
        conn: &Connection,
        user_id: &str,
        exercise_id: &str,
    ) -> AppResult<Option<ExercisePrSummary>> {
        let mut stmt = conn.prepare(
            r#"
                SELECT
                    pr.exercise_id,
                    e.name AS exercise_name,
                    pr.metric,
                    pr.value,
                    pr.performed_at,
                    pr.set_id
                FROM personal_records pr
                LEFT JOIN exercises e ON e.id = pr.exercise_id
                WHERE pr.user_id = :user_id AND pr.exercise_id = :exercise_id
            "#,
        )?;

        let rows = stmt
            .query_map(
                named_params! {":user_id": user_id, ":exercise_id": exercise_id},
                |row| PersonalRecordRow::try_from(row),
            )?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(group_rows(rows)?.into_iter().next())
    }

    pub fn upsert_metric(
        conn: &Connection,
        user_id: &str,
        exercise_id: &str,
        metric: PrMetric,
        stat: &MetricStat,
    ) -> AppResult<()> {
        conn.execute(
            r#"
                INSERT INTO personal_records (
                    user_id, exercise_id, metric, value, performed_at, set_id
                ) VALUES (
                    :user_id, :exercise_id, :metric, :value, :performed_at, :set_id
                )
                ON CONFLICT(user_id, exercise_id, metric) DO UPDATE SET
                    value = excluded.value,
                    performed_at = excluded.performed_at,
                    set_id = excluded.set_id,
                    updated_at = CURRENT_TIMESTAMP
            "#,
            named_params! {
                ":user_id": user_id,
                ":exercise_id": exercise_id,
                ":metric": metric.as_str(),
                ":value": stat.value,
                ":performed_at": &stat.date_iso,
                ":set_id": &stat.set_id,
            },
        )?;

        Ok(())
    }

    /// Drops every stored record of `user_id` and writes `summaries` in their place.
    /// Callers run this inside a transaction so readers never see a partial table.
    pub fn replace_all(
        conn: &Connection,
        user_id: &str,
        summaries: &[ExercisePrSummary],
    ) -> AppResult<()> {
        conn.execute(
            "DELETE FROM personal_records WHERE user_id = :user_id",
            named_params! {":user_id": user_id},
        )?;

        for summary in summaries {
            for metric in PrMetric::all() {
                if let Some(stat) = summary.metric(*metric) {
                    Self::upsert_metric(conn, user_id, &summary.exercise_id, *metric, stat)?;
                }
            }
        }

        Ok(())
    }
}
