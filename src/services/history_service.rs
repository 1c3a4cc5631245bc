use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use tracing::debug;

use crate::db::repositories::exercise_repository::{ExerciseRepository, ExerciseRow};
use crate::db::repositories::set_repository::SetRepository;
use crate::db::DbPool;
use crate::error::{AppError, AppResult};
use crate::models::history::{ExerciseBadges, ProgressPoint, Timeframe};
use crate::models::set_entry::SetWithExercise;
use crate::services::one_rep_max::estimate_one_rep_max;
use crate::services::pr_aggregator::UNKNOWN_EXERCISE_NAME;
use crate::services::settings_service::SettingsService;
use crate::utils::local_day::{parse_iso, to_iso, ViewerTimezone};

pub const DEFAULT_RECENT_DAYS: usize = 30;
/// Upper bound on sets scanned when listing recent training days.
const RECENT_SCAN_LIMIT: usize = 1000;
const TREND_WINDOW_DAYS: i64 = 28;

#[derive(Clone)]
pub struct HistoryService {
    db: DbPool,
    settings: Arc<SettingsService>,
}

#[derive(Debug, Default, Clone, Copy)]
struct DayStats {
    heaviest: f64,
    one_rm: f64,
    volume: f64,
}

impl HistoryService {
    pub fn new(db: DbPool, settings: Arc<SettingsService>) -> Self {
        Self { db, settings }
    }

    /// Distinct local days with at least one set, newest first.
    pub fn recent_days(&self, user_id: &str, limit: Option<usize>) -> AppResult<Vec<NaiveDate>> {
        let limit = limit.unwrap_or(DEFAULT_RECENT_DAYS);
        let timezone = self.settings.timezone(user_id)?;
        let timestamps = self.db.with_connection(|conn| {
            SetRepository::list_recent_timestamps(conn, user_id, RECENT_SCAN_LIMIT)
        })?;

        let mut days = BTreeSet::new();
        for value in timestamps {
            days.insert(timezone.local_date(&parse_iso(&value)?));
        }

        Ok(days.into_iter().rev().take(limit).collect())
    }

    /// Sets performed during the local `day`, oldest first.
    pub fn sets_for_day(&self, user_id: &str, day: NaiveDate) -> AppResult<Vec<SetWithExercise>> {
        let timezone = self.settings.timezone(user_id)?;
        let (start, end) = timezone.day_bounds(day);

        let (sets, exercises) = self.db.with_connection(|conn| {
            let sets = SetRepository::list_between(conn, user_id, &to_iso(&start), &to_iso(&end))?;
            let exercises = ExerciseRepository::list_visible(conn, user_id)?;
            Ok((sets, exercises))
        })?;
        let exercises: HashMap<String, ExerciseRow> = exercises
            .into_iter()
            .map(|row| (row.id.clone(), row))
            .collect();

        Ok(sets
            .into_iter()
            .map(|set| {
                let (exercise_name, exercise_label) = match exercises.get(&set.exercise_id) {
                    Some(row) => (
                        row.name.clone(),
                        row.short_name.clone().unwrap_or_else(|| row.name.clone()),
                    ),
                    None => (
                        UNKNOWN_EXERCISE_NAME.to_string(),
                        UNKNOWN_EXERCISE_NAME.to_string(),
                    ),
                };
                SetWithExercise {
                    set,
                    exercise_name,
                    exercise_label,
                }
            })
            .collect())
    }

    /// Distinct exercise labels trained on each of `days`, failed sets included.
    pub fn exercise_badges(
        &self,
        user_id: &str,
        days: &[NaiveDate],
    ) -> AppResult<Vec<ExerciseBadges>> {
        days.iter()
            .map(|day| {
                let labels: BTreeSet<String> = self
                    .sets_for_day(user_id, *day)?
                    .into_iter()
                    .map(|entry| entry.exercise_label)
                    .collect();
                Ok(ExerciseBadges {
                    day: *day,
                    labels: labels.into_iter().collect(),
                })
            })
            .collect()
    }

    /// Daily heaviest weight, best 1RM estimate and volume for one exercise.
    pub fn progress_series(
        &self,
        user_id: &str,
        exercise_id: &str,
        timeframe: Timeframe,
        now: DateTime<Utc>,
    ) -> AppResult<Vec<ProgressPoint>> {
        let timezone = self.settings.timezone(user_id)?;
        let sets = self.db.with_connection(|conn| {
            if ExerciseRepository::find_visible(conn, user_id, exercise_id)?.is_none() {
                return Err(AppError::not_found());
            }
            SetRepository::list_for_exercise(conn, user_id, exercise_id)
        })?;

        let start = timeframe.start(now);
        let mut by_day: BTreeMap<NaiveDate, DayStats> = BTreeMap::new();
        for set in sets.iter().filter(|set| set.counts_for_records()) {
            let performed = set.performed_or_created();
            if start.is_some_and(|start| performed < start) {
                continue;
            }
            let stats = by_day.entry(timezone.local_date(&performed)).or_default();
            stats.heaviest = stats.heaviest.max(set.weight);
            stats.one_rm = stats.one_rm.max(estimate_one_rep_max(set.weight, set.reps));
            stats.volume += set.volume();
        }

        let mut points = build_points(by_day, &timezone);
        apply_trend(&mut points);
        debug!(
            target: "app::history",
            %user_id,
            %exercise_id,
            points = points.len(),
            "progress series built"
        );
        Ok(points)
    }
}

fn build_points(by_day: BTreeMap<NaiveDate, DayStats>, timezone: &ViewerTimezone) -> Vec<ProgressPoint> {
    let positive = |value: f64| (value > 0.0).then_some(value);
    by_day
        .into_iter()
        .map(|(day, stats)| ProgressPoint {
            day,
            date_iso: to_iso(&timezone.day_start(day)),
            heaviest: positive(stats.heaviest),
            one_rm: positive(stats.one_rm),
            volume: stats.volume,
            trend: None,
        })
        .collect()
}

fn week_start(day: NaiveDate) -> NaiveDate {
    day - Duration::days(i64::from(day.weekday().num_days_from_monday()))
}

/// Least-squares line over `values` at x = 0..n, evaluated at the last x.
fn linear_trend(values: &[f64]) -> Option<f64> {
    let n = values.len() as f64;
    let (mut sum_x, mut sum_y, mut sum_xy, mut sum_xx) = (0.0, 0.0, 0.0, 0.0);
    for (index, value) in values.iter().enumerate() {
        let x = index as f64;
        sum_x += x;
        sum_y += value;
        sum_xy += x * value;
        sum_xx += x * x;
    }
    let denominator = n * sum_xx - sum_x * sum_x;
    if denominator == 0.0 {
        return None;
    }
    let slope = (n * sum_xy - sum_x * sum_y) / denominator;
    let intercept = (sum_y - slope * sum_x) / n;
    Some(slope * (n - 1.0) + intercept)
}

/// Fills `trend` for every point that has at least two points and two
/// distinct weeks of heaviest weights within the trailing window.
pub fn apply_trend(points: &mut [ProgressPoint]) {
    let snapshot: Vec<(NaiveDate, Option<f64>)> =
        points.iter().map(|point| (point.day, point.heaviest)).collect();

    for point in points.iter_mut() {
        let window_start = point.day - Duration::days(TREND_WINDOW_DAYS);
        let recent: Vec<&(NaiveDate, Option<f64>)> = snapshot
            .iter()
            .filter(|(day, _)| *day >= window_start && *day <= point.day)
            .collect();
        if recent.len() < 2 {
            continue;
        }

        let mut weekly: BTreeMap<NaiveDate, (f64, usize)> = BTreeMap::new();
        for (day, heaviest) in recent {
            if let Some(weight) = heaviest {
                let entry = weekly.entry(week_start(*day)).or_insert((0.0, 0));
                entry.0 += weight;
                entry.1 += 1;
            }
        }
        if weekly.len() < 2 {
            continue;
        }

        let averages: Vec<f64> = weekly
            .values()
            .map(|(sum, count)| sum / *count as f64)
            .collect();
        point.trend = linear_trend(&averages).map(|value| value.max(0.0));
    }
}
