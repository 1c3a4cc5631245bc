//! Personal-record aggregation.
//!
//! [`aggregate_personal_records`] rebuilds every summary from raw set history
//! and is the authoritative path. [`apply_incremental`] folds one new set into
//! an existing summary and only ever raises values.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;

use crate::models::personal_record::{ExercisePrSummary, MetricStat, PrMetric};
use crate::models::set_entry::SetRecord;
use crate::services::one_rep_max::estimate_one_rep_max;
use crate::utils::local_day::{to_iso, ViewerTimezone};

/// Display name used when an exercise id has no known name.
pub const UNKNOWN_EXERCISE_NAME: &str = "—";

/// Case-insensitive by exercise name, then by id.
pub fn sort_summaries(summaries: &mut [ExercisePrSummary]) {
    summaries.sort_by(|a, b| {
        a.exercise_name
            .to_lowercase()
            .cmp(&b.exercise_name.to_lowercase())
            .then_with(|| a.exercise_id.cmp(&b.exercise_id))
    });
}

/// Chronological processing order: effective timestamp, then id.
fn chronological(a: &&SetRecord, b: &&SetRecord) -> Ordering {
    a.performed_or_created()
        .cmp(&b.performed_or_created())
        .then_with(|| a.id.cmp(&b.id))
}

/// Replaces `slot` when `candidate` is finite and strictly greater.
/// A missing or non-finite stored value loses to any finite candidate.
fn keep_if_greater(slot: &mut Option<MetricStat>, candidate: MetricStat) -> bool {
    if !candidate.value.is_finite() {
        return false;
    }
    match slot {
        Some(current) if current.value.is_finite() && candidate.value <= current.value => false,
        _ => {
            *slot = Some(candidate);
            true
        }
    }
}

#[derive(Debug, Default)]
struct DayVolume {
    total: f64,
    best_set_id: Option<String>,
    best_set_volume: f64,
}

impl DayVolume {
    fn add(&mut self, set: &SetRecord) {
        let volume = set.volume();
        self.total += volume;
        if self.best_set_id.is_none() || volume > self.best_set_volume {
            self.best_set_id = Some(set.id.clone());
            self.best_set_volume = volume;
        }
    }

    fn into_stat(self, day: NaiveDate, timezone: &ViewerTimezone) -> MetricStat {
        MetricStat::new(self.total, to_iso(&timezone.day_start(day)), self.best_set_id)
    }
}

struct ExerciseAccumulator {
    summary: ExercisePrSummary,
    days: BTreeMap<NaiveDate, DayVolume>,
}

impl ExerciseAccumulator {
    fn record(&mut self, set: &SetRecord, timezone: &ViewerTimezone) {
        let at = set.performed_or_created();
        let date_iso = to_iso(&at);
        keep_if_greater(
            &mut self.summary.weight_pr,
            MetricStat::new(set.weight, date_iso.clone(), Some(set.id.clone())),
        );
        keep_if_greater(
            &mut self.summary.one_rm_pr,
            MetricStat::new(
                estimate_one_rep_max(set.weight, set.reps),
                date_iso,
                Some(set.id.clone()),
            ),
        );
        self.days
            .entry(timezone.local_date(&at))
            .or_default()
            .add(set);
    }

    fn finish(mut self, timezone: &ViewerTimezone) -> ExercisePrSummary {
        // Ascending day order, so the earliest day keeps a tie.
        for (day, volume) in self.days {
            keep_if_greater(&mut self.summary.volume_pr, volume.into_stat(day, timezone));
        }
        self.summary
    }
}

fn exercise_name(names: &HashMap<String, String>, exercise_id: &str) -> String {
    names
        .get(exercise_id)
        .cloned()
        .unwrap_or_else(|| UNKNOWN_EXERCISE_NAME.to_string())
}

/// Rebuilds every per-exercise summary from the complete set history.
///
/// Failed and non-finite sets are ignored. Exercises without an eligible set
/// produce no summary. The result is sorted and does not depend on input order.
pub fn aggregate_personal_records(
    sets: &[SetRecord],
    exercise_names: &HashMap<String, String>,
    timezone: &ViewerTimezone,
) -> Vec<ExercisePrSummary> {
    let mut eligible: Vec<&SetRecord> = sets.iter().filter(|set| set.counts_for_records()).collect();
    eligible.sort_by(chronological);

    let mut by_exercise: HashMap<&str, ExerciseAccumulator> = HashMap::new();
    for set in eligible {
        by_exercise
            .entry(set.exercise_id.as_str())
            .or_insert_with(|| ExerciseAccumulator {
                summary: ExercisePrSummary::empty(
                    set.exercise_id.clone(),
                    exercise_name(exercise_names, &set.exercise_id),
                ),
                days: BTreeMap::new(),
            })
            .record(set, timezone);
    }

    let mut summaries: Vec<_> = by_exercise
        .into_values()
        .map(|accumulator| accumulator.finish(timezone))
        .collect();
    sort_summaries(&mut summaries);
    summaries
}

#[derive(Debug, Clone, PartialEq)]
pub struct IncrementalUpdate {
    pub summary: ExercisePrSummary,
    /// Metrics whose stored value was raised, in `PrMetric` order.
    pub improved: Vec<PrMetric>,
}

/// Folds `set` into `current`.
///
/// `day_sets` are the stored sets around the set's local day; only those of
/// the same exercise and day that count for records are summed, and `set`
/// itself is always included once.
pub fn apply_incremental(
    current: Option<&ExercisePrSummary>,
    set: &SetRecord,
    day_sets: &[SetRecord],
    exercise_name: &str,
    timezone: &ViewerTimezone,
) -> IncrementalUpdate {
    let mut summary = current
        .cloned()
        .unwrap_or_else(|| ExercisePrSummary::empty(set.exercise_id.clone(), exercise_name));
    summary.exercise_name = exercise_name.to_string();

    let mut improved = Vec::new();
    if !set.counts_for_records() {
        return IncrementalUpdate { summary, improved };
    }

    let at = set.performed_or_created();
    let date_iso = to_iso(&at);
    if keep_if_greater(
        &mut summary.weight_pr,
        MetricStat::new(set.weight, date_iso.clone(), Some(set.id.clone())),
    ) {
        improved.push(PrMetric::Weight);
    }
    if keep_if_greater(
        &mut summary.one_rm_pr,
        MetricStat::new(
            estimate_one_rep_max(set.weight, set.reps),
            date_iso,
            Some(set.id.clone()),
        ),
    ) {
        improved.push(PrMetric::OneRm);
    }

    let day = timezone.local_date(&at);
    let mut members: Vec<&SetRecord> = day_sets
        .iter()
        .filter(|other| {
            other.id != set.id
                && other.exercise_id == set.exercise_id
                && other.counts_for_records()
                && timezone.local_date(&other.performed_or_created()) == day
        })
        .collect();
    members.push(set);
    members.sort_by(chronological);

    let mut volume = DayVolume::default();
    for member in members {
        volume.add(member);
    }
    if keep_if_greater(&mut summary.volume_pr, volume.into_stat(day, timezone)) {
        improved.push(PrMetric::Volume);
    }

    IncrementalUpdate { summary, improved }
}
