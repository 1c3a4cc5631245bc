//! Orchestrates record recomputation against a [`PersonalRecordStore`].
//!
//! Full recomputes are ordered by ticket: each one draws a ticket before it
//! reads, and a result is only written if no newer ticket has committed for
//! the same user. The incremental path feeds notifications only; whatever a
//! full recompute writes is authoritative.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use tracing::{debug, info, warn};

use crate::db::store::PersonalRecordStore;
use crate::error::{AppError, AppResult};
use crate::models::club::ClubProgress;
use crate::models::personal_record::{
    ExercisePrSummary, IncrementalPrOutcome, PrMetric, PrNotification, RecomputeOutcome,
};
use crate::models::set_entry::SetRecord;
use crate::services::club_progress::{club_just_reached, ClubDefinition};
use crate::services::improvement::detect_improved_metrics;
use crate::services::pr_aggregator::{aggregate_personal_records, UNKNOWN_EXERCISE_NAME};
use crate::services::settings_service::SettingsService;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct RecomputeTicket(u64);

pub struct PrService {
    store: Arc<dyn PersonalRecordStore>,
    settings: Arc<SettingsService>,
    club: ClubDefinition,
    next_ticket: AtomicU64,
    committed: Mutex<HashMap<String, u64>>,
}

fn find_summary<'a>(
    summaries: &'a [ExercisePrSummary],
    exercise_id: &str,
) -> Option<&'a ExercisePrSummary> {
    summaries
        .iter()
        .find(|summary| summary.exercise_id == exercise_id)
}

impl PrService {
    pub fn new(store: Arc<dyn PersonalRecordStore>, settings: Arc<SettingsService>) -> Self {
        Self {
            store,
            settings,
            club: ClubDefinition::default(),
            next_ticket: AtomicU64::new(0),
            committed: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_club_definition(mut self, club: ClubDefinition) -> Self {
        self.club = club;
        self
    }

    pub fn club_definition(&self) -> &ClubDefinition {
        &self.club
    }

    pub fn begin_recompute(&self) -> RecomputeTicket {
        RecomputeTicket(self.next_ticket.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// Aggregates the user's full history without writing anything.
    pub fn compute_summaries(&self, user_id: &str) -> AppResult<Vec<ExercisePrSummary>> {
        let timezone = self.settings.timezone(user_id)?;
        let sets = self.store.list_all_sets(user_id)?;
        let names = self.store.exercise_names(user_id)?;
        Ok(aggregate_personal_records(&sets, &names, &timezone))
    }

    /// Writes `summaries` unless a recompute with a newer ticket already did.
    pub fn finish_recompute(
        &self,
        user_id: &str,
        ticket: RecomputeTicket,
        summaries: Vec<ExercisePrSummary>,
    ) -> AppResult<RecomputeOutcome> {
        let mut committed = self
            .committed
            .lock()
            .map_err(|_| AppError::other("recompute bookkeeping lock poisoned"))?;

        let latest = committed.get(user_id).copied().unwrap_or(0);
        if ticket.0 < latest {
            debug!(
                target: "app::records",
                %user_id,
                ticket = ticket.0,
                latest,
                "discarding superseded recompute"
            );
            return Ok(RecomputeOutcome::Superseded);
        }

        self.store.replace_pr_summaries(user_id, &summaries)?;
        committed.insert(user_id.to_string(), ticket.0);
        info!(
            target: "app::records",
            %user_id,
            exercises = summaries.len(),
            "personal records recomputed"
        );
        Ok(RecomputeOutcome::Applied { summaries })
    }

    pub fn recompute_all(&self, user_id: &str) -> AppResult<RecomputeOutcome> {
        let ticket = self.begin_recompute();
        let summaries = self.compute_summaries(user_id)?;
        self.finish_recompute(user_id, ticket, summaries)
    }

    pub fn summaries(&self, user_id: &str) -> AppResult<Vec<ExercisePrSummary>> {
        self.store.read_pr_summaries(user_id)
    }

    pub fn club_progress(&self, user_id: &str) -> AppResult<ClubProgress> {
        Ok(self.club.evaluate(&self.summaries(user_id)?))
    }

    /// Incremental upsert for `set_id`, with the club fields filled in.
    pub fn upsert_incremental(&self, user_id: &str, set_id: &str) -> AppResult<IncrementalPrOutcome> {
        let previous = self.store.read_pr_summaries(user_id)?;
        let (outcome, _) = self.upsert_with_club(user_id, set_id, &previous)?;
        Ok(outcome)
    }

    fn upsert_with_club(
        &self,
        user_id: &str,
        set_id: &str,
        previous: &[ExercisePrSummary],
    ) -> AppResult<(IncrementalPrOutcome, Vec<ExercisePrSummary>)> {
        let timezone = self.settings.timezone(user_id)?;
        let mut outcome = self
            .store
            .upsert_incremental_pr(user_id, set_id, &timezone)?;
        let current = self.store.read_pr_summaries(user_id)?;

        let before = self.club.evaluate(previous);
        let after = self.club.evaluate(&current);
        outcome.club_total_kg = Some(after.total_kg);
        outcome.club_just_reached = Some(club_just_reached(&before, &after));
        Ok((outcome, current))
    }

    /// Updates records after `set` was stored and describes what improved.
    ///
    /// Tries the incremental path first. If that fails the error is logged,
    /// a full recompute runs instead and improvements are derived by diffing
    /// the summaries from before and after.
    pub fn process_new_set(&self, user_id: &str, set: &SetRecord) -> AppResult<PrNotification> {
        let previous = self.store.read_pr_summaries(user_id)?;
        let club_before = self.club.evaluate(&previous);

        let (metrics, current) = match self.upsert_with_club(user_id, &set.id, &previous) {
            Ok((outcome, current)) => (outcome.improved_metrics(), current),
            Err(err) => {
                warn!(
                    target: "app::records",
                    %user_id,
                    set_id = %set.id,
                    error = %err,
                    "incremental record update failed, running full recompute"
                );
                let current = match self.recompute_all(user_id)? {
                    RecomputeOutcome::Applied { summaries } => summaries,
                    RecomputeOutcome::Superseded => self.store.read_pr_summaries(user_id)?,
                };
                let metrics: Vec<PrMetric> = detect_improved_metrics(
                    find_summary(&previous, &set.exercise_id),
                    find_summary(&current, &set.exercise_id),
                )
                .into_iter()
                .collect();
                (metrics, current)
            }
        };

        let club = self.club.evaluate(&current);
        let exercise_name = match find_summary(&current, &set.exercise_id) {
            Some(summary) => summary.exercise_name.clone(),
            None => self
                .store
                .exercise_names(user_id)?
                .remove(&set.exercise_id)
                .unwrap_or_else(|| UNKNOWN_EXERCISE_NAME.to_string()),
        };

        let notification = PrNotification {
            exercise_id: set.exercise_id.clone(),
            exercise_name,
            metrics,
            weight_kg: set.weight,
            club_just_reached: club_just_reached(&club_before, &club),
            club,
        };
        if notification.has_news() {
            info!(
                target: "app::records",
                %user_id,
                exercise_id = %notification.exercise_id,
                metrics = ?notification.metrics,
                club_just_reached = notification.club_just_reached,
                "new personal record"
            );
        }
        Ok(notification)
    }
}
