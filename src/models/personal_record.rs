use std::fmt;

use serde::{Deserialize, Serialize};

use crate::models::club::ClubProgress;
use crate::utils::units::format_weight;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PrMetric {
    #[serde(rename = "weight")]
    Weight,
    #[serde(rename = "1rm")]
    OneRm,
    #[serde(rename = "volume")]
    Volume,
}

impl PrMetric {
    pub fn all() -> &'static [PrMetric] {
        &[PrMetric::Weight, PrMetric::OneRm, PrMetric::Volume]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PrMetric::Weight => "weight",
            PrMetric::OneRm => "1rm",
            PrMetric::Volume => "volume",
        }
    }
}

impl fmt::Display for PrMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for PrMetric {
    type Error = String;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "weight" => Ok(PrMetric::Weight),
            "1rm" => Ok(PrMetric::OneRm),
            "volume" => Ok(PrMetric::Volume),
            other => Err(format!("unsupported record metric: {other}")),
        }
    }
}

/// One extremal measurement and when it was achieved.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MetricStat {
    pub value: f64,
    #[serde(rename = "dateISO")]
    pub date_iso: String,
    /// Set that produced the record, when known.
    #[serde(rename = "setId", default, skip_serializing_if = "Option::is_none")]
    pub set_id: Option<String>,
}

impl MetricStat {
    pub fn new(value: f64, date_iso: impl Into<String>, set_id: Option<String>) -> Self {
        Self {
            value,
            date_iso: date_iso.into(),
            set_id,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExercisePrSummary {
    #[serde(rename = "exerciseId")]
    pub exercise_id: String,
    #[serde(rename = "exerciseName")]
    pub exercise_name: String,
    #[serde(rename = "weightPR")]
    pub weight_pr: Option<MetricStat>,
    #[serde(rename = "oneRMPR")]
    pub one_rm_pr: Option<MetricStat>,
    #[serde(rename = "volumePR")]
    pub volume_pr: Option<MetricStat>,
}

impl ExercisePrSummary {
    pub fn empty(exercise_id: impl Into<String>, exercise_name: impl Into<String>) -> Self {
        Self {
            exercise_id: exercise_id.into(),
            exercise_name: exercise_name.into(),
            weight_pr: None,
            one_rm_pr: None,
            volume_pr: None,
        }
    }

    pub fn metric(&self, metric: PrMetric) -> Option<&MetricStat> {
        match metric {
            PrMetric::Weight => self.weight_pr.as_ref(),
            PrMetric::OneRm => self.one_rm_pr.as_ref(),
            PrMetric::Volume => self.volume_pr.as_ref(),
        }
    }

    pub fn metric_mut(&mut self, metric: PrMetric) -> &mut Option<MetricStat> {
        match metric {
            PrMetric::Weight => &mut self.weight_pr,
            PrMetric::OneRm => &mut self.one_rm_pr,
            PrMetric::Volume => &mut self.volume_pr,
        }
    }
}

/// Result of the per-set incremental upsert.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct IncrementalPrOutcome {
    pub new_weight: bool,
    #[serde(rename = "new1RM")]
    pub new_one_rm: bool,
    pub new_volume: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub club_total_kg: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub club_just_reached: Option<bool>,
}

impl IncrementalPrOutcome {
    pub fn improved_metrics(&self) -> Vec<PrMetric> {
        let mut metrics = Vec::new();
        if self.new_weight {
            metrics.push(PrMetric::Weight);
        }
        if self.new_one_rm {
            metrics.push(PrMetric::OneRm);
        }
        if self.new_volume {
            metrics.push(PrMetric::Volume);
        }
        metrics
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub enum RecomputeOutcome {
    Applied { summaries: Vec<ExercisePrSummary> },
    /// A newer recompute finished first; this result was discarded.
    Superseded,
}

impl RecomputeOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, RecomputeOutcome::Applied { .. })
    }
}

/// Celebration payload raised after a set is logged.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PrNotification {
    pub exercise_id: String,
    pub exercise_name: String,
    pub metrics: Vec<PrMetric>,
    pub weight_kg: f64,
    pub club: ClubProgress,
    pub club_just_reached: bool,
}

impl PrNotification {
    pub fn has_news(&self) -> bool {
        !self.metrics.is_empty() || self.club_just_reached
    }

    pub fn headline(&self) -> String {
        format!(
            "New PR: {} — {} kg",
            self.exercise_name,
            format_weight(Some(self.weight_kg))
        )
    }
}
