use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::utils::units::WeightUnit;

/// One logged set. Weight is always stored in kilograms.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SetRecord {
    pub id: String,
    pub user_id: String,
    pub exercise_id: String,
    pub weight: f64,
    pub reps: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rpe: Option<f64>,
    pub failed: bool,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub performed_at: Option<DateTime<Utc>>,
}

impl SetRecord {
    /// When the set happened: `performed_at`, falling back to `created_at`.
    pub fn performed_or_created(&self) -> DateTime<Utc> {
        self.performed_at.unwrap_or(self.created_at)
    }

    /// Whether the set may contribute to any personal record.
    pub fn counts_for_records(&self) -> bool {
        !self.failed && self.weight.is_finite()
    }

    pub fn volume(&self) -> f64 {
        self.weight * f64::from(self.reps)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetCreateInput {
    pub exercise_id: String,
    /// Expressed in `unit`, or in the preferred unit when `unit` is absent.
    pub weight: f64,
    pub reps: u32,
    #[serde(default)]
    pub rpe: Option<f64>,
    #[serde(default)]
    pub failed: bool,
    #[serde(default)]
    pub performed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub unit: Option<WeightUnit>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetUpdateInput {
    #[serde(default)]
    pub exercise_id: Option<String>,
    #[serde(default)]
    pub weight: Option<f64>,
    #[serde(default)]
    pub reps: Option<u32>,
    #[serde(default, deserialize_with = "crate::models::double_option")]
    pub rpe: Option<Option<f64>>,
    #[serde(default)]
    pub failed: Option<bool>,
    #[serde(default, deserialize_with = "crate::models::double_option")]
    pub performed_at: Option<Option<DateTime<Utc>>>,
    #[serde(default)]
    pub unit: Option<WeightUnit>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SetWithExercise {
    #[serde(flatten)]
    pub set: SetRecord,
    pub exercise_name: String,
    pub exercise_label: String,
}
