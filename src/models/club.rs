use serde::Serialize;

use crate::utils::units::KG_PER_LB;

/// 1000 avoirdupois pounds expressed in kilograms.
pub const THOUSAND_LB_TARGET_KG: f64 = 1000.0 * KG_PER_LB;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ClubCategory {
    Bench,
    Deadlift,
    Squat,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ClubProgress {
    pub bench_kg: Option<f64>,
    pub deadlift_kg: Option<f64>,
    pub squat_kg: Option<f64>,
    pub total_kg: f64,
    pub percent: f64,
    pub reached_target: bool,
}

impl ClubProgress {
    pub fn empty() -> Self {
        Self {
            bench_kg: None,
            deadlift_kg: None,
            squat_kg: None,
            total_kg: 0.0,
            percent: 0.0,
            reached_target: false,
        }
    }

    pub fn category(&self, category: ClubCategory) -> Option<f64> {
        match category {
            ClubCategory::Bench => self.bench_kg,
            ClubCategory::Deadlift => self.deadlift_kg,
            ClubCategory::Squat => self.squat_kg,
        }
    }
}
