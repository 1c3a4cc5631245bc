//! 1000 lb club progress.
//!
//! Exercise names are free text, so categories are recognised by
//! [`NameMatcher`] rules applied to lower-cased names. Each category has an
//! ordered list of tiers and the first tier with any match decides the
//! candidates.

use crate::models::club::{ClubCategory, ClubProgress, THOUSAND_LB_TARGET_KG};
use crate::models::personal_record::ExercisePrSummary;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NameMatcher {
    all_of: Vec<String>,
    any_of: Vec<String>,
    none_of: Vec<String>,
}

fn lowered(needles: &[&str]) -> Vec<String> {
    needles.iter().map(|needle| needle.to_lowercase()).collect()
}

impl NameMatcher {
    pub fn containing_all(needles: &[&str]) -> Self {
        Self {
            all_of: lowered(needles),
            ..Self::default()
        }
    }

    pub fn containing_any(needles: &[&str]) -> Self {
        Self {
            any_of: lowered(needles),
            ..Self::default()
        }
    }

    pub fn excluding(mut self, needles: &[&str]) -> Self {
        self.none_of.extend(lowered(needles));
        self
    }

    pub fn matches(&self, name: &str) -> bool {
        let name = name.to_lowercase();
        self.all_of.iter().all(|needle| name.contains(needle.as_str()))
            && (self.any_of.is_empty()
                || self.any_of.iter().any(|needle| name.contains(needle.as_str())))
            && !self.none_of.iter().any(|needle| name.contains(needle.as_str()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClubCategoryRule {
    pub category: ClubCategory,
    /// Tried in order; later tiers are fallbacks.
    pub tiers: Vec<NameMatcher>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClubDefinition {
    pub rules: Vec<ClubCategoryRule>,
    pub target_kg: f64,
}

impl Default for ClubDefinition {
    fn default() -> Self {
        Self::thousand_pound()
    }
}

impl ClubDefinition {
    pub fn thousand_pound() -> Self {
        Self {
            rules: vec![
                ClubCategoryRule {
                    category: ClubCategory::Bench,
                    tiers: vec![NameMatcher::containing_all(&["bench"])],
                },
                ClubCategoryRule {
                    category: ClubCategory::Deadlift,
                    tiers: vec![NameMatcher::containing_any(&["deadlift", "dead lift"])],
                },
                ClubCategoryRule {
                    category: ClubCategory::Squat,
                    tiers: vec![
                        NameMatcher::containing_all(&["squat", "back"]),
                        NameMatcher::containing_all(&["squat"])
                            .excluding(&["front", "overhead", "zercher"]),
                    ],
                },
            ],
            target_kg: THOUSAND_LB_TARGET_KG,
        }
    }

    /// Best 1RM for `rule`, taken from the first tier that matches anything.
    /// Ties keep the first summary encountered.
    fn best_for(&self, rule: &ClubCategoryRule, summaries: &[ExercisePrSummary]) -> Option<f64> {
        for tier in &rule.tiers {
            let mut best: Option<f64> = None;
            for summary in summaries {
                let Some(value) = summary.one_rm_pr.as_ref().map(|stat| stat.value) else {
                    continue;
                };
                if !value.is_finite() || !tier.matches(&summary.exercise_name) {
                    continue;
                }
                if best.map_or(true, |current| value > current) {
                    best = Some(value);
                }
            }
            if best.is_some() {
                return best;
            }
        }
        None
    }

    pub fn evaluate(&self, summaries: &[ExercisePrSummary]) -> ClubProgress {
        let mut progress = ClubProgress::empty();
        let mut matched = 0usize;

        for rule in &self.rules {
            let best = self.best_for(rule, summaries);
            if let Some(value) = best {
                matched += 1;
                progress.total_kg += value;
            }
            match rule.category {
                ClubCategory::Bench => progress.bench_kg = best,
                ClubCategory::Deadlift => progress.deadlift_kg = best,
                ClubCategory::Squat => progress.squat_kg = best,
            }
        }

        progress.percent = if matched == 0 || self.target_kg <= 0.0 {
            0.0
        } else {
            (progress.total_kg / self.target_kg * 100.0).clamp(0.0, 100.0)
        };
        progress.reached_target = progress.total_kg >= self.target_kg;
        progress
    }
}

/// Progress toward the default 1000 lb target.
pub fn compute_club_progress(summaries: &[ExercisePrSummary]) -> ClubProgress {
    ClubDefinition::thousand_pound().evaluate(summaries)
}

/// Whether the target was crossed between two evaluations.
pub fn club_just_reached(before: &ClubProgress, after: &ClubProgress) -> bool {
    !before.reached_target && after.reached_target
}
