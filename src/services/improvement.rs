use std::collections::BTreeSet;

use crate::models::personal_record::{ExercisePrSummary, PrMetric};

/// Metrics whose value in `next` strictly exceeds the one in `previous`.
///
/// A missing or non-finite previous value counts as negative infinity, so the
/// first record for an exercise reports every metric it has. Without a `next`
/// summary nothing improved.
pub fn detect_improved_metrics(
    previous: Option<&ExercisePrSummary>,
    next: Option<&ExercisePrSummary>,
) -> BTreeSet<PrMetric> {
    let Some(next) = next else {
        return BTreeSet::new();
    };

    PrMetric::all()
        .iter()
        .copied()
        .filter(|metric| {
            let Some(candidate) = next.metric(*metric).map(|stat| stat.value) else {
                return false;
            };
            if !candidate.is_finite() {
                return false;
            }
            let baseline = previous
                .and_then(|summary| summary.metric(*metric))
                .map(|stat| stat.value)
                .filter(|value| value.is_finite())
                .unwrap_or(f64::NEG_INFINITY);
            candidate > baseline
        })
        .collect()
}
