/// Epley estimate of the one-rep max: `weight * (1 + reps / 30)`.
///
/// Pure arithmetic with no validation. `reps == 0` yields `weight` and
/// non-finite weights propagate unchanged, so callers filter beforehand.
pub fn estimate_one_rep_max(weight: f64, reps: u32) -> f64 {
    weight * (1.0 + f64::from(reps) / 30.0)
}
