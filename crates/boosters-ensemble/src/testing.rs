//! Test utilities shared by unit tests, integration tests, and benches.
//!
//! Helpers here panic on mismatch; they are meant for tests only.

use approx::abs_diff_eq;

use crate::learner::{DecisionStump, LinearLearner, WeakLearner};
use crate::model::BoostingModel;

/// Default absolute tolerance when comparing f64 predictions.
pub const DEFAULT_TOLERANCE_F64: f64 = 1e-9;

/// Boxed stump with leaves `-1.0` / `+1.0`.
pub fn stump(feature: u32, threshold: f32) -> Box<dyn WeakLearner> {
    Box::new(DecisionStump::new(feature, threshold, -1.0, 1.0))
}

/// Building-state ensemble of `n` learners.
///
/// Alternates stumps and linear learners; learner `i` gets weight
/// `1 / (i + 1)`. Deterministic for a given `n`.
pub fn sample_ensemble(n: usize) -> BoostingModel {
    let mut model = BoostingModel::with_capacity(n);
    for i in 0..n {
        let learner: Box<dyn WeakLearner> = if i % 2 == 0 {
            Box::new(
                DecisionStump::new((i % 4) as u32, i as f32 * 0.25, -(i as f64), i as f64 + 0.5)
                    .with_default_left(i % 3 != 0),
            )
        } else {
            Box::new(LinearLearner::new(
                (0..4).map(|j| (i + j) as f32 * 0.1).collect(),
                i as f64 * -0.01,
            ))
        };
        model
            .add_weighted_learner(learner, 1.0 / (i as f64 + 1.0))
            .expect("sample ensemble is building");
    }
    model
}

/// Assert two ensembles hold the same learners and weights, in the same order.
///
/// Learners are compared through their tags and encoded payloads, weights
/// bit for bit.
pub fn assert_same_ensemble(actual: &BoostingModel, expected: &BoostingModel) {
    assert_eq!(
        actual.number_of_weak_learners(),
        expected.number_of_weak_learners(),
        "learner count differs"
    );

    for (i, ((a, wa), (e, we))) in actual.learners().zip(expected.learners()).enumerate() {
        assert_eq!(a.type_tag(), e.type_tag(), "type tag differs at {i}");
        assert_eq!(
            a.encode_payload().expect("encode actual"),
            e.encode_payload().expect("encode expected"),
            "payload differs at {i}"
        );
        assert_eq!(wa.to_bits(), we.to_bits(), "weight differs at {i}: {wa} vs {we}");
    }
}

/// Assert predictions match within `tolerance`.
pub fn assert_predictions_close(actual: &[f64], expected: &[f64], tolerance: f64) {
    assert_eq!(actual.len(), expected.len(), "prediction count differs");
    for (i, (&a, &e)) in actual.iter().zip(expected).enumerate() {
        assert!(
            abs_diff_eq!(a, e, epsilon = tolerance),
            "prediction {i}: got {a}, expected {e} (tolerance {tolerance})"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_ensemble_is_deterministic() {
        let a = sample_ensemble(5);
        let b = sample_ensemble(5);
        assert_same_ensemble(&a, &b);
        assert!(!a.is_finalized());
    }

    #[test]
    #[should_panic(expected = "learner count differs")]
    fn detects_count_mismatch() {
        assert_same_ensemble(&sample_ensemble(2), &sample_ensemble(3));
    }
}
