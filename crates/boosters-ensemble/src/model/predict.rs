//! Weighted-vote inference over the ensemble.

use ndarray::{Array1, ArrayView2};

use super::BoostingModel;
use crate::utils::Parallelism;

impl BoostingModel {
    /// Weighted margin `Σ wᵢ·hᵢ(x)` for a single row, in training order.
    ///
    /// An empty ensemble scores `0.0`.
    pub fn predict_row(&self, features: &[f32]) -> f64 {
        self.learners()
            .map(|(learner, weight)| weight * learner.predict_row(features))
            .sum()
    }

    /// Binary label from the sign of the margin: `+1.0` when `>= 0`, else `-1.0`.
    pub fn classify_row(&self, features: &[f32]) -> f64 {
        if self.predict_row(features) >= 0.0 {
            1.0
        } else {
            -1.0
        }
    }

    /// Margins for every row of a sample-major `(n_rows, n_features)` matrix.
    pub fn predict_batch(
        &self,
        features: ArrayView2<'_, f32>,
        parallelism: Parallelism,
    ) -> Array1<f64> {
        let margins = parallelism.maybe_par_map(0..features.nrows(), |row_idx| {
            let row = features.row(row_idx);
            match row.as_slice() {
                Some(slice) => self.predict_row(slice),
                None => self.predict_row(&row.to_vec()),
            }
        });
        Array1::from(margins)
    }
}
