//! Linear weak learner.

use std::any::Any;

use serde::{Deserialize, Serialize};

use super::{LearnerCodec, TypeTag, WeakLearner};

/// Linear score `bias + Σ wᵢ·xᵢ`.
///
/// NaN features contribute nothing; features beyond `weights.len()` are
/// ignored, and missing trailing features count as zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearLearner {
    weights: Vec<f32>,
    bias: f64,
}

impl LinearLearner {
    pub fn new(weights: Vec<f32>, bias: f64) -> Self {
        Self { weights, bias }
    }

    #[inline]
    pub fn weights(&self) -> &[f32] {
        &self.weights
    }

    #[inline]
    pub fn bias(&self) -> f64 {
        self.bias
    }
}

impl WeakLearner for LinearLearner {
    fn type_tag(&self) -> TypeTag {
        Self::TYPE_TAG
    }

    fn predict_row(&self, features: &[f32]) -> f64 {
        self.weights
            .iter()
            .zip(features)
            .filter(|(_, x)| !x.is_nan())
            .fold(self.bias, |acc, (&w, &x)| acc + w as f64 * x as f64)
    }

    fn encode_payload(&self) -> Result<Vec<u8>, postcard::Error> {
        postcard::to_allocvec(self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl LearnerCodec for LinearLearner {
    const TYPE_TAG: TypeTag = TypeTag::new(2);

    fn decode_payload(bytes: &[u8]) -> Result<(Self, &[u8]), postcard::Error> {
        postcard::take_from_bytes(bytes)
    }
}
