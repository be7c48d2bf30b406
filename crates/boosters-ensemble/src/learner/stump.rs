//! Single-split decision stump.

use std::any::Any;

use serde::{Deserialize, Serialize};

use super::{LearnerCodec, TypeTag, WeakLearner};

/// Depth-one decision tree: one numeric split, two leaf values.
///
/// Rows with `features[feature] < threshold` go left. NaN and absent
/// features follow `default_left`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionStump {
    feature: u32,
    threshold: f32,
    left_value: f64,
    right_value: f64,
    default_left: bool,
}

impl DecisionStump {
    /// Create a stump sending missing values left.
    pub fn new(feature: u32, threshold: f32, left_value: f64, right_value: f64) -> Self {
        Self {
            feature,
            threshold,
            left_value,
            right_value,
            default_left: true,
        }
    }

    /// Set the direction taken for missing values.
    pub fn with_default_left(mut self, default_left: bool) -> Self {
        self.default_left = default_left;
        self
    }

    /// Split feature index.
    #[inline]
    pub fn feature(&self) -> u32 {
        self.feature
    }

    /// Split threshold.
    #[inline]
    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Leaf values as `(left, right)`.
    #[inline]
    pub fn leaf_values(&self) -> (f64, f64) {
        (self.left_value, self.right_value)
    }

    /// Direction taken for missing values.
    #[inline]
    pub fn default_left(&self) -> bool {
        self.default_left
    }
}

impl WeakLearner for DecisionStump {
    fn type_tag(&self) -> TypeTag {
        Self::TYPE_TAG
    }

    fn predict_row(&self, features: &[f32]) -> f64 {
        let go_left = match features.get(self.feature as usize) {
            Some(&x) if !x.is_nan() => x < self.threshold,
            _ => self.default_left,
        };
        if go_left {
            self.left_value
        } else {
            self.right_value
        }
    }

    fn encode_payload(&self) -> Result<Vec<u8>, postcard::Error> {
        postcard::to_allocvec(self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl LearnerCodec for DecisionStump {
    const TYPE_TAG: TypeTag = TypeTag::new(1);

    fn decode_payload(bytes: &[u8]) -> Result<(Self, &[u8]), postcard::Error> {
        postcard::take_from_bytes(bytes)
    }
}
