//! Boosting ensemble container.
//!
//! [`BoostingModel`] owns an ordered sequence of weak learners plus one
//! boosting coefficient per learner. Learners are appended by a training loop
//! while the model is [`Building`](ModelState::Building); once
//! [`finalize`](BoostingModel::finalize)d the model is read-only.
//!
//! # Example
//!
//! ```
//! use boosters_ensemble::learner::DecisionStump;
//! use boosters_ensemble::BoostingModel;
//!
//! let mut model = BoostingModel::new();
//! model.add_weighted_learner(Box::new(DecisionStump::new(0, 0.5, -1.0, 1.0)), 0.8)?;
//! model.add_weighted_learner(Box::new(DecisionStump::new(1, 2.0, -1.0, 1.0)), 0.3)?;
//! model.finalize();
//!
//! let bytes = model.serialize()?;
//! let loaded = BoostingModel::deserialize(&bytes)?;
//! assert_eq!(loaded.number_of_weak_learners(), 2);
//! assert!(loaded.is_finalized());
//! # Ok::<(), boosters_ensemble::EnsembleError>(())
//! ```

mod predict;
mod state;

use std::io::{Read, Write};

pub use state::ModelState;

use crate::error::{EnsembleError, Result};
use crate::io::{self, BinaryReadOptions};
use crate::learner::{LearnerDecoders, WeakLearner};
use crate::registry::LearnerRegistry;
use crate::runtime;

/// Weight recorded by [`BoostingModel::add_weak_learner`].
pub const DEFAULT_WEIGHT: f64 = 1.0;

/// Ordered ensemble of weak learners with per-learner boosting weights.
#[derive(Debug, Default)]
pub struct BoostingModel {
    registry: LearnerRegistry,
    weights: Vec<f64>,
    state: ModelState,
}

impl BoostingModel {
    /// Create an empty model in the `Building` state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty model with room for `capacity` learners.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            registry: LearnerRegistry::with_capacity(capacity),
            weights: Vec::with_capacity(capacity),
            state: ModelState::Building,
        }
    }

    /// Assemble a finalized model from decoded parts.
    pub(crate) fn from_parts(registry: LearnerRegistry, weights: Vec<f64>) -> Self {
        debug_assert_eq!(registry.count(), weights.len());
        Self {
            registry,
            weights,
            state: ModelState::Finalized,
        }
    }

    // =========================================================================
    // Building
    // =========================================================================

    /// Append a learner with weight [`DEFAULT_WEIGHT`].
    ///
    /// Returns the learner's index. Fails with
    /// [`EnsembleError::InvalidState`] once the model is finalized.
    pub fn add_weak_learner(&mut self, learner: Box<dyn WeakLearner>) -> Result<usize> {
        self.add_weighted_learner(learner, DEFAULT_WEIGHT)
    }

    /// Append a learner with an explicit boosting coefficient.
    pub fn add_weighted_learner(
        &mut self,
        learner: Box<dyn WeakLearner>,
        weight: f64,
    ) -> Result<usize> {
        if self.state.is_finalized() {
            return Err(EnsembleError::InvalidState {
                state: self.state,
                operation: "add a weak learner to",
            });
        }
        if !weight.is_finite() {
            return Err(EnsembleError::InvalidWeight(weight));
        }

        let index = self.registry.store(learner);
        self.weights.push(weight);
        Ok(index)
    }

    /// Mark training as complete. Finalizing twice is a no-op.
    pub fn finalize(&mut self) {
        if self.state.is_building() {
            tracing::debug!(n_learners = self.registry.count(), "finalized boosting model");
            self.state = ModelState::Finalized;
        }
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Borrow the learner at `index`.
    pub fn get_weak_learner(&self, index: usize) -> Result<&dyn WeakLearner> {
        self.registry.get(index)
    }

    /// Boosting coefficient of the learner at `index`.
    pub fn weight(&self, index: usize) -> Result<f64> {
        self.weights
            .get(index)
            .copied()
            .ok_or_else(|| EnsembleError::out_of_range(index, self.weights.len()))
    }

    /// All boosting coefficients in training order.
    #[inline]
    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    /// Number of learners in the ensemble.
    #[inline]
    pub fn number_of_weak_learners(&self) -> usize {
        self.registry.count()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.registry.is_empty()
    }

    #[inline]
    pub fn state(&self) -> ModelState {
        self.state
    }

    #[inline]
    pub fn is_finalized(&self) -> bool {
        self.state.is_finalized()
    }

    /// Iterate `(learner, weight)` pairs in training order.
    pub fn learners(&self) -> impl ExactSizeIterator<Item = (&dyn WeakLearner, f64)> + '_ {
        self.registry.iter().zip(self.weights.iter().copied())
    }

    /// Underlying learner storage.
    #[inline]
    pub fn registry(&self) -> &LearnerRegistry {
        &self.registry
    }

    // =========================================================================
    // Persistence
    // =========================================================================

    /// Encode the model in the native format.
    ///
    /// Output is deterministic for a given insertion history and is legal in
    /// either state.
    pub fn serialize(&self) -> Result<Vec<u8>> {
        let mut buf = Vec::with_capacity(io::HEADER_SIZE);
        self.write_into(&mut buf)?;
        Ok(buf)
    }

    /// Stream the native encoding into `writer`.
    pub fn write_into<W: Write>(&self, writer: &mut W) -> Result<()> {
        io::write_model(self, writer)?;
        Ok(())
    }

    /// Decode a model using the process-wide [`runtime`] decoders and options.
    ///
    /// The result is finalized. The whole slice must be consumed.
    pub fn deserialize(bytes: &[u8]) -> Result<Self> {
        let rt = runtime::init();
        Self::deserialize_with(bytes, rt.decoders(), &rt.read_options())
    }

    /// Decode a model with explicit decoders and read limits.
    pub fn deserialize_with(
        bytes: &[u8],
        decoders: &LearnerDecoders,
        options: &BinaryReadOptions,
    ) -> Result<Self> {
        io::read_model_from_slice(bytes, decoders, options).map_err(|e| {
            tracing::warn!(error = %e, len = bytes.len(), "rejected serialized ensemble");
            EnsembleError::from(e)
        })
    }

    /// Decode one model from a stream, leaving any following bytes unread.
    pub fn read_from<R: Read>(
        reader: &mut R,
        decoders: &LearnerDecoders,
        options: &BinaryReadOptions,
    ) -> Result<Self> {
        Ok(io::read_model(reader, decoders, options)?)
    }

    /// Replace this model's contents with a decoded model.
    ///
    /// All-or-nothing: on error `self` is left exactly as it was.
    pub fn restore(&mut self, bytes: &[u8]) -> Result<()> {
        *self = Self::deserialize(bytes)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::learner::{DecisionStump, LinearLearner};

    fn stump(feature: u32) -> Box<dyn WeakLearner> {
        Box::new(DecisionStump::new(feature, 0.5, -1.0, 1.0))
    }

    #[test]
    fn add_then_get_in_order() {
        let mut model = BoostingModel::new();
        for feature in 0..3 {
            assert_eq!(model.add_weak_learner(stump(feature)).unwrap(), feature as usize);
        }

        assert_eq!(model.number_of_weak_learners(), 3);
        for feature in 0..3 {
            let learner = model.get_weak_learner(feature as usize).unwrap();
            assert_eq!(learner.downcast_ref::<DecisionStump>().unwrap().feature(), feature);
        }
        assert!(matches!(
            model.get_weak_learner(3),
            Err(EnsembleError::OutOfRange { index: 3, count: 3 })
        ));
        assert_eq!(model.weights(), &[DEFAULT_WEIGHT; 3]);
    }

    #[test]
    fn finalized_model_rejects_additions() {
        let mut model = BoostingModel::new();
        model.add_weak_learner(stump(0)).unwrap();
        model.finalize();
        model.finalize();

        let err = model.add_weak_learner(stump(1)).unwrap_err();
        assert!(matches!(
            err,
            EnsembleError::InvalidState {
                state: ModelState::Finalized,
                ..
            }
        ));
        assert_eq!(model.number_of_weak_learners(), 1);
        assert!(model.get_weak_learner(0).is_ok());
    }

    #[test]
    fn rejects_non_finite_weight() {
        let mut model = BoostingModel::new();
        for bad in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            assert!(matches!(
                model.add_weighted_learner(stump(0), bad),
                Err(EnsembleError::InvalidWeight(_))
            ));
        }
        assert!(model.is_empty());
        assert!(model.weights().is_empty());
    }

    #[test]
    fn learners_pair_with_weights() {
        let mut model = BoostingModel::with_capacity(2);
        model.add_weighted_learner(stump(0), 0.25).unwrap();
        model
            .add_weighted_learner(Box::new(LinearLearner::new(vec![1.0], 0.0)), 0.75)
            .unwrap();

        let pairs: Vec<(bool, f64)> = model
            .learners()
            .map(|(l, w)| (l.is::<DecisionStump>(), w))
            .collect();
        assert_eq!(pairs, vec![(true, 0.25), (false, 0.75)]);
        assert_eq!(model.weight(1).unwrap(), 0.75);
        assert!(model.weight(2).is_err());
    }

    #[test]
    fn restore_is_all_or_nothing() {
        let mut model = BoostingModel::new();
        model.add_weighted_learner(stump(7), 0.5).unwrap();

        let err = model.restore(b"not a model").unwrap_err();
        assert!(matches!(err, EnsembleError::CorruptData(_)));
        assert_eq!(model.number_of_weak_learners(), 1);
        assert!(!model.is_finalized());

        let mut source = BoostingModel::new();
        source.add_weak_learner(stump(1)).unwrap();
        source.add_weak_learner(stump(2)).unwrap();
        model.restore(&source.serialize().unwrap()).unwrap();
        assert_eq!(model.number_of_weak_learners(), 2);
        assert!(model.is_finalized());
    }
}
