//! Append-only storage of type-erased weak learners.

use crate::error::{EnsembleError, Result};
use crate::learner::WeakLearner;

/// Ordered, append-only collection of weak learners.
///
/// Indices returned by [`store`](Self::store) stay valid for the registry's
/// lifetime: nothing is ever removed or reordered.
#[derive(Debug, Default)]
pub struct LearnerRegistry {
    learners: Vec<Box<dyn WeakLearner>>,
}

impl LearnerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty registry with room for `capacity` learners.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            learners: Vec::with_capacity(capacity),
        }
    }

    /// Append a learner, taking ownership. Returns its 0-based index.
    pub fn store(&mut self, learner: Box<dyn WeakLearner>) -> usize {
        let index = self.learners.len();
        self.learners.push(learner);
        index
    }

    /// Borrow the learner at `index`.
    pub fn get(&self, index: usize) -> Result<&dyn WeakLearner> {
        self.learners
            .get(index)
            .map(|learner| &**learner)
            .ok_or_else(|| EnsembleError::out_of_range(index, self.learners.len()))
    }

    /// Number of stored learners.
    #[inline]
    pub fn count(&self) -> usize {
        self.learners.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.learners.is_empty()
    }

    /// Iterate learners in insertion order.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = &dyn WeakLearner> + '_ {
        self.learners.iter().map(|learner| &**learner)
    }
}
