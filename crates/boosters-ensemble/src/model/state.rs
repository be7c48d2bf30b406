//! Lifecycle state of a boosting model.

use std::fmt;

/// Lifecycle state of a [`BoostingModel`](super::BoostingModel).
///
/// `Building -> Finalized` is the only transition. A finalized model is
/// read-only: it can be queried, serialized, and shared across threads, but
/// no learners can be added.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ModelState {
    /// Accepting weak learners from a training loop.
    #[default]
    Building,
    /// Training complete; read-only.
    Finalized,
}

impl ModelState {
    /// Returns `true` while learners can still be added.
    #[inline]
    pub fn is_building(self) -> bool {
        matches!(self, Self::Building)
    }

    /// Returns `true` once the model is read-only.
    #[inline]
    pub fn is_finalized(self) -> bool {
        matches!(self, Self::Finalized)
    }
}

impl fmt::Display for ModelState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Building => f.write_str("building"),
            Self::Finalized => f.write_str("finalized"),
        }
    }
}
