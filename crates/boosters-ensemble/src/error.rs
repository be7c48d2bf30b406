//! Error taxonomy for ensemble operations.
//!
//! [`EnsembleError`] is the single error type returned by the container,
//! registry, and context APIs. Format-level failures are carried as
//! [`DecodeError`] / [`EncodeError`] from the [`io`](crate::io) module.

use std::fmt;

use thiserror::Error;

use crate::context::{ContextId, ModelHandle};
use crate::io::{DecodeError, EncodeError};
use crate::learner::TypeTag;
use crate::model::ModelState;

/// Convenience alias used throughout the crate.
pub type Result<T, E = EnsembleError> = std::result::Result<T, E>;

/// What was released when a [`EnsembleError::UseAfterRelease`] occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Released {
    /// The whole context was torn down.
    Context(ContextId),
    /// A single model was released (or moved out) of its context.
    Model(ModelHandle),
}

impl fmt::Display for Released {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Context(id) => write!(f, "context {id}"),
            Self::Model(handle) => write!(f, "model {handle}"),
        }
    }
}

/// Errors returned by ensemble, registry, and context operations.
#[derive(Debug, Error)]
pub enum EnsembleError {
    /// Index outside `[0, count)`. Recoverable: retry with a valid index.
    #[error("weak learner index {index} out of range for ensemble of {count}")]
    OutOfRange { index: i64, count: usize },

    /// Mutation attempted on a model that no longer accepts it.
    #[error("cannot {operation} a {state} model")]
    InvalidState {
        state: ModelState,
        operation: &'static str,
    },

    /// Serialized input was malformed. The target container is unchanged.
    #[error("corrupt model data: {0}")]
    CorruptData(#[from] DecodeError),

    /// The ensemble could not be encoded.
    #[error("failed to encode model: {0}")]
    Encode(#[from] EncodeError),

    /// A handle (or its context) was used after being released.
    #[error("use after release of {0}")]
    UseAfterRelease(Released),

    /// A handle minted by one context was presented to another.
    #[error("handle {handle} does not belong to context {context}")]
    ForeignHandle {
        handle: ModelHandle,
        context: ContextId,
    },

    /// A raw handle value names no slot in the context.
    #[error("raw handle {raw:#034x} does not name a model in context {context}")]
    UnknownHandle { raw: u128, context: ContextId },

    /// The context has handed out every slot index it can address.
    #[error("context {context} has no free model slots")]
    ContextFull { context: ContextId },

    /// Boosting weights must be finite.
    #[error("boosting weight must be finite, got {0}")]
    InvalidWeight(f64),

    /// A decoder for this type tag is already registered.
    #[error("a decoder for type tag {0} is already registered")]
    DuplicateTypeTag(TypeTag),
}

impl EnsembleError {
    /// Build an [`OutOfRange`](Self::OutOfRange) error from an unsigned index.
    pub(crate) fn out_of_range(index: usize, count: usize) -> Self {
        Self::OutOfRange {
            index: i64::try_from(index).unwrap_or(i64::MAX),
            count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn out_of_range_saturates_huge_indices() {
        let err = EnsembleError::out_of_range(usize::MAX, 3);
        assert!(matches!(
            err,
            EnsembleError::OutOfRange {
                index: i64::MAX,
                count: 3
            }
        ));
    }

    #[test]
    fn messages_name_the_operation() {
        let err = EnsembleError::InvalidState {
            state: ModelState::Finalized,
            operation: "add a weak learner to",
        };
        assert_eq!(err.to_string(), "cannot add a weak learner to a finalized model");

        let err = EnsembleError::OutOfRange { index: -1, count: 0 };
        assert_eq!(
            err.to_string(),
            "weak learner index -1 out of range for ensemble of 0"
        );
    }
}
