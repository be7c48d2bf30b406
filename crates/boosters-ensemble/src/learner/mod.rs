//! Weak-learner abstraction.
//!
//! A weak learner is an opaque, already-trained model that the ensemble owns
//! but never inspects. The ensemble only needs a small capability set from it:
//!
//! - [`WeakLearner::type_tag`]: one byte identifying the concrete kind, used to
//!   pick a decoder when reading and for safe downcasting
//! - [`WeakLearner::encode_payload`] / [`LearnerCodec::decode_payload`]: the
//!   algorithm-specific payload stored inside the native format
//! - [`WeakLearner::predict_row`]: the raw score used for the weighted vote
//!
//! Two reference kinds ship with the crate: [`DecisionStump`] and
//! [`LinearLearner`]. Other kinds implement [`WeakLearner`] + [`LearnerCodec`]
//! and are registered with a [`LearnerDecoders`] table.

mod decode;
mod linear;
mod stump;

use std::any::Any;
use std::fmt;

use serde::{Deserialize, Serialize};

pub use decode::{DecodeFn, LearnerDecoders};
pub use linear::LinearLearner;
pub use stump::DecisionStump;

/// One-byte identifier of a concrete weak-learner kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TypeTag(u8);

impl TypeTag {
    /// Create a tag from its raw byte.
    pub const fn new(raw: u8) -> Self {
        Self(raw)
    }

    /// Raw byte as stored in the native format.
    #[inline]
    pub const fn get(self) -> u8 {
        self.0
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#04x}", self.0)
    }
}

/// Object-safe interface of a trained weak learner.
///
/// Learners are moved into the ensemble as `Box<dyn WeakLearner>` and are
/// shared read-only across threads once the ensemble is finalized.
pub trait WeakLearner: Any + fmt::Debug + Send + Sync {
    /// Tag identifying this learner's kind.
    fn type_tag(&self) -> TypeTag;

    /// Raw score for a single row of features.
    ///
    /// Missing features (index past the end of `features`, or NaN) follow the
    /// learner's own missing-value policy.
    fn predict_row(&self, features: &[f32]) -> f64;

    /// Encode the algorithm-specific payload.
    fn encode_payload(&self) -> Result<Vec<u8>, postcard::Error>;

    /// Upcast for downcasting through [`dyn WeakLearner::downcast_ref`].
    fn as_any(&self) -> &dyn Any;
}

/// Static half of the codec: how to rebuild a learner from its payload.
pub trait LearnerCodec: WeakLearner + Sized {
    /// Tag written in front of every payload of this kind.
    const TYPE_TAG: TypeTag;

    /// Decode a payload produced by [`WeakLearner::encode_payload`].
    ///
    /// Returns the learner and the unread remainder of `bytes`, in the manner
    /// of [`postcard::take_from_bytes`]. Readers reject a non-empty remainder.
    fn decode_payload(bytes: &[u8]) -> Result<(Self, &[u8]), postcard::Error>;
}

impl<'a> dyn WeakLearner + 'a {
    /// Returns `true` if the learner is of concrete type `T`.
    pub fn is<T: WeakLearner>(&self) -> bool {
        self.as_any().is::<T>()
    }

    /// Borrow the learner as its concrete type, if it is one.
    pub fn downcast_ref<T: WeakLearner>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn downcast_by_concrete_type() {
        let learner: Box<dyn WeakLearner> = Box::new(DecisionStump::new(0, 0.5, -1.0, 1.0));

        assert!(learner.is::<DecisionStump>());
        assert!(!learner.is::<LinearLearner>());
        assert_eq!(
            learner.downcast_ref::<DecisionStump>().map(|s| s.feature()),
            Some(0)
        );
        assert!(learner.downcast_ref::<LinearLearner>().is_none());
    }

    #[test]
    fn builtin_tags_are_distinct() {
        assert_ne!(DecisionStump::TYPE_TAG, LinearLearner::TYPE_TAG);
        assert_eq!(TypeTag::new(7).get(), 7);
        assert_eq!(TypeTag::new(7).to_string(), "0x07");
    }
}
