//! Type-tag to decoder table.

use std::collections::BTreeMap;
use std::fmt;

use super::{DecisionStump, LearnerCodec, LinearLearner, TypeTag, WeakLearner};
use crate::error::{EnsembleError, Result};

/// Type-erased decoder for one learner kind.
///
/// Returns the learner and the number of payload bytes left unread.
pub type DecodeFn = fn(&[u8]) -> Result<(Box<dyn WeakLearner>, usize), postcard::Error>;

fn decode_boxed<L: LearnerCodec>(
    bytes: &[u8],
) -> Result<(Box<dyn WeakLearner>, usize), postcard::Error> {
    let (learner, rest) = L::decode_payload(bytes)?;
    Ok((Box::new(learner), rest.len()))
}

/// Decoders keyed by [`TypeTag`].
///
/// Reading a model looks up every block's tag here; a tag with no entry is
/// reported as corrupt data.
#[derive(Clone)]
pub struct LearnerDecoders {
    table: BTreeMap<TypeTag, DecodeFn>,
}

impl LearnerDecoders {
    /// A table with no decoders.
    pub fn empty() -> Self {
        Self {
            table: BTreeMap::new(),
        }
    }

    /// A table with the built-in learner kinds.
    pub fn builtin() -> Self {
        let mut table = BTreeMap::new();
        table.insert(DecisionStump::TYPE_TAG, decode_boxed::<DecisionStump> as DecodeFn);
        table.insert(LinearLearner::TYPE_TAG, decode_boxed::<LinearLearner> as DecodeFn);
        Self { table }
    }

    /// Register the decoder for `L`.
    ///
    /// Fails with [`EnsembleError::DuplicateTypeTag`] if the tag is taken.
    pub fn register<L: LearnerCodec>(&mut self) -> Result<()> {
        if self.table.contains_key(&L::TYPE_TAG) {
            return Err(EnsembleError::DuplicateTypeTag(L::TYPE_TAG));
        }
        self.table.insert(L::TYPE_TAG, decode_boxed::<L>);
        Ok(())
    }

    /// Builder-style [`register`](Self::register).
    pub fn with<L: LearnerCodec>(mut self) -> Result<Self> {
        self.register::<L>()?;
        Ok(self)
    }

    /// Whether a decoder exists for `tag`.
    pub fn contains(&self, tag: TypeTag) -> bool {
        self.table.contains_key(&tag)
    }

    /// Registered tags in ascending order.
    pub fn tags(&self) -> impl Iterator<Item = TypeTag> + '_ {
        self.table.keys().copied()
    }

    /// Decode a payload, or `None` when `tag` is unknown.
    pub(crate) fn decode(
        &self,
        tag: TypeTag,
        payload: &[u8],
    ) -> Option<Result<(Box<dyn WeakLearner>, usize), postcard::Error>> {
        self.table.get(&tag).map(|decode| decode(payload))
    }
}

impl Default for LearnerDecoders {
    fn default() -> Self {
        Self::builtin()
    }
}

impl fmt::Debug for LearnerDecoders {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.table.keys()).finish()
    }
}
