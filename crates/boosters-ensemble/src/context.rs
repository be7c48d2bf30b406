//! Context-scoped model handles.
//!
//! A [`Context`] is an arena that owns [`BoostingModel`]s and hands out
//! [`ModelHandle`]s to them. Handles are small `Copy` tokens that can cross
//! API boundaries (including as a raw `u128`, see [`ModelHandle::raw`]) without
//! aliasing the model itself. The raw form names its owning context, so it is
//! unique across the process.
//!
//! Each slot carries a generation counter. Releasing a model bumps the
//! generation, so stale handles are detected instead of silently reaching a
//! different model that reused the slot. Releasing the whole context drops
//! every model it owns; any later call fails with
//! [`EnsembleError::UseAfterRelease`].
//!
//! # Example
//!
//! ```
//! use boosters_ensemble::learner::DecisionStump;
//! use boosters_ensemble::Context;
//!
//! let mut ctx = Context::new();
//! let handle = ctx.create_model()?;
//! ctx.add_weak_learner(handle, Box::new(DecisionStump::new(0, 0.5, -1.0, 1.0)))?;
//! ctx.finalize(handle)?;
//!
//! // The raw form can be passed around and rehydrated later.
//! let same = ctx.rehydrate(handle.raw())?;
//! assert_eq!(ctx.number_of_weak_learners(same)?, 1);
//!
//! ctx.release();
//! assert!(ctx.number_of_weak_learners(handle).is_err());
//! # Ok::<(), boosters_ensemble::EnsembleError>(())
//! ```

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::{EnsembleError, Released, Result};
use crate::io::{self, BinaryReadOptions};
use crate::learner::{LearnerDecoders, WeakLearner};
use crate::model::BoostingModel;
use crate::runtime;

static NEXT_CONTEXT_ID: AtomicU64 = AtomicU64::new(1);

/// Generation given to a freshly allocated slot. Zero is never valid, so a
/// raw handle with zero generation bits never resolves.
const FIRST_GENERATION: u32 = 1;

// =============================================================================
// Identifiers
// =============================================================================

/// Process-unique context identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ContextId(u64);

impl ContextId {
    fn next() -> Self {
        Self(NEXT_CONTEXT_ID.fetch_add(1, Ordering::Relaxed))
    }

    #[inline]
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ctx#{}", self.0)
    }
}

/// Stable reference to a model owned by one [`Context`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ModelHandle {
    context: ContextId,
    index: u32,
    generation: u32,
}

impl ModelHandle {
    /// Owning context.
    #[inline]
    pub fn context(&self) -> ContextId {
        self.context
    }

    /// Numeric form, `context << 64 | generation << 32 | slot`.
    ///
    /// Pass it back through [`Context::rehydrate`] on the owning context to
    /// recover the handle.
    #[inline]
    pub fn raw(&self) -> u128 {
        (u128::from(self.context.0) << 64)
            | (u128::from(self.generation) << 32)
            | u128::from(self.index)
    }

    fn from_raw(raw: u128) -> Self {
        Self {
            context: ContextId((raw >> 64) as u64),
            index: raw as u32,
            generation: (raw >> 32) as u32,
        }
    }
}

impl fmt::Display for ModelHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}v{}", self.context, self.index, self.generation)
    }
}

// =============================================================================
// Context
// =============================================================================

#[derive(Debug)]
struct Slot {
    generation: u32,
    model: Option<BoostingModel>,
}

/// Owning scope for a set of models.
///
/// Mutation requires `&mut Context`, so a context has a single writer at a
/// time. Finalized models can be read from many threads through `&Context`.
#[derive(Debug)]
pub struct Context {
    id: ContextId,
    slots: Vec<Slot>,
    free: Vec<u32>,
    live: usize,
    released: bool,
    decoders: LearnerDecoders,
    read_options: BinaryReadOptions,
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

impl Context {
    /// Create a context configured from the process-wide [`runtime`].
    pub fn new() -> Self {
        runtime::init().new_context()
    }

    /// Create a context with its own decoders and read limits.
    pub fn with_decoders(decoders: LearnerDecoders, read_options: BinaryReadOptions) -> Self {
        let id = ContextId::next();
        tracing::debug!(context = %id, "created context");
        Self {
            id,
            slots: Vec::new(),
            free: Vec::new(),
            live: 0,
            released: false,
            decoders,
            read_options,
        }
    }

    #[inline]
    pub fn id(&self) -> ContextId {
        self.id
    }

    /// Whether [`release`](Self::release) has run.
    #[inline]
    pub fn is_released(&self) -> bool {
        self.released
    }

    /// Number of live models.
    #[inline]
    pub fn len(&self) -> usize {
        self.live
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Handles of all live models, in slot order.
    pub fn handles(&self) -> Vec<ModelHandle> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.model.is_some())
            .map(|(index, slot)| ModelHandle {
                context: self.id,
                index: index as u32,
                generation: slot.generation,
            })
            .collect()
    }

    // =========================================================================
    // Construction
    // =========================================================================

    /// Create an empty, building model owned by this context.
    pub fn create_model(&mut self) -> Result<ModelHandle> {
        self.adopt(BoostingModel::new())
    }

    /// Take ownership of a model produced elsewhere, without copying it.
    pub fn adopt(&mut self, model: BoostingModel) -> Result<ModelHandle> {
        self.ensure_live()?;

        let index = match self.free.pop() {
            Some(index) => index,
            None => {
                let index = next_slot_index(self.slots.len(), self.id)?;
                self.slots.push(Slot {
                    generation: FIRST_GENERATION,
                    model: None,
                });
                index
            }
        };

        let slot = &mut self.slots[index as usize];
        slot.model = Some(model);
        self.live += 1;

        let handle = ModelHandle {
            context: self.id,
            index,
            generation: slot.generation,
        };
        tracing::trace!(%handle, "model added to context");
        Ok(handle)
    }

    /// Recover a handle from its [`raw`](ModelHandle::raw) form.
    ///
    /// Fails with [`EnsembleError::ForeignHandle`] if the raw value was minted
    /// by another context, [`EnsembleError::UnknownHandle`] if it names no
    /// slot, and [`EnsembleError::UseAfterRelease`] if the slot has since been
    /// released.
    pub fn rehydrate(&self, raw: u128) -> Result<ModelHandle> {
        let handle = ModelHandle::from_raw(raw);
        self.check_owner(handle)?;

        let slot = self
            .slots
            .get(handle.index as usize)
            .filter(|_| handle.generation >= FIRST_GENERATION)
            .ok_or(EnsembleError::UnknownHandle {
                raw,
                context: self.id,
            })?;

        if slot.generation != handle.generation || slot.model.is_none() {
            return Err(EnsembleError::UseAfterRelease(Released::Model(handle)));
        }
        Ok(handle)
    }

    // =========================================================================
    // Access
    // =========================================================================

    fn ensure_live(&self) -> Result<()> {
        if self.released {
            return Err(EnsembleError::UseAfterRelease(Released::Context(self.id)));
        }
        Ok(())
    }

    fn check_owner(&self, handle: ModelHandle) -> Result<()> {
        self.ensure_live()?;
        if handle.context != self.id {
            return Err(EnsembleError::ForeignHandle {
                handle,
                context: self.id,
            });
        }
        Ok(())
    }

    /// Borrow the model behind `handle`.
    pub fn model(&self, handle: ModelHandle) -> Result<&BoostingModel> {
        self.check_owner(handle)?;
        self.slots
            .get(handle.index as usize)
            .filter(|slot| slot.generation == handle.generation)
            .and_then(|slot| slot.model.as_ref())
            .ok_or(EnsembleError::UseAfterRelease(Released::Model(handle)))
    }

    /// Mutably borrow the model behind `handle`.
    pub fn model_mut(&mut self, handle: ModelHandle) -> Result<&mut BoostingModel> {
        self.check_owner(handle)?;
        self.slots
            .get_mut(handle.index as usize)
            .filter(|slot| slot.generation == handle.generation)
            .and_then(|slot| slot.model.as_mut())
            .ok_or(EnsembleError::UseAfterRelease(Released::Model(handle)))
    }

    // =========================================================================
    // Model operations
    // =========================================================================

    /// See [`BoostingModel::add_weak_learner`].
    pub fn add_weak_learner(
        &mut self,
        handle: ModelHandle,
        learner: Box<dyn WeakLearner>,
    ) -> Result<usize> {
        self.model_mut(handle)?.add_weak_learner(learner)
    }

    /// See [`BoostingModel::add_weighted_learner`].
    pub fn add_weighted_learner(
        &mut self,
        handle: ModelHandle,
        learner: Box<dyn WeakLearner>,
        weight: f64,
    ) -> Result<usize> {
        self.model_mut(handle)?.add_weighted_learner(learner, weight)
    }

    /// Borrow a learner by signed index.
    ///
    /// Negative indices fail with [`EnsembleError::OutOfRange`] like any other
    /// index outside `[0, count)`.
    pub fn get_weak_learner(&self, handle: ModelHandle, index: i64) -> Result<&dyn WeakLearner> {
        let model = self.model(handle)?;
        let index = checked_index(index, model.number_of_weak_learners())?;
        model.get_weak_learner(index)
    }

    /// Boosting coefficient by signed index.
    pub fn weight(&self, handle: ModelHandle, index: i64) -> Result<f64> {
        let model = self.model(handle)?;
        let index = checked_index(index, model.number_of_weak_learners())?;
        model.weight(index)
    }

    pub fn number_of_weak_learners(&self, handle: ModelHandle) -> Result<usize> {
        Ok(self.model(handle)?.number_of_weak_learners())
    }

    /// Signal that training is complete.
    pub fn finalize(&mut self, handle: ModelHandle) -> Result<()> {
        self.model_mut(handle)?.finalize();
        Ok(())
    }

    pub fn serialize(&self, handle: ModelHandle) -> Result<Vec<u8>> {
        self.model(handle)?.serialize()
    }

    /// Decode a model into a new slot. The model is finalized.
    pub fn deserialize(&mut self, bytes: &[u8]) -> Result<ModelHandle> {
        self.ensure_live()?;
        let model = self.decode(bytes)?;
        self.adopt(model)
    }

    /// Replace the model behind `handle` with a decoded one.
    ///
    /// All-or-nothing: on error the existing model is untouched.
    pub fn load_into(&mut self, handle: ModelHandle, bytes: &[u8]) -> Result<()> {
        self.model(handle)?;
        let decoded = self.decode(bytes)?;
        *self.model_mut(handle)? = decoded;
        Ok(())
    }

    fn decode(&self, bytes: &[u8]) -> Result<BoostingModel> {
        io::read_model_from_slice(bytes, &self.decoders, &self.read_options).map_err(|e| {
            tracing::warn!(context = %self.id, error = %e, "rejected serialized ensemble");
            EnsembleError::from(e)
        })
    }

    // =========================================================================
    // Teardown
    // =========================================================================

    /// Move the model out of the context, invalidating `handle`.
    pub fn take(&mut self, handle: ModelHandle) -> Result<BoostingModel> {
        self.model(handle)?;
        let slot = &mut self.slots[handle.index as usize];
        let model = slot.model.take();
        self.vacate(handle.index);
        model.ok_or(EnsembleError::UseAfterRelease(Released::Model(handle)))
    }

    /// Drop the model behind `handle`, invalidating it.
    pub fn release_model(&mut self, handle: ModelHandle) -> Result<()> {
        self.take(handle).map(drop)
    }

    /// Bump the slot generation and recycle it, unless the generation is spent.
    fn vacate(&mut self, index: u32) {
        let slot = &mut self.slots[index as usize];
        self.live -= 1;
        // A spent slot is retired: left vacant and never handed out again.
        if let Some(next) = slot.generation.checked_add(1) {
            slot.generation = next;
            self.free.push(index);
        }
    }

    /// Tear down the context, dropping every model it owns.
    ///
    /// Idempotent. Afterwards every operation fails with
    /// [`EnsembleError::UseAfterRelease`].
    pub fn release(&mut self) {
        if self.released {
            return;
        }
        tracing::debug!(context = %self.id, live = self.live, "releasing context");
        self.released = true;
        self.slots.clear();
        self.free.clear();
        self.live = 0;
    }
}

impl Drop for Context {
    fn drop(&mut self) {
        self.release();
    }
}

/// Index for a slot appended after `len` existing ones.
fn next_slot_index(len: usize, context: ContextId) -> Result<u32> {
    u32::try_from(len).map_err(|_| EnsembleError::ContextFull { context })
}

fn checked_index(index: i64, count: usize) -> Result<usize> {
    usize::try_from(index)
        .ok()
        .filter(|&i| i < count)
        .ok_or(EnsembleError::OutOfRange { index, count })
}
