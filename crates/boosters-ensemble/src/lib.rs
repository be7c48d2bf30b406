//! boosters-ensemble: a container for boosted ensembles of weak learners.
//!
//! A boosting algorithm trains weak learners one at a time and appends each
//! one to a [`BoostingModel`]. Once training is done the model is finalized,
//! after which it can be queried, evaluated and persisted in a compact binary
//! format.
//!
//! # Key Types
//!
//! - [`BoostingModel`] - Ordered ensemble with per-learner weights
//! - [`WeakLearner`] / [`LearnerCodec`] - Capability set a learner must provide
//! - [`LearnerDecoders`] - Type tag to decoder table used when reading
//! - [`Context`] / [`ModelHandle`] - Handle-based ownership with release semantics
//!
//! # Persistence
//!
//! See the [`io`] module for the native format. [`BoostingModel::serialize`]
//! and [`BoostingModel::deserialize`] are the usual entry points.
//!
//! # Runtime
//!
//! Call [`init`] once at program start (or [`runtime::init_with`] to register
//! additional learner kinds). Everything that needs the default decoders calls
//! it lazily, so explicit initialization is only required for custom kinds.

// Re-export approx traits for users who want to compare predictions
pub use approx;

pub mod context;
pub mod error;
pub mod io;
pub mod learner;
pub mod model;
pub mod registry;
pub mod runtime;
pub mod testing;
pub mod utils;

// =============================================================================
// Convenience Re-exports
// =============================================================================

// Container
pub use model::{BoostingModel, ModelState, DEFAULT_WEIGHT};
pub use registry::LearnerRegistry;

// Errors
pub use error::{EnsembleError, Released, Result};

// Learners
pub use learner::{
    DecisionStump, LearnerCodec, LearnerDecoders, LinearLearner, TypeTag, WeakLearner,
};

// Handles
pub use context::{Context, ContextId, ModelHandle};

// Persistence and bootstrap
pub use io::BinaryReadOptions;
pub use runtime::init;

// Shared utilities
pub use utils::Parallelism;
