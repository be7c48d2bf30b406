//! Process-wide bootstrap.
//!
//! [`init`] builds the shared [`Runtime`] exactly once: the default decoder
//! table and read limits used by [`BoostingModel::deserialize`] and new
//! [`Context`]s. Call it at program start; later calls return the same
//! instance. The runtime is immutable after initialization.
//!
//! [`BoostingModel::deserialize`]: crate::BoostingModel::deserialize

use std::sync::OnceLock;

use thiserror::Error;

use crate::context::Context;
use crate::io::BinaryReadOptions;
use crate::learner::LearnerDecoders;

static RUNTIME: OnceLock<Runtime> = OnceLock::new();

/// Errors from explicit runtime initialization.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InitError {
    /// [`init`] or [`init_with`] already ran in this process.
    #[error("ensemble runtime is already initialized")]
    AlreadyInitialized,
}

/// Shared, immutable process-wide state.
#[derive(Debug)]
pub struct Runtime {
    decoders: LearnerDecoders,
    read_options: BinaryReadOptions,
}

impl Runtime {
    /// Decoders used when none are given explicitly.
    #[inline]
    pub fn decoders(&self) -> &LearnerDecoders {
        &self.decoders
    }

    /// Read limits used when none are given explicitly.
    #[inline]
    pub fn read_options(&self) -> BinaryReadOptions {
        self.read_options
    }

    /// Create a new context configured from this runtime.
    pub fn new_context(&self) -> Context {
        Context::with_decoders(self.decoders.clone(), self.read_options)
    }
}

/// Initialize the runtime with built-in decoders and default limits.
///
/// Idempotent: every call returns the same instance.
pub fn init() -> &'static Runtime {
    RUNTIME.get_or_init(|| {
        tracing::debug!("initializing ensemble runtime with built-in decoders");
        Runtime {
            decoders: LearnerDecoders::builtin(),
            read_options: BinaryReadOptions::default(),
        }
    })
}

/// Initialize the runtime with custom decoders and limits.
///
/// Must run before anything calls [`init`]; otherwise fails with
/// [`InitError::AlreadyInitialized`] and leaves the existing runtime in place.
pub fn init_with(
    decoders: LearnerDecoders,
    read_options: BinaryReadOptions,
) -> Result<&'static Runtime, InitError> {
    let mut installed = false;
    let runtime = RUNTIME.get_or_init(|| {
        installed = true;
        tracing::debug!(?decoders, "initializing ensemble runtime");
        Runtime {
            decoders,
            read_options,
        }
    });

    if installed {
        Ok(runtime)
    } else {
        tracing::warn!("ensemble runtime already initialized; custom decoders ignored");
        Err(InitError::AlreadyInitialized)
    }
}

/// Returns `true` once [`init`] or [`init_with`] has run.
pub fn is_initialized() -> bool {
    RUNTIME.get().is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_is_idempotent() {
        let first = init();
        let second = init();
        assert!(std::ptr::eq(first, second));
        assert!(is_initialized());
    }

    #[test]
    fn init_with_after_init_fails() {
        init();
        let err = init_with(LearnerDecoders::empty(), BinaryReadOptions::default()).unwrap_err();
        assert_eq!(err, InitError::AlreadyInitialized);
        // Existing runtime is untouched.
        assert!(init().decoders().tags().count() >= 2);
    }
}
