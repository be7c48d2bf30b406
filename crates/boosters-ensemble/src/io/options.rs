//! Read limits for the native format, with builder pattern.
//!
//! Declared sizes in a serialized model are attacker-controlled. Readers
//! check them against [`BinaryReadOptions`] before allocating.
//!
//! # Example
//!
//! ```
//! use boosters_ensemble::io::BinaryReadOptions;
//!
//! let options = BinaryReadOptions::builder()
//!     .max_learners(10_000)
//!     .build()
//!     .unwrap();
//! assert_eq!(options.max_learners, 10_000);
//! ```

use bon::Builder;
use thiserror::Error;

/// Default cap on the declared learner count.
pub const DEFAULT_MAX_LEARNERS: u32 = 1 << 20;

/// Default cap on a single learner payload (64 MiB).
pub const DEFAULT_MAX_PAYLOAD_BYTES: u32 = 64 << 20;

/// Invalid read options.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// A limit was set to zero.
    #[error("{field} must be at least 1")]
    ZeroLimit { field: &'static str },
}

/// Limits applied while reading a serialized model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Builder)]
#[builder(
    derive(Clone, Debug),
    finish_fn(vis = "", name = __build_internal)
)]
pub struct BinaryReadOptions {
    /// Largest accepted learner count. Default: 2^20.
    #[builder(default = DEFAULT_MAX_LEARNERS)]
    pub max_learners: u32,

    /// Largest accepted single payload, in bytes. Default: 64 MiB.
    #[builder(default = DEFAULT_MAX_PAYLOAD_BYTES)]
    pub max_payload_bytes: u32,
}

impl<S: binary_read_options_builder::IsComplete> BinaryReadOptionsBuilder<S> {
    /// Build and validate the options.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ZeroLimit`] if either limit is zero.
    pub fn build(self) -> Result<BinaryReadOptions, ConfigError> {
        let options = self.__build_internal();
        options.validate()?;
        Ok(options)
    }
}

impl BinaryReadOptions {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.max_learners == 0 {
            return Err(ConfigError::ZeroLimit {
                field: "max_learners",
            });
        }
        if self.max_payload_bytes == 0 {
            return Err(ConfigError::ZeroLimit {
                field: "max_payload_bytes",
            });
        }
        Ok(())
    }
}

impl Default for BinaryReadOptions {
    fn default() -> Self {
        Self::builder().build().expect("default options are valid")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let options = BinaryReadOptions::default();
        assert_eq!(options.max_learners, DEFAULT_MAX_LEARNERS);
        assert_eq!(options.max_payload_bytes, DEFAULT_MAX_PAYLOAD_BYTES);
    }

    #[test]
    fn zero_limits_rejected() {
        let err = BinaryReadOptions::builder().max_learners(0).build().unwrap_err();
        assert_eq!(err, ConfigError::ZeroLimit { field: "max_learners" });

        let err = BinaryReadOptions::builder()
            .max_payload_bytes(0)
            .build()
            .unwrap_err();
        assert_eq!(err.to_string(), "max_payload_bytes must be at least 1");
    }
}
