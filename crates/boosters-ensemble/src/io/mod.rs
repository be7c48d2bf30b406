//! I/O module for ensemble serialization and deserialization.
//!
//! - [`native`]: the binary format (header, learner blocks, weight table)
//! - [`BinaryReadOptions`]: limits applied while reading untrusted input
//! - [`ModelInfo`] / [`inspect`]: header-only summaries

mod info;
pub mod native;
mod options;

pub use info::{inspect, LearnerInfo, ModelInfo};
pub use native::{
    read_model, read_model_from_slice, write_model, BlockHeader, DecodeError, EncodeError,
    FormatHeader, BLOCK_HEADER_SIZE, FORMAT_VERSION, HEADER_SIZE, MAGIC, WEIGHT_SIZE,
};
pub use options::{
    BinaryReadOptions, BinaryReadOptionsBuilder, ConfigError, DEFAULT_MAX_LEARNERS,
    DEFAULT_MAX_PAYLOAD_BYTES,
};
