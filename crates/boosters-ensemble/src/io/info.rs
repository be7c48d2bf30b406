//! Header-only inspection of serialized ensembles.
//!
//! [`ModelInfo`] walks the block headers and weight table without decoding a
//! single payload, so it works even when no decoder for a tag is registered.

use std::io::{self, Cursor, Read};

use serde::{Deserialize, Serialize};

use super::native::{
    read_block_header, read_header, read_weights, DecodeError, BLOCK_HEADER_SIZE, HEADER_SIZE,
    WEIGHT_SIZE,
};
use super::BinaryReadOptions;

/// Summary of one learner block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearnerInfo {
    /// Raw type tag.
    pub type_tag: u8,
    /// Payload size in bytes.
    pub payload_bytes: u32,
    /// Boosting coefficient.
    pub weight: f64,
}

/// Summary of a serialized ensemble.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelInfo {
    /// Format version.
    pub version: u8,
    /// Learners in training order.
    pub learners: Vec<LearnerInfo>,
    /// Total encoded size in bytes.
    pub total_bytes: u64,
}

impl ModelInfo {
    /// Number of learner blocks.
    pub fn n_learners(&self) -> usize {
        self.learners.len()
    }

    /// Walk one serialized model from `reader`, skipping payloads.
    pub fn read_from<R: Read>(
        reader: &mut R,
        options: &BinaryReadOptions,
    ) -> Result<Self, DecodeError> {
        let header = read_header(reader, options)?;
        let n = header.n_learners as usize;

        let mut total_bytes = (HEADER_SIZE + n * (BLOCK_HEADER_SIZE + WEIGHT_SIZE)) as u64;
        let mut blocks = Vec::with_capacity(n.min(1024));
        for _ in 0..n {
            let block = read_block_header(reader, options)?;
            let expected = block.payload_len as u64;
            let skipped = io::copy(&mut reader.by_ref().take(expected), &mut io::sink())?;
            if skipped < expected {
                return Err(DecodeError::Truncated {
                    section: "learner payload",
                    expected: expected as usize,
                    actual: skipped as usize,
                });
            }
            total_bytes += expected;
            blocks.push(block);
        }

        let weights = read_weights(reader, n)?;
        let learners = blocks
            .into_iter()
            .zip(weights)
            .map(|(block, weight)| LearnerInfo {
                type_tag: block.tag.get(),
                payload_bytes: block.payload_len,
                weight,
            })
            .collect();

        Ok(Self {
            version: header.version,
            learners,
            total_bytes,
        })
    }
}

/// Inspect a serialized model held in memory.
pub fn inspect(bytes: &[u8]) -> Result<ModelInfo, DecodeError> {
    ModelInfo::read_from(&mut Cursor::new(bytes), &BinaryReadOptions::default())
}
