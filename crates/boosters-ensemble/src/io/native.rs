//! Native binary format for boosting ensembles.
//!
//! # Format Structure
//!
//! All integers are big-endian.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │ Header (9 bytes)                                         │
//! │   magic "BSTE" (4) | version (1) | learner count u32 (4) │
//! ├──────────────────────────────────────────────────────────┤
//! │ Learner block × count                                    │
//! │   type tag (1) | payload length u32 (4) | payload        │
//! ├──────────────────────────────────────────────────────────┤
//! │ Weight table: count × f64 (8 bytes each)                 │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! Payloads are opaque to the container; the built-in learners encode them
//! with Postcard. An empty ensemble is exactly the 9-byte header.

use std::io::{Cursor, Read, Write};

use thiserror::Error;

use super::BinaryReadOptions;
use crate::learner::{LearnerDecoders, TypeTag};
use crate::model::BoostingModel;
use crate::registry::LearnerRegistry;

// ============================================================================
// Constants
// ============================================================================

/// Magic bytes identifying a serialized boosting ensemble.
pub const MAGIC: &[u8; 4] = b"BSTE";

/// Current format version.
pub const FORMAT_VERSION: u8 = 1;

/// Size of the format header in bytes.
pub const HEADER_SIZE: usize = 9;

/// Size of a learner block header (tag + payload length) in bytes.
pub const BLOCK_HEADER_SIZE: usize = 5;

/// Size of one entry in the weight table.
pub const WEIGHT_SIZE: usize = 8;

/// Upper bound on speculative preallocation driven by a declared count.
const PREALLOC_LEARNERS: usize = 1024;

// ============================================================================
// Error Types
// ============================================================================

/// Errors that can occur while encoding a model.
#[derive(Debug, Error)]
pub enum EncodeError {
    /// Learner count does not fit the format's u32 field.
    #[error("ensemble of {0} learners exceeds the format's u32 count")]
    TooManyLearners(usize),

    /// A learner failed to encode its payload.
    #[error("learner {index} (type tag {tag}) failed to encode: {source}")]
    Payload {
        index: usize,
        tag: TypeTag,
        source: postcard::Error,
    },

    /// A payload does not fit the format's u32 length field.
    #[error("learner {index} payload of {len} bytes exceeds the format's u32 length")]
    PayloadTooLarge { index: usize, len: usize },

    /// I/O error during writing.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Ways serialized input can be corrupt.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// Input does not start with [`MAGIC`].
    #[error("not a boosting ensemble (magic {found:02x?})")]
    NotAModel { found: [u8; 4] },

    /// Format version this build cannot read.
    #[error("unsupported format version {version}")]
    UnsupportedVersion { version: u8 },

    /// Input ended early.
    #[error("{section} truncated: expected {expected} bytes, got {actual}")]
    Truncated {
        section: &'static str,
        expected: usize,
        actual: usize,
    },

    /// No decoder is registered for a block's type tag.
    #[error("learner {index} has unknown type tag {tag}")]
    UnknownTypeTag { index: usize, tag: TypeTag },

    /// The decoder rejected a block's payload.
    #[error("learner {index} (type tag {tag}) has a malformed payload: {source}")]
    MalformedPayload {
        index: usize,
        tag: TypeTag,
        source: postcard::Error,
    },

    /// The decoder left part of a block's payload unread.
    #[error("learner {index} (type tag {tag}) left {count} payload bytes unread")]
    PayloadTrailingBytes {
        index: usize,
        tag: TypeTag,
        count: usize,
    },

    /// Weight table entry is NaN or infinite.
    #[error("learner {index} has non-finite weight {value}")]
    InvalidWeight { index: usize, value: f64 },

    /// Bytes remain after the weight table.
    #[error("{count} trailing bytes after the weight table")]
    TrailingBytes { count: usize },

    /// A declared size exceeds the configured [`BinaryReadOptions`].
    #[error("{what} {declared} exceeds limit {limit}")]
    LimitExceeded {
        what: &'static str,
        declared: u64,
        limit: u64,
    },

    /// I/O error during reading.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

// ============================================================================
// Headers
// ============================================================================

/// Fixed-size header at the start of every serialized ensemble.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatHeader {
    /// Format version.
    pub version: u8,
    /// Number of learner blocks that follow.
    pub n_learners: u32,
}

impl FormatHeader {
    /// Create a header with the current version.
    pub fn new(n_learners: u32) -> Self {
        Self {
            version: FORMAT_VERSION,
            n_learners,
        }
    }

    /// Serialize header to bytes.
    pub fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let mut buf = [0u8; HEADER_SIZE];
        buf[0..4].copy_from_slice(MAGIC);
        buf[4] = self.version;
        buf[5..9].copy_from_slice(&self.n_learners.to_be_bytes());
        buf
    }

    /// Parse header from bytes, checking magic and version.
    pub fn from_bytes(buf: &[u8; HEADER_SIZE]) -> Result<Self, DecodeError> {
        if &buf[0..4] != MAGIC {
            return Err(DecodeError::NotAModel {
                found: [buf[0], buf[1], buf[2], buf[3]],
            });
        }

        let version = buf[4];
        if version != FORMAT_VERSION {
            return Err(DecodeError::UnsupportedVersion { version });
        }

        Ok(Self {
            version,
            n_learners: u32::from_be_bytes([buf[5], buf[6], buf[7], buf[8]]),
        })
    }
}

/// Per-learner block header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockHeader {
    /// Learner kind.
    pub tag: TypeTag,
    /// Payload size in bytes.
    pub payload_len: u32,
}

impl BlockHeader {
    pub fn to_bytes(&self) -> [u8; BLOCK_HEADER_SIZE] {
        let mut buf = [0u8; BLOCK_HEADER_SIZE];
        buf[0] = self.tag.get();
        buf[1..5].copy_from_slice(&self.payload_len.to_be_bytes());
        buf
    }

    pub fn from_bytes(buf: &[u8; BLOCK_HEADER_SIZE]) -> Self {
        Self {
            tag: TypeTag::new(buf[0]),
            payload_len: u32::from_be_bytes([buf[1], buf[2], buf[3], buf[4]]),
        }
    }
}

// ============================================================================
// Writing
// ============================================================================

/// Write `model` to `writer` in the native format.
pub fn write_model<W: Write>(
    model: &BoostingModel,
    writer: &mut W,
) -> Result<(), EncodeError> {
    let n = model.number_of_weak_learners();
    let n_learners = u32::try_from(n).map_err(|_| EncodeError::TooManyLearners(n))?;
    writer.write_all(&FormatHeader::new(n_learners).to_bytes())?;

    for (index, learner) in model.registry().iter().enumerate() {
        let tag = learner.type_tag();
        let payload = learner
            .encode_payload()
            .map_err(|source| EncodeError::Payload { index, tag, source })?;
        let payload_len = u32::try_from(payload.len()).map_err(|_| EncodeError::PayloadTooLarge {
            index,
            len: payload.len(),
        })?;

        writer.write_all(&BlockHeader { tag, payload_len }.to_bytes())?;
        writer.write_all(&payload)?;
    }

    for weight in model.weights() {
        writer.write_all(&weight.to_be_bytes())?;
    }

    Ok(())
}

// ============================================================================
// Reading
// ============================================================================

/// Fill `buf` completely, reporting how far we got on early EOF.
pub(crate) fn read_full<R: Read>(
    reader: &mut R,
    buf: &mut [u8],
    section: &'static str,
) -> Result<(), DecodeError> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => {
                return Err(DecodeError::Truncated {
                    section,
                    expected: buf.len(),
                    actual: filled,
                });
            }
            Ok(n) => filled += n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(DecodeError::Io(e)),
        }
    }
    Ok(())
}

/// Read `len` bytes without trusting `len` for the allocation up front.
pub(crate) fn read_section<R: Read>(
    reader: &mut R,
    len: usize,
    section: &'static str,
) -> Result<Vec<u8>, DecodeError> {
    let mut buf = Vec::new();
    reader.by_ref().take(len as u64).read_to_end(&mut buf)?;
    if buf.len() < len {
        return Err(DecodeError::Truncated {
            section,
            expected: len,
            actual: buf.len(),
        });
    }
    Ok(buf)
}

pub(crate) fn read_header<R: Read>(
    reader: &mut R,
    options: &BinaryReadOptions,
) -> Result<FormatHeader, DecodeError> {
    let mut buf = [0u8; HEADER_SIZE];
    read_full(reader, &mut buf, "header")?;
    let header = FormatHeader::from_bytes(&buf)?;

    if header.n_learners > options.max_learners {
        return Err(DecodeError::LimitExceeded {
            what: "learner count",
            declared: header.n_learners as u64,
            limit: options.max_learners as u64,
        });
    }
    Ok(header)
}

pub(crate) fn read_block_header<R: Read>(
    reader: &mut R,
    options: &BinaryReadOptions,
) -> Result<BlockHeader, DecodeError> {
    let mut buf = [0u8; BLOCK_HEADER_SIZE];
    read_full(reader, &mut buf, "learner block header")?;
    let block = BlockHeader::from_bytes(&buf);

    if block.payload_len > options.max_payload_bytes {
        return Err(DecodeError::LimitExceeded {
            what: "payload length",
            declared: block.payload_len as u64,
            limit: options.max_payload_bytes as u64,
        });
    }
    Ok(block)
}

pub(crate) fn read_weights<R: Read>(
    reader: &mut R,
    n: usize,
) -> Result<Vec<f64>, DecodeError> {
    let table = read_section(reader, n * WEIGHT_SIZE, "weight table")?;
    table
        .chunks_exact(WEIGHT_SIZE)
        .enumerate()
        .map(|(index, chunk)| {
            let mut raw = [0u8; WEIGHT_SIZE];
            raw.copy_from_slice(chunk);
            let value = f64::from_be_bytes(raw);
            if value.is_finite() {
                Ok(value)
            } else {
                Err(DecodeError::InvalidWeight { index, value })
            }
        })
        .collect()
}

/// Read one model from `reader`, leaving any following bytes unread.
///
/// The returned model is finalized.
pub fn read_model<R: Read>(
    reader: &mut R,
    decoders: &LearnerDecoders,
    options: &BinaryReadOptions,
) -> Result<BoostingModel, DecodeError> {
    let header = read_header(reader, options)?;
    let n = header.n_learners as usize;

    let mut registry = LearnerRegistry::with_capacity(n.min(PREALLOC_LEARNERS));
    for index in 0..n {
        let block = read_block_header(reader, options)?;
        if !decoders.contains(block.tag) {
            return Err(DecodeError::UnknownTypeTag {
                index,
                tag: block.tag,
            });
        }

        let payload = read_section(reader, block.payload_len as usize, "learner payload")?;
        let (learner, unread) = decoders
            .decode(block.tag, &payload)
            .ok_or(DecodeError::UnknownTypeTag {
                index,
                tag: block.tag,
            })?
            .map_err(|source| DecodeError::MalformedPayload {
                index,
                tag: block.tag,
                source,
            })?;
        if unread > 0 {
            return Err(DecodeError::PayloadTrailingBytes {
                index,
                tag: block.tag,
                count: unread,
            });
        }
        registry.store(learner);
    }

    let weights = read_weights(reader, n)?;
    Ok(BoostingModel::from_parts(registry, weights))
}

/// Read a model that must span the whole of `bytes`.
pub fn read_model_from_slice(
    bytes: &[u8],
    decoders: &LearnerDecoders,
    options: &BinaryReadOptions,
) -> Result<BoostingModel, DecodeError> {
    let mut cursor = Cursor::new(bytes);
    let model = read_model(&mut cursor, decoders, options)?;

    let consumed = cursor.position() as usize;
    if consumed < bytes.len() {
        return Err(DecodeError::TrailingBytes {
            count: bytes.len() - consumed,
        });
    }
    Ok(model)
}

// ============================================================================
// Tests
// ============================================================================
