//! Parsing, delta resolution, and generation of git's version-2 packfile
//! format.
//!
//! A pack is a sequence of zlib-deflated objects, each either a full object
//! (commit/tree/blob/tag) or a delta against another object addressed by
//! pack offset (OFS_DELTA) or SHA-1 (REF_DELTA), followed by a trailing
//! SHA-1 checksum over everything that came before it. This crate turns a
//! byte buffer into fully materialized, hash-verified objects, and builds
//! new packs from a reachability walk over an object store.
//!
//! The object store and compression codec are supplied by the caller as
//! trait objects ([`store::ObjectStore`], [`codec::Codec`]); this crate
//! owns no on-disk format of its own and never shells out to `git`.

pub mod builder;
pub mod codec;
pub mod delta;
pub mod entry;
pub mod hash;
pub mod object;
pub mod parser;
pub mod resolver;
pub mod store;
pub mod varint;

pub use entry::{ObjectKind, PackEntry};
pub use hash::ObjectId;

/// Errors that can occur during pack parsing, delta resolution, or
/// generation.
#[derive(Debug, thiserror::Error)]
pub enum PackError {
    #[error("invalid pack header: {0}")]
    MalformedHeader(String),

    #[error("unsupported pack version: {0}")]
    UnsupportedVersion(u32),

    #[error("pack truncated at offset {0}")]
    Truncated(u64),

    #[error("invalid object kind {0} at offset {1}")]
    InvalidKind(u8, u64),

    #[error("OFS_DELTA at offset {offset} points {distance} bytes before the start of the pack")]
    DanglingOffsetDelta { offset: u64, distance: u64 },

    #[error("truncated delta instruction stream at byte {0}")]
    TruncatedDelta(usize),

    #[error("invalid delta opcode 0 at byte {0}")]
    InvalidDeltaOpcode(usize),

    #[error("delta base length mismatch: delta expects {declared} bytes, base has {actual}")]
    DeltaBaseLengthMismatch { declared: usize, actual: usize },

    #[error("delta output length mismatch: delta declares {declared} bytes, produced {actual}")]
    DeltaLengthMismatch { declared: usize, actual: usize },

    #[error("delta copy out of range: offset={offset} size={size} base_len={base_len}")]
    DeltaOutOfRange {
        offset: usize,
        size: usize,
        base_len: usize,
    },

    #[error("delta base not found: {0}")]
    MissingBase(ObjectId),

    #[error("cyclic REF_DELTA chain detected at pack offset {0}")]
    CyclicDelta(u64),

    #[error("delta chain exceeds {max_depth} links at offset {offset}")]
    DeltaChainTooDeep { offset: u64, max_depth: usize },

    #[error("pack checksum mismatch: expected {expected}, got {actual}")]
    ChecksumMismatch { expected: ObjectId, actual: ObjectId },

    #[error("invalid object content: {0}")]
    InvalidObjectContent(String),

    #[error(transparent)]
    Hash(#[from] hash::HashError),

    #[error(transparent)]
    Codec(#[from] codec::CodecError),

    #[error(transparent)]
    Store(#[from] store::StoreError),
}

/// Pack format constants.
pub const PACK_SIGNATURE: &[u8; 4] = b"PACK";
pub const PACK_VERSION: u32 = 2;
pub const PACK_HEADER_SIZE: usize = 12;

/// Maximum delta chain depth resolved before bailing out with
/// [`PackError::DeltaChainTooDeep`]. Bounds the explicit work stack the
/// resolver uses, not the native call stack.
pub const MAX_DELTA_CHAIN_DEPTH: usize = 512;
