//! Pluggable (de)compression for object payloads.
//!
//! Pack version 2 only ever stores zlib-deflated payloads, but the parser
//! and builder depend on the `Codec` trait rather than `flate2` directly so
//! that tests can swap in an instrumented or pass-through codec without
//! touching the parsing logic.

use std::io::Read;

use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;

#[derive(Debug, thiserror::Error)]
#[error("codec failure: {0}")]
pub struct CodecError(#[from] std::io::Error);

pub trait Codec: Send + Sync {
    /// Inflate `source`, which begins at a zlib stream but may extend past
    /// its end (callers over-read rather than pre-locate the exact
    /// compressed length). `size_hint` sizes the output buffer; it is not
    /// trusted as authoritative.
    ///
    /// Returns the decompressed bytes and the number of bytes of `source`
    /// the zlib stream actually consumed.
    fn inflate(&self, source: &[u8], size_hint: usize) -> Result<(Vec<u8>, usize), CodecError>;

    /// Deflate `source` into a standalone zlib stream.
    fn deflate(&self, source: &[u8]) -> Result<Vec<u8>, CodecError>;
}

/// The only codec pack version 2 actually uses.
#[derive(Debug, Default, Clone, Copy)]
pub struct ZlibCodec;

impl Codec for ZlibCodec {
    fn inflate(&self, source: &[u8], size_hint: usize) -> Result<(Vec<u8>, usize), CodecError> {
        let mut decoder = ZlibDecoder::new(source);
        let mut out = Vec::with_capacity(size_hint);
        decoder.read_to_end(&mut out)?;
        let consumed = decoder.total_in() as usize;
        Ok((out, consumed))
    }

    fn deflate(&self, source: &[u8]) -> Result<Vec<u8>, CodecError> {
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        std::io::Write::write_all(&mut encoder, source)?;
        encoder.finish().map_err(CodecError::from)
    }
}
