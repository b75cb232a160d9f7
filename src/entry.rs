//! Per-object entry headers: the irregular `(kind, size)` varint and the two
//! delta base addressing forms.

use crate::hash::{ObjectId, HASH_LEN};
use crate::varint;
use crate::PackError;

/// The kind of an entry. Non-delta variants double as the four git object
/// types; the delta variants carry whatever base-addressing information the
/// entry's header held before resolution rewrote it to the materialized
/// kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectKind {
    Commit,
    Tree,
    Blob,
    Tag,
    OfsDelta { base_offset: u64 },
    RefDelta { base_sha1: ObjectId },
}

impl ObjectKind {
    /// The name used in git's object framing header. Only meaningful for
    /// materialized kinds; delta variants never reach this because the
    /// resolver always rewrites `kind` before anything hashes the entry.
    pub fn name(&self) -> &'static str {
        match self {
            ObjectKind::Commit => "commit",
            ObjectKind::Tree => "tree",
            ObjectKind::Blob => "blob",
            ObjectKind::Tag => "tag",
            ObjectKind::OfsDelta { .. } | ObjectKind::RefDelta { .. } => {
                unreachable!("name() called on an unresolved delta entry")
            }
        }
    }

    pub fn is_delta(&self) -> bool {
        matches!(self, ObjectKind::OfsDelta { .. } | ObjectKind::RefDelta { .. })
    }

    fn type_number(&self) -> u8 {
        match self {
            ObjectKind::Commit => 1,
            ObjectKind::Tree => 2,
            ObjectKind::Blob => 3,
            ObjectKind::Tag => 4,
            ObjectKind::OfsDelta { .. } => 6,
            ObjectKind::RefDelta { .. } => 7,
        }
    }
}

/// One object slot in a pack, in the order it appears on the wire.
#[derive(Debug, Clone)]
pub struct PackEntry {
    /// Byte offset of this entry's header within the pack.
    pub offset: u64,
    /// Initial kind as read from the header; rewritten to the base's
    /// materialized kind once delta resolution completes.
    pub kind: ObjectKind,
    /// Declared uncompressed payload size.
    pub size: usize,
    /// Delta instructions before resolution, materialized object bytes
    /// after. `None` only after [`PackEntry::release_payload`] is called.
    pub payload: Option<Vec<u8>>,
    /// CRC32 over this entry's on-wire bytes (header through compressed
    /// payload), independent of delta resolution.
    pub crc32: u32,
    /// Set once the entry's kind and content are fully materialized.
    pub sha1: Option<ObjectId>,
}

impl PackEntry {
    pub fn is_resolved(&self) -> bool {
        self.sha1.is_some()
    }

    /// Drop the materialized payload to reclaim memory once a caller has
    /// persisted it elsewhere. Opt-in: nothing in this crate calls it
    /// automatically, since many callers want to keep every byte around
    /// (e.g. to feed a builder's reachability walk).
    pub fn release_payload(&mut self) {
        self.payload = None;
    }
}

/// Parse the header at `data[entry_offset..]`: the 3-bit-kind + varint-size
/// byte(s), followed by any delta base addressing bytes.
///
/// Returns the entry's kind, declared size, and the total header length in
/// bytes (including delta base bytes) — the compressed payload begins
/// immediately after.
pub fn decode_entry_header(
    data: &[u8],
    entry_offset: u64,
) -> Result<(ObjectKind, usize, usize), PackError> {
    let start = entry_offset as usize;
    let mut pos = start;

    let first = *data.get(pos).ok_or(PackError::Truncated(entry_offset))?;
    pos += 1;
    let type_num = (first >> 4) & 0x7;
    let mut size = (first & 0x0f) as u64;
    let mut shift = 4;
    let mut more = first & 0x80 != 0;

    while more {
        let byte = *data.get(pos).ok_or(PackError::Truncated(entry_offset))?;
        pos += 1;
        size |= ((byte & 0x7f) as u64) << shift;
        shift += 7;
        more = byte & 0x80 != 0;
    }

    let kind = match type_num {
        1 => ObjectKind::Commit,
        2 => ObjectKind::Tree,
        3 => ObjectKind::Blob,
        4 => ObjectKind::Tag,
        6 => {
            let (distance, consumed) = varint::read_ofs_delta_offset(&data[pos..])
                .ok_or(PackError::Truncated(entry_offset))?;
            pos += consumed;
            let base_offset =
                entry_offset
                    .checked_sub(distance)
                    .ok_or(PackError::DanglingOffsetDelta {
                        offset: entry_offset,
                        distance,
                    })?;
            ObjectKind::OfsDelta { base_offset }
        }
        7 => {
            let sha_bytes = data
                .get(pos..pos + HASH_LEN)
                .ok_or(PackError::Truncated(entry_offset))?;
            pos += HASH_LEN;
            let base_sha1 = ObjectId::from_bytes(sha_bytes).map_err(PackError::Hash)?;
            ObjectKind::RefDelta { base_sha1 }
        }
        other => return Err(PackError::InvalidKind(other, entry_offset)),
    };

    Ok((kind, size as usize, pos - start))
}

/// Encode an entry's leading type+size byte(s). For delta kinds the caller
/// appends the base addressing bytes itself: [`varint::write_ofs_delta_offset`]
/// for OFS_DELTA, or the base SHA-1's raw bytes for REF_DELTA.
pub fn encode_entry_header(kind: ObjectKind, size: usize) -> Vec<u8> {
    let type_num = kind.type_number();
    let mut size = size as u64;
    let mut buf = Vec::with_capacity(4);

    let mut first = (type_num << 4) | (size & 0x0f) as u8;
    size >>= 4;
    if size > 0 {
        first |= 0x80;
    }
    buf.push(first);

    while size > 0 {
        let mut byte = (size & 0x7f) as u8;
        size >>= 7;
        if size > 0 {
            byte |= 0x80;
        }
        buf.push(byte);
    }

    buf
}
