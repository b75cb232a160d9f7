//! Pack enumeration: turns a byte buffer into a list of [`PackEntry`]
//! values plus the trailing checksum.
//!
//! This phase never touches a delta base. Deltified entries come out of
//! here with `kind` still `OfsDelta`/`RefDelta`, `payload` set to the raw
//! instruction stream, and `sha1` unset; [`crate::resolver`] does the rest.
//! The phases are separate so callers that only want to audit a pack's
//! shape (or compute its checksum) don't pay for delta resolution they
//! don't need.

use crate::codec::Codec;
use crate::entry::{decode_entry_header, PackEntry};
use crate::hash::sha1;
use crate::{ObjectId, PackError, PACK_HEADER_SIZE, PACK_SIGNATURE};

/// The result of enumerating a pack: its entries (deltas unresolved) and
/// the trailing checksum that was verified while reading it.
#[derive(Debug)]
pub struct ParsedPack {
    pub entries: Vec<PackEntry>,
    pub checksum: ObjectId,
}

/// How far past an entry's declared uncompressed size to feed the codec —
/// zlib streams have their own end-of-stream marker, so this only needs to
/// cover header overhead, not the true compressed length.
const INFLATE_SLACK: usize = 512;

/// Enumerate every entry in `data`, verifying the trailing pack checksum.
///
/// Materialized (non-delta) entries get their SHA-1 computed immediately,
/// since doing so needs no information beyond their own payload. Deltified
/// entries are left for the resolver. If the checksum does not match, no
/// entries are returned — a corrupt pack yields nothing, not a partial
/// list.
pub fn parse(data: &[u8], codec: &dyn Codec) -> Result<ParsedPack, PackError> {
    if data.len() < PACK_HEADER_SIZE + 20 {
        return Err(PackError::Truncated(data.len() as u64));
    }
    if &data[0..4] != PACK_SIGNATURE {
        return Err(PackError::MalformedHeader(format!(
            "expected signature {:?}, got {:?}",
            PACK_SIGNATURE,
            &data[0..4]
        )));
    }
    let version = u32::from_be_bytes(data[4..8].try_into().unwrap());
    if version != crate::PACK_VERSION {
        return Err(PackError::UnsupportedVersion(version));
    }
    let num_objects = u32::from_be_bytes(data[8..12].try_into().unwrap());

    let mut entries = Vec::with_capacity(num_objects as usize);
    let mut cursor = PACK_HEADER_SIZE as u64;

    for _ in 0..num_objects {
        let entry_offset = cursor;
        let (kind, size, header_len) = decode_entry_header(data, entry_offset)?;
        let payload_start = entry_offset as usize + header_len;

        let slice_end = (payload_start + size + INFLATE_SLACK).min(data.len());
        let compressed = data
            .get(payload_start..slice_end)
            .ok_or(PackError::Truncated(entry_offset))?;
        let (payload, consumed) = codec.inflate(compressed, size)?;
        if payload.len() != size {
            return Err(PackError::Truncated(entry_offset));
        }

        let entry_end = payload_start + consumed;
        let crc32 = crc32fast::hash(&data[entry_offset as usize..entry_end]);

        let sha1 = if kind.is_delta() {
            None
        } else {
            Some(crate::hash::hash_object(kind, &payload))
        };

        entries.push(PackEntry {
            offset: entry_offset,
            kind,
            size,
            payload: Some(payload),
            crc32,
            sha1,
        });

        cursor = entry_end as u64;
    }

    let trailer_start = cursor as usize;
    let trailer = data
        .get(trailer_start..trailer_start + 20)
        .ok_or(PackError::Truncated(cursor))?;
    let expected = ObjectId::from_bytes(trailer).map_err(PackError::Hash)?;
    let actual = sha1(&data[..trailer_start]);
    if actual != expected {
        return Err(PackError::ChecksumMismatch { expected, actual });
    }

    Ok(ParsedPack { entries, checksum: actual })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::ZlibCodec;
    use crate::entry::encode_entry_header;
    use crate::ObjectKind;

    fn build_pack(objects: &[(ObjectKind, &[u8])]) -> Vec<u8> {
        let codec = ZlibCodec;
        let mut body = Vec::new();
        body.extend_from_slice(PACK_SIGNATURE);
        body.extend_from_slice(&crate::PACK_VERSION.to_be_bytes());
        body.extend_from_slice(&(objects.len() as u32).to_be_bytes());

        for (kind, content) in objects {
            body.extend_from_slice(&encode_entry_header(*kind, content.len()));
            body.extend_from_slice(&codec.deflate(content).unwrap());
        }

        let checksum = sha1(&body);
        body.extend_from_slice(checksum.as_bytes());
        body
    }

    #[test]
    fn empty_pack_parses_with_zero_entries() {
        let data = build_pack(&[]);
        let parsed = parse(&data, &ZlibCodec).unwrap();
        assert!(parsed.entries.is_empty());
    }

    #[test]
    fn single_blob_hashes_match_git() {
        let data = build_pack(&[(ObjectKind::Blob, b"hello\n")]);
        let parsed = parse(&data, &ZlibCodec).unwrap();
        assert_eq!(parsed.entries.len(), 1);
        let entry = &parsed.entries[0];
        assert_eq!(
            entry.sha1.unwrap().to_hex(),
            "ce013625030ba8dba906f756967f9e9ca394464a"
        );
        assert_eq!(entry.payload.as_deref(), Some(b"hello\n".as_slice()));
    }

    #[test]
    fn multiple_objects_parse_in_order() {
        let data = build_pack(&[
            (ObjectKind::Blob, b"first"),
            (ObjectKind::Blob, b"second"),
            (ObjectKind::Tree, b"tree-content"),
        ]);
        let parsed = parse(&data, &ZlibCodec).unwrap();
        assert_eq!(parsed.entries.len(), 3);
        assert_eq!(parsed.entries[0].payload.as_deref(), Some(b"first".as_slice()));
        assert_eq!(parsed.entries[2].kind, ObjectKind::Tree);
    }

    #[test]
    fn delta_entries_are_left_unresolved() {
        let base = b"base content";
        let delta = {
            let mut d = Vec::new();
            d.extend_from_slice(&crate::varint::write_varint(base.len() as u64));
            d.extend_from_slice(&crate::varint::write_varint(base.len() as u64));
            d.extend_from_slice(&crate::delta::encode_copy(0, base.len()));
            d
        };

        let mut body = Vec::new();
        body.extend_from_slice(PACK_SIGNATURE);
        body.extend_from_slice(&crate::PACK_VERSION.to_be_bytes());
        body.extend_from_slice(&2u32.to_be_bytes());
        let base_offset = body.len() as u64;
        body.extend_from_slice(&crate::entry::encode_entry_header(ObjectKind::Blob, base.len()));
        body.extend_from_slice(&ZlibCodec.deflate(base).unwrap());
        let delta_offset = body.len() as u64;
        body.extend_from_slice(&crate::entry::encode_entry_header(
            ObjectKind::OfsDelta { base_offset: 0 },
            delta.len(),
        ));
        body.extend_from_slice(&crate::varint::write_ofs_delta_offset(delta_offset - base_offset));
        body.extend_from_slice(&ZlibCodec.deflate(&delta).unwrap());
        let checksum = sha1(&body);
        body.extend_from_slice(checksum.as_bytes());

        let parsed = parse(&body, &ZlibCodec).unwrap();
        assert_eq!(parsed.entries.len(), 2);
        assert!(parsed.entries[1].kind.is_delta());
        assert!(parsed.entries[1].sha1.is_none());
    }

    #[test]
    fn wrong_version_is_rejected() {
        let mut data = build_pack(&[]);
        data[4..8].copy_from_slice(&3u32.to_be_bytes());
        assert!(matches!(
            parse(&data, &ZlibCodec),
            Err(PackError::UnsupportedVersion(3))
        ));
    }

    #[test]
    fn bad_signature_is_rejected() {
        let mut data = build_pack(&[]);
        data[0] = b'X';
        assert!(matches!(parse(&data, &ZlibCodec), Err(PackError::MalformedHeader(_))));
    }

    #[test]
    fn corrupted_checksum_surfaces_no_entries() {
        let mut data = build_pack(&[(ObjectKind::Blob, b"hello\n")]);
        let last = data.len() - 1;
        data[last] ^= 0xff;
        assert!(matches!(
            parse(&data, &ZlibCodec),
            Err(PackError::ChecksumMismatch { .. })
        ));
    }
}
