//! SHA-1 object identifiers.
//!
//! Unlike the object store and the compression codec, the hash algorithm is
//! not exposed as a swappable trait. Pack version 2 is defined in terms of
//! SHA-1 digests and this engine does not support the SHA-256 object format;
//! a future SHA-256 engine would be a different crate, not a generic
//! parameter here.

use std::fmt;
use std::str::FromStr;

use sha1::{Digest, Sha1};

use crate::ObjectKind;

pub const HASH_LEN: usize = 20;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum HashError {
    #[error("expected a {expected}-byte object id, got {actual}")]
    InvalidLength { expected: usize, actual: usize },
    #[error("invalid hex digit in object id: {0:?}")]
    InvalidHex(String),
}

/// A 20-byte SHA-1 object id.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId([u8; HASH_LEN]);

impl ObjectId {
    pub const NULL: ObjectId = ObjectId([0u8; HASH_LEN]);

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, HashError> {
        if bytes.len() != HASH_LEN {
            return Err(HashError::InvalidLength {
                expected: HASH_LEN,
                actual: bytes.len(),
            });
        }
        let mut arr = [0u8; HASH_LEN];
        arr.copy_from_slice(bytes);
        Ok(ObjectId(arr))
    }

    pub fn from_hex(hex: &str) -> Result<Self, HashError> {
        if hex.len() != HASH_LEN * 2 {
            return Err(HashError::InvalidHex(hex.to_string()));
        }
        let mut bytes = [0u8; HASH_LEN];
        for (i, chunk) in hex.as_bytes().chunks(2).enumerate() {
            let hi = hex_digit(chunk[0]).ok_or_else(|| HashError::InvalidHex(hex.to_string()))?;
            let lo = hex_digit(chunk[1]).ok_or_else(|| HashError::InvalidHex(hex.to_string()))?;
            bytes[i] = (hi << 4) | lo;
        }
        Ok(ObjectId(bytes))
    }

    pub fn as_bytes(&self) -> &[u8; HASH_LEN] {
        &self.0
    }

    pub fn is_null(&self) -> bool {
        self.0.iter().all(|&b| b == 0)
    }

    pub fn to_hex(&self) -> String {
        let mut s = String::with_capacity(HASH_LEN * 2);
        for b in self.0 {
            s.push_str(&format!("{b:02x}"));
        }
        s
    }
}

fn hex_digit(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectId({})", self.to_hex())
    }
}

impl FromStr for ObjectId {
    type Err = HashError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ObjectId::from_hex(s)
    }
}

/// Incremental SHA-1 hasher, used both for object framing and the pack
/// trailer checksum (which is a running digest over every preceding byte).
pub struct Sha1Hasher(Sha1);

impl Sha1Hasher {
    pub fn new() -> Self {
        Sha1Hasher(Sha1::new())
    }

    pub fn update(&mut self, data: &[u8]) {
        self.0.update(data);
    }

    pub fn finalize(self) -> ObjectId {
        let digest = self.0.finalize();
        let mut bytes = [0u8; HASH_LEN];
        bytes.copy_from_slice(&digest);
        ObjectId(bytes)
    }
}

impl Default for Sha1Hasher {
    fn default() -> Self {
        Self::new()
    }
}

/// Hash raw bytes with no object framing (used for the pack trailer).
pub fn sha1(data: &[u8]) -> ObjectId {
    let mut hasher = Sha1Hasher::new();
    hasher.update(data);
    hasher.finalize()
}

/// Hash an object's content the way git addresses it: `"<type> <size>\0" ||
/// content`.
pub fn hash_object(kind: ObjectKind, content: &[u8]) -> ObjectId {
    let header = format!("{} {}\0", kind.name(), content.len());
    let mut hasher = Sha1Hasher::new();
    hasher.update(header.as_bytes());
    hasher.update(content);
    hasher.finalize()
}
