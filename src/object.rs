//! Minimal reads of commit and tree content.
//!
//! The builder only ever needs two facts about an object's content: which
//! tree a commit points at, and which children a tree points at. This is
//! not a general object model — no parent lists, no author/committer
//! parsing, no tag bodies — just enough to walk history.

use crate::hash::ObjectId;
use crate::PackError;

/// Git's three file-mode buckets that matter for a reachability walk; any
/// other regular/executable-file mode value just means "blob".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TreeEntryKind {
    Blob,
    Subtree,
    /// A commit-typed entry pointing at another repository (mode 160000).
    /// Has no content reachable through this pack and is always skipped.
    Gitlink,
}

#[derive(Debug, Clone, Copy)]
pub struct TreeEntry {
    pub kind: TreeEntryKind,
    pub oid: ObjectId,
}

/// Extract the tree id from a commit object's content. The first line of a
/// commit is always `tree <hex-oid>\n`.
pub fn commit_tree_oid(content: &[u8]) -> Result<ObjectId, PackError> {
    let line_end = content
        .iter()
        .position(|&b| b == b'\n')
        .ok_or_else(|| PackError::InvalidObjectContent("commit has no header lines".into()))?;
    let line = &content[..line_end];
    let hex = line.strip_prefix(b"tree ").ok_or_else(|| {
        PackError::InvalidObjectContent("commit's first header line is not 'tree'".into())
    })?;
    let hex = std::str::from_utf8(hex)
        .map_err(|_| PackError::InvalidObjectContent("tree oid is not valid utf-8".into()))?;
    ObjectId::from_hex(hex)
        .map_err(|_| PackError::InvalidObjectContent(format!("malformed tree oid {hex:?}")))
}

/// Parse a tree object's binary entry list: repeated
/// `<octal mode> <name>\0<20-byte oid>` records with no separators between
/// entries.
pub fn parse_tree_entries(content: &[u8]) -> Result<Vec<TreeEntry>, PackError> {
    let mut entries = Vec::new();
    let mut pos = 0;

    while pos < content.len() {
        let space = content[pos..]
            .iter()
            .position(|&b| b == b' ')
            .ok_or_else(|| PackError::InvalidObjectContent("tree entry missing mode".into()))?
            + pos;
        let mode = parse_octal_mode(&content[pos..space])?;

        let name_start = space + 1;
        let nul = content[name_start..]
            .iter()
            .position(|&b| b == 0)
            .ok_or_else(|| PackError::InvalidObjectContent("tree entry missing name".into()))?
            + name_start;

        let oid_start = nul + 1;
        let oid_bytes = content
            .get(oid_start..oid_start + 20)
            .ok_or_else(|| PackError::InvalidObjectContent("tree entry oid truncated".into()))?;
        let oid = ObjectId::from_bytes(oid_bytes).map_err(PackError::Hash)?;

        let kind = match mode {
            0o040000 => TreeEntryKind::Subtree,
            0o160000 => TreeEntryKind::Gitlink,
            _ => TreeEntryKind::Blob,
        };
        entries.push(TreeEntry { kind, oid });
        pos = oid_start + 20;
    }

    Ok(entries)
}

fn parse_octal_mode(digits: &[u8]) -> Result<u32, PackError> {
    if digits.is_empty() {
        return Err(PackError::InvalidObjectContent("empty tree entry mode".into()));
    }
    let mut value = 0u32;
    for &b in digits {
        if !(b'0'..=b'7').contains(&b) {
            return Err(PackError::InvalidObjectContent(format!(
                "non-octal byte {b:#04x} in tree entry mode"
            )));
        }
        value = value * 8 + (b - b'0') as u32;
    }
    Ok(value)
}
