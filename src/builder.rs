//! Pack generation via reachability walk.
//!
//! Given a set of root commits and an object store, [`PackBuilder`] walks
//! each commit's tree, emits every blob and subtree it reaches (skipping
//! gitlinks and anything the store reports as already packed elsewhere),
//! then emits the commit itself. The result is a single byte buffer
//! containing a complete version-2 pack and its trailing checksum; nothing
//! here writes to disk or knows what a caller intends to do with the bytes
//! — see [`crate::store::ObjectStore::persist_pack`] for that.

use std::collections::HashSet;

use crate::codec::Codec;
use crate::entry::{encode_entry_header, ObjectKind};
use crate::hash::Sha1Hasher;
use crate::object::{commit_tree_oid, parse_tree_entries, TreeEntryKind};
use crate::store::ObjectStore;
use crate::{ObjectId, PackError, PACK_HEADER_SIZE, PACK_SIGNATURE};

/// Reported once per object as the builder emits it, in emission order
/// (dependencies before dependents: blobs and subtrees before their tree,
/// trees before their commit).
#[derive(Debug, Clone, Copy)]
pub struct BuildProgress {
    pub kind: ObjectKind,
    pub oid: ObjectId,
}

/// Builds a pack from a reachability walk rooted at a set of commits.
pub struct PackBuilder<'s> {
    store: &'s dyn ObjectStore,
    roots: Vec<ObjectId>,
    progress: Option<Box<dyn FnMut(BuildProgress) + 's>>,
}

impl<'s> PackBuilder<'s> {
    pub fn new(store: &'s dyn ObjectStore, roots: Vec<ObjectId>) -> Self {
        PackBuilder {
            store,
            roots,
            progress: None,
        }
    }

    /// Register a callback invoked once per emitted object. Useful for
    /// progress bars or object-count estimates; has no effect on the walk
    /// itself.
    pub fn with_progress(mut self, sink: impl FnMut(BuildProgress) + 's) -> Self {
        self.progress = Some(Box::new(sink));
        self
    }

    /// Run the walk and assemble the finished pack. Returns the pack bytes
    /// and their trailing checksum.
    pub fn build(mut self, codec: &dyn Codec) -> Result<(Vec<u8>, ObjectId), PackError> {
        let mut emitted: Vec<(ObjectKind, Vec<u8>)> = Vec::new();
        let mut visited: HashSet<ObjectId> = HashSet::new();

        let roots = self.roots.clone();
        for root in &roots {
            self.emit_commit(*root, &mut emitted, &mut visited)?;
        }

        assemble(&emitted, codec)
    }

    fn emit_commit(
        &mut self,
        oid: ObjectId,
        emitted: &mut Vec<(ObjectKind, Vec<u8>)>,
        visited: &mut HashSet<ObjectId>,
    ) -> Result<(), PackError> {
        if !visited.insert(oid) {
            return Ok(());
        }
        let (_, bytes) = self.store.retrieve(&oid)?;
        let tree_oid = commit_tree_oid(&bytes)?;
        self.walk_tree(tree_oid, emitted, visited)?;
        self.push(emitted, ObjectKind::Commit, oid, bytes);
        Ok(())
    }

    fn walk_tree(
        &mut self,
        oid: ObjectId,
        emitted: &mut Vec<(ObjectKind, Vec<u8>)>,
        visited: &mut HashSet<ObjectId>,
    ) -> Result<(), PackError> {
        if !visited.insert(oid) {
            return Ok(());
        }
        if self.store.find_packed(&oid) {
            return Ok(());
        }
        let (_, bytes) = self.store.retrieve(&oid)?;
        for entry in parse_tree_entries(&bytes)? {
            match entry.kind {
                TreeEntryKind::Subtree => self.walk_tree(entry.oid, emitted, visited)?,
                TreeEntryKind::Blob => self.emit_blob(entry.oid, emitted, visited)?,
                TreeEntryKind::Gitlink => {}
            }
        }
        self.push(emitted, ObjectKind::Tree, oid, bytes);
        Ok(())
    }

    fn emit_blob(
        &mut self,
        oid: ObjectId,
        emitted: &mut Vec<(ObjectKind, Vec<u8>)>,
        visited: &mut HashSet<ObjectId>,
    ) -> Result<(), PackError> {
        if !visited.insert(oid) {
            return Ok(());
        }
        if self.store.find_packed(&oid) {
            return Ok(());
        }
        let (_, bytes) = self.store.retrieve(&oid)?;
        self.push(emitted, ObjectKind::Blob, oid, bytes);
        Ok(())
    }

    fn push(
        &mut self,
        emitted: &mut Vec<(ObjectKind, Vec<u8>)>,
        kind: ObjectKind,
        oid: ObjectId,
        bytes: Vec<u8>,
    ) {
        if let Some(sink) = self.progress.as_mut() {
            sink(BuildProgress { kind, oid });
        }
        emitted.push((kind, bytes));
    }
}

fn assemble(emitted: &[(ObjectKind, Vec<u8>)], codec: &dyn Codec) -> Result<(Vec<u8>, ObjectId), PackError> {
    let mut body = Vec::new();
    let mut hasher = Sha1Hasher::new();

    let mut header = [0u8; PACK_HEADER_SIZE];
    header[0..4].copy_from_slice(PACK_SIGNATURE);
    header[4..8].copy_from_slice(&crate::PACK_VERSION.to_be_bytes());
    header[8..12].copy_from_slice(&(emitted.len() as u32).to_be_bytes());
    hasher.update(&header);
    body.extend_from_slice(&header);

    for (kind, content) in emitted {
        let entry_header = encode_entry_header(*kind, content.len());
        let compressed = codec.deflate(content)?;
        hasher.update(&entry_header);
        hasher.update(&compressed);
        body.extend_from_slice(&entry_header);
        body.extend_from_slice(&compressed);
    }

    let checksum = hasher.finalize();
    body.extend_from_slice(checksum.as_bytes());
    Ok((body, checksum))
}

/// Build a pack from `roots` and hand the finished bytes to the store.
/// Returns the pack's checksum, which also serves as an id for it.
pub fn build_and_persist(
    store: &dyn ObjectStore,
    roots: Vec<ObjectId>,
    codec: &dyn Codec,
) -> Result<ObjectId, PackError> {
    let (bytes, checksum) = PackBuilder::new(store, roots).build(codec)?;
    store.persist_pack(&bytes)?;
    Ok(checksum)
}
