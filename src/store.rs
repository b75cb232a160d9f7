//! The object store collaborator interface.
//!
//! This crate never owns an on-disk object database; it is handed one as a
//! trait object by the caller. The resolver calls `retrieve` to materialize
//! REF_DELTA bases that live outside the pack being parsed; the builder
//! calls `find_packed` and `retrieve` while walking history, and
//! `persist_pack` once the finished pack is ready to be written somewhere
//! durable.

use crate::hash::ObjectId;
use crate::ObjectKind;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("object not found in store: {0}")]
    NotFound(ObjectId),
    #[error("object store failure: {0}")]
    Other(String),
}

pub trait ObjectStore: Send + Sync {
    /// True if `oid` is already present in some pack the store knows about.
    /// Used by the builder to avoid re-emitting objects other packs already
    /// cover.
    fn find_packed(&self, oid: &ObjectId) -> bool;

    /// Fetch an object's kind and raw (undeltified) content.
    ///
    /// Returns `StoreError::NotFound` if the store has no such object; the
    /// resolver and builder both treat that distinctly from other failures.
    fn retrieve(&self, oid: &ObjectId) -> Result<(ObjectKind, Vec<u8>), StoreError>;

    /// Persist a finished pack's bytes. Called by the caller-facing build
    /// helper, never by `PackBuilder` itself.
    fn persist_pack(&self, bytes: &[u8]) -> Result<(), StoreError>;
}

/// A trivial in-memory object store, useful for tests and small embedded
/// uses. Objects are keyed by their SHA-1 id; `persist_pack` just appends
/// the bytes to an internal log rather than writing to disk.
#[derive(Default)]
pub struct InMemoryObjectStore {
    objects: std::sync::RwLock<std::collections::HashMap<ObjectId, (ObjectKind, Vec<u8>)>>,
    packed: std::sync::RwLock<std::collections::HashSet<ObjectId>>,
    persisted_packs: std::sync::RwLock<Vec<Vec<u8>>>,
}

impl InMemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a loose object, returning its computed id.
    pub fn insert(&self, kind: ObjectKind, content: Vec<u8>) -> ObjectId {
        let oid = crate::hash::hash_object(kind, &content);
        self.objects.write().unwrap().insert(oid, (kind, content));
        oid
    }

    /// Mark an id as already covered by some other pack.
    pub fn mark_packed(&self, oid: ObjectId) {
        self.packed.write().unwrap().insert(oid);
    }

    pub fn persisted_packs(&self) -> Vec<Vec<u8>> {
        self.persisted_packs.read().unwrap().clone()
    }
}

impl ObjectStore for InMemoryObjectStore {
    fn find_packed(&self, oid: &ObjectId) -> bool {
        self.packed.read().unwrap().contains(oid)
    }

    fn retrieve(&self, oid: &ObjectId) -> Result<(ObjectKind, Vec<u8>), StoreError> {
        self.objects
            .read()
            .unwrap()
            .get(oid)
            .cloned()
            .ok_or(StoreError::NotFound(*oid))
    }

    fn persist_pack(&self, bytes: &[u8]) -> Result<(), StoreError> {
        self.persisted_packs.write().unwrap().push(bytes.to_vec());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_then_retrieve() {
        let store = InMemoryObjectStore::new();
        let oid = store.insert(ObjectKind::Blob, b"hello\n".to_vec());
        let (kind, content) = store.retrieve(&oid).unwrap();
        assert_eq!(kind, ObjectKind::Blob);
        assert_eq!(content, b"hello\n");
    }

    #[test]
    fn missing_object_is_not_found() {
        let store = InMemoryObjectStore::new();
        let oid = ObjectId::from_hex("000000000000000000000000000000000000000a").unwrap();
        assert!(matches!(store.retrieve(&oid), Err(StoreError::NotFound(_))));
    }

    #[test]
    fn find_packed_reflects_marked_ids() {
        let store = InMemoryObjectStore::new();
        let oid = store.insert(ObjectKind::Tree, b"tree-bytes".to_vec());
        assert!(!store.find_packed(&oid));
        store.mark_packed(oid);
        assert!(store.find_packed(&oid));
    }
}
