//! End-to-end tests: build a pack from a small object graph, parse it back,
//! resolve every entry, and check the materialized content matches.

use git_pack::builder::PackBuilder;
use git_pack::codec::ZlibCodec;
use git_pack::entry::ObjectKind;
use git_pack::hash::hash_object;
use git_pack::store::InMemoryObjectStore;
use git_pack::{parser, resolver};

fn tree_entry(mode: &str, name: &str, oid: &git_pack::ObjectId) -> Vec<u8> {
    let mut buf = Vec::new();
    buf.extend_from_slice(mode.as_bytes());
    buf.push(b' ');
    buf.extend_from_slice(name.as_bytes());
    buf.push(0);
    buf.extend_from_slice(oid.as_bytes());
    buf
}

fn commit_bytes(tree: git_pack::ObjectId, message: &str) -> Vec<u8> {
    format!(
        "tree {tree}\nauthor a <a@example.com> 0 +0000\ncommitter a <a@example.com> 0 +0000\n\n{message}\n"
    )
    .into_bytes()
}

#[test]
fn roundtrip_single_blob() {
    let store = InMemoryObjectStore::new();
    let content = b"roundtrip test blob".to_vec();
    let blob = store.insert(ObjectKind::Blob, content.clone());
    let tree = store.insert(ObjectKind::Tree, tree_entry("100644", "blob.txt", &blob));
    let commit = store.insert(ObjectKind::Commit, commit_bytes(tree, "single blob"));

    let (bytes, _) = PackBuilder::new(&store, vec![commit]).build(&ZlibCodec).unwrap();
    let mut parsed = parser::parse(&bytes, &ZlibCodec).unwrap();
    resolver::resolve_all(&mut parsed.entries, &store).unwrap();

    let blob_entry = parsed
        .entries
        .iter()
        .find(|e| e.kind == ObjectKind::Blob)
        .unwrap();
    assert_eq!(blob_entry.payload.as_deref(), Some(content.as_slice()));
    assert_eq!(blob_entry.sha1, Some(blob));
}

#[test]
fn roundtrip_multiple_objects() {
    let store = InMemoryObjectStore::new();
    let blobs: Vec<_> = ["alpha", "beta", "gamma", "delta"]
        .iter()
        .map(|s| store.insert(ObjectKind::Blob, s.as_bytes().to_vec()))
        .collect();

    let mut tree_content = Vec::new();
    for (i, oid) in blobs.iter().enumerate() {
        tree_content.extend(tree_entry("100644", &format!("file{i}"), oid));
    }
    let tree = store.insert(ObjectKind::Tree, tree_content);
    let commit = store.insert(ObjectKind::Commit, commit_bytes(tree, "four blobs"));

    let (bytes, checksum) = PackBuilder::new(&store, vec![commit]).build(&ZlibCodec).unwrap();
    let parsed = parser::parse(&bytes, &ZlibCodec).unwrap();
    assert_eq!(parsed.checksum, checksum);
    // four blobs + one tree + one commit
    assert_eq!(parsed.entries.len(), 6);
}

#[test]
fn roundtrip_with_ofs_delta_chain() {
    use git_pack::delta::compute::compute_delta;
    use git_pack::entry::encode_entry_header;
    use git_pack::varint::write_ofs_delta_offset;
    use git_pack::{PACK_HEADER_SIZE, PACK_SIGNATURE, PACK_VERSION};

    let base_content =
        b"This is the base content that will be used for delta compression testing.".to_vec();
    let modified_content =
        b"This is the modified content that will be used for delta compression testing!".to_vec();

    let codec = ZlibCodec;
    let base_oid = hash_object(ObjectKind::Blob, &base_content);
    let modified_oid = hash_object(ObjectKind::Blob, &modified_content);
    let delta = compute_delta(&base_content, &modified_content);

    let mut body = Vec::new();
    body.extend_from_slice(PACK_SIGNATURE);
    body.extend_from_slice(&PACK_VERSION.to_be_bytes());
    body.extend_from_slice(&2u32.to_be_bytes());

    let base_offset = body.len() as u64;
    body.extend_from_slice(&encode_entry_header(ObjectKind::Blob, base_content.len()));
    {
        use git_pack::codec::Codec;
        body.extend_from_slice(&codec.deflate(&base_content).unwrap());
    }

    let delta_offset = body.len() as u64;
    body.extend_from_slice(&encode_entry_header(
        ObjectKind::OfsDelta { base_offset: 0 },
        delta.len(),
    ));
    body.extend_from_slice(&write_ofs_delta_offset(delta_offset - base_offset));
    {
        use git_pack::codec::Codec;
        body.extend_from_slice(&codec.deflate(&delta).unwrap());
    }

    let checksum = git_pack::hash::sha1(&body);
    body.extend_from_slice(checksum.as_bytes());

    let mut parsed = parser::parse(&body, &codec).unwrap();
    let store = InMemoryObjectStore::new();
    resolver::resolve_all(&mut parsed.entries, &store).unwrap();

    assert_eq!(parsed.entries[0].sha1, Some(base_oid));
    assert_eq!(parsed.entries[1].sha1, Some(modified_oid));
    assert_eq!(
        parsed.entries[1].payload.as_deref(),
        Some(modified_content.as_slice())
    );
}

#[test]
fn corrupted_pack_is_rejected_wholesale() {
    let store = InMemoryObjectStore::new();
    let blob = store.insert(ObjectKind::Blob, b"data".to_vec());
    let tree = store.insert(ObjectKind::Tree, tree_entry("100644", "d", &blob));
    let commit = store.insert(ObjectKind::Commit, commit_bytes(tree, "corrupt me"));

    let (mut bytes, _) = PackBuilder::new(&store, vec![commit]).build(&ZlibCodec).unwrap();
    let last = bytes.len() - 1;
    bytes[last] ^= 0xff;

    assert!(parser::parse(&bytes, &ZlibCodec).is_err());
}
