//! Delta resolution: rewrites OFS_DELTA/REF_DELTA entries produced by
//! [`crate::parser`] into materialized objects with a kind, content, and
//! SHA-1.
//!
//! Each entry is resolved by walking its delta chain down to a
//! materialized base, collecting the chain on an explicit stack rather
//! than recursing — a pack can legally chain hundreds of deltas deep, and
//! this avoids needing that many native stack frames. OFS_DELTA chains
//! cannot cycle (offsets strictly decrease), so only REF_DELTA chains carry
//! an `on_chain` check against this possibility.
//!
//! That check is defense-in-depth rather than the primary guard against a
//! genuine two-entry REF_DELTA cycle (A's base is B's sha1, B's base is
//! A's sha1): bases are looked up by *already-materialized* sha1
//! ([`resolve_all`]'s `sha1_to_index`), and an entry on the chain currently
//! being resolved is by definition not materialized yet, so such a cycle
//! never matches `on_chain` in practice — it instead falls through to
//! [`materialize_from_store`] and surfaces as [`PackError::MissingBase`],
//! since no real pack can make two objects' content-addressed hashes
//! mutually depend on each other. See the `cyclic_ref_delta_is_rejected`
//! and `mutual_ref_delta_reference_surfaces_as_missing_base` tests below for
//! both halves of this.

use std::collections::HashMap;

use crate::delta::apply::apply_delta;
use crate::entry::{ObjectKind, PackEntry};
use crate::hash::hash_object;
use crate::store::{ObjectStore, StoreError};
use crate::{ObjectId, PackError, MAX_DELTA_CHAIN_DEPTH};

/// Resolve every entry in `entries` in place. Entries are processed in
/// pack order; resolving one may resolve others transitively (anything
/// earlier in its chain), which later iterations then skip.
pub fn resolve_all(entries: &mut [PackEntry], store: &dyn ObjectStore) -> Result<(), PackError> {
    let offset_to_index: HashMap<u64, usize> = entries
        .iter()
        .enumerate()
        .map(|(i, e)| (e.offset, i))
        .collect();
    let mut sha1_to_index: HashMap<ObjectId, usize> = entries
        .iter()
        .enumerate()
        .filter_map(|(i, e)| e.sha1.map(|s| (s, i)))
        .collect();

    for i in 0..entries.len() {
        resolve_one(entries, i, &offset_to_index, &mut sha1_to_index, store)?;
    }
    Ok(())
}

fn resolve_one(
    entries: &mut [PackEntry],
    start: usize,
    offset_to_index: &HashMap<u64, usize>,
    sha1_to_index: &mut HashMap<ObjectId, usize>,
    store: &dyn ObjectStore,
) -> Result<(), PackError> {
    if entries[start].is_resolved() {
        return Ok(());
    }

    // Walk down the chain, collecting indices from `start` towards its
    // base, until we hit a materialized entry or an external base.
    let mut chain: Vec<usize> = Vec::new();
    let mut on_chain: std::collections::HashSet<usize> = std::collections::HashSet::new();
    let mut current = start;

    loop {
        if entries[current].is_resolved() {
            break;
        }
        if !on_chain.insert(current) {
            return Err(PackError::CyclicDelta(entries[current].offset));
        }
        chain.push(current);
        if chain.len() > MAX_DELTA_CHAIN_DEPTH {
            return Err(PackError::DeltaChainTooDeep {
                offset: entries[start].offset,
                max_depth: MAX_DELTA_CHAIN_DEPTH,
            });
        }

        current = match entries[current].kind {
            ObjectKind::OfsDelta { base_offset } => *offset_to_index
                .get(&base_offset)
                .ok_or(PackError::DanglingOffsetDelta {
                    offset: entries[current].offset,
                    distance: entries[current].offset.saturating_sub(base_offset),
                })?,
            ObjectKind::RefDelta { base_sha1 } => {
                if let Some(&idx) = sha1_to_index.get(&base_sha1) {
                    idx
                } else {
                    materialize_from_store(entries, &chain, base_sha1, store, sha1_to_index)?;
                    return Ok(());
                }
            }
            ObjectKind::Commit | ObjectKind::Tree | ObjectKind::Blob | ObjectKind::Tag => {
                unreachable!("materialized entries break out of the loop above")
            }
        };
    }

    let mut data = entries[current]
        .payload
        .clone()
        .expect("materialized entry retains its payload until release_payload() is called");
    let mut kind = entries[current].kind;

    for &idx in chain.iter().rev() {
        let delta = entries[idx]
            .payload
            .take()
            .expect("delta entry has a pending instruction stream");
        data = apply_delta(&data, &delta)?;
        let sha1 = hash_object(kind, &data);
        entries[idx].kind = kind;
        entries[idx].payload = Some(data.clone());
        entries[idx].sha1 = Some(sha1);
        sha1_to_index.insert(sha1, idx);
    }

    Ok(())
}

/// A REF_DELTA chain bottomed out at a base this pack doesn't contain;
/// fetch it from the store and apply the whole collected chain against it.
fn materialize_from_store(
    entries: &mut [PackEntry],
    chain: &[usize],
    base_sha1: ObjectId,
    store: &dyn ObjectStore,
    sha1_to_index: &mut HashMap<ObjectId, usize>,
) -> Result<(), PackError> {
    let (kind, mut data) = match store.retrieve(&base_sha1) {
        Ok(found) => found,
        Err(StoreError::NotFound(_)) => return Err(PackError::MissingBase(base_sha1)),
        Err(other) => return Err(PackError::Store(other)),
    };

    for &idx in chain.iter().rev() {
        let delta = entries[idx]
            .payload
            .take()
            .expect("delta entry has a pending instruction stream");
        data = apply_delta(&data, &delta)?;
        let sha1 = hash_object(kind, &data);
        entries[idx].kind = kind;
        entries[idx].payload = Some(data.clone());
        entries[idx].sha1 = Some(sha1);
        sha1_to_index.insert(sha1, idx);
    }

    Ok(())
}
