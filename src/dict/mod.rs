//! Component D — the context/dictionary store.
//!
//! Each distinct field across the input format (VCF's `CHROM`, `POS`, `INFO`
//! subfields, ...) gets one [`Ctx`], keyed by [`DictId`]. A `Ctx` holds the
//! dictionary of distinct snip values seen so far (`dict`/`nodes`), the
//! per-line reference into that dictionary (`b250`), and an optional
//! `local` side channel for values that don't dictionary-encode well
//! (numeric deltas, quality strings, sequence data).

pub mod b250;
pub mod ctx;

pub use ctx::{Ctx, Ltype};

use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};

/// An 8-byte identifier derived from a field name, used as the stable key
/// for a [`Ctx`] across VBlocks (§3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DictId(pub u64);

impl DictId {
    pub fn from_name(name: &str) -> Self {
        // FNV-1a over the field name — deterministic, stable across runs,
        // and collision-resistant enough for the handful of distinct field
        // names any one format defines.
        let mut hash: u64 = 0xcbf29ce484222325;
        for &b in name.as_bytes() {
            hash ^= b as u64;
            hash = hash.wrapping_mul(0x100000001b3);
        }
        DictId(hash)
    }
}

impl std::fmt::Display for DictId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:#018x}", self.0)
    }
}

struct AHashState;
impl std::hash::BuildHasher for AHashState {
    type Hasher = ahash::AHasher;
    fn build_hasher(&self) -> ahash::AHasher {
        ahash::AHasher::default()
    }
}

/// Owns every [`Ctx`] in a z_file, keyed by [`DictId`]. Lookups use
/// `ahash` (grounded in the sibling example pack's hash-table crate choice)
/// since this map is on the hot path of every segmented line.
pub struct ContextStore {
    contexts: std::collections::HashMap<DictId, Ctx, ahash::RandomState>,
    /// Insertion order, so z_file dictionary sections are written
    /// deterministically rather than in hash-iteration order.
    order: Vec<DictId>,
}

impl Default for ContextStore {
    fn default() -> Self {
        ContextStore {
            contexts: std::collections::HashMap::default(),
            order: Vec::new(),
        }
    }
}

impl ContextStore {
    pub fn get_or_create(&mut self, dict_id: DictId, name: &'static str) -> &mut Ctx {
        if !self.contexts.contains_key(&dict_id) {
            self.contexts.insert(dict_id, Ctx::new(dict_id, name));
            self.order.push(dict_id);
        }
        self.contexts.get_mut(&dict_id).unwrap()
    }

    pub fn get(&self, dict_id: DictId) -> Option<&Ctx> {
        self.contexts.get(&dict_id)
    }

    pub fn get_mut(&mut self, dict_id: DictId) -> Option<&mut Ctx> {
        self.contexts.get_mut(&dict_id)
    }

    /// Iterates contexts in deterministic insertion order, for on-disk
    /// dictionary-section write ordering.
    pub fn iter_in_order(&self) -> impl Iterator<Item = &Ctx> {
        self.order.iter().map(move |id| &self.contexts[id])
    }

    pub fn len(&self) -> usize {
        self.contexts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contexts.is_empty()
    }

    /// Builds a fresh VBlock-local store overlaying every context's current
    /// dictionary state (§4.5's clone step), one [`Ctx::clone_for_vb`] per
    /// entry, preserving insertion order.
    pub fn deep_clone_for_vb(&self) -> ContextStore {
        let mut out = ContextStore::default();
        for id in &self.order {
            let cloned = self.contexts[id].clone_for_vb();
            out.contexts.insert(*id, cloned);
            out.order.push(*id);
        }
        out
    }

    /// Merges a VBlock-local context's newly-seen snips into the z_file-wide
    /// dictionary (§4.5): snips already present keep their global node
    /// index; new snips are appended and get the next available index.
    /// Returns a translation table from the VBlock's local node indices to
    /// global ones, used to rewrite the VBlock's `b250` stream in place.
    pub fn merge_vb_context(&mut self, dict_id: DictId, name: &'static str, vb_ctx: &Ctx) -> Vec<u32> {
        let global = self.get_or_create(dict_id, name);
        let mut translation = Vec::with_capacity(vb_ctx.nodes.len());
        for snip in &vb_ctx.nodes {
            let idx = global.intern(snip);
            translation.push(idx);
        }
        translation
    }
}

/// Deterministic ordering helper used by tests and by the section writer:
/// sorts dict_ids so output is reproducible across runs regardless of
/// hash-map iteration order.
pub fn sorted_dict_ids(map: &BTreeMap<DictId, ()>) -> Vec<DictId> {
    map.keys().copied().collect()
}

#[allow(dead_code)]
fn hash_of(id: &DictId) -> u64 {
    let mut hasher = ahash::AHasher::default();
    id.hash(&mut hasher);
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dict_id_deterministic() {
        assert_eq!(DictId::from_name("CHROM"), DictId::from_name("CHROM"));
        assert_ne!(DictId::from_name("CHROM"), DictId::from_name("POS"));
    }

    #[test]
    fn context_store_insertion_order_preserved() {
        let mut store = ContextStore::default();
        store.get_or_create(DictId::from_name("POS"), "POS");
        store.get_or_create(DictId::from_name("CHROM"), "CHROM");
        let names: Vec<&str> = store.iter_in_order().map(|c| c.name).collect();
        assert_eq!(names, vec!["POS", "CHROM"]);
    }

    #[test]
    fn deep_clone_for_vb_preserves_order_and_dict_state() {
        let mut store = ContextStore::default();
        store.get_or_create(DictId::from_name("CHROM"), "CHROM").intern(b"chr1");
        store.get_or_create(DictId::from_name("POS"), "POS").intern(b"100");
        let clone = store.deep_clone_for_vb();
        let names: Vec<&str> = clone.iter_in_order().map(|c| c.name).collect();
        assert_eq!(names, vec!["CHROM", "POS"]);
        assert_eq!(clone.get(DictId::from_name("CHROM")).unwrap().nodes, vec![b"chr1".to_vec()]);
    }

    #[test]
    fn merge_vb_context_translates_indices() {
        let mut vb_ctx = Ctx::new(DictId::from_name("CHROM"), "CHROM");
        let i1 = vb_ctx.intern(b"chr1");
        let i2 = vb_ctx.intern(b"chr2");
        assert_eq!((i1, i2), (0, 1));

        let mut store = ContextStore::default();
        // Pre-seed the global dict with chr2 first.
        store.get_or_create(DictId::from_name("CHROM"), "CHROM").intern(b"chr2");

        let translation = store.merge_vb_context(DictId::from_name("CHROM"), "CHROM", &vb_ctx);
        // vb local idx 0 ("chr1") -> global idx 1 (new); idx 1 ("chr2") -> global idx 0 (existing)
        assert_eq!(translation, vec![1, 0]);
    }
}
