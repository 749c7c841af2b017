//! Container / reconstructor machinery (§4.1, §6).
//!
//! A [`Container`] is a declarative template for one repeating unit of
//! output: "emit these items, separated like this, this many times". PIZ
//! reconstruction is nothing but walking a toplevel container recursively;
//! segmenters build one during ZIP and the b250 stream for its own dict_id
//! records one Container snip per line (so a later line reusing the exact
//! same item layout just points back to the same snip, the common case for
//! fixed-column formats like VCF).

use crate::dict::b250::B250Code;
use crate::dict::{ContextStore, DictId};
use crate::error::{GenozipError, Result};

/// One field slot within a container repeat.
#[derive(Debug, Clone)]
pub struct Item {
    pub dict_id: DictId,
    /// Bytes emitted after this item's value (commonly b"\t" or b"\n\0").
    pub separator: [u8; 2],
    pub translator_id: Option<u8>,
}

impl Item {
    pub fn new(dict_id: DictId, separator: [u8; 2]) -> Self {
        Item { dict_id, separator, translator_id: None }
    }

    pub fn with_translator(mut self, id: u8) -> Self {
        self.translator_id = Some(id);
        self
    }
}

/// A reconstruction template: emit `items` in order, `repeats` times.
/// `filter_repeats`/`filter_items` let a data-type callback suppress whole
/// repeats or individual items (used for `--grep`/`--header-only`/
/// `--regions` per §4.1) without the core needing format-specific logic.
pub struct Container {
    pub dict_id: DictId,
    pub repeats: u32,
    pub items: Vec<Item>,
}

impl Container {
    pub fn new(dict_id: DictId, repeats: u32, items: Vec<Item>) -> Self {
        Container { dict_id, repeats, items }
    }

    /// Serializes this container's template (dict_id, repeats, item list) so
    /// it can travel inside a `VbHeader` section of the on-disk format (§6)
    /// instead of being implicit per-segmenter state.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(16 + self.items.len() * 11);
        out.extend_from_slice(&self.dict_id.0.to_be_bytes());
        out.extend_from_slice(&self.repeats.to_be_bytes());
        out.extend_from_slice(&(self.items.len() as u32).to_be_bytes());
        for item in &self.items {
            out.extend_from_slice(&item.dict_id.0.to_be_bytes());
            out.push(item.separator[0]);
            out.push(item.separator[1]);
            out.push(item.translator_id.unwrap_or(0xff));
        }
        out
    }

    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let err = || GenozipError::Other("truncated container template".into());
        if data.len() < 16 {
            return Err(err());
        }
        let dict_id = DictId(u64::from_be_bytes(data[0..8].try_into().unwrap()));
        let repeats = u32::from_be_bytes(data[8..12].try_into().unwrap());
        let num_items = u32::from_be_bytes(data[12..16].try_into().unwrap()) as usize;
        let mut items = Vec::with_capacity(num_items);
        let mut pos = 16;
        for _ in 0..num_items {
            if pos + 11 > data.len() {
                return Err(err());
            }
            let id = DictId(u64::from_be_bytes(data[pos..pos + 8].try_into().unwrap()));
            let sep = [data[pos + 8], data[pos + 9]];
            let translator_id = data[pos + 10];
            let mut item = Item::new(id, sep);
            if translator_id != 0xff {
                item = item.with_translator(translator_id);
            }
            items.push(item);
            pos += 11;
        }
        Ok(Container::new(dict_id, repeats, items))
    }
}

/// Per-repeat, per-item suppression hook (`--grep`/`--header-only`/
/// `--regions`, §4.1). Returns `false` to suppress.
pub type ItemFilter<'a> = dyn Fn(u32, &Item) -> bool + 'a;

/// Already-reconstructed item values from the current container repeat, in
/// emission order — lets a translator look back at sibling fields emitted
/// earlier in the same line (e.g. SAM's SEQ translator needs RNAME/POS/CIGAR,
/// all of which precede SEQ in column order).
#[derive(Default)]
pub struct LineValues {
    values: Vec<(DictId, Vec<u8>)>,
}

impl LineValues {
    pub(crate) fn push(&mut self, dict_id: DictId, value: Vec<u8>) {
        self.values.push((dict_id, value));
    }

    /// Looks up the most-recently-pushed value for `dict_id`, if any.
    pub fn get(&self, dict_id: DictId) -> Option<&[u8]> {
        self.values.iter().rev().find(|(id, _)| *id == dict_id).map(|(_, v)| v.as_slice())
    }
}

/// Rewrites a just-reconstructed item's bytes in place for cross-format
/// output (23andMe→VCF, SAM SEQ-against-reference, §4.1 "Translators").
/// Given access to `ctx_store` (for contexts that aren't container items,
/// such as SAM's SQBITMAP/NONREF side channels) and `line` (sibling items
/// already reconstructed this repeat) since the rewrite can depend on more
/// than just its own raw value.
pub trait Translator: Send + Sync {
    fn translate(
        &self,
        dict_id: DictId,
        value: &[u8],
        ctx_store: &mut ContextStore,
        line: &LineValues,
    ) -> Result<Vec<u8>>;
}

/// Registry of translators by small integer id, scoped to one source×target
/// data-type pair.
#[derive(Default)]
pub struct TranslatorTable {
    translators: Vec<Box<dyn Translator>>,
}

impl TranslatorTable {
    pub fn register(&mut self, translator: Box<dyn Translator>) -> u8 {
        self.translators.push(translator);
        (self.translators.len() - 1) as u8
    }

    pub fn get(&self, id: u8) -> Option<&dyn Translator> {
        self.translators.get(id as usize).map(|b| b.as_ref())
    }

    pub fn is_empty(&self) -> bool {
        self.translators.is_empty()
    }
}

/// Walks `container`, resolving each item's next snip from `ctx_store`, with
/// an optional item filter and translator table. Returns the fully
/// reconstructed bytes for all repeats.
pub fn reconstruct(
    container: &Container,
    ctx_store: &mut ContextStore,
    translators: Option<&TranslatorTable>,
    filter: Option<&ItemFilter>,
) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    for repeat in 0..container.repeats {
        let mut line = LineValues::default();
        for item in &container.items {
            if let Some(f) = filter {
                if !f(repeat, item) {
                    continue;
                }
            }
            let bytes = {
                let ctx = ctx_store
                    .get_mut(item.dict_id)
                    .ok_or(GenozipError::Dict(crate::error::DictError::UnknownDictId(item.dict_id.0)))?;
                ctx.next_reconstructed()?
            };
            let bytes = match (item.translator_id, translators) {
                (Some(id), Some(table)) => match table.get(id) {
                    Some(t) => t.translate(item.dict_id, &bytes, ctx_store, &line)?,
                    None => bytes,
                },
                _ => bytes,
            };
            line.push(item.dict_id, bytes.clone());
            out.extend_from_slice(&bytes);
            if item.separator[0] != 0 {
                out.push(item.separator[0]);
            }
            if item.separator[1] != 0 {
                out.push(item.separator[1]);
            }
        }
    }
    Ok(out)
}

/// 23andMe → VCF row translator (§2, supplemented from `me23.c`): rewrites a
/// genotype subfield's two allele characters against the reference base so
/// the reconstructed VCF row reports `REF`/`ALT`/`GT` instead of 23andMe's
/// raw two-letter genotype column.
pub struct Me23ToVcfGenotype {
    pub ref_base: u8,
}

impl Me23ToVcfGenotype {
    /// Rewrites a two-letter 23andMe genotype column against `ref_base` into
    /// a VCF-style `GT` value (`0/0`, `0/1`, `1/1`). Values that aren't a
    /// two-letter genotype (missing calls, indels) pass through unchanged.
    pub fn rewrite(&self, value: &[u8]) -> Vec<u8> {
        if value.len() != 2 {
            return value.to_vec();
        }
        let alleles = [value[0], value[1]];
        let alt = alleles.iter().copied().find(|&b| b != self.ref_base);
        match alt {
            None => b"0/0".to_vec(),
            Some(_) => {
                let code = |b: u8| if b == self.ref_base { b'0' } else { b'1' };
                vec![code(alleles[0]), b'/', code(alleles[1])]
            }
        }
    }
}

impl Translator for Me23ToVcfGenotype {
    fn translate(
        &self,
        _dict_id: DictId,
        value: &[u8],
        _ctx_store: &mut ContextStore,
        _line: &LineValues,
    ) -> Result<Vec<u8>> {
        Ok(self.rewrite(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reconstruct_two_field_line() {
        let mut store = ContextStore::default();
        let chrom_id = DictId::from_name("CHROM");
        let pos_id = DictId::from_name("POS");
        {
            let chrom_ctx = store.get_or_create(chrom_id, "CHROM");
            chrom_ctx.intern(b"chr1");
            chrom_ctx.b250.push(B250Code::Index(0));
        }
        {
            let pos_ctx = store.get_or_create(pos_id, "POS");
            pos_ctx.intern(b"100");
            pos_ctx.b250.push(B250Code::Index(0));
        }

        let container = Container::new(
            DictId::from_name("TOPLEVEL"),
            1,
            vec![
                Item::new(chrom_id, [b'\t', 0]),
                Item::new(pos_id, [b'\n', 0]),
            ],
        );

        let out = reconstruct(&container, &mut store, None, None).unwrap();
        assert_eq!(out, b"chr1\t100\n");
    }

    #[test]
    fn me23_translator_heterozygous() {
        let t = Me23ToVcfGenotype { ref_base: b'A' };
        assert_eq!(t.rewrite(b"AG"), b"0/1");
        assert_eq!(t.rewrite(b"AA"), b"0/0");
    }

    #[test]
    fn me23_translator_trait_delegates_to_rewrite() {
        let t = Me23ToVcfGenotype { ref_base: b'A' };
        let mut store = ContextStore::default();
        let line = LineValues::default();
        let out = t.translate(DictId::from_name("GT"), b"AG", &mut store, &line).unwrap();
        assert_eq!(out, b"0/1");
    }

    #[test]
    fn container_template_roundtrip() {
        let container = Container::new(
            DictId::from_name("VCF_TOPLEVEL"),
            3,
            vec![
                Item::new(DictId::from_name("CHROM"), [b'\t', 0]),
                Item::new(DictId::from_name("GENOTYPE"), [b'\n', 0]).with_translator(0),
            ],
        );
        let bytes = container.to_bytes();
        let back = Container::from_bytes(&bytes).unwrap();
        assert_eq!(back.dict_id, container.dict_id);
        assert_eq!(back.repeats, 3);
        assert_eq!(back.items.len(), 2);
        assert_eq!(back.items[1].translator_id, Some(0));
    }

    #[test]
    fn unknown_dict_id_is_fatal() {
        let mut store = ContextStore::default();
        let container = Container::new(
            DictId::from_name("TOPLEVEL"),
            1,
            vec![Item::new(DictId::from_name("NOPE"), [b'\n', 0])],
        );
        assert!(reconstruct(&container, &mut store, None, None).is_err());
    }
}
