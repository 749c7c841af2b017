//! GVF/GFF3 segmenter (§6; grounded in `original_source/seg_gff3.c`) — the
//! standard nine tab-separated columns, with the `attributes` column
//! further split on `;`-separated `key=value` pairs into per-key contexts
//! so repeated keys across features (e.g. `ID=`, `Parent=`) dictionary-encode
//! well instead of going through one opaque blob context.

use crate::container::{Container, Item};
use crate::dict::{ContextStore, DictId};
use crate::error::Result;
use crate::reference::ReferenceStore;
use crate::segment::Segmenter;

const COLUMNS: [&str; 8] =
    ["SEQID", "SOURCE", "TYPE", "START", "END", "SCORE", "STRAND", "PHASE"];

pub fn toplevel_dict_id() -> DictId {
    DictId::from_name("GVF_TOPLEVEL")
}

#[derive(Default)]
pub struct GvfSegmenter {
    /// Attribute keys discovered so far, in first-seen order, so the
    /// toplevel container's item list is stable once all lines are seen.
    attr_keys: Vec<String>,
    num_lines: u32,
}

impl GvfSegmenter {
    pub fn num_lines(&self) -> u32 {
        self.num_lines
    }

    fn attr_dict_id(key: &str) -> DictId {
        DictId::from_name(&format!("ATTR_{key}"))
    }
}

impl Segmenter for GvfSegmenter {
    fn initialize(&mut self, ctx_store: &mut ContextStore) -> Container {
        let mut items = Vec::with_capacity(COLUMNS.len());
        for name in COLUMNS.iter() {
            let id = DictId::from_name(name);
            ctx_store.get_or_create(id, name);
            items.push(Item::new(id, [b'\t', 0]));
        }
        let attr_id = DictId::from_name("ATTRIBUTES_RAW");
        ctx_store.get_or_create(attr_id, "ATTRIBUTES_RAW");
        items.push(Item::new(attr_id, [b'\n', 0]));
        Container::new(toplevel_dict_id(), 0, items)
    }

    fn seg_line(&mut self, ctx_store: &mut ContextStore, _reference: Option<&ReferenceStore>, line: &[u8]) -> Result<()> {
        if line.starts_with(b"#") {
            return Ok(());
        }
        let fields: Vec<&[u8]> = line.splitn(9, |&b| b == b'\t').collect();
        for (i, name) in COLUMNS.iter().enumerate() {
            let id = DictId::from_name(name);
            ctx_store.get_or_create(id, name).seg_line(fields.get(i).copied());
        }
        let raw_attrs = fields.get(8).copied().unwrap_or(b"");
        ctx_store.get_or_create(DictId::from_name("ATTRIBUTES_RAW"), "ATTRIBUTES_RAW").seg_line(Some(raw_attrs));

        if let Ok(text) = std::str::from_utf8(raw_attrs) {
            for pair in text.split(';') {
                if let Some((key, _value)) = pair.split_once('=') {
                    if !self.attr_keys.iter().any(|k| k == key) {
                        self.attr_keys.push(key.to_string());
                    }
                    let id = Self::attr_dict_id(key);
                    let name: &'static str = Box::leak(format!("ATTR_{key}").into_boxed_str());
                    let value = pair.split_once('=').map(|(_, v)| v.as_bytes());
                    ctx_store.get_or_create(id, name).seg_line(value);
                }
            }
        }
        self.num_lines += 1;
        Ok(())
    }

    fn finalize(&mut self, _ctx_store: &mut ContextStore) {}

    fn num_repeats(&self) -> u32 {
        self.num_lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_attribute_column_into_per_key_contexts() {
        let mut seg = GvfSegmenter::default();
        let mut store = ContextStore::default();
        seg.initialize(&mut store);
        seg.seg_line(&mut store, None, b"chr1\t.\tgene\t1\t100\t.\t+\t.\tID=gene1;Name=foo").unwrap();
        assert_eq!(seg.num_lines(), 1);
        let id_ctx = store.get(GvfSegmenter::attr_dict_id("ID")).unwrap();
        assert_eq!(id_ctx.nodes[0], b"gene1");
        let name_ctx = store.get(GvfSegmenter::attr_dict_id("Name")).unwrap();
        assert_eq!(name_ctx.nodes[0], b"foo");
    }
}
