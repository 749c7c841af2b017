//! FASTA segmenter (§6) — a `>description` header line followed by one or
//! more sequence lines, accumulated until the next `>` or end of input.

use crate::container::{Container, Item};
use crate::dict::{ContextStore, DictId};
use crate::error::Result;
use crate::reference::ReferenceStore;
use crate::segment::Segmenter;

pub fn toplevel_dict_id() -> DictId {
    DictId::from_name("FASTA_TOPLEVEL")
}

#[derive(Default)]
pub struct FastaSegmenter {
    current_seq: Vec<u8>,
    num_records: u32,
}

fn desc_id() -> DictId {
    DictId::from_name("DESC")
}
fn seq_id() -> DictId {
    DictId::from_name("SEQ")
}

impl FastaSegmenter {
    fn flush(&mut self, ctx_store: &mut ContextStore) {
        if !self.current_seq.is_empty() {
            ctx_store.get_or_create(seq_id(), "SEQ").seg_line(Some(&self.current_seq));
            self.current_seq.clear();
        }
    }

    pub fn num_records(&self) -> u32 {
        self.num_records
    }
}

impl Segmenter for FastaSegmenter {
    fn initialize(&mut self, ctx_store: &mut ContextStore) -> Container {
        ctx_store.get_or_create(desc_id(), "DESC");
        ctx_store.get_or_create(seq_id(), "SEQ");
        Container::new(
            toplevel_dict_id(),
            0,
            vec![Item::new(desc_id(), [b'\n', 0]), Item::new(seq_id(), [b'\n', 0])],
        )
    }

    fn seg_line(&mut self, ctx_store: &mut ContextStore, _reference: Option<&ReferenceStore>, line: &[u8]) -> Result<()> {
        if let Some(desc) = line.strip_prefix(b">") {
            self.flush(ctx_store);
            ctx_store.get_or_create(desc_id(), "DESC").seg_line(Some(desc));
            self.num_records += 1;
        } else {
            self.current_seq.extend_from_slice(line);
        }
        Ok(())
    }

    fn finalize(&mut self, ctx_store: &mut ContextStore) {
        self.flush(ctx_store);
    }

    fn num_repeats(&self) -> u32 {
        self.num_records
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accumulates_multiline_sequence_under_one_record() {
        let mut seg = FastaSegmenter::default();
        let mut store = ContextStore::default();
        seg.initialize(&mut store);
        seg.seg_line(&mut store, None, b">chr1 test").unwrap();
        seg.seg_line(&mut store, None, b"ACGTACGT").unwrap();
        seg.seg_line(&mut store, None, b"ACGT").unwrap();
        seg.finalize(&mut store);
        assert_eq!(seg.num_records(), 1);
        let seq_ctx = store.get(seq_id()).unwrap();
        assert_eq!(seq_ctx.nodes[0], b"ACGTACGTACGT");
    }
}
