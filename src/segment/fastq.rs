//! FASTQ segmenter (§6, §8 scenario 2) — each record is four lines
//! (`@header`, `seq`, `+[header]`, `qual`); `seg_line` is called once per
//! physical line and dispatches on `line_index % 4`.

use crate::container::{Container, Item};
use crate::dict::{ContextStore, DictId};
use crate::error::{GenozipError, Result};
use crate::reference::ReferenceStore;
use crate::segment::Segmenter;

pub fn toplevel_dict_id() -> DictId {
    DictId::from_name("FASTQ_TOPLEVEL")
}

fn dict_ids() -> [DictId; 3] {
    [DictId::from_name("DESC"), DictId::from_name("SEQ"), DictId::from_name("QUAL")]
}

#[derive(Default)]
pub struct FastqSegmenter {
    line_index: u32,
    num_reads: u32,
}

impl FastqSegmenter {
    pub fn num_reads(&self) -> u32 {
        self.num_reads
    }
}

impl Segmenter for FastqSegmenter {
    fn initialize(&mut self, ctx_store: &mut ContextStore) -> Container {
        let [desc, seq, qual] = dict_ids();
        ctx_store.get_or_create(desc, "DESC");
        ctx_store.get_or_create(seq, "SEQ");
        ctx_store.get_or_create(qual, "QUAL");
        Container::new(
            toplevel_dict_id(),
            0,
            vec![
                Item::new(desc, [b'\n', 0]),
                Item::new(seq, [b'\n', 0]),
                Item::new(DictId::from_name("PLUS_LINE"), [b'\n', 0]),
                Item::new(qual, [b'\n', 0]),
            ],
        )
    }

    fn seg_line(&mut self, ctx_store: &mut ContextStore, _reference: Option<&ReferenceStore>, line: &[u8]) -> Result<()> {
        let [desc, seq, qual] = dict_ids();
        match self.line_index % 4 {
            0 => {
                if !line.starts_with(b"@") {
                    return Err(GenozipError::Other(format!("FASTQ record {} missing '@' header", self.num_reads)));
                }
                ctx_store.get_or_create(desc, "DESC").seg_line(Some(&line[1..]));
            }
            1 => ctx_store.get_or_create(seq, "SEQ").seg_line(Some(line)),
            2 => ctx_store.get_or_create(DictId::from_name("PLUS_LINE"), "PLUS_LINE").seg_line(Some(line)),
            3 => {
                ctx_store.get_or_create(qual, "QUAL").seg_line(Some(line));
                self.num_reads += 1;
            }
            _ => unreachable!(),
        }
        self.line_index += 1;
        Ok(())
    }

    fn finalize(&mut self, _ctx_store: &mut ContextStore) {}

    fn num_repeats(&self) -> u32 {
        self.num_reads
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn segments_four_line_records() {
        let mut seg = FastqSegmenter::default();
        let mut store = ContextStore::default();
        seg.initialize(&mut store);
        for line in [&b"@read1"[..], b"ACGT", b"+", b"IIII"] {
            seg.seg_line(&mut store, None, line).unwrap();
        }
        assert_eq!(seg.num_reads(), 1);
    }

    #[test]
    fn rejects_record_missing_at_header() {
        let mut seg = FastqSegmenter::default();
        let mut store = ContextStore::default();
        seg.initialize(&mut store);
        assert!(seg.seg_line(&mut store, None, b"not-a-header").is_err());
    }
}
