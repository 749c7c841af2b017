//! SAM segmenter (§6) — representative coverage of the eleven mandatory
//! SAM columns; optional tag fields are kept as one joined `TAGS` blob
//! rather than split per-tag (full per-tag dictionary splitting is a
//! format-quirk detail the Non-goals exclude).
//!
//! When a reference is available and a read's RNAME/POS/CIGAR resolve
//! against it, `SEQ` is not stored literally: the per-base match bitmap and
//! the diverging bases go into `SQBITMAP`/`NONREF` instead (§4.2), and
//! [`SamSeqTranslator`] rebuilds the literal bytes from the reference on
//! reconstruction. Reads that can't be resolved against a reference (no
//! `--reference`, unmapped, unrecognized CIGAR op) fall back to storing
//! `SEQ` literally, exactly as before.

use std::sync::Arc;

use crate::container::{Container, Item, LineValues, Translator};
use crate::dict::{ContextStore, DictId};
use crate::error::{GenozipError, Result};
use crate::reference::seqcoder::{self, CigarOp};
use crate::reference::{RefMode, ReferenceStore};
use crate::segment::Segmenter;

const COLUMNS: [&str; 11] = [
    "QNAME", "FLAG", "RNAME", "POS", "MAPQ", "CIGAR", "RNEXT", "PNEXT", "TLEN", "SEQ", "QUAL",
];
const SEQ_COLUMN: usize = 9;

/// Index into the translator table `SamSeqTranslator` registers itself
/// under — relies on it always being the only translator registered for a
/// SAM archive's decompression (`Session::decompress`).
pub const SAM_SEQ_TRANSLATOR_ID: u8 = 0;

pub fn toplevel_dict_id() -> DictId {
    DictId::from_name("SAM_TOPLEVEL")
}

fn sqbitmap_id() -> DictId {
    DictId::from_name("SQBITMAP")
}
fn nonref_id() -> DictId {
    DictId::from_name("NONREF")
}
fn seq_mode_id() -> DictId {
    DictId::from_name("SEQ_MODE")
}

#[derive(Default)]
pub struct SamSegmenter {
    num_lines: u32,
}

fn dict_ids() -> Vec<DictId> {
    COLUMNS.iter().map(|n| DictId::from_name(n)).chain(std::iter::once(DictId::from_name("TAGS"))).collect()
}

impl Segmenter for SamSegmenter {
    fn initialize(&mut self, ctx_store: &mut ContextStore) -> Container {
        let ids = dict_ids();
        let mut items = Vec::with_capacity(ids.len());
        for (i, id) in ids.iter().enumerate() {
            let name = if i < COLUMNS.len() { COLUMNS[i] } else { "TAGS" };
            ctx_store.get_or_create(*id, name);
            let item = Item::new(*id, if i + 1 == ids.len() { [b'\n', 0] } else { [b'\t', 0] });
            let item = if name == "SEQ" { item.with_translator(SAM_SEQ_TRANSLATOR_ID) } else { item };
            items.push(item);
        }
        // Side-channel contexts consulted directly by SamSeqTranslator, not
        // themselves container items.
        ctx_store.get_or_create(sqbitmap_id(), "SQBITMAP");
        ctx_store.get_or_create(nonref_id(), "NONREF");
        ctx_store.get_or_create(seq_mode_id(), "SEQ_MODE");
        Container::new(toplevel_dict_id(), 0, items)
    }

    fn seg_line(&mut self, ctx_store: &mut ContextStore, reference: Option<&ReferenceStore>, line: &[u8]) -> Result<()> {
        if line.starts_with(b"@") {
            return Ok(());
        }
        let fields: Vec<&[u8]> = line.splitn(12, |&b| b == b'\t').collect();
        for (i, name) in COLUMNS.iter().enumerate() {
            if i == SEQ_COLUMN {
                continue;
            }
            let id = DictId::from_name(name);
            let ctx = ctx_store.get_or_create(id, name);
            ctx.seg_line(fields.get(i).copied());
        }
        let tags_id = DictId::from_name("TAGS");
        let tags_ctx = ctx_store.get_or_create(tags_id, "TAGS");
        tags_ctx.seg_line(fields.get(11).copied());

        let seq_field = fields.get(SEQ_COLUMN).copied();
        let encoded = match (reference, seq_field, fields.get(2).copied(), fields.get(3).copied(), fields.get(5).copied()) {
            (Some(r), Some(seq), Some(rname), Some(pos), Some(cigar)) => {
                reference_encode_seq(r, rname, pos, cigar, seq)
            }
            _ => None,
        };
        match encoded {
            Some((bitmap, nonref)) => {
                ctx_store.get_or_create(sqbitmap_id(), "SQBITMAP").seg_line(Some(&bitmap));
                ctx_store.get_or_create(nonref_id(), "NONREF").seg_line(Some(&nonref));
                ctx_store.get_or_create(seq_mode_id(), "SEQ_MODE").seg_line(Some(b"R"));
                ctx_store.get_or_create(DictId::from_name("SEQ"), "SEQ").seg_line(None);
            }
            None => {
                ctx_store.get_or_create(sqbitmap_id(), "SQBITMAP").seg_line(Some(b""));
                ctx_store.get_or_create(nonref_id(), "NONREF").seg_line(Some(b""));
                ctx_store.get_or_create(seq_mode_id(), "SEQ_MODE").seg_line(Some(b"L"));
                ctx_store.get_or_create(DictId::from_name("SEQ"), "SEQ").seg_line(seq_field);
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

impl SamSegmenter {
    pub fn num_lines(&self) -> u32 {
        self.num_lines
    }
}

/// Attempts to encode `seq` against `reference` using `rname`/`pos`/`cigar`.
/// Returns `None` (falling back to a literal `SEQ`) when the read is
/// unmapped, the contig isn't in the reference, or the CIGAR uses an op
/// `parse_cigar` doesn't recognize. When `reference.mode` is `ExtStore`,
/// also marks every matched reference position as verbatim for later
/// compaction (§4.2).
fn reference_encode_seq(
    reference: &ReferenceStore,
    rname: &[u8],
    pos: &[u8],
    cigar: &[u8],
    seq: &[u8],
) -> Option<(Vec<u8>, Vec<u8>)> {
    if rname == b"*" || seq.is_empty() {
        return None;
    }
    let rname_s = std::str::from_utf8(rname).ok()?;
    let pos_s = std::str::from_utf8(pos).ok()?;
    let pos_n: u64 = pos_s.parse().ok()?;
    if pos_n == 0 {
        return None;
    }
    let cigar_s = std::str::from_utf8(cigar).ok()?;
    let cigar_ops = seqcoder::parse_cigar(cigar_s)?;
    let range_arc = reference.get_range(rname_s)?;
    let ref_pos = (pos_n - 1) as usize;

    let (diffs, bitmap, nonref) = {
        let range = range_arc.read().unwrap();
        let diffs = seqcoder::encode_seq(seq, &cigar_ops, &range, ref_pos);
        let (bitmap, nonref) = seqcoder::encode_bitmap(&cigar_ops, &diffs);
        (diffs, bitmap, nonref)
    };

    if reference.mode == RefMode::ExtStore {
        let positions = seqcoder::matched_ref_positions(&cigar_ops, &diffs, ref_pos);
        reference.mark_verbatim(rname_s, &positions);
    }

    Some((bitmap, nonref))
}

/// Rebuilds a SAM read's literal `SEQ` bytes on reconstruction. When the
/// row was segmented in literal mode (`SEQ_MODE` = `L`), passes the stored
/// value straight through; when segmented against a reference (`R`), pulls
/// `RNAME`/`POS`/`CIGAR` from the already-reconstructed sibling items in the
/// same row and rebuilds via [`seqcoder::decode_seq`].
pub struct SamSeqTranslator {
    reference: Option<Arc<ReferenceStore>>,
}

impl SamSeqTranslator {
    pub fn new(reference: Option<Arc<ReferenceStore>>) -> Self {
        SamSeqTranslator { reference }
    }
}

impl Translator for SamSeqTranslator {
    fn translate(
        &self,
        _dict_id: DictId,
        value: &[u8],
        ctx_store: &mut ContextStore,
        line: &LineValues,
    ) -> Result<Vec<u8>> {
        let mode = ctx_store
            .get_mut(seq_mode_id())
            .ok_or_else(|| GenozipError::Other("SEQ_MODE context missing".into()))?
            .next_reconstructed()?;
        let bitmap = ctx_store
            .get_mut(sqbitmap_id())
            .ok_or_else(|| GenozipError::Other("SQBITMAP context missing".into()))?
            .next_reconstructed()?;
        let nonref = ctx_store
            .get_mut(nonref_id())
            .ok_or_else(|| GenozipError::Other("NONREF context missing".into()))?
            .next_reconstructed()?;

        if mode != b"R" {
            return Ok(value.to_vec());
        }

        let reference = self
            .reference
            .as_ref()
            .ok_or_else(|| GenozipError::Other("archive requires --reference to reconstruct SEQ".into()))?;

        let rname = line
            .get(DictId::from_name("RNAME"))
            .ok_or_else(|| GenozipError::Other("RNAME not yet reconstructed".into()))?;
        let pos = line
            .get(DictId::from_name("POS"))
            .ok_or_else(|| GenozipError::Other("POS not yet reconstructed".into()))?;
        let cigar = line
            .get(DictId::from_name("CIGAR"))
            .ok_or_else(|| GenozipError::Other("CIGAR not yet reconstructed".into()))?;

        let rname_s = std::str::from_utf8(rname).map_err(|_| GenozipError::Other("RNAME not UTF-8".into()))?;
        let pos_s = std::str::from_utf8(pos).map_err(|_| GenozipError::Other("POS not UTF-8".into()))?;
        let pos_n: u64 = pos_s.parse().map_err(|_| GenozipError::Other(format!("bad POS {pos_s:?}")))?;
        let cigar_s = std::str::from_utf8(cigar).map_err(|_| GenozipError::Other("CIGAR not UTF-8".into()))?;
        let cigar_ops = seqcoder::parse_cigar(cigar_s).ok_or_else(|| GenozipError::Other(format!("bad CIGAR {cigar_s:?}")))?;

        let range_arc = reference
            .get_range(rname_s)
            .ok_or_else(|| GenozipError::Other(format!("reference has no contig {rname_s}")))?;
        let range = range_arc.read().unwrap();
        let ref_pos = (pos_n - 1) as usize;
        let diffs = seqcoder::diffs_from_bitmap(&cigar_ops, &bitmap, &nonref);
        let read_len: usize = cigar_ops
            .iter()
            .map(|op| match op {
                CigarOp::Match(n) | CigarOp::Insertion(n) | CigarOp::SoftClip(n) => *n as usize,
                CigarOp::Deletion(_) => 0,
            })
            .sum();
        Ok(seqcoder::decode_seq(read_len, &cigar_ops, &range, ref_pos, &diffs))
    }
}
