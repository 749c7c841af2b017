//! 23andMe segmenter and VCF translation (§6, §8 scenario 5; grounded in
//! `original_source/me23.c`'s `rsid chromosome position genotype` row
//! layout). `translate_row` implements the 23andMe→VCF row rewrite
//! directly (rather than only through [`crate::container::Translator`])
//! since a 23andMe row maps to a *reordered* set of VCF columns, not a
//! same-position in-place rewrite.

use crate::container::{Container, Item, Me23ToVcfGenotype};
use crate::dict::{ContextStore, DictId};
use crate::error::{GenozipError, Result};
use crate::reference::ReferenceStore;
use crate::segment::Segmenter;

const COLUMNS: [&str; 4] = ["RSID", "CHROMOSOME", "POSITION", "GENOTYPE"];

pub fn toplevel_dict_id() -> DictId {
    DictId::from_name("ME23_TOPLEVEL")
}

#[derive(Default)]
pub struct Me23Segmenter {
    num_lines: u32,
}

impl Me23Segmenter {
    pub fn num_lines(&self) -> u32 {
        self.num_lines
    }
}

impl Segmenter for Me23Segmenter {
    fn initialize(&mut self, ctx_store: &mut ContextStore) -> Container {
        let mut items = Vec::with_capacity(COLUMNS.len());
        for (i, name) in COLUMNS.iter().enumerate() {
            let id = DictId::from_name(name);
            ctx_store.get_or_create(id, name);
            items.push(Item::new(id, if i + 1 == COLUMNS.len() { [b'\n', 0] } else { [b' ', 0] }));
        }
        Container::new(toplevel_dict_id(), 0, items)
    }

    fn seg_line(&mut self, ctx_store: &mut ContextStore, _reference: Option<&ReferenceStore>, line: &[u8]) -> Result<()> {
        if line.starts_with(b"#") {
            return Ok(());
        }
        let fields: Vec<&[u8]> = line.split(|&b| b == b' ' || b == b'\t').filter(|f| !f.is_empty()).collect();
        if fields.len() < 4 {
            return Err(GenozipError::Other(format!("malformed 23andMe row: {:?}", String::from_utf8_lossy(line))));
        }
        for (i, name) in COLUMNS.iter().enumerate() {
            ctx_store.get_or_create(DictId::from_name(name), name).seg_line(Some(fields[i]));
        }
        self.num_lines += 1;
        Ok(())
    }

    fn finalize(&mut self, _ctx_store: &mut ContextStore) {}

    fn num_repeats(&self) -> u32 {
        self.num_lines
    }
}

/// Translates one parsed 23andMe row into a VCF data line, given the
/// reference base at the row's position (§8 scenario 5).
pub fn translate_row(rsid: &str, chrom: &str, pos: u64, genotype: &[u8], ref_base: u8) -> Result<Vec<u8>> {
    if genotype.len() != 2 {
        return Err(GenozipError::Other(format!("malformed genotype {:?}", String::from_utf8_lossy(genotype))));
    }
    let alt = genotype.iter().copied().find(|&b| b != ref_base).unwrap_or(ref_base);
    let gt = Me23ToVcfGenotype { ref_base };
    let gt_field = gt.rewrite(genotype);
    let alt_display = if alt == ref_base { b'.' } else { alt };
    Ok(format!(
        "{chrom}\t{pos}\t{rsid}\t{}\t{}\t.\tPASS\t.\tGT\t{}",
        ref_base as char,
        alt_display as char,
        String::from_utf8_lossy(&gt_field),
    )
    .into_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn translates_heterozygous_row_to_vcf() {
        let row = translate_row("rs123", "chr1", 12345, b"AG", b'A').unwrap();
        assert_eq!(row, b"chr1\t12345\trs123\tA\tG\t.\tPASS\t.\tGT\t0/1");
    }

    #[test]
    fn segments_four_column_rows() {
        let mut seg = Me23Segmenter::default();
        let mut store = ContextStore::default();
        seg.initialize(&mut store);
        seg.seg_line(&mut store, None, b"rs123\t1\t12345\tAG").unwrap();
        assert_eq!(seg.num_lines(), 1);
    }

    #[test]
    fn rejects_malformed_row() {
        let mut seg = Me23Segmenter::default();
        let mut store = ContextStore::default();
        seg.initialize(&mut store);
        assert!(seg.seg_line(&mut store, None, b"rs123 1").is_err());
    }
}
