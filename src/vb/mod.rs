//! Component G — the VBlock dispatcher and on-disk section format.

pub mod dispatcher;
pub mod footer;
pub mod random_access;
pub mod section;

use crate::dict::Ctx;
use std::collections::HashMap;

use crate::dict::DictId;

/// A VBlock: the unit of parallel work (§3). Owns a clone of every context
/// touched while segmenting its lines, merged back into the z_file-wide
/// store once segmentation finishes (§4.5).
pub struct VBlock {
    pub vblock_i: u32,
    pub contexts: HashMap<DictId, Ctx>,
    pub first_line: u64,
    pub num_lines: u64,
    /// Raw input bytes belonging to this VBlock, kept until digest
    /// computation needs them (§4.4).
    pub txt_data: Vec<u8>,
}

impl VBlock {
    pub fn new(vblock_i: u32, first_line: u64) -> Self {
        VBlock {
            vblock_i,
            contexts: HashMap::new(),
            first_line,
            num_lines: 0,
            txt_data: Vec::new(),
        }
    }

    pub fn ctx_mut(&mut self, dict_id: DictId, name: &'static str) -> &mut Ctx {
        self.contexts.entry(dict_id).or_insert_with(|| Ctx::new(dict_id, name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vblock_creates_contexts_on_demand() {
        let mut vb = VBlock::new(0, 0);
        let id = DictId::from_name("CHROM");
        vb.ctx_mut(id, "CHROM").intern(b"chr1");
        assert_eq!(vb.contexts.len(), 1);
    }
}
