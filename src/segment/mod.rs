//! The plug-in segmenter contract (§6) and its concrete implementations.
//!
//! A segmenter turns one input format's lines into context updates (ZIP)
//! and walks a toplevel [`crate::container::Container`] to reconstruct them
//! (PIZ). `vcf` is implemented to full fidelity — it is the literal
//! end-to-end scenario in the testable-properties list. The others
//! implement the same trait with representative, runnable behavior.

pub mod fasta;
pub mod fastq;
pub mod gvf;
pub mod me23;
pub mod sam;
pub mod vcf;

use crate::container::Container;
use crate::dict::ContextStore;
use crate::error::Result;
use crate::reference::ReferenceStore;

/// One input line plus enough position to let `unconsumed` find the last
/// complete record boundary in a streamed read.
pub struct SegInput<'a> {
    pub data: &'a [u8],
}

/// The plug-in segmenter contract (§6):
/// - `initialize` configures ctx ltypes/codec hints and the toplevel container.
/// - `seg_line` populates contexts from one input line, returning bytes consumed.
/// - `finalize` emits the toplevel container snip once all lines are segmented.
/// - `unconsumed` locates the last complete record boundary in a raw byte range,
///   so a VBlock's trailing partial record is carried over to the next VBlock.
pub trait Segmenter {
    fn initialize(&mut self, ctx_store: &mut ContextStore) -> Container;

    fn seg_line(
        &mut self,
        ctx_store: &mut ContextStore,
        reference: Option<&ReferenceStore>,
        line: &[u8],
    ) -> Result<()>;

    fn finalize(&mut self, ctx_store: &mut ContextStore);

    /// Number of repeats segmented so far (lines/reads/records depending on
    /// format) — the toplevel container's `repeats` count once segmentation
    /// finishes.
    fn num_repeats(&self) -> u32;

    /// Returns the length of the trailing incomplete record in `data`
    /// (bytes not ending in a line terminator, for line-delimited formats).
    fn unconsumed(&self, data: &[u8]) -> usize {
        match data.iter().rposition(|&b| b == b'\n') {
            Some(pos) => data.len() - (pos + 1),
            None => data.len(),
        }
    }
}

/// Splits `data` into complete lines (terminator stripped), leaving any
/// trailing partial line for the caller to carry over — the common helper
/// every line-delimited segmenter in this module uses.
pub fn split_lines(data: &[u8]) -> impl Iterator<Item = &[u8]> {
    data.split(|&b| b == b'\n').filter(|l| !l.is_empty())
}
