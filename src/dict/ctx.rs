//! [`Ctx`] — per-field dictionary, b250 index stream, and `local` side
//! channel (§3, §4.1).

use super::b250::B250Code;
use super::DictId;
use crate::codec::CodecId;
use crate::error::DictError;

/// Hints the kind of value a context holds, steering which codecs are
/// offered in the auto-selection race (§4.1) and how `local` bytes are
/// interpreted during reconstruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ltype {
    /// Free-text / categorical snip, dictionary-encoded via b250.
    Text,
    /// Numeric value stored as a textual delta in `local`.
    NumericDelta,
    /// Raw sequence bytes (FASTA/FASTQ/SAM `SEQ`).
    Sequence,
    /// Quality-score string (FASTQ/SAM `QUAL`).
    Quality,
    /// Per-sample haplotype/genotype matrix.
    Haplotype,
}

/// One field's dictionary, b250 stream, and local side-channel — the unit of
/// work merged from a VBlock's local `Ctx` into the z_file-wide one (§4.5).
pub struct Ctx {
    pub dict_id: DictId,
    pub name: &'static str,
    pub ltype: Ltype,

    /// Concatenated distinct snip bytes, in first-seen order.
    pub dict: Vec<u8>,
    /// Offsets into `dict` delimiting each node (`nodes[i]` is snip `i`).
    pub nodes: Vec<Vec<u8>>,

    /// Overlay view of `dict`/`nodes` as they stood when this VBlock opened
    /// (§3's `ol_dict`/`ol_nodes`) — `None` for the z_file-wide context,
    /// `Some` for a VBlock-local context clone.
    pub ol_node_count: Option<usize>,

    /// Per-line b250 codes referencing `nodes` (or a reserved sentinel).
    pub b250: Vec<B250Code>,

    /// Side-channel bytes for values that don't dictionary-encode well.
    pub local: Vec<u8>,

    /// Last codec chosen for this context's b250/local streams, once
    /// auto-selection or `--fast` has committed one (§4.1).
    pub codec: Option<CodecId>,

    /// `true` once no more snips will be interned this VBlock — guards
    /// against accidental writes after a context has been finalized.
    pub frozen: bool,

    last_value_numeric: Option<i64>,

    /// Reconstruction cursor into `b250` (§3's `next_b250`) and the
    /// ONE_UP tracking state (`prev_word_index`'s numeric analogue), used by
    /// [`Ctx::next_reconstructed`] during PIZ.
    recon_cursor: usize,
    recon_prev_numeric: Option<i64>,
}

impl Ctx {
    pub fn new(dict_id: DictId, name: &'static str) -> Self {
        Ctx {
            dict_id,
            name,
            ltype: Ltype::Text,
            dict: Vec::new(),
            nodes: Vec::new(),
            ol_node_count: None,
            b250: Vec::new(),
            local: Vec::new(),
            codec: None,
            frozen: false,
            last_value_numeric: None,
            recon_cursor: 0,
            recon_prev_numeric: None,
        }
    }

    /// Creates a VBlock-local clone overlaying `self`'s current dictionary
    /// state (§4.5's context clone step, performed once per VBlock at open
    /// time so new snips this VBlock don't need a lock against the
    /// z_file-wide context until merge time).
    pub fn clone_for_vb(&self) -> Ctx {
        Ctx {
            dict_id: self.dict_id,
            name: self.name,
            ltype: self.ltype,
            dict: self.dict.clone(),
            nodes: self.nodes.clone(),
            ol_node_count: Some(self.nodes.len()),
            b250: Vec::new(),
            local: Vec::new(),
            codec: self.codec,
            frozen: false,
            last_value_numeric: self.last_value_numeric,
            recon_cursor: 0,
            recon_prev_numeric: None,
        }
    }

    /// Interns `snip`, returning its node index: an existing index if
    /// already present, otherwise a newly-appended one.
    pub fn intern(&mut self, snip: &[u8]) -> u32 {
        assert!(!self.frozen, "cannot intern into frozen context {}", self.name);
        if let Some(idx) = self.nodes.iter().position(|n| n.as_slice() == snip) {
            return idx as u32;
        }
        self.nodes.push(snip.to_vec());
        self.dict.extend_from_slice(snip);
        self.dict.push(b'\t');
        (self.nodes.len() - 1) as u32
    }

    /// Evaluates one line's value for this field: decides between
    /// `OneUp`/`Missing`/`Empty`/an interned `Index`, matching §4.1's
    /// "evaluate_snip" contract used by every segmenter.
    pub fn evaluate_snip(&mut self, value: Option<&[u8]>) -> B250Code {
        match value {
            None => B250Code::Missing,
            Some(v) if v.is_empty() => B250Code::Empty,
            Some(v) => {
                if let Ok(s) = std::str::from_utf8(v) {
                    if let Ok(n) = s.parse::<i64>() {
                        if self.last_value_numeric == Some(n - 1) {
                            self.last_value_numeric = Some(n);
                            return B250Code::OneUp;
                        }
                        self.last_value_numeric = Some(n);
                    }
                }
                B250Code::Index(self.intern(v))
            }
        }
    }

    /// Appends one line's code to the context's b250 stream.
    pub fn seg_line(&mut self, value: Option<&[u8]>) {
        let code = self.evaluate_snip(value);
        self.b250.push(code);
    }

    /// Resolves the snip for a b250 code during reconstruction ("piz"),
    /// tracking `ONE_UP` state from `prev_numeric` the same way `seg_line`
    /// does during compression.
    pub fn get_next_snip(&self, code: B250Code, prev_numeric: &mut Option<i64>) -> Vec<u8> {
        match code {
            B250Code::Missing => Vec::new(),
            B250Code::Empty => Vec::new(),
            B250Code::OneUp => {
                let n = prev_numeric.map(|n| n + 1).unwrap_or(0);
                *prev_numeric = Some(n);
                n.to_string().into_bytes()
            }
            B250Code::Index(i) => {
                let snip = self.nodes[i as usize].clone();
                if let Ok(s) = std::str::from_utf8(&snip) {
                    if let Ok(n) = s.parse::<i64>() {
                        *prev_numeric = Some(n);
                    }
                }
                snip
            }
        }
    }

    /// Advances the context's own reconstruction cursor and returns the next
    /// snip's bytes, tracking ONE_UP state internally (§3's `next_b250`
    /// iterator). A b250 overrun — requesting a snip past the end of the
    /// stream — is fatal (§4.1's "Failure semantics").
    pub fn next_reconstructed(&mut self) -> Result<Vec<u8>, DictError> {
        let code = *self
            .b250
            .get(self.recon_cursor)
            .ok_or(DictError::NodeIndexOutOfRange { index: self.recon_cursor as u32, len: self.b250.len() })?;
        self.recon_cursor += 1;
        if let B250Code::Index(i) = code {
            if i as usize >= self.nodes.len() {
                return Err(DictError::NodeIndexOutOfRange { index: i, len: self.nodes.len() });
            }
        }
        let mut prev = self.recon_prev_numeric;
        let bytes = self.get_next_snip(code, &mut prev);
        self.recon_prev_numeric = prev;
        Ok(bytes)
    }

    /// Commits the winning codec for this context's streams (§4.1).
    pub fn commit_codec(&mut self, codec: CodecId) {
        self.codec = Some(codec);
    }

    /// Appends a VBlock's b250 stream onto this (z_file-wide) context's own
    /// stream, rewriting each `Index` code through `translation` (the table
    /// [`super::ContextStore::merge_vb_context`] returned for this dict) so
    /// the appended codes reference global, not VB-local, node indices
    /// (§4.5's "index rewriting happens before any output is written").
    pub fn append_translated_b250(&mut self, codes: &[B250Code], translation: &[u32]) {
        for &code in codes {
            let translated = match code {
                B250Code::Index(i) => B250Code::Index(translation[i as usize]),
                other => other,
            };
            self.b250.push(translated);
        }
    }

    pub fn freeze(&mut self) {
        self.frozen = true;
    }
}
