//! Component C — the codec layer.
//!
//! A uniform `Codec` trait covers the general-purpose compressors (bzip2,
//! lzma, zstd standing in for genozip's "bsc", and the BGZF passthrough) and
//! the specialized domain codecs (`DOMQ` for quality strings, `ACGT` for
//! 2-bit-packed sequence, `HAPM` for haplotype matrices, `PBWT` for
//! positionally-sorted haplotype columns). [`assign_best_codec`] implements
//! the layered tie-break auto-selection rule from §4.1.

mod acgt;
mod bsc_stub;
mod bzip2_codec;
mod domq;
mod hapm;
mod lzma_codec;
mod pbwt;

pub use acgt::AcgtCodec;
pub use bsc_stub::BscCodec;
pub use bzip2_codec::Bzip2Codec;
pub use domq::DomqCodec;
pub use hapm::HapmCodec;
pub use lzma_codec::LzmaCodec;
pub use pbwt::PbwtCodec;

use crate::config::CODEC_SAMPLE_SIZE;
use crate::error::CodecError;

/// Stable numeric codec identifiers as written into section headers (§6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum CodecId {
    None = 0,
    Bzip2 = 1,
    Lzma = 2,
    Bsc = 3,
    Bgzf = 4,
    Domq = 5,
    Acgt = 6,
    Hapm = 7,
    Pbwt = 8,
}

impl CodecId {
    pub fn from_u8(v: u8) -> Result<Self, CodecError> {
        Ok(match v {
            0 => CodecId::None,
            1 => CodecId::Bzip2,
            2 => CodecId::Lzma,
            3 => CodecId::Bsc,
            4 => CodecId::Bgzf,
            5 => CodecId::Domq,
            6 => CodecId::Acgt,
            7 => CodecId::Hapm,
            8 => CodecId::Pbwt,
            other => return Err(CodecError::UnknownCodec(other)),
        })
    }
}

/// Uniform interface implemented by every codec in the registry.
pub trait Codec {
    fn id(&self) -> CodecId;

    fn compress(&self, data: &[u8]) -> Result<Vec<u8>, CodecError>;

    fn decompress(&self, data: &[u8], uncompressed_len: usize) -> Result<Vec<u8>, CodecError>;

    /// Cheap size estimate used by auto-selection to avoid running every
    /// codec to completion on the full section; trials run on a
    /// [`CODEC_SAMPLE_SIZE`]-byte prefix and scale the result.
    fn estimate(&self, data: &[u8]) -> Result<usize, CodecError> {
        let sample_len = data.len().min(CODEC_SAMPLE_SIZE);
        let sample = &data[..sample_len];
        let compressed = self.compress(sample)?;
        if sample_len == 0 {
            return Ok(0);
        }
        let scale = data.len() as f64 / sample_len as f64;
        Ok((compressed.len() as f64 * scale).ceil() as usize)
    }
}

pub fn codec_by_id(id: CodecId) -> Box<dyn Codec> {
    match id {
        CodecId::None => Box::new(bzip2_codec::NoneCodec),
        CodecId::Bzip2 => Box::new(Bzip2Codec::default()),
        CodecId::Lzma => Box::new(LzmaCodec::default()),
        CodecId::Bsc => Box::new(BscCodec::default()),
        CodecId::Bgzf => Box::new(bzip2_codec::NoneCodec), // BGZF framing lives in src/bgzf
        CodecId::Domq => Box::new(DomqCodec::default()),
        CodecId::Acgt => Box::new(AcgtCodec::default()),
        CodecId::Hapm => Box::new(HapmCodec::default()),
        CodecId::Pbwt => Box::new(PbwtCodec::default()),
    }
}

/// The general-purpose codecs considered for an arbitrary byte section —
/// the specialized codecs (DOMQ/ACGT/HAPM/PBWT) are only entered into this
/// race when the caller's field type hints at them (§4.1's `ltype`-driven
/// candidate list).
pub fn general_purpose_candidates() -> Vec<Box<dyn Codec>> {
    vec![
        Box::new(Bzip2Codec::default()),
        Box::new(LzmaCodec::default()),
        Box::new(BscCodec::default()),
    ]
}

/// Result of an auto-selection race: the winning codec id plus the
/// compressed bytes it produced, so the caller never re-compresses after
/// picking a winner.
pub struct SelectedCodec {
    pub id: CodecId,
    pub compressed: Vec<u8>,
}

/// Auto-selects a codec for `data` among `candidates`, applying the layered
/// tie-break rule from §4.1: prefer the smallest estimated output; when two
/// candidates estimate within 1% of each other, prefer the faster one (here
/// approximated as the earlier entry in `candidates`, which callers order
/// fastest-first); `fast_mode` skips estimation entirely and returns the
/// first candidate, mirroring `--fast`'s override of the auto-select race.
pub fn assign_best_codec(
    data: &[u8],
    candidates: &[Box<dyn Codec>],
    fast_mode: bool,
) -> Result<SelectedCodec, CodecError> {
    assert!(!candidates.is_empty());
    if fast_mode {
        let c = &candidates[0];
        return Ok(SelectedCodec {
            id: c.id(),
            compressed: c.compress(data)?,
        });
    }

    let mut best_idx = 0usize;
    let mut best_estimate = candidates[0].estimate(data)?;
    for (idx, c) in candidates.iter().enumerate().skip(1) {
        let est = c.estimate(data)?;
        // Tie-break: only switch winners when strictly >1% smaller, so the
        // earlier (faster) candidate wins narrow races.
        if (est as f64) < (best_estimate as f64) * 0.99 {
            best_estimate = est;
            best_idx = idx;
        }
    }
    let winner = &candidates[best_idx];
    Ok(SelectedCodec {
        id: winner.id(),
        compressed: winner.compress(data)?,
    })
}
