//! Crate-wide error taxonomy.
//!
//! Each component owns a small `Display + Error` enum — a manual `Display`
//! impl rather than `thiserror` — and [`GenozipError`] aggregates them via
//! `From` impls so `Session` methods can return a single `Result` type. The
//! CLI boundary converts this into `anyhow::Error` with `?`.

use std::fmt;
use std::io;

#[derive(Debug)]
pub enum CodecError {
    Io(io::Error),
    UnknownCodec(u8),
    CompressionFailed(String),
    DecompressionFailed(String),
    BufferTooSmall { needed: usize, have: usize },
}

impl fmt::Display for CodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CodecError::Io(e) => write!(f, "codec I/O error: {e}"),
            CodecError::UnknownCodec(id) => write!(f, "unknown codec id {id}"),
            CodecError::CompressionFailed(s) => write!(f, "compression failed: {s}"),
            CodecError::DecompressionFailed(s) => write!(f, "decompression failed: {s}"),
            CodecError::BufferTooSmall { needed, have } => {
                write!(f, "buffer too small: need {needed}, have {have}")
            }
        }
    }
}
impl std::error::Error for CodecError {}
impl From<io::Error> for CodecError {
    fn from(e: io::Error) -> Self {
        CodecError::Io(e)
    }
}

#[derive(Debug)]
pub enum DictError {
    UnknownDictId(u64),
    B250Overflow(u32),
    NodeIndexOutOfRange { index: u32, len: usize },
    ContextFrozen(String),
}

impl fmt::Display for DictError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DictError::UnknownDictId(id) => write!(f, "unknown dict_id {id:#x}"),
            DictError::B250Overflow(v) => write!(f, "b250 word index {v} exceeds encodable range"),
            DictError::NodeIndexOutOfRange { index, len } => {
                write!(f, "node index {index} out of range (dict has {len} nodes)")
            }
            DictError::ContextFrozen(name) => write!(f, "context {name} is frozen for write"),
        }
    }
}
impl std::error::Error for DictError {}

#[derive(Debug)]
pub enum RefError {
    Io(io::Error),
    RangeNotLoaded { chrom: String, pos: u64 },
    PositionOutOfBounds { pos: u64, len: u64 },
    ModeMismatch(&'static str),
    CompactionFailed(&'static str),
}

impl fmt::Display for RefError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RefError::Io(e) => write!(f, "reference I/O error: {e}"),
            RefError::RangeNotLoaded { chrom, pos } => {
                write!(f, "range not loaded: {chrom}:{pos}")
            }
            RefError::PositionOutOfBounds { pos, len } => {
                write!(f, "position {pos} out of bounds (range length {len})")
            }
            RefError::ModeMismatch(s) => write!(f, "reference mode mismatch: {s}"),
            RefError::CompactionFailed(s) => write!(f, "reference compaction failed: {s}"),
        }
    }
}
impl std::error::Error for RefError {}
impl From<io::Error> for RefError {
    fn from(e: io::Error) -> Self {
        RefError::Io(e)
    }
}

#[derive(Debug)]
pub enum BgzfError {
    Io(io::Error),
    BadMagic,
    TruncatedBlock,
    UnsupportedLibrary(&'static str),
}

impl fmt::Display for BgzfError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BgzfError::Io(e) => write!(f, "BGZF I/O error: {e}"),
            BgzfError::BadMagic => write!(f, "BGZF block has invalid magic/extra field"),
            BgzfError::TruncatedBlock => write!(f, "BGZF block truncated"),
            BgzfError::UnsupportedLibrary(s) => write!(f, "unsupported BGZF-producing library: {s}"),
        }
    }
}
impl std::error::Error for BgzfError {}
impl From<io::Error> for BgzfError {
    fn from(e: io::Error) -> Self {
        BgzfError::Io(e)
    }
}

#[derive(Debug)]
pub enum SectionError {
    Io(io::Error),
    BadFooterMagic(u64),
    TruncatedHeader,
    UnknownSectionType(u8),
    OutOfOrderVBlock { expected: u32, got: u32 },
}

impl fmt::Display for SectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SectionError::Io(e) => write!(f, "section I/O error: {e}"),
            SectionError::BadFooterMagic(m) => write!(f, "bad footer magic {m:#x}"),
            SectionError::TruncatedHeader => write!(f, "truncated section header"),
            SectionError::UnknownSectionType(t) => write!(f, "unknown section type {t}"),
            SectionError::OutOfOrderVBlock { expected, got } => write!(
                f,
                "VBlock written out of order: expected {expected}, got {got}"
            ),
        }
    }
}
impl std::error::Error for SectionError {}
impl From<io::Error> for SectionError {
    fn from(e: io::Error) -> Self {
        SectionError::Io(e)
    }
}

#[derive(Debug)]
pub enum SegmentError {
    MalformedLine { line_no: u64, reason: String },
    UnexpectedEof,
    UnsupportedFormat(&'static str),
}

impl fmt::Display for SegmentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SegmentError::MalformedLine { line_no, reason } => {
                write!(f, "malformed input at line {line_no}: {reason}")
            }
            SegmentError::UnexpectedEof => write!(f, "unexpected end of input"),
            SegmentError::UnsupportedFormat(s) => write!(f, "unsupported format: {s}"),
        }
    }
}
impl std::error::Error for SegmentError {}

/// Top-level error type returned by [`crate::session::Session`] methods.
#[derive(Debug)]
pub enum GenozipError {
    Io(io::Error),
    Codec(CodecError),
    Dict(DictError),
    Ref(RefError),
    Bgzf(BgzfError),
    Section(SectionError),
    Segment(SegmentError),
    Digest(&'static str),
    Other(String),
}

impl fmt::Display for GenozipError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GenozipError::Io(e) => write!(f, "{e}"),
            GenozipError::Codec(e) => write!(f, "{e}"),
            GenozipError::Dict(e) => write!(f, "{e}"),
            GenozipError::Ref(e) => write!(f, "{e}"),
            GenozipError::Bgzf(e) => write!(f, "{e}"),
            GenozipError::Section(e) => write!(f, "{e}"),
            GenozipError::Segment(e) => write!(f, "{e}"),
            GenozipError::Digest(s) => write!(f, "digest mismatch: {s}"),
            GenozipError::Other(s) => write!(f, "{s}"),
        }
    }
}
impl std::error::Error for GenozipError {}

impl From<io::Error> for GenozipError {
    fn from(e: io::Error) -> Self {
        GenozipError::Io(e)
    }
}
impl From<CodecError> for GenozipError {
    fn from(e: CodecError) -> Self {
        GenozipError::Codec(e)
    }
}
impl From<DictError> for GenozipError {
    fn from(e: DictError) -> Self {
        GenozipError::Dict(e)
    }
}
impl From<RefError> for GenozipError {
    fn from(e: RefError) -> Self {
        GenozipError::Ref(e)
    }
}
impl From<BgzfError> for GenozipError {
    fn from(e: BgzfError) -> Self {
        GenozipError::Bgzf(e)
    }
}
impl From<SectionError> for GenozipError {
    fn from(e: SectionError) -> Self {
        GenozipError::Section(e)
    }
}
impl From<SegmentError> for GenozipError {
    fn from(e: SegmentError) -> Self {
        GenozipError::Segment(e)
    }
}

pub type Result<T> = std::result::Result<T, GenozipError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codec_error_displays() {
        let e = CodecError::UnknownCodec(9);
        assert_eq!(e.to_string(), "unknown codec id 9");
    }

    #[test]
    fn genozip_error_wraps_sub_errors() {
        let e: GenozipError = DictError::UnknownDictId(5).into();
        assert!(e.to_string().contains("unknown dict_id"));
    }

    #[test]
    fn section_error_out_of_order() {
        let e = SectionError::OutOfOrderVBlock { expected: 3, got: 5 };
        assert!(e.to_string().contains("expected 3"));
    }
}
