//! Component F — BGZF block I/O.
//!
//! BGZF (Blocked GZip Format, used by BAM/VCF.gz/tabix-indexed files) is
//! ordinary gzip with one constraint: every member is a complete,
//! independently-decompressible DEFLATE block, and carries a mandatory
//! `BC` extra subfield recording its own total compressed size minus one.
//! Preserving these block boundaries bit-exactly matters when genozip
//! re-emits the original file on decompression (§4.3's "bit-exact interop"
//! requirement) — resegmenting at different boundaries would still decode
//! to the same logical content but would NOT reproduce the original bytes.

pub mod detect;

use std::io::{Read, Write};

use flate2::read::DeflateDecoder;
use flate2::write::DeflateEncoder;
use flate2::Compression;

use crate::config::BGZF_MAX_BLOCK_SIZE;
use crate::error::BgzfError;

/// The fixed 18-byte BGZF header preceding the DEFLATE stream: gzip magic,
/// CM=8, FLG=FEXTRA, MTIME=0, XFL, OS=255, XLEN=6, then the `BC` subfield
/// (SI1='B', SI2='C', SLEN=2, BSIZE placeholder).
const HEADER_LEN: usize = 18;
/// Trailing CRC32 + ISIZE (4 bytes each).
const TRAILER_LEN: usize = 8;
/// The empty final BGZF block every valid file ends with (28 bytes).
pub const EOF_MARKER: [u8; 28] = [
    0x1f, 0x8b, 0x08, 0x04, 0x00, 0x00, 0x00, 0x00, 0x00, 0xff, 0x06, 0x00, 0x42, 0x43, 0x02, 0x00,
    0x1b, 0x00, 0x03, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
];

/// One decoded BGZF block.
pub struct Block {
    pub uncompressed: Vec<u8>,
    /// Total on-disk size of the compressed block, including header/trailer.
    pub compressed_len: usize,
}

/// What a z_file needs to re-wrap its reconstructed text back into the
/// original BGZF container bit-exactly (§4.3): the detected producing level
/// plus the decompressed-offset boundary of every source block, via
/// [`detect::BoundaryMap`].
#[derive(Debug, Clone)]
pub struct BgzfMeta {
    pub level: u32,
    pub boundaries: detect::BoundaryMap,
}

impl BgzfMeta {
    /// Flat wire format: `level`(4) `num_boundaries`(4) `boundary`(8) each.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(8 + self.boundaries.offsets.len() * 8);
        out.extend_from_slice(&self.level.to_be_bytes());
        out.extend_from_slice(&(self.boundaries.offsets.len() as u32).to_be_bytes());
        for &b in &self.boundaries.offsets {
            out.extend_from_slice(&b.to_be_bytes());
        }
        out
    }

    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < 8 {
            return None;
        }
        let level = u32::from_be_bytes(bytes[0..4].try_into().unwrap());
        let count = u32::from_be_bytes(bytes[4..8].try_into().unwrap()) as usize;
        let mut offsets = Vec::with_capacity(count);
        let mut pos = 8;
        for _ in 0..count {
            if pos + 8 > bytes.len() {
                return None;
            }
            offsets.push(u64::from_be_bytes(bytes[pos..pos + 8].try_into().unwrap()));
            pos += 8;
        }
        Some(BgzfMeta { level, boundaries: detect::BoundaryMap { offsets } })
    }

    /// Re-wraps `text` (the reconstructed decompressed stream) into BGZF
    /// blocks at each recorded boundary, terminated by [`EOF_MARKER`] —
    /// the inverse of decoding the original source file block by block.
    pub fn rewrap(&self, text: &[u8]) -> Result<Vec<u8>, BgzfError> {
        let mut out = Vec::new();
        let mut start = 0usize;
        for &end in &self.boundaries.offsets {
            let end = (end as usize).min(text.len());
            out.extend_from_slice(&write_block(&text[start..end], self.level)?);
            start = end;
        }
        out.extend_from_slice(&EOF_MARKER);
        Ok(out)
    }
}

/// Compresses `data` (at most [`BGZF_MAX_BLOCK_SIZE`] bytes) into one
/// self-contained BGZF block at the given flate2 compression level.
pub fn write_block(data: &[u8], level: u32) -> Result<Vec<u8>, BgzfError> {
    assert!(data.len() <= BGZF_MAX_BLOCK_SIZE, "BGZF block exceeds 64 KiB payload limit");

    let mut encoder = DeflateEncoder::new(Vec::new(), Compression::new(level));
    encoder.write_all(data)?;
    let deflated = encoder.finish()?;

    let crc = crc32(data);
    let isize = data.len() as u32;
    let bsize = (HEADER_LEN + deflated.len() + TRAILER_LEN - 1) as u16;

    let mut out = Vec::with_capacity(HEADER_LEN + deflated.len() + TRAILER_LEN);
    out.extend_from_slice(&[0x1f, 0x8b, 0x08, 0x04, 0, 0, 0, 0, 0, 0xff]);
    out.extend_from_slice(&[6, 0]); // XLEN = 6
    out.extend_from_slice(&[b'B', b'C', 2, 0]); // SI1,SI2,SLEN=2
    out.extend_from_slice(&bsize.to_le_bytes());
    out.extend_from_slice(&deflated);
    out.extend_from_slice(&crc.to_le_bytes());
    out.extend_from_slice(&isize.to_le_bytes());
    Ok(out)
}

/// Reads one BGZF block starting at the beginning of `data`, returning the
/// decompressed payload and the number of compressed bytes consumed.
pub fn read_block(data: &[u8]) -> Result<Block, BgzfError> {
    if data.len() < HEADER_LEN + TRAILER_LEN || data[0] != 0x1f || data[1] != 0x8b {
        return Err(BgzfError::BadMagic);
    }
    let xlen = u16::from_le_bytes([data[10], data[11]]) as usize;
    if data.len() < HEADER_LEN {
        return Err(BgzfError::TruncatedBlock);
    }
    // Scan the extra subfields for BC (BSIZE).
    let mut bsize: Option<u16> = None;
    let mut pos = 12;
    let extra_end = 12 + xlen;
    if data.len() < extra_end {
        return Err(BgzfError::TruncatedBlock);
    }
    while pos + 4 <= extra_end {
        let si1 = data[pos];
        let si2 = data[pos + 1];
        let slen = u16::from_le_bytes([data[pos + 2], data[pos + 3]]) as usize;
        if si1 == b'B' && si2 == b'C' && slen == 2 {
            bsize = Some(u16::from_le_bytes([data[pos + 4], data[pos + 5]]));
        }
        pos += 4 + slen;
    }
    let bsize = bsize.ok_or(BgzfError::BadMagic)? as usize + 1;
    if data.len() < bsize {
        return Err(BgzfError::TruncatedBlock);
    }

    let deflate_start = extra_end;
    let deflate_end = bsize - TRAILER_LEN;
    let isize = u32::from_le_bytes([
        data[bsize - 4],
        data[bsize - 3],
        data[bsize - 2],
        data[bsize - 1],
    ]) as usize;

    let mut out = Vec::with_capacity(isize);
    DeflateDecoder::new(&data[deflate_start..deflate_end]).read_to_end(&mut out)?;
    Ok(Block { uncompressed: out, compressed_len: bsize })
}

/// `true` when `data` starts with the canonical 28-byte empty EOF block.
pub fn is_eof_marker(data: &[u8]) -> bool {
    data.len() >= EOF_MARKER.len() && data[..EOF_MARKER.len()] == EOF_MARKER
}

fn crc32(data: &[u8]) -> u32 {
    // Standard reflected CRC-32 (IEEE 802.3), same polynomial gzip uses.
    let mut crc: u32 = 0xFFFF_FFFF;
    for &byte in data {
        crc ^= byte as u32;
        for _ in 0..8 {
            let mask = (crc & 1).wrapping_neg();
            crc = (crc >> 1) ^ (0xEDB8_8320 & mask);
        }
    }
    !crc
}
