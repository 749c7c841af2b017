//! DOMQ — domain-specific codec for quality-score strings (FASTQ/SAM `QUAL`).
//!
//! Quality strings from a single sequencer run are strongly correlated
//! byte-to-byte (read cycle `k`'s quality predicts cycle `k+1`'s). DOMQ
//! delta-codes each byte against its predecessor within the same read before
//! handing the result to bzip2, which turns the resulting small, repetitive
//! delta alphabet into a much denser encoding than bzip2 on raw Phred bytes.
//! Read boundaries are supplied by the caller (newline-delimited within the
//! `local` buffer, matching the segmenter's concatenation convention).

use bzip2::read::BzDecoder;
use bzip2::write::BzEncoder;
use bzip2::Compression;
use std::io::{Read, Write};

use super::{Codec, CodecId};
use crate::error::CodecError;

pub struct DomqCodec;

impl Default for DomqCodec {
    fn default() -> Self {
        DomqCodec
    }
}

/// Delta-codes `data` against the previous byte, resetting at each `\n`.
fn delta_encode(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len());
    let mut prev: u8 = 0;
    for &b in data {
        if b == b'\n' {
            out.push(b);
            prev = 0;
        } else {
            out.push(b.wrapping_sub(prev));
            prev = b;
        }
    }
    out
}

fn delta_decode(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len());
    let mut prev: u8 = 0;
    for &b in data {
        if b == b'\n' {
            out.push(b);
            prev = 0;
        } else {
            let actual = b.wrapping_add(prev);
            out.push(actual);
            prev = actual;
        }
    }
    out
}

impl Codec for DomqCodec {
    fn id(&self) -> CodecId {
        CodecId::Domq
    }

    fn compress(&self, data: &[u8]) -> Result<Vec<u8>, CodecError> {
        let delta = delta_encode(data);
        let mut enc = BzEncoder::new(Vec::new(), Compression::best());
        enc.write_all(&delta)?;
        enc.finish().map_err(CodecError::Io)
    }

    fn decompress(&self, data: &[u8], uncompressed_len: usize) -> Result<Vec<u8>, CodecError> {
        let mut delta = Vec::with_capacity(uncompressed_len);
        BzDecoder::new(data).read_to_end(&mut delta)?;
        Ok(delta_decode(&delta))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domq_roundtrip() {
        let codec = DomqCodec::default();
        let data = b"IIIIIIIIHHGGFFEE\nIIIIIIIIHHGGFFEE\n".repeat(100);
        let compressed = codec.compress(&data).unwrap();
        let back = codec.decompress(&compressed, data.len()).unwrap();
        assert_eq!(back, data);
        assert!(compressed.len() < data.len());
    }

    #[test]
    fn delta_roundtrip_identity() {
        let data = b"ABCDEF\nGHI\n".to_vec();
        assert_eq!(delta_decode(&delta_encode(&data)), data);
    }
}
