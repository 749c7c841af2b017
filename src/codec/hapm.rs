//! HAPM — domain-specific codec for haplotype matrices (VCF genotype calls
//! across many samples at one site, packed as a rectangular 0/1 matrix).
//! Bit-packs the matrix with [`crate::bitarray::BitArray`] before bzip2,
//! matching §4.1's `local` side-channel convention for per-sample
//! genotype bits.

use bzip2::read::BzDecoder;
use bzip2::write::BzEncoder;
use bzip2::Compression;
use std::io::{Read, Write};

use super::{Codec, CodecId};
use crate::bitarray::BitArray;
use crate::error::CodecError;

/// `data` is one byte per call: `0` or `1`. Real callers build this from the
/// segmenter's per-sample genotype bits before handing the flat matrix to
/// the codec layer.
pub struct HapmCodec;

impl Default for HapmCodec {
    fn default() -> Self {
        HapmCodec
    }
}

impl Codec for HapmCodec {
    fn id(&self) -> CodecId {
        CodecId::Hapm
    }

    fn compress(&self, data: &[u8]) -> Result<Vec<u8>, CodecError> {
        let mut bits = BitArray::new(data.len());
        for (i, &b) in data.iter().enumerate() {
            bits.set_to(i, b != 0);
        }
        let packed = bits_to_bytes(&bits);
        let mut enc = BzEncoder::new(Vec::new(), Compression::best());
        enc.write_all(&packed)?;
        enc.finish().map_err(CodecError::Io)
    }

    fn decompress(&self, data: &[u8], uncompressed_len: usize) -> Result<Vec<u8>, CodecError> {
        let mut packed = Vec::new();
        BzDecoder::new(data).read_to_end(&mut packed)?;
        let mut out = vec![0u8; uncompressed_len];
        for i in 0..uncompressed_len {
            let byte = packed[i / 8];
            out[i] = (byte >> (i % 8)) & 1;
        }
        Ok(out)
    }
}

fn bits_to_bytes(bits: &BitArray) -> Vec<u8> {
    let mut out = vec![0u8; bits.len().div_ceil(8)];
    for i in 0..bits.len() {
        if bits.get(i) {
            out[i / 8] |= 1 << (i % 8);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hapm_roundtrip() {
        let codec = HapmCodec::default();
        let data: Vec<u8> = (0..5000).map(|i| (i % 3 == 0) as u8).collect();
        let compressed = codec.compress(&data).unwrap();
        let back = codec.decompress(&compressed, data.len()).unwrap();
        assert_eq!(back, data);
        assert!(compressed.len() < data.len());
    }
}
