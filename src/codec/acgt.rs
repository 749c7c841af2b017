//! ACGT — domain-specific codec for sequence data (FASTA/FASTQ `SEQ`,
//! SAM `SEQ`). Packs 4 bases per byte using [`crate::bitarray::NucArray`]
//! and stores non-ACGT exceptions (N, IUPAC ambiguity codes) as a sparse
//! `(position, byte)` list, then bzip2-compresses the packed form — 4x
//! smaller input to the general-purpose stage before it even starts.

use bzip2::read::BzDecoder;
use bzip2::write::BzEncoder;
use bzip2::Compression;
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::{Read, Write};

use super::{Codec, CodecId};
use crate::bitarray::NucArray;
use crate::error::CodecError;

pub struct AcgtCodec;

impl Default for AcgtCodec {
    fn default() -> Self {
        AcgtCodec
    }
}

impl Codec for AcgtCodec {
    fn id(&self) -> CodecId {
        CodecId::Acgt
    }

    fn compress(&self, data: &[u8]) -> Result<Vec<u8>, CodecError> {
        let (packed, exceptions) = NucArray::from_sequence(data);
        let mut blob = Vec::new();
        blob.write_u32::<LittleEndian>(exceptions.len() as u32)?;
        for &pos in &exceptions {
            blob.write_u32::<LittleEndian>(pos as u32)?;
            blob.push(data[pos]);
        }
        for i in 0..packed.len() {
            // re-pack 4 bases/byte explicitly so the blob is self-contained
            // (NucArray's internal word layout is 32 bases/u64, not exposed).
            if i % 4 == 0 {
                blob.push(0);
            }
            let b = packed.get(i) as u8;
            let last = blob.len() - 1;
            blob[last] |= b << ((i % 4) * 2);
        }

        let mut enc = BzEncoder::new(Vec::new(), Compression::best());
        enc.write_all(&blob)?;
        enc.finish().map_err(CodecError::Io)
    }

    fn decompress(&self, data: &[u8], uncompressed_len: usize) -> Result<Vec<u8>, CodecError> {
        let mut blob = Vec::new();
        BzDecoder::new(data).read_to_end(&mut blob)?;
        let mut cursor = &blob[..];
        let nexceptions = cursor.read_u32::<LittleEndian>()? as usize;
        let mut exceptions = Vec::with_capacity(nexceptions);
        for _ in 0..nexceptions {
            let pos = cursor.read_u32::<LittleEndian>()? as usize;
            let mut byte = [0u8; 1];
            cursor.read_exact(&mut byte)?;
            exceptions.push((pos, byte[0]));
        }
        let packed_bytes = cursor;
        let mut out = vec![0u8; uncompressed_len];
        for i in 0..uncompressed_len {
            let byte = packed_bytes[i / 4];
            let code = (byte >> ((i % 4) * 2)) & 0b11;
            out[i] = crate::bitarray::nuc::Nucleotide::from_code(code).to_base();
        }
        for (pos, byte) in exceptions {
            out[pos] = byte;
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn acgt_roundtrip_with_exceptions() {
        let codec = AcgtCodec::default();
        let data = b"ACGTACGTNNNACGTRYKM".repeat(200);
        let compressed = codec.compress(&data).unwrap();
        let back = codec.decompress(&compressed, data.len()).unwrap();
        assert_eq!(back, data);
    }

    #[test]
    fn acgt_compresses_pure_sequence() {
        let codec = AcgtCodec::default();
        let data = b"ACGT".repeat(10000);
        let compressed = codec.compress(&data).unwrap();
        assert!(compressed.len() < data.len() / 2);
    }
}
