//! LZMA general-purpose codec, backed by the `xz2` crate (bindings over
//! liblzma). Used for `local` side-channel data with long-range redundancy
//! that out-performs bzip2's block-sorting model (§4.1).

use std::io::{Read, Write};

use xz2::read::XzDecoder;
use xz2::write::XzEncoder;

use super::{Codec, CodecId};
use crate::error::CodecError;

pub struct LzmaCodec {
    preset: u32,
}

impl Default for LzmaCodec {
    fn default() -> Self {
        LzmaCodec { preset: 6 }
    }
}

impl Codec for LzmaCodec {
    fn id(&self) -> CodecId {
        CodecId::Lzma
    }

    fn compress(&self, data: &[u8]) -> Result<Vec<u8>, CodecError> {
        let mut enc = XzEncoder::new(Vec::new(), self.preset);
        enc.write_all(data)?;
        enc.finish().map_err(CodecError::Io)
    }

    fn decompress(&self, data: &[u8], uncompressed_len: usize) -> Result<Vec<u8>, CodecError> {
        let mut out = Vec::with_capacity(uncompressed_len);
        let mut dec = XzDecoder::new(data);
        dec.read_to_end(&mut out)?;
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lzma_roundtrip() {
        let codec = LzmaCodec::default();
        let data = b"ACGTACGTACGTACGTACGTACGTACGT".repeat(500);
        let compressed = codec.compress(&data).unwrap();
        assert!(compressed.len() < data.len());
        let back = codec.decompress(&compressed, data.len()).unwrap();
        assert_eq!(back, data);
    }
}
