//! bzip2 general-purpose codec, backed by the `bzip2` crate (block-sorting
//! compression — genozip's primary workhorse for dictionaries and b250
//! streams per §4.1).

use std::io::{Read, Write};

use bzip2::read::BzDecoder;
use bzip2::write::BzEncoder;
use bzip2::Compression;

use super::{Codec, CodecId};
use crate::error::CodecError;

pub struct Bzip2Codec {
    level: Compression,
}

impl Default for Bzip2Codec {
    fn default() -> Self {
        Bzip2Codec { level: Compression::best() }
    }
}

impl Codec for Bzip2Codec {
    fn id(&self) -> CodecId {
        CodecId::Bzip2
    }

    fn compress(&self, data: &[u8]) -> Result<Vec<u8>, CodecError> {
        let mut enc = BzEncoder::new(Vec::new(), self.level);
        enc.write_all(data)?;
        enc.finish().map_err(CodecError::Io)
    }

    fn decompress(&self, data: &[u8], uncompressed_len: usize) -> Result<Vec<u8>, CodecError> {
        let mut out = Vec::with_capacity(uncompressed_len);
        let mut dec = BzDecoder::new(data);
        dec.read_to_end(&mut out)?;
        Ok(out)
    }
}

/// Identity codec: no transformation. Used for tiny sections where framing
/// overhead would exceed any savings, and as the `CodecId::Bgzf` registry
/// placeholder (BGZF framing is handled by `src/bgzf`, not the generic
/// codec race).
pub struct NoneCodec;

impl Codec for NoneCodec {
    fn id(&self) -> CodecId {
        CodecId::None
    }
    fn compress(&self, data: &[u8]) -> Result<Vec<u8>, CodecError> {
        Ok(data.to_vec())
    }
    fn decompress(&self, data: &[u8], _uncompressed_len: usize) -> Result<Vec<u8>, CodecError> {
        Ok(data.to_vec())
    }
    fn estimate(&self, data: &[u8]) -> Result<usize, CodecError> {
        Ok(data.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bzip2_roundtrip() {
        let codec = Bzip2Codec::default();
        let data = b"the quick brown fox jumps over the lazy dog ".repeat(200);
        let compressed = codec.compress(&data).unwrap();
        assert!(compressed.len() < data.len());
        let back = codec.decompress(&compressed, data.len()).unwrap();
        assert_eq!(back, data);
    }

    #[test]
    fn none_codec_is_identity() {
        let codec = NoneCodec;
        let data = b"abc".to_vec();
        assert_eq!(codec.compress(&data).unwrap(), data);
        assert_eq!(codec.decompress(&data, 3).unwrap(), data);
    }
}
