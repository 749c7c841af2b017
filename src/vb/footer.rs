//! genozip file header/footer (§6).
//!
//! Every `.genozip` file ends with a fixed 8-byte trailer: a 4-byte offset
//! (from the start of the file) to the section list, followed by a 4-byte
//! magic constant. genocat/random-access readers seek to `file_len - 8`,
//! validate the magic, then jump straight to the section list without
//! scanning the whole file.

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use std::io::{self, Read, Write};

use crate::config::FOOTER_MAGIC;
use crate::error::SectionError;

pub const FOOTER_LEN: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Footer {
    /// Byte offset of the section list from the start of the file.
    pub section_list_offset: u32,
}

impl Footer {
    pub fn write_to(&self, w: &mut impl Write) -> io::Result<()> {
        w.write_u32::<BigEndian>(self.section_list_offset)?;
        w.write_u32::<BigEndian>(FOOTER_MAGIC)?;
        Ok(())
    }

    pub fn read_from(r: &mut impl Read) -> Result<Self, SectionError> {
        let section_list_offset = r.read_u32::<BigEndian>().map_err(|_| SectionError::TruncatedHeader)?;
        let magic = r.read_u32::<BigEndian>().map_err(|_| SectionError::TruncatedHeader)?;
        if magic != FOOTER_MAGIC {
            return Err(SectionError::BadFooterMagic(magic as u64));
        }
        Ok(Footer { section_list_offset })
    }
}

/// The fixed preamble at the very start of a genozip file, identifying the
/// format and the original (uncompressed) source so genounzip can validate
/// compatibility before reading further.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenozipHeader {
    pub version: u8,
    /// Number of VBlocks the z_file is split into.
    pub num_vblocks: u32,
    /// Uncompressed size of the original source file, in bytes.
    pub source_size: u64,
    /// 0 = Adler32 (low 4 bytes of `digest_bytes` significant), 1 = MD5 (all
    /// 16 bytes significant) — mirrors [`crate::digest::DigestKind`] without
    /// this module depending on it, since `digest.rs` is a sibling component.
    pub digest_kind: u8,
    pub digest_bytes: [u8; 16],
    /// Which plug-in segmenter produced this archive (`crate::session::Format`
    /// as a raw byte) — the "data-type-specific bit" §6 describes, stored so
    /// PIZ doesn't need the caller to already know the source format.
    pub data_type: u8,
}

const HEADER_MAGIC: u32 = 0x474e5a31; // "GNZ1"

impl GenozipHeader {
    pub fn write_to(&self, w: &mut impl Write) -> io::Result<()> {
        w.write_u32::<BigEndian>(HEADER_MAGIC)?;
        w.write_u8(self.version)?;
        w.write_u32::<BigEndian>(self.num_vblocks)?;
        w.write_u64::<BigEndian>(self.source_size)?;
        w.write_u8(self.digest_kind)?;
        w.write_all(&self.digest_bytes)?;
        w.write_u8(self.data_type)?;
        Ok(())
    }

    pub fn read_from(r: &mut impl Read) -> Result<Self, SectionError> {
        let magic = r.read_u32::<BigEndian>().map_err(|_| SectionError::TruncatedHeader)?;
        if magic != HEADER_MAGIC {
            return Err(SectionError::BadFooterMagic(magic as u64));
        }
        let version = r.read_u8().map_err(|_| SectionError::TruncatedHeader)?;
        let num_vblocks = r.read_u32::<BigEndian>().map_err(|_| SectionError::TruncatedHeader)?;
        let source_size = r.read_u64::<BigEndian>().map_err(|_| SectionError::TruncatedHeader)?;
        let digest_kind = r.read_u8().map_err(|_| SectionError::TruncatedHeader)?;
        let mut digest_bytes = [0u8; 16];
        r.read_exact(&mut digest_bytes).map_err(|_| SectionError::TruncatedHeader)?;
        let data_type = r.read_u8().map_err(|_| SectionError::TruncatedHeader)?;
        Ok(GenozipHeader { version, num_vblocks, source_size, digest_kind, digest_bytes, data_type })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn footer_roundtrip() {
        let f = Footer { section_list_offset: 123456 };
        let mut buf = Vec::new();
        f.write_to(&mut buf).unwrap();
        assert_eq!(buf.len(), FOOTER_LEN);
        let back = Footer::read_from(&mut &buf[..]).unwrap();
        assert_eq!(back, f);
    }

    #[test]
    fn footer_rejects_bad_magic() {
        let buf = [0u8; 8];
        assert!(Footer::read_from(&mut &buf[..]).is_err());
    }

    #[test]
    fn genozip_header_roundtrip() {
        let h = GenozipHeader {
            version: 1,
            num_vblocks: 42,
            source_size: 1_000_000,
            digest_kind: 0,
            digest_bytes: [0xab; 16],
            data_type: 0,
        };
        let mut buf = Vec::new();
        h.write_to(&mut buf).unwrap();
        let back = GenozipHeader::read_from(&mut &buf[..]).unwrap();
        assert_eq!(back, h);
    }
}
