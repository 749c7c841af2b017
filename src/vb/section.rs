//! On-disk section format (§4.4, §6): every section in a `.genozip` file is
//! prefixed by a fixed 28-byte header, stored big-endian (network byte
//! order) so the format is endian-independent regardless of the producing
//! machine.

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use std::io::{self, Read, Write};

use crate::codec::CodecId;
use crate::error::SectionError;

pub const SECTION_HEADER_LEN: usize = 28;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum SectionType {
    GenozipHeader = 0,
    TxtHeader = 1,
    VbHeader = 2,
    Dictionary = 3,
    B250 = 4,
    Local = 5,
    Reference = 6,
    RefIsSet = 7,
    RandomAccess = 8,
    Bgzf = 9,
}

impl SectionType {
    pub fn from_u8(v: u8) -> Result<Self, SectionError> {
        Ok(match v {
            0 => SectionType::GenozipHeader,
            1 => SectionType::TxtHeader,
            2 => SectionType::VbHeader,
            3 => SectionType::Dictionary,
            4 => SectionType::B250,
            5 => SectionType::Local,
            6 => SectionType::Reference,
            7 => SectionType::RefIsSet,
            8 => SectionType::RandomAccess,
            9 => SectionType::Bgzf,
            other => return Err(SectionError::UnknownSectionType(other)),
        })
    }
}

/// Fixed 28-byte section header:
/// `section_type`(1) `codec`(1) `flags`(2) `vblock_i`(4) `dict_id`(8)
/// `compressed_len`(4) `uncompressed_len`(4) `reserved`(4) = 28 bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectionHeader {
    pub section_type: SectionType,
    pub codec: CodecId,
    pub flags: u16,
    pub vblock_i: u32,
    pub dict_id: u64,
    pub compressed_len: u32,
    pub uncompressed_len: u32,
}

impl SectionHeader {
    pub fn write_to(&self, w: &mut impl Write) -> io::Result<()> {
        w.write_u8(self.section_type as u8)?;
        w.write_u8(self.codec as u8)?;
        w.write_u16::<BigEndian>(self.flags)?;
        w.write_u32::<BigEndian>(self.vblock_i)?;
        w.write_u64::<BigEndian>(self.dict_id)?;
        w.write_u32::<BigEndian>(self.compressed_len)?;
        w.write_u32::<BigEndian>(self.uncompressed_len)?;
        w.write_u32::<BigEndian>(0)?; // reserved
        Ok(())
    }

    pub fn read_from(r: &mut impl Read) -> Result<Self, SectionError> {
        let section_type = SectionType::from_u8(r.read_u8().map_err(|_| SectionError::TruncatedHeader)?)?;
        let codec = CodecId::from_u8(r.read_u8().map_err(|_| SectionError::TruncatedHeader)?)
            .map_err(|_| SectionError::TruncatedHeader)?;
        let flags = r.read_u16::<BigEndian>().map_err(|_| SectionError::TruncatedHeader)?;
        let vblock_i = r.read_u32::<BigEndian>().map_err(|_| SectionError::TruncatedHeader)?;
        let dict_id = r.read_u64::<BigEndian>().map_err(|_| SectionError::TruncatedHeader)?;
        let compressed_len = r.read_u32::<BigEndian>().map_err(|_| SectionError::TruncatedHeader)?;
        let uncompressed_len = r.read_u32::<BigEndian>().map_err(|_| SectionError::TruncatedHeader)?;
        let _reserved = r.read_u32::<BigEndian>().map_err(|_| SectionError::TruncatedHeader)?;
        Ok(SectionHeader { section_type, codec, flags, vblock_i, dict_id, compressed_len, uncompressed_len })
    }
}

/// One entry in the file-level section list (written once, near the end of
/// the file, immediately before the random-access index): records where a
/// section lives so genocat/random-access can seek directly to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectionListEntry {
    pub offset: u64,
    pub section_type: SectionType,
    pub vblock_i: u32,
    pub dict_id: u64,
}

impl SectionListEntry {
    pub fn write_to(&self, w: &mut impl Write) -> io::Result<()> {
        w.write_u64::<BigEndian>(self.offset)?;
        w.write_u8(self.section_type as u8)?;
        w.write_u32::<BigEndian>(self.vblock_i)?;
        w.write_u64::<BigEndian>(self.dict_id)?;
        Ok(())
    }

    pub fn read_from(r: &mut impl Read) -> Result<Self, SectionError> {
        let offset = r.read_u64::<BigEndian>().map_err(|_| SectionError::TruncatedHeader)?;
        let section_type = SectionType::from_u8(r.read_u8().map_err(|_| SectionError::TruncatedHeader)?)?;
        let vblock_i = r.read_u32::<BigEndian>().map_err(|_| SectionError::TruncatedHeader)?;
        let dict_id = r.read_u64::<BigEndian>().map_err(|_| SectionError::TruncatedHeader)?;
        Ok(SectionListEntry { offset, section_type, vblock_i, dict_id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn section_header_roundtrip() {
        let h = SectionHeader {
            section_type: SectionType::B250,
            codec: CodecId::Bzip2,
            flags: 0x1234,
            vblock_i: 7,
            dict_id: 0xdead_beef_cafe_babe,
            compressed_len: 100,
            uncompressed_len: 400,
        };
        let mut buf = Vec::new();
        h.write_to(&mut buf).unwrap();
        assert_eq!(buf.len(), SECTION_HEADER_LEN);
        let back = SectionHeader::read_from(&mut &buf[..]).unwrap();
        assert_eq!(back, h);
    }

    #[test]
    fn section_list_entry_roundtrip() {
        let e = SectionListEntry {
            offset: 123456,
            section_type: SectionType::VbHeader,
            vblock_i: 3,
            dict_id: 42,
        };
        let mut buf = Vec::new();
        e.write_to(&mut buf).unwrap();
        let back = SectionListEntry::read_from(&mut &buf[..]).unwrap();
        assert_eq!(back, e);
    }

    #[test]
    fn truncated_header_errors() {
        let buf = vec![0u8; 5];
        assert!(SectionHeader::read_from(&mut &buf[..]).is_err());
    }
}
