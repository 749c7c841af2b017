//! Running digest over reconstructed text (§4.4): Adler32 by default, MD5
//! under `--md5`/`--test`. The engine updates the digest in VB order so a
//! `digest_so_far` snapshot can be taken after each VB and compared, VB by
//! VB, against the value recorded at ZIP time — without needing the whole
//! file in memory to verify.

use md5::{Digest as Md5DigestTrait, Md5};

const ADLER_MOD: u32 = 65521;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DigestKind {
    Adler32,
    Md5,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DigestValue {
    Adler32(u32),
    Md5([u8; 16]),
}

impl DigestValue {
    pub fn kind(&self) -> DigestKind {
        match self {
            DigestValue::Adler32(_) => DigestKind::Adler32,
            DigestValue::Md5(_) => DigestKind::Md5,
        }
    }

    /// Packs this value into the `(digest_kind, digest_bytes)` pair stored in
    /// [`crate::vb::footer::GenozipHeader`] (0 = Adler32, 1 = MD5).
    pub fn to_header_bytes(&self) -> (u8, [u8; 16]) {
        let mut bytes = [0u8; 16];
        match self {
            DigestValue::Adler32(v) => {
                bytes[..4].copy_from_slice(&v.to_be_bytes());
                (0, bytes)
            }
            DigestValue::Md5(b) => {
                bytes.copy_from_slice(b);
                (1, bytes)
            }
        }
    }

    pub fn from_header_bytes(kind: u8, bytes: [u8; 16]) -> Option<Self> {
        match kind {
            0 => Some(DigestValue::Adler32(u32::from_be_bytes(bytes[..4].try_into().ok()?))),
            1 => Some(DigestValue::Md5(bytes)),
            _ => None,
        }
    }
}

impl std::fmt::Display for DigestValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DigestValue::Adler32(v) => write!(f, "{v:08x}"),
            DigestValue::Md5(bytes) => {
                for b in bytes {
                    write!(f, "{b:02x}")?;
                }
                Ok(())
            }
        }
    }
}

/// Incremental digest accumulator, fed one VB's reconstructed bytes at a
/// time so `snapshot` can be taken after every VB without re-hashing from
/// the start.
pub enum RunningDigest {
    Adler32 { a: u32, b: u32 },
    Md5(Box<Md5>),
}

impl RunningDigest {
    pub fn new(kind: DigestKind) -> Self {
        match kind {
            DigestKind::Adler32 => RunningDigest::Adler32 { a: 1, b: 0 },
            DigestKind::Md5 => RunningDigest::Md5(Box::new(Md5::new())),
        }
    }

    pub fn update(&mut self, data: &[u8]) {
        match self {
            RunningDigest::Adler32 { a, b } => {
                for &byte in data {
                    *a = (*a + byte as u32) % ADLER_MOD;
                    *b = (*b + *a) % ADLER_MOD;
                }
            }
            RunningDigest::Md5(hasher) => hasher.update(data),
        }
    }

    /// Snapshot of the digest as it stands after the bytes fed so far,
    /// without consuming the accumulator — more calls to `update` may
    /// follow.
    pub fn snapshot(&self) -> DigestValue {
        match self {
            RunningDigest::Adler32 { a, b } => DigestValue::Adler32((*b << 16) | *a),
            RunningDigest::Md5(hasher) => {
                let finished = hasher.clone().finalize();
                let mut out = [0u8; 16];
                out.copy_from_slice(&finished);
                DigestValue::Md5(out)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adler32_known_vector() {
        let mut d = RunningDigest::new(DigestKind::Adler32);
        d.update(b"Wikipedia");
        assert_eq!(d.snapshot(), DigestValue::Adler32(0x11E6_0398));
    }

    #[test]
    fn adler32_per_vb_snapshots_match_single_pass() {
        let mut whole = RunningDigest::new(DigestKind::Adler32);
        whole.update(b"chr1\t100\t.\tA\tC\n");
        whole.update(b"chr1\t200\t.\tA\tG\n");
        let whole_final = whole.snapshot();

        let mut per_vb = RunningDigest::new(DigestKind::Adler32);
        per_vb.update(b"chr1\t100\t.\tA\tC\n");
        let _mid = per_vb.snapshot();
        per_vb.update(b"chr1\t200\t.\tA\tG\n");
        assert_eq!(per_vb.snapshot(), whole_final);
    }

    #[test]
    fn md5_known_vector() {
        let mut d = RunningDigest::new(DigestKind::Md5);
        d.update(b"abc");
        let DigestValue::Md5(bytes) = d.snapshot() else { panic!("expected md5") };
        assert_eq!(format!("{:x}", bytes.iter().fold(0u128, |acc, b| (acc << 8) | *b as u128)), "900150983cd24fb0d6963f7d28e17f72");
    }

    #[test]
    fn digest_value_display_formats_hex() {
        assert_eq!(DigestValue::Adler32(0xdead_beef).to_string(), "deadbeef");
    }

    #[test]
    fn digest_value_header_bytes_roundtrip() {
        let v = DigestValue::Adler32(0x1122_3344);
        let (kind, bytes) = v.to_header_bytes();
        assert_eq!(DigestValue::from_header_bytes(kind, bytes), Some(v));

        let md5 = DigestValue::Md5([7u8; 16]);
        let (kind, bytes) = md5.to_header_bytes();
        assert_eq!(DigestValue::from_header_bytes(kind, bytes), Some(md5));
    }
}
