//! BGZF container preservation (§4.3, §8 scenario 2): a BGZF-wrapped source
//! must come back out bit-identical to its original block layout, not just
//! its uncompressed content, after compress/decompress through [`Session`].

use genozip::bgzf::{self, detect, BgzfMeta};
use genozip::digest::DigestKind;
use genozip::session::{Format, Session};

const VCF: &[u8] = b"#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\n\
chr1\t100\trs1\tA\tG\t.\tPASS\t.\n\
chr1\t200\trs2\tC\tT\t.\tPASS\t.\n";

/// Wraps `text` in a two-block BGZF stream at `level`, returning the raw
/// bytes plus the `BgzfMeta` that records the split point and level.
fn wrap_bgzf(text: &[u8], level: u32) -> (Vec<u8>, BgzfMeta) {
    let split = text.len() / 2;
    let (first, second) = text.split_at(split);

    let mut raw = Vec::new();
    raw.extend_from_slice(&bgzf::write_block(first, level).unwrap());
    raw.extend_from_slice(&bgzf::write_block(second, level).unwrap());
    raw.extend_from_slice(&bgzf::EOF_MARKER);

    let mut boundaries = detect::BoundaryMap::default();
    boundaries.push_block(first.len() as u64);
    boundaries.push_block(second.len() as u64);

    (raw, BgzfMeta { level, boundaries })
}

#[test]
fn bgzf_wrapped_source_round_trips_to_identical_bytes() {
    let (bgzf_bytes, meta) = wrap_bgzf(VCF, 6);

    let mut zip = Session::new(DigestKind::Md5).with_bgzf_meta(meta);
    let archive = zip.compress(Format::Vcf, VCF).unwrap();

    let mut unzip = Session::new(DigestKind::Md5);
    let restored = unzip.decompress(&archive).unwrap();
    assert_eq!(restored, bgzf_bytes, "rewrap must reproduce the original BGZF block layout byte for byte");
}

#[test]
fn bgzf_meta_round_trips_through_to_bytes_and_from_bytes() {
    let (_, meta) = wrap_bgzf(VCF, 9);
    let encoded = meta.to_bytes();
    let decoded = BgzfMeta::from_bytes(&encoded).unwrap();
    assert_eq!(decoded.level, 9);
    assert_eq!(decoded.boundaries.offsets, meta.boundaries.offsets);
}

#[test]
fn without_bgzf_meta_decompress_yields_plain_reconstructed_text() {
    let mut zip = Session::new(DigestKind::Adler32);
    let archive = zip.compress(Format::Vcf, VCF).unwrap();

    let mut unzip = Session::new(DigestKind::Adler32);
    let restored = unzip.decompress(&archive).unwrap();
    assert_eq!(restored, VCF);
}
