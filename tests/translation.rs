//! 23andMe→VCF translation through [`Session::decompress_me23_as_vcf`]
//! (§8 scenario 5), exercised end to end rather than just at the
//! `translate_row` unit level.

use genozip::digest::DigestKind;
use genozip::reference::{RefMode, ReferenceStore};
use genozip::session::{Format, Session};

const ME23: &[u8] = b"rs001\t1\t100\tAG\n\
rs002\t1\t200\tCC\n\
rs003\t1\t300\tTT\n";

fn chr1_reference() -> ReferenceStore {
    let mut store = ReferenceStore::new(RefMode::External);
    let range = store.add_range("1", 400);
    let mut range = range.write().unwrap();
    range.set_base(99, b'A').unwrap();
    range.set_base(199, b'C').unwrap();
    range.set_base(299, b'G').unwrap();
    drop(range);
    store
}

#[test]
fn me23_archive_translates_to_vcf_rows_against_a_reference() {
    let mut zip = Session::new(DigestKind::Md5);
    let archive = zip.compress(Format::Me23, ME23).unwrap();

    let mut unzip = Session::new(DigestKind::Md5).with_reference(chr1_reference());
    let vcf = unzip.decompress_me23_as_vcf(&archive).unwrap();
    let text = String::from_utf8(vcf).unwrap();

    assert!(text.starts_with("##fileformat=VCFv4.2\n#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\tFORMAT\tSAMPLE\n"));
    assert!(text.contains("1\t100\trs001\tA\tG\t.\tPASS\t.\tGT\t0/1"));
    // Homozygous-reference row: no alt allele, genotype collapses to 0/0.
    assert!(text.contains("1\t200\trs002\tC\t.\t.\tPASS\t.\tGT\t0/0"));
    // Homozygous-variant row: both alleles differ from REF.
    assert!(text.contains("1\t300\trs003\tG\tT\t.\tPASS\t.\tGT\t1/1"));
}

#[test]
fn me23_to_vcf_requires_a_reference() {
    let mut zip = Session::new(DigestKind::Adler32);
    let archive = zip.compress(Format::Me23, ME23).unwrap();

    let mut unzip = Session::new(DigestKind::Adler32);
    assert!(unzip.decompress_me23_as_vcf(&archive).is_err());
}

#[test]
fn plain_decompress_still_replays_original_23andme_rows() {
    let mut zip = Session::new(DigestKind::Adler32);
    let archive = zip.compress(Format::Me23, ME23).unwrap();

    let mut unzip = Session::new(DigestKind::Adler32);
    let restored = unzip.decompress(&archive).unwrap();
    assert_eq!(restored, ME23);
}
