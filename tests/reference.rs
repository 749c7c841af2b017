//! SAM-against-reference and REF_EXT_STORE round trips through the public
//! [`Session`] API (§4.2) — the scenarios plain format round trips in
//! `e2e.rs` don't cover, since they require an explicit reference.

use genozip::digest::DigestKind;
use genozip::reference::{RefMode, ReferenceStore};
use genozip::session::{Format, Session};

const CHR1: &[u8] = b"ACGTACGTACGTACGTACGTACGTACGTACGTACGTACGTACGTACGTACGTACGTACGTACGTACGTACGTACGTACGTACGTACGTACGTACGTAC";

const SAM: &[u8] = b"@HD\tVN:1.6\tSO:coordinate\n\
@SQ\tSN:chr1\tLN:100\n\
read1\t0\tchr1\t1\t60\t10M\t*\t0\t0\tACGTACGTAC\tIIIIIIIIII\n\
read2\t0\tchr1\t21\t60\t10M\t*\t0\t0\tACGTACGTAC\tIIIIIIIIII\n\
read3\t0\tchr1\t41\t60\t10M\t*\t0\t0\tACGTTCGTAC\tIIIIIIIIII\n";

fn chr1_reference(mode: RefMode) -> ReferenceStore {
    let mut store = ReferenceStore::new(mode);
    let range = store.add_range("chr1", CHR1.len());
    let mut range = range.write().unwrap();
    for (i, base) in CHR1.iter().enumerate() {
        range.set_base(i, *base).unwrap();
    }
    drop(range);
    store
}

#[test]
fn sam_round_trips_byte_identical_against_an_external_reference() {
    let mut zip = Session::new(DigestKind::Md5).with_reference(chr1_reference(RefMode::External));
    let archive = zip.compress(Format::Sam, SAM).unwrap();

    let mut unzip = Session::new(DigestKind::Md5).with_reference(chr1_reference(RefMode::External));
    let restored = unzip.decompress(&archive).unwrap();
    assert_eq!(restored, SAM);
}

#[test]
fn sam_decompress_without_reference_fails_when_archive_used_one() {
    let mut zip = Session::new(DigestKind::Adler32).with_reference(chr1_reference(RefMode::External));
    let archive = zip.compress(Format::Sam, SAM).unwrap();

    let mut unzip = Session::new(DigestKind::Adler32);
    assert!(unzip.decompress(&archive).is_err(), "SEQ reconstruction must fail without a reference");
}

#[test]
fn ext_store_archives_its_own_reference_and_round_trips_without_resupplying_it() {
    let mut zip = Session::new(DigestKind::Adler32).with_reference(chr1_reference(RefMode::ExtStore));
    let archive = zip.compress(Format::Sam, SAM).unwrap();

    // No --reference supplied at decode time: the archive must carry enough
    // of the reference itself (via the embedded Reference/RefIsSet sections)
    // to reconstruct SEQ.
    let mut unzip = Session::new(DigestKind::Adler32);
    let restored = unzip.decompress(&archive).unwrap();
    assert_eq!(restored, SAM);
    assert!(unzip.reference.is_some(), "decompress must have reconstructed a reference from the archive");
}
