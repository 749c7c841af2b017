//! Tunable run-time flags shared by `genozip`/`genounzip`/`genocat`: a plain
//! value type the CLI layer builds from argv and hands down to
//! [`crate::session::Session`].

use crate::digest::DigestKind;

/// Which binary-equivalent mode the process is running as, inferred from
/// `argv[0]`'s basename rather than a subcommand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// `genozip`: compress one or more source files into `.genozip` archives.
    Zip,
    /// `genounzip`: decompress `.genozip` archives back to their original text.
    Unzip,
    /// `genocat`: decompress and print to stdout without writing a file.
    Cat,
}

#[derive(Clone, Debug)]
pub struct Flags {
    pub mode: Mode,
    /// Overwrite an existing destination file without prompting. Default: false.
    pub force: bool,
    /// Number of VBlock compute threads. `None` means auto-detect (§5).
    pub threads: Option<usize>,
    /// VBlock memory budget in bytes, clamped at use time to
    /// `[VBLOCK_MEMORY_MIN, VBLOCK_MEMORY_MAX]`.
    pub vblock_size: Option<usize>,
    /// Use MD5 instead of the default Adler32 running digest (§4.4).
    pub md5: bool,
    /// Skip the 1%-tie-break general-purpose codec race and just take the
    /// first candidate — trades ratio for speed (§4.1).
    pub fast: bool,
    /// Decompress and verify the digest but discard the reconstructed text.
    pub test_mode: bool,
    /// Path to an external reference FASTA (`--reference`), used in
    /// [`crate::reference::RefMode::External`] (§4.2).
    pub reference_filename: Option<String>,
    /// Path to an external reference FASTA (`--reference-store`), used in
    /// [`crate::reference::RefMode::ExtStore`] (§4.2) — bases the data
    /// actually touches are also stored in the archive, subject to
    /// compaction, so the archive stays self-contained.
    pub reference_store_filename: Option<String>,
    /// Explicit output path (`--output`/`-o`). When absent, the destination
    /// is derived from the input filename and `mode`.
    pub output_filename: Option<String>,
    /// Decompress a 23andMe archive as VCF rows instead of replaying the
    /// original 23andMe text (`--to-vcf`, §8 scenario 5). Requires a
    /// reference to resolve REF bases.
    pub to_vcf: bool,
}

impl Flags {
    pub fn new(mode: Mode) -> Self {
        Flags {
            mode,
            force: false,
            threads: None,
            vblock_size: None,
            md5: false,
            fast: false,
            test_mode: false,
            reference_filename: None,
            reference_store_filename: None,
            output_filename: None,
            to_vcf: false,
        }
    }

    pub fn digest_kind(&self) -> DigestKind {
        if self.md5 {
            DigestKind::Md5
        } else {
            DigestKind::Adler32
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_flags_are_unset() {
        let f = Flags::new(Mode::Zip);
        assert!(!f.force);
        assert!(f.threads.is_none());
        assert_eq!(f.digest_kind(), DigestKind::Adler32);
    }

    #[test]
    fn md5_flag_selects_md5_digest() {
        let mut f = Flags::new(Mode::Unzip);
        f.md5 = true;
        assert_eq!(f.digest_kind(), DigestKind::Md5);
    }
}
