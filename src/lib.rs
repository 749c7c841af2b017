//! genozip — a VBlock-parallel compressor for genomic text formats (VCF,
//! SAM, FASTQ, FASTA, GVF/GFF3, 23andMe), built around a reference-aware,
//! context/dictionary-based encoder (§0, §3).
//!
//! [`session::Session`] is the crate's single entry point: it owns the
//! z_file-wide state (contexts, reference, random-access index, digest) and
//! drives both directions through [`session::Session::compress`] and
//! [`session::Session::decompress`].

pub mod bgzf;
pub mod bitarray;
pub mod buffer;
pub mod cli;
pub mod codec;
pub mod config;
pub mod container;
pub mod dict;
pub mod digest;
pub mod error;
pub mod io;
pub mod reference;
pub mod segment;
pub mod session;
pub mod threadpool;
pub mod util;
pub mod vb;

pub use error::{GenozipError, Result};
pub use session::{Format, Session};
