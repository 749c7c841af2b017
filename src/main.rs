//! Binary entry point for `genozip`/`genounzip`/`genocat`.
//!
//! A single binary whose behaviour is selected by `argv[0]`'s basename —
//! see [`genozip::cli::parse::detect_mode`].

use std::io::{IsTerminal, Read, Write};

use genozip::bgzf::{self, BgzfMeta};
use genozip::cli::constants::{display_level, set_display_level, GENOZIP_EXTENSION};
use genozip::cli::flags::Mode;
use genozip::cli::parse::{detect_mode, parse_args, ParsedArgs};
use genozip::digest::DigestKind;
use genozip::io::{open_dst_file, open_src_file, NUL_MARK, STDIN_MARK, STDOUT_MARK};
use genozip::reference::{RefMode, ReferenceStore};
use genozip::session::{Format, Session};

fn print_usage(exe_name: &str) {
    eprintln!(
        "usage: {exe_name} [options] FILE...\n\
         \n\
         options:\n\
         \x20 -f, --force              overwrite destination without prompting\n\
         \x20 -o, --output PATH        explicit destination path\n\
         \x20 -e, --reference FILE     external reference FASTA for position-delta coding\n\
         \x20     --reference-store F  like --reference, but also archives the bases used\n\
         \x20     --to-vcf             decompress a 23andMe archive as VCF rows\n\
         \x20     --threads N          number of VBlock compute threads\n\
         \x20     --vblock N           VBlock size in MiB\n\
         \x20     --md5                use MD5 instead of Adler32 for the running digest\n\
         \x20     --fast               skip the codec ratio race, pick the first candidate\n\
         \x20 -t, --test               verify digest only, discard reconstructed output\n\
         \x20     --input-type TYPE    force source format (vcf/sam/fastq/fasta/gvf/23andme)\n\
         \x20 -h, --help               print this message"
    );
}

/// Loads an external reference FASTA into a [`ReferenceStore`] under `mode`
/// (`External` for `--reference`, `ExtStore` for `--reference-store`) — a
/// minimal multi-contig FASTA reader grounded on
/// [`genozip::segment::fasta::FastaSegmenter`]'s `>`-header convention.
/// Reads the file through an `mmap` rather than buffering it into a `String`
/// first, since reference FASTAs (whole chromosomes) can be gigabytes.
fn load_reference(path: &str, mode: RefMode) -> anyhow::Result<ReferenceStore> {
    let file = std::fs::File::open(path)?;
    // SAFETY: the mapped file isn't concurrently truncated by another
    // process for the lifetime of this function; reference FASTAs are
    // read-only inputs supplied by the caller.
    let mmap = unsafe { memmap2::Mmap::map(&file)? };

    let mut store = ReferenceStore::new(mode);
    let mut current: Option<(String, Vec<u8>)> = None;
    let mut flush = |store: &mut ReferenceStore, entry: Option<(String, Vec<u8>)>| {
        if let Some((chrom, seq)) = entry {
            let range = store.add_range(chrom, seq.len());
            let mut range = range.write().unwrap();
            for (i, base) in seq.iter().enumerate() {
                let _ = range.set_base(i, *base);
            }
        }
    };

    for raw_line in mmap.split(|&b| b == b'\n') {
        let line = raw_line.strip_suffix(b"\r").unwrap_or(raw_line);
        if let Some(chrom) = line.strip_prefix(b">") {
            flush(&mut store, current.take());
            let name = chrom.split(|&b| b == b' ' || b == b'\t').next().unwrap_or(chrom);
            current = Some((String::from_utf8_lossy(name).into_owned(), Vec::new()));
        } else if let Some((_, seq)) = current.as_mut() {
            seq.extend(line.iter().filter(|b| !b.is_ascii_whitespace()).map(|b| b.to_ascii_uppercase()));
        }
    }
    flush(&mut store, current.take());
    Ok(store)
}

fn build_session(parsed: &ParsedArgs) -> anyhow::Result<Session> {
    let mut session = Session::new(parsed.flags.digest_kind()).with_fast_mode(parsed.flags.fast);
    if let Some(threads) = parsed.flags.threads {
        session = session.with_threads(threads);
    }
    if let Some(vblock) = parsed.flags.vblock_size {
        session = session.with_vblock_size(vblock);
    }
    if let Some(ref_path) = &parsed.flags.reference_filename {
        session = session.with_reference(load_reference(ref_path, RefMode::External)?);
    } else if let Some(ref_path) = &parsed.flags.reference_store_filename {
        session = session.with_reference(load_reference(ref_path, RefMode::ExtStore)?);
    }
    Ok(session)
}

/// Detects a BGZF-wrapped source (`.bam`/`.vcf.gz`/tabix-indexed files) by
/// its gzip+FEXTRA magic and unwraps it into plain text plus the
/// level/boundary metadata needed to re-wrap it bit-exactly on decompress
/// (§4.3). Returns `None` for plain-text sources, or if the magic matches
/// but the body doesn't actually parse as BGZF blocks.
fn try_unwrap_bgzf(data: &[u8]) -> Option<(Vec<u8>, BgzfMeta)> {
    if data.len() < 4 || data[0] != 0x1f || data[1] != 0x8b || data[3] & 0x04 == 0 {
        return None;
    }
    let mut text = Vec::new();
    let mut boundaries = bgzf::detect::BoundaryMap::default();
    let mut level: Option<u32> = None;
    let mut cursor = data;
    while !cursor.is_empty() {
        if bgzf::is_eof_marker(cursor) {
            break;
        }
        let block = bgzf::read_block(cursor).ok()?;
        if level.is_none() && !block.uncompressed.is_empty() {
            level = bgzf::detect::detect_level(&block.uncompressed, block.compressed_len);
        }
        boundaries.push_block(block.uncompressed.len() as u64);
        text.extend_from_slice(&block.uncompressed);
        cursor = &cursor[block.compressed_len..];
    }
    Some((text, BgzfMeta { level: level.unwrap_or(6), boundaries }))
}

fn default_output_path(input: &str, mode: Mode) -> String {
    match mode {
        Mode::Zip => format!("{input}{GENOZIP_EXTENSION}"),
        Mode::Unzip => input.strip_suffix(GENOZIP_EXTENSION).unwrap_or(input).to_owned(),
        Mode::Cat => STDOUT_MARK.to_owned(),
    }
}

fn run_one(parsed: &ParsedArgs, input: &str) -> anyhow::Result<()> {
    let mut session = build_session(parsed)?;

    let output = match (&parsed.flags.output_filename, parsed.flags.test_mode) {
        (_, true) => NUL_MARK.to_owned(),
        (Some(o), false) => o.clone(),
        (None, false) => default_output_path(input, parsed.flags.mode),
    };

    let mut src_data = Vec::new();
    open_src_file(input)?.read_to_end(&mut src_data)?;

    let out_bytes = match parsed.flags.mode {
        Mode::Zip => {
            let format = parsed
                .explicit_format
                .or_else(|| Format::from_extension(input))
                .ok_or_else(|| anyhow::anyhow!("cannot infer format for {input}; pass --input-type"))?;
            if let Some((text, meta)) = try_unwrap_bgzf(&src_data) {
                session = session.with_bgzf_meta(meta);
                src_data = text;
            }
            session.compress(format, &src_data)?
        }
        Mode::Unzip | Mode::Cat if parsed.flags.to_vcf => session.decompress_me23_as_vcf(&src_data)?,
        Mode::Unzip | Mode::Cat => session.decompress(&src_data)?,
    };

    if display_level() >= 3 {
        eprintln!(
            "{input}: {} -> {} bytes",
            src_data.len().max(out_bytes.len()),
            out_bytes.len()
        );
    }

    let mut dst = open_dst_file(&output, &parsed.flags)?;
    dst.write_all(&out_bytes)?;
    dst.flush()?;
    Ok(())
}

fn main() {
    let argv0 = std::env::args().next().unwrap_or_else(|| "genozip".to_owned());
    let mode = detect_mode(&argv0);
    let rest: Vec<String> = std::env::args().skip(1).collect();

    let parsed = match parse_args(mode, argv0.clone(), &rest) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("genozip: {e}");
            std::process::exit(1);
        }
    };

    if parsed.help {
        print_usage(&parsed.exe_name);
        std::process::exit(0);
    }

    if parsed.flags.mode == Mode::Cat && display_level() == 2 {
        set_display_level(1);
    }

    let mut input_files = parsed.input_files.clone();
    if input_files.is_empty() {
        if std::io::stdin().is_terminal() {
            eprintln!("genozip: refusing to read from a console");
            std::process::exit(1);
        }
        input_files.push(STDIN_MARK.to_owned());
    }

    let multi = input_files.len() > 1;
    let mut failures = 0;
    for input in &input_files {
        if multi && parsed.flags.output_filename.is_some() {
            eprintln!("genozip: --output cannot be combined with multiple input files");
            std::process::exit(1);
        }
        if let Err(e) = run_one(&parsed, input) {
            eprintln!("genozip: {input}: {e}");
            failures += 1;
        }
    }

    std::process::exit(if failures == 0 { 0 } else { 1 });
}

// Keep the digest-kind selection reachable for callers that only use the
// library (e.g. tests) without going through argv parsing.
#[allow(dead_code)]
fn _digest_kind_default() -> DigestKind {
    DigestKind::Adler32
}
