//! Hand-rolled argument parsing — no `clap`, just a pass over `argv`
//! recognizing long flags and collecting remaining arguments as input
//! filenames.

use crate::cli::flags::{Flags, Mode};
use crate::session::Format;

pub struct ParsedArgs {
    pub flags: Flags,
    pub input_files: Vec<String>,
    pub exe_name: String,
    pub help: bool,
    pub explicit_format: Option<Format>,
}

/// Infers the run mode from `argv[0]`'s basename: `genounzip`/`gunzip` imply
/// [`Mode::Unzip`], `genocat` implies [`Mode::Cat`], anything else defaults
/// to [`Mode::Zip`].
pub fn detect_mode(argv0: &str) -> Mode {
    let base = argv0.rsplit(['/', '\\']).next().unwrap_or(argv0).to_ascii_lowercase();
    if base.contains("unzip") {
        Mode::Unzip
    } else if base.contains("cat") {
        Mode::Cat
    } else {
        Mode::Zip
    }
}

/// Parses `args` (not including argv[0]) against `mode` inferred from argv[0].
pub fn parse_args(mode: Mode, exe_name: String, args: &[String]) -> Result<ParsedArgs, String> {
    let mut flags = Flags::new(mode);
    let mut input_files = Vec::new();
    let mut help = false;
    let mut explicit_format = None;

    let mut i = 0;
    while i < args.len() {
        let arg = &args[i];
        match arg.as_str() {
            "-h" | "--help" => help = true,
            "-f" | "--force" => flags.force = true,
            "-t" | "--test" => flags.test_mode = true,
            "--md5" => flags.md5 = true,
            "--fast" => flags.fast = true,
            "-o" | "--output" => {
                i += 1;
                let val = args.get(i).ok_or_else(|| format!("{arg} requires a value"))?;
                flags.output_filename = Some(val.clone());
            }
            "-e" | "--reference" => {
                i += 1;
                let val = args.get(i).ok_or_else(|| format!("{arg} requires a value"))?;
                flags.reference_filename = Some(val.clone());
            }
            "--reference-store" => {
                i += 1;
                let val = args.get(i).ok_or_else(|| format!("{arg} requires a value"))?;
                flags.reference_store_filename = Some(val.clone());
            }
            "--to-vcf" => flags.to_vcf = true,
            "--threads" => {
                i += 1;
                let val = args.get(i).ok_or_else(|| format!("{arg} requires a value"))?;
                flags.threads = Some(val.parse().map_err(|_| format!("invalid --threads value: {val}"))?);
            }
            "--vblock" => {
                i += 1;
                let val = args.get(i).ok_or_else(|| format!("{arg} requires a value"))?;
                let mb: usize = val.parse().map_err(|_| format!("invalid --vblock value: {val}"))?;
                flags.vblock_size = Some(mb * 1024 * 1024);
            }
            "--input-type" => {
                i += 1;
                let val = args.get(i).ok_or_else(|| format!("{arg} requires a value"))?;
                explicit_format = Some(parse_format_name(val)?);
            }
            other if other.starts_with('-') && other.len() > 1 => {
                return Err(format!("unrecognized option: {other}"));
            }
            positional => input_files.push(positional.to_owned()),
        }
        i += 1;
    }

    Ok(ParsedArgs { flags, input_files, exe_name, help, explicit_format })
}

fn parse_format_name(name: &str) -> Result<Format, String> {
    match name.to_ascii_lowercase().as_str() {
        "vcf" => Ok(Format::Vcf),
        "sam" => Ok(Format::Sam),
        "fastq" => Ok(Format::Fastq),
        "fasta" => Ok(Format::Fasta),
        "gvf" | "gff" | "gff3" => Ok(Format::Gvf),
        "23andme" | "me23" => Ok(Format::Me23),
        other => Err(format!("unknown --input-type: {other}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detect_mode_from_basename() {
        assert_eq!(detect_mode("/usr/bin/genozip"), Mode::Zip);
        assert_eq!(detect_mode("genounzip"), Mode::Unzip);
        assert_eq!(detect_mode("genocat"), Mode::Cat);
    }

    #[test]
    fn parses_flags_and_positional_files() {
        let args: Vec<String> = vec!["-f", "--threads", "4", "a.vcf", "b.vcf"]
            .into_iter()
            .map(String::from)
            .collect();
        let parsed = parse_args(Mode::Zip, "genozip".into(), &args).unwrap();
        assert!(parsed.flags.force);
        assert_eq!(parsed.flags.threads, Some(4));
        assert_eq!(parsed.input_files, vec!["a.vcf", "b.vcf"]);
    }

    #[test]
    fn rejects_unknown_flag() {
        let args: Vec<String> = vec!["--bogus".to_owned()];
        assert!(parse_args(Mode::Zip, "genozip".into(), &args).is_err());
    }

    #[test]
    fn missing_value_is_an_error() {
        let args: Vec<String> = vec!["--threads".to_owned()];
        assert!(parse_args(Mode::Zip, "genozip".into(), &args).is_err());
    }
}
