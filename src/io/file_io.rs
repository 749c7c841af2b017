//! File I/O primitives for the genozip/genounzip/genocat CLI.
//!
//! - [`open_src_file`] — resolves a path string to a `Box<dyn Read>`,
//!   handling the `"stdin"` sentinel and rejecting directories.
//! - [`open_dst_file`] — resolves a path string to a [`DstFile`], handling
//!   the `"stdout"` and discard sentinels and enforcing the overwrite policy
//!   from [`crate::cli::flags::Flags`].
//!
//! Verbosity-gated diagnostics are emitted via stderr using the global
//! [`crate::cli::constants::DISPLAY_LEVEL`] atomic.

use std::fs::{File, OpenOptions};
use std::io::{self, BufReader, Read, Write};
use std::path::Path;

use crate::cli::constants::display_level;
use crate::cli::flags::Flags;
use crate::util::is_directory;

// ---------------------------------------------------------------------------
// Sentinel strings
// ---------------------------------------------------------------------------

/// Sentinel: read from standard input.
pub const STDIN_MARK: &str = "stdin";

/// Sentinel: write to standard output.
pub const STDOUT_MARK: &str = "stdout";

/// Sentinel: discard output.
#[cfg(windows)]
pub const NUL_MARK: &str = "nul";
#[cfg(not(windows))]
pub const NUL_MARK: &str = "/dev/null";

#[inline]
fn is_dev_null(s: &str) -> bool {
    s == NUL_MARK
}

#[inline]
fn is_stdin(s: &str) -> bool {
    s == STDIN_MARK
}

#[inline]
fn is_stdout(s: &str) -> bool {
    s == STDOUT_MARK
}

// ---------------------------------------------------------------------------
// Source file
// ---------------------------------------------------------------------------

/// Opens a source file for reading, returning a boxed [`Read`].
///
/// - If `path` is the sentinel `"stdin"`, returns standard input.
/// - If `path` is a directory, returns an [`io::ErrorKind::InvalidInput`] error.
/// - Otherwise opens the file and wraps it in a [`BufReader`] for efficient
///   sequential reads.
pub fn open_src_file(path: &str) -> io::Result<Box<dyn Read>> {
    if is_stdin(path) {
        if display_level() >= 4 {
            eprintln!("Using stdin for input");
        }
        #[cfg(windows)]
        // SAFETY: calling _setmode on stdin (fd=0) is always valid.
        unsafe {
            libc::_setmode(0, libc::O_BINARY);
        }
        return Ok(Box::new(io::stdin()));
    }

    if is_directory(Path::new(path)) {
        if display_level() >= 1 {
            eprintln!("genozip: {} is a directory -- ignored", path);
        }
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("{}: is a directory", path),
        ));
    }

    let f = File::open(path).map_err(|e| {
        if display_level() >= 1 {
            eprintln!("{}: {}", path, e);
        }
        e
    })?;
    Ok(Box::new(BufReader::new(f)))
}

// ---------------------------------------------------------------------------
// Destination file
// ---------------------------------------------------------------------------

/// A write-capable destination produced by [`open_dst_file`].
///
/// Wraps either a regular [`File`], stdout, or a discard sink ([`io::sink`]).
/// Callers inspect `is_stdout` to suppress terminal-unfriendly progress
/// output (genocat always writes through here with `is_stdout = true`).
pub struct DstFile {
    inner: Box<dyn Write>,
    pub is_stdout: bool,
}

impl Write for DstFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.inner.write(buf)
    }
    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

/// Opens a destination for writing, returning a [`DstFile`].
///
/// Resolves special sentinels before touching the filesystem:
/// - `"stdout"` → stdout (`is_stdout = true`).
/// - [`NUL_MARK`] → [`io::sink`] (all bytes discarded, no file created) —
///   used for `--test` mode, which verifies the digest but keeps no output.
///
/// For regular paths, enforces the overwrite policy from `flags`: when
/// `flags.force == false` and the file already exists, behaviour depends on
/// [`display_level`]: at level ≤ 1 the call returns an
/// [`io::ErrorKind::AlreadyExists`] error without prompting; at higher levels
/// an interactive yes/no prompt is shown on stderr.
pub fn open_dst_file(path: &str, flags: &Flags) -> io::Result<DstFile> {
    if is_stdout(path) {
        if display_level() >= 4 {
            eprintln!("Using stdout for output");
        }
        #[cfg(windows)]
        // SAFETY: calling _setmode on stdout (fd=1) is always valid.
        unsafe {
            libc::_setmode(1, libc::O_BINARY);
        }
        return Ok(DstFile { inner: Box::new(io::stdout()), is_stdout: true });
    }

    if is_dev_null(path) {
        return Ok(DstFile { inner: Box::new(io::sink()), is_stdout: false });
    }

    if !flags.force && Path::new(path).exists() {
        if display_level() <= 1 {
            eprintln!("{} already exists; not overwritten  ", path);
            return Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("{}: already exists; not overwritten", path),
            ));
        }
        eprint!("{} already exists; do you want to overwrite (y/N) ? ", path);
        let _ = io::stderr().flush();
        let mut line = String::new();
        io::stdin().read_line(&mut line)?;
        let first = line.trim_start().chars().next().unwrap_or('\0');
        if first != 'y' && first != 'Y' {
            eprintln!("    not overwritten  ");
            return Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("{}: not overwritten", path),
            ));
        }
    }

    let f = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)
        .map_err(|e| {
            if display_level() >= 1 {
                eprintln!("{}: {}", path, e);
            }
            e
        })?;

    Ok(DstFile { inner: Box::new(f), is_stdout: false })
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::flags::Mode;

    #[test]
    fn open_src_file_nonexistent_returns_err() {
        let result = open_src_file("/nonexistent/path/that/cannot/exist.genozip");
        assert!(result.is_err());
    }

    #[test]
    fn open_dst_file_stdout_sentinel() {
        let flags = Flags::new(Mode::Zip);
        let dst = open_dst_file(STDOUT_MARK, &flags).unwrap();
        assert!(dst.is_stdout);
    }

    #[test]
    fn open_dst_file_devnull_sentinel() {
        let flags = Flags::new(Mode::Zip);
        let result = open_dst_file(NUL_MARK, &flags);
        assert!(result.is_ok());
        assert!(!result.unwrap().is_stdout);
    }

    #[test]
    fn open_dst_file_overwrite_false_nonexistent_ok() {
        let mut flags = Flags::new(Mode::Zip);
        flags.force = false;
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("output.genozip");
        let result = open_dst_file(path.to_str().unwrap(), &flags);
        assert!(result.is_ok());
    }

    #[test]
    fn open_dst_file_overwrite_false_existing_err() {
        crate::cli::constants::set_display_level(0);
        let mut flags = Flags::new(Mode::Zip);
        flags.force = false;
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("output.genozip");
        std::fs::write(&path, b"existing").unwrap();
        let result = open_dst_file(path.to_str().unwrap(), &flags);
        assert!(result.is_err());
        crate::cli::constants::set_display_level(2);
    }

    #[test]
    fn sentinel_constants() {
        assert_eq!(STDIN_MARK, "stdin");
        assert_eq!(STDOUT_MARK, "stdout");
        #[cfg(not(windows))]
        assert_eq!(NUL_MARK, "/dev/null");
        #[cfg(windows)]
        assert_eq!(NUL_MARK, "nul");
    }
}
