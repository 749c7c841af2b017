//! Source/destination file handling for the `genozip`/`genounzip`/`genocat`
//! CLI — sentinel paths (stdin/stdout/discard), overwrite prompting, and
//! directory rejection.

pub mod file_io;

pub use file_io::{open_dst_file, open_src_file, DstFile, NUL_MARK, STDIN_MARK, STDOUT_MARK};
