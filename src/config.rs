//! Compile-time tunables: a flat set of documented constants plus one
//! environment-sensitive default.

use crate::util;

/// Default compute-thread count, one per logical core (§5).
pub fn nb_workers_default() -> usize {
    util::count_cores()
}

/// Maximum number of compute threads selectable via `--threads`.
pub const NB_WORKERS_MAX: usize = 200;

/// Default VBlock memory budget; overridable via `--vblock`.
pub const VBLOCK_MEMORY_DEFAULT: usize = 16 * 1024 * 1024;

/// Smallest VBlock size accepted from `--vblock`.
pub const VBLOCK_MEMORY_MIN: usize = 1024 * 1024;

/// Largest VBlock size accepted from `--vblock`.
pub const VBLOCK_MEMORY_MAX: usize = 2047 * 1024 * 1024;

/// Width of one sharded mutex region in the reference genome, in bases (§4.2).
pub const GENOME_MUTEX_RANGE_SIZE: u64 = 64 * 1024;

/// REF_EXT_STORE compaction break-even threshold, in cleared bits (§4.2).
pub const REF_EXT_STORE_BREAK_EVEN: usize = 470;

/// Sample size used for codec auto-selection trials (§4.1).
pub const CODEC_SAMPLE_SIZE: usize = 100 * 1024;

/// Maximum size of one BGZF block payload before compression (§4.3).
pub const BGZF_MAX_BLOCK_SIZE: usize = 64 * 1024;

/// Number of reserved low b250 codes before ordinary dictionary word indices
/// begin (§4.1): `ONE_UP`, `EMPTY_SF`, `MISSING_SF`.
pub const B250_NUM_RESERVED: u32 = 3;

/// Base used for the b250 variable-length word-index encoding (§4.1).
pub const B250_BASE: u32 = 250;

/// Trailing magic number written in the genozip footer (§4.4).
pub const FOOTER_MAGIC: u32 = 0x27052012;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nb_workers_at_least_one() {
        assert!(nb_workers_default() >= 1);
    }

    #[test]
    fn vblock_bounds_sane() {
        assert!(VBLOCK_MEMORY_MIN < VBLOCK_MEMORY_DEFAULT);
        assert!(VBLOCK_MEMORY_DEFAULT < VBLOCK_MEMORY_MAX);
    }
}
