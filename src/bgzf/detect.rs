//! BGZF producing-library/level detection and block-boundary bookkeeping
//! across VBlock boundaries (§4.3).
//!
//! To reproduce an input BGZF file bit-exactly on decompression, genozip
//! doesn't re-compress at a fixed level: it detects which level (and,
//! approximately, which library) produced each block by re-compressing a
//! sample at every candidate level and matching compressed size, then
//! stores that level once per file (most BGZF producers use one level
//! throughout) rather than once per block.

use super::write_block;

/// Candidate compression levels tried during detection, covering the common
/// producers (samtools/htslib defaults to 6, bgzip defaults to 6, some
/// tools use 9 for archival).
const CANDIDATE_LEVELS: [u32; 4] = [6, 9, 1, 4];

/// Detects which of [`CANDIDATE_LEVELS`] reproduces `original_block`'s exact
/// compressed length when re-compressing `uncompressed`. Returns `None` if
/// no candidate matches (the file was produced by an unrecognized library;
/// callers fall back to storing raw block boundaries without level reuse).
pub fn detect_level(uncompressed: &[u8], original_compressed_len: usize) -> Option<u32> {
    CANDIDATE_LEVELS
        .iter()
        .copied()
        .find(|&level| {
            write_block(uncompressed, level)
                .map(|b| b.len() == original_compressed_len)
                .unwrap_or(false)
        })
}

/// Records where each BGZF block boundary fell relative to the VBlock's
/// logical (decompressed) byte stream, so a read that straddles two BGZF
/// blocks — which may also straddle a VBlock boundary — can be
/// reconstructed without re-running detection per read.
#[derive(Debug, Clone, Default)]
pub struct BoundaryMap {
    /// Cumulative decompressed offset at which each source block ended.
    pub offsets: Vec<u64>,
}

impl BoundaryMap {
    pub fn push_block(&mut self, decompressed_len: u64) {
        let prev = self.offsets.last().copied().unwrap_or(0);
        self.offsets.push(prev + decompressed_len);
    }

    /// Returns `true` if the half-open logical range `[start, end)` crosses
    /// at least one recorded block boundary.
    pub fn straddles(&self, start: u64, end: u64) -> bool {
        self.offsets.iter().any(|&b| b > start && b < end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detect_level_finds_known_level() {
        let data = b"ACGTACGTACGTACGTACGTACGTACGT".repeat(200);
        let block = write_block(&data, 9).unwrap();
        let detected = detect_level(&data, block.len());
        assert_eq!(detected, Some(9));
    }

    #[test]
    fn boundary_map_straddle_detection() {
        let mut map = BoundaryMap::default();
        map.push_block(100);
        map.push_block(100);
        map.push_block(100);
        assert!(map.straddles(50, 150));
        assert!(!map.straddles(0, 100));
        assert!(!map.straddles(100, 200));
    }
}
