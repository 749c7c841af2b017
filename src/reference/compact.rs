//! REF_EXT_STORE compaction (§4.2): once a file finishes, bases that were
//! read from the external reference unmodified don't need to be stored
//! verbatim — but clearing a bit costs a section-list entry's worth of
//! overhead, so it's only worth doing when `REF_EXT_STORE_BREAK_EVEN` or
//! more consecutive positions qualify (`ref_remove_flanking_regions` +
//! the break-even test in `reference.c`).

use crate::bitarray::BitArray;
use crate::config::REF_EXT_STORE_BREAK_EVEN;

/// Trims the leading/trailing positions of `[start, end)` that are NOT set
/// in `is_set` — mirrors `ref_remove_flanking_regions`, which narrows a
/// candidate compaction span to its confirmed-base core before running the
/// break-even test, since flanking gaps shouldn't count toward either side.
pub fn trim_flanking(is_set: &BitArray, start: usize, end: usize) -> (usize, usize) {
    let mut s = start;
    let mut e = end;
    while s < e && !is_set.get(s) {
        s += 1;
    }
    while e > s && !is_set.get(e - 1) {
        e -= 1;
    }
    (s, e)
}

/// Given `verbatim`, the set of positions storing a base identical to the
/// external reference (i.e. candidates for clearing), compacts runs of at
/// least [`REF_EXT_STORE_BREAK_EVEN`] consecutive such positions by clearing
/// them in `is_set` (so they'll be re-fetched from the external reference on
/// decompression instead of carried in this file). Returns the number of
/// positions cleared.
pub fn compact_ext_store(is_set: &mut BitArray, verbatim: &BitArray) -> usize {
    assert_eq!(is_set.len(), verbatim.len());
    let mut cleared = 0usize;
    let mut run_start: Option<usize> = None;
    let len = is_set.len();
    for i in 0..=len {
        let in_run = i < len && verbatim.get(i);
        match (in_run, run_start) {
            (true, None) => run_start = Some(i),
            (false, Some(s)) => {
                if i - s >= REF_EXT_STORE_BREAK_EVEN {
                    is_set.clear_range(s, i);
                    cleared += i - s;
                }
                run_start = None;
            }
            _ => {}
        }
    }
    cleared
}

/// Runs the full REF_EXT_STORE compaction pass for one contig: narrows to
/// the confirmed-base core via [`trim_flanking`], then clears long verbatim
/// runs within that core via [`compact_ext_store`], splicing the result back
/// into a full-length copy of `is_set`. Returns the compacted `is_set` plus
/// the number of positions cleared.
pub fn compact_contig(is_set: &BitArray, verbatim: &BitArray) -> (BitArray, usize) {
    assert_eq!(is_set.len(), verbatim.len());
    let (core_start, core_end) = trim_flanking(is_set, 0, is_set.len());
    if core_start >= core_end {
        return (is_set.clone(), 0);
    }

    let core_len = core_end - core_start;
    let mut core_is_set = BitArray::new(core_len);
    let mut core_verbatim = BitArray::new(core_len);
    for i in 0..core_len {
        core_is_set.set_to(i, is_set.get(core_start + i));
        core_verbatim.set_to(i, verbatim.get(core_start + i));
    }

    let cleared = compact_ext_store(&mut core_is_set, &core_verbatim);

    let mut out = is_set.clone();
    for i in 0..core_len {
        out.set_to(core_start + i, core_is_set.get(i));
    }
    (out, cleared)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compact_contig_trims_and_clears_verbatim_runs() {
        let mut is_set = BitArray::new(1000);
        let mut verbatim = BitArray::new(1000);
        // Confirmed-base core is [100, 900); outside stays unset (flanking).
        for i in 100..900 {
            is_set.set(i);
        }
        for i in 200..(200 + REF_EXT_STORE_BREAK_EVEN) {
            verbatim.set(i);
        }
        let (compacted, cleared) = compact_contig(&is_set, &verbatim);
        assert_eq!(cleared, REF_EXT_STORE_BREAK_EVEN);
        assert!(!compacted.get(200));
        assert!(compacted.get(100));
        assert!(!compacted.get(50)); // flanking region untouched, still unset
    }

    #[test]
    fn compact_contig_handles_all_unset() {
        let is_set = BitArray::new(100);
        let verbatim = BitArray::new(100);
        let (compacted, cleared) = compact_contig(&is_set, &verbatim);
        assert_eq!(cleared, 0);
        assert_eq!(compacted.len(), 100);
    }

    #[test]
    fn trim_flanking_strips_unset_edges() {
        let mut is_set = BitArray::new(20);
        for i in 5..15 {
            is_set.set(i);
        }
        let (s, e) = trim_flanking(&is_set, 0, 20);
        assert_eq!((s, e), (5, 15));
    }

    #[test]
    fn compact_skips_runs_below_break_even() {
        let mut is_set = BitArray::new(1000);
        let mut verbatim = BitArray::new(1000);
        for i in 0..1000 {
            is_set.set(i);
        }
        // Short run: below break-even, should NOT be cleared.
        for i in 10..20 {
            verbatim.set(i);
        }
        let cleared = compact_ext_store(&mut is_set, &verbatim);
        assert_eq!(cleared, 0);
        assert!(is_set.get(15));
    }

    #[test]
    fn compact_clears_runs_at_or_above_break_even() {
        let mut is_set = BitArray::new(1000);
        let mut verbatim = BitArray::new(1000);
        for i in 0..1000 {
            is_set.set(i);
        }
        for i in 100..(100 + REF_EXT_STORE_BREAK_EVEN) {
            verbatim.set(i);
        }
        let cleared = compact_ext_store(&mut is_set, &verbatim);
        assert_eq!(cleared, REF_EXT_STORE_BREAK_EVEN);
        assert!(!is_set.get(100));
        assert!(!is_set.get(100 + REF_EXT_STORE_BREAK_EVEN - 1));
        assert!(is_set.get(99));
    }
}
