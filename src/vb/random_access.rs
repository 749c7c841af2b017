//! Random-access index (§5(d)): maps `(chrom, pos_range)` to the VBlock(s)
//! that contain it, so `genocat --regions` can skip straight to the
//! relevant VBlocks instead of decompressing the whole file.
//!
//! Compute threads discover their VBlock's chrom/position range while
//! segmenting, out of vblock_i order, and each pushes one [`RaEntry`] here
//! as soon as it finishes — well before the dispatcher's in-order write
//! stage runs. A full `Mutex` is overkill for an append that's a handful of
//! instructions; a spinlock keeps contention cheap under the VBlock count
//! this index sees (one push per VBlock, never per line).

use std::cell::UnsafeCell;
use std::sync::atomic::{AtomicBool, Ordering};

/// One contiguous position range, within a single chromosome, covered by
/// one VBlock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RaEntry {
    pub vblock_i: u32,
    pub chrom: String,
    pub first_pos: u64,
    pub last_pos: u64,
}

/// A spinlock-guarded, append-mostly random-access index.
pub struct RandomAccessIndex {
    locked: AtomicBool,
    entries: UnsafeCell<Vec<RaEntry>>,
}

// SAFETY: all access to `entries` goes through `with_lock`, which holds the
// spinlock for the duration of the closure.
unsafe impl Sync for RandomAccessIndex {}

impl RandomAccessIndex {
    pub fn new() -> Self {
        RandomAccessIndex { locked: AtomicBool::new(false), entries: UnsafeCell::new(Vec::new()) }
    }

    fn acquire(&self) {
        while self
            .locked
            .compare_exchange_weak(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_err()
        {
            std::hint::spin_loop();
        }
    }

    fn release(&self) {
        self.locked.store(false, Ordering::Release);
    }

    fn with_lock<R>(&self, f: impl FnOnce(&mut Vec<RaEntry>) -> R) -> R {
        self.acquire();
        // SAFETY: the spinlock above excludes every other caller.
        let result = f(unsafe { &mut *self.entries.get() });
        self.release();
        result
    }

    pub fn push(&self, entry: RaEntry) {
        self.with_lock(|v| v.push(entry));
    }

    pub fn len(&self) -> usize {
        self.with_lock(|v| v.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns every entry overlapping `[first_pos, last_pos]` on `chrom`,
    /// sorted by `vblock_i` so callers can decompress in ascending order.
    pub fn lookup(&self, chrom: &str, first_pos: u64, last_pos: u64) -> Vec<RaEntry> {
        self.with_lock(|v| {
            let mut matches: Vec<RaEntry> = v
                .iter()
                .filter(|e| e.chrom == chrom && e.first_pos <= last_pos && e.last_pos >= first_pos)
                .cloned()
                .collect();
            matches.sort_by_key(|e| e.vblock_i);
            matches
        })
    }

    /// Snapshot of all entries sorted by `vblock_i`, as written to the
    /// `RandomAccess` section.
    pub fn snapshot_sorted(&self) -> Vec<RaEntry> {
        self.with_lock(|v| {
            let mut out = v.clone();
            out.sort_by_key(|e| e.vblock_i);
            out
        })
    }
}

impl Default for RandomAccessIndex {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn push_and_lookup() {
        let idx = RandomAccessIndex::new();
        idx.push(RaEntry { vblock_i: 0, chrom: "chr1".into(), first_pos: 1, last_pos: 100 });
        idx.push(RaEntry { vblock_i: 1, chrom: "chr1".into(), first_pos: 101, last_pos: 200 });
        idx.push(RaEntry { vblock_i: 2, chrom: "chr2".into(), first_pos: 1, last_pos: 50 });

        let hits = idx.lookup("chr1", 90, 110);
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].vblock_i, 0);
        assert_eq!(hits[1].vblock_i, 1);

        assert!(idx.lookup("chr3", 1, 10).is_empty());
    }

    #[test]
    fn concurrent_pushes_from_out_of_order_threads() {
        let idx = Arc::new(RandomAccessIndex::new());
        let mut handles = Vec::new();
        for i in 0..16u32 {
            let idx = Arc::clone(&idx);
            handles.push(thread::spawn(move || {
                idx.push(RaEntry {
                    vblock_i: i,
                    chrom: "chr1".into(),
                    first_pos: (i as u64) * 100,
                    last_pos: (i as u64) * 100 + 99,
                });
            }));
        }
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(idx.len(), 16);
        let snap = idx.snapshot_sorted();
        for (i, e) in snap.iter().enumerate() {
            assert_eq!(e.vblock_i, i as u32);
        }
    }
}
