//! Sharded mutex locking over the reference genome (§4.2, §5).
//!
//! Ported from `reference.c`'s `ref_lock`/`ref_unlock`: the genome is divided
//! into [`crate::config::GENOME_MUTEX_RANGE_SIZE`]-base shards, each guarded
//! by its own `Mutex<()>`. A span that touches multiple shards acquires them
//! in ascending shard-index order (a fixed global order avoids deadlock
//! between VBlocks locking overlapping-but-not-identical spans) and releases
//! them in descending order.

use std::sync::{Mutex, MutexGuard};

use crate::config::GENOME_MUTEX_RANGE_SIZE;

/// One contig's set of shard mutexes, sized to cover `contig_len` bases.
pub struct RangeLocks {
    shards: Vec<Mutex<()>>,
}

impl RangeLocks {
    pub fn new(contig_len: u64) -> Self {
        let n_shards = (contig_len.max(1)).div_ceil(GENOME_MUTEX_RANGE_SIZE) as usize;
        let shards = (0..n_shards.max(1)).map(|_| Mutex::new(())).collect();
        RangeLocks { shards }
    }

    fn shard_range(&self, start: u64, end: u64) -> (usize, usize) {
        let first = (start / GENOME_MUTEX_RANGE_SIZE) as usize;
        let last = ((end.saturating_sub(1)) / GENOME_MUTEX_RANGE_SIZE) as usize;
        (first.min(self.shards.len() - 1), last.min(self.shards.len() - 1))
    }

    /// Locks every shard intersecting `[start, end)`, ascending, returning a
    /// RAII guard that releases them descending.
    pub fn lock_span(&self, start: u64, end: u64) -> RefLock<'_> {
        let (first, last) = self.shard_range(start, end);
        let mut guards = Vec::with_capacity(last - first + 1);
        for idx in first..=last {
            guards.push(self.shards[idx].lock().unwrap());
        }
        RefLock { guards }
    }

    /// Convenience for the INTERNAL/de-novo path, which only ever needs one
    /// shard at a time while extending the reference (`ref_seg_get_locked_range_denovo`).
    pub fn lock_one(&self, pos: u64) -> RefLock<'_> {
        self.lock_span(pos, pos + 1)
    }

    pub fn n_shards(&self) -> usize {
        self.shards.len()
    }
}

/// RAII guard holding one or more shard mutexes, acquired ascending.
pub struct RefLock<'a> {
    guards: Vec<MutexGuard<'a, ()>>,
}

impl<'a> Drop for RefLock<'a> {
    fn drop(&mut self) {
        // Release descending: pop from the back (highest shard index first).
        while self.guards.pop().is_some() {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn lock_span_covers_all_intersected_shards() {
        let locks = RangeLocks::new(GENOME_MUTEX_RANGE_SIZE * 3);
        let guard = locks.lock_span(GENOME_MUTEX_RANGE_SIZE - 10, GENOME_MUTEX_RANGE_SIZE + 10);
        assert_eq!(guard.guards.len(), 2);
    }

    #[test]
    fn lock_one_covers_single_shard() {
        let locks = RangeLocks::new(GENOME_MUTEX_RANGE_SIZE * 3);
        let guard = locks.lock_one(5);
        assert_eq!(guard.guards.len(), 1);
    }

    #[test]
    fn concurrent_disjoint_locks_do_not_block() {
        let locks = Arc::new(RangeLocks::new(GENOME_MUTEX_RANGE_SIZE * 4));
        let l1 = locks.clone();
        let l2 = locks.clone();
        let t1 = thread::spawn(move || {
            let _g = l1.lock_one(0);
            thread::sleep(std::time::Duration::from_millis(20));
        });
        let t2 = thread::spawn(move || {
            let _g = l2.lock_one(GENOME_MUTEX_RANGE_SIZE * 3);
        });
        t1.join().unwrap();
        t2.join().unwrap();
    }
}
