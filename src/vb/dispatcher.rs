//! VBlock dispatcher (§3, §7): reads VBlocks from the segmenter, computes
//! each one (segment + codec-assign) on the thread pool out of order, then
//! writes their sections to the z_file strictly in ascending `vblock_i`
//! order, using `threadpool.rs`'s bounded-submit `TPool` for the compute
//! side and a pending-buffer to reorder writes back to sequential.
//!
//! A compute-thread error is fatal (§7): the dispatcher drains every
//! in-flight job (so the pool isn't left with dangling slots) before
//! returning the first error it saw.

use std::collections::BTreeMap;
use std::sync::Arc;

use crossbeam_channel::unbounded;

use crate::error::Result;
use crate::threadpool::TPool;
use crate::vb::random_access::RaEntry;
use crate::vb::section::SectionHeader;
use crate::vb::VBlock;

/// Everything one VBlock contributes to the z_file once segmentation and
/// codec assignment finish: its section headers+payloads (dictionary
/// deltas, b250 streams, local buffers) in on-disk order, plus the random
/// access entries it discovered.
pub struct CompressedVBlock {
    pub vblock_i: u32,
    pub sections: Vec<(SectionHeader, Vec<u8>)>,
    pub ra_entries: Vec<RaEntry>,
}

pub struct Dispatcher {
    pool: TPool,
}

impl Dispatcher {
    pub fn new(nb_threads: usize, queue_size: usize) -> Option<Self> {
        Some(Dispatcher { pool: TPool::new(nb_threads, queue_size)? })
    }

    /// Runs `compute` over every VBlock from `vblocks`, then calls `write`
    /// once per VBlock in ascending `vblock_i` order. `compute` runs on the
    /// pool and may run out of order across VBlocks; `write` always runs on
    /// the calling thread — the one place where per-dict-mutex-style
    /// sequential merge work (§4.5) belongs, since ascending-order delivery
    /// here already gives it exclusive, ordered access.
    pub fn run<I, T, C, W>(&self, vblocks: I, compute: C, mut write: W) -> Result<()>
    where
        I: Iterator<Item = VBlock>,
        T: Send + 'static,
        C: Fn(VBlock) -> Result<T> + Send + Sync + 'static,
        W: FnMut(T) -> Result<()>,
    {
        let compute = Arc::new(compute);
        let (tx, rx) = unbounded::<(u32, Result<T>)>();

        let mut submitted = 0u32;
        for vb in vblocks {
            let vblock_i = vb.vblock_i;
            let compute = Arc::clone(&compute);
            let tx = tx.clone();
            self.pool.submit_job(Box::new(move || {
                let result = compute(vb);
                let _ = tx.send((vblock_i, result));
            }));
            submitted += 1;
        }
        drop(tx);

        let mut pending: BTreeMap<u32, T> = BTreeMap::new();
        let mut next_to_write = 0u32;
        let mut received = 0u32;
        let mut first_err = None;

        while received < submitted {
            let Ok((vblock_i, result)) = rx.recv() else { break };
            received += 1;
            match result {
                Ok(cvb) => {
                    pending.insert(vblock_i, cvb);
                    while let Some(cvb) = pending.remove(&next_to_write) {
                        if first_err.is_none() {
                            if let Err(e) = write(cvb) {
                                first_err = Some(e);
                            }
                        }
                        next_to_write += 1;
                    }
                }
                Err(e) => {
                    if first_err.is_none() {
                        first_err = Some(e);
                    }
                }
            }
        }

        match first_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GenozipError;
    use std::sync::Mutex;

    fn make_vblocks(n: u32) -> Vec<VBlock> {
        (0..n).map(|i| VBlock::new(i, i as u64 * 10)).collect()
    }

    #[test]
    fn writes_in_ascending_order_despite_out_of_order_compute() {
        let dispatcher = Dispatcher::new(4, 8).unwrap();
        let vblocks = make_vblocks(20);
        let written = Arc::new(Mutex::new(Vec::new()));
        let written_clone = Arc::clone(&written);

        dispatcher
            .run(
                vblocks.into_iter(),
                |vb| {
                    // Reverse-order sleeps so early vblocks tend to finish last.
                    std::thread::sleep(std::time::Duration::from_micros((20 - vb.vblock_i) as u64));
                    Ok(CompressedVBlock { vblock_i: vb.vblock_i, sections: Vec::new(), ra_entries: Vec::new() })
                },
                move |cvb| {
                    written_clone.lock().unwrap().push(cvb.vblock_i);
                    Ok(())
                },
            )
            .unwrap();

        let order = written.lock().unwrap().clone();
        let expected: Vec<u32> = (0..20).collect();
        assert_eq!(order, expected);
    }

    #[test]
    fn compute_error_propagates() {
        let dispatcher = Dispatcher::new(2, 4).unwrap();
        let vblocks = make_vblocks(5);
        let result = dispatcher.run(
            vblocks.into_iter(),
            |vb| {
                if vb.vblock_i == 3 {
                    Err(GenozipError::Other("boom".into()))
                } else {
                    Ok(CompressedVBlock { vblock_i: vb.vblock_i, sections: Vec::new(), ra_entries: Vec::new() })
                }
            },
            |_| Ok(()),
        );
        assert!(result.is_err());
    }
}
