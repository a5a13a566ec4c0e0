//! Fork-join parallel loop over a contiguous iteration range.
//!
//! [`spawn_loop`] cuts `[0, loopmax)` into at most `nthr` contiguous slices
//! of equal block size (the last one may be shorter) and runs the supplied
//! function once per slice, returning only after every slice has finished.
//! With the `parallel` feature the slices run on rayon's pool; otherwise they
//! run one after another on the calling thread.

#[cfg(feature = "parallel")]
use rayon::prelude::*;


/// A raw pointer wrapper that is `Send` + `Sync`.
///
/// # Safety
/// The caller must guarantee that the pointed-to data is valid for the
/// lifetime of any parallel operation and that no data races occur
/// (e.g., different threads write to disjoint regions).
pub struct SendPtr<T>(pub *mut T);

impl<T> Clone for SendPtr<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for SendPtr<T> {}

unsafe impl<T> Send for SendPtr<T> {}
unsafe impl<T> Sync for SendPtr<T> {}

impl<T> SendPtr<T> {
    #[inline]
    pub fn as_ptr(self) -> *mut T {
        self.0
    }
}

/// Half-open slice `[min, max)` of the iteration range handed to one worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpawnRange {
    /// Index of the slice, `0..nchunks`.
    pub thr: usize,
    pub min: usize,
    pub max: usize,
}

impl SpawnRange {
    #[inline]
    pub fn len(&self) -> usize {
        self.max - self.min
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.max == self.min
    }
}

/// Extra bound on the closure handed to [`spawn_loop`].
///
/// With `parallel` the slices may run on other threads, so the closure and
/// everything it captures must be `Send + Sync`. Without it the bound holds
/// for every type.
#[cfg(feature = "parallel")]
pub trait SweepShare: Send + Sync {}
#[cfg(feature = "parallel")]
impl<T: Send + Sync> SweepShare for T {}

#[cfg(not(feature = "parallel"))]
pub trait SweepShare {}
#[cfg(not(feature = "parallel"))]
impl<T> SweepShare for T {}

/// The slices [`spawn_loop`] hands out for `loopmax` iterations and `nthr` workers.
///
/// `block = ceil(loopmax / nthr)`; slice `i` is
/// `[i * block, min((i + 1) * block, loopmax))`; empty trailing slices are
/// not produced.
pub fn partition(loopmax: usize, nthr: usize) -> Vec<SpawnRange> {
    if loopmax == 0 {
        return Vec::new();
    }
    let nthr = nthr.clamp(1, loopmax);
    let block = loopmax.div_ceil(nthr);
    let nchunks = loopmax.div_ceil(block);
    let ranges: Vec<SpawnRange> = (0..nchunks)
        .map(|thr| SpawnRange {
            thr,
            min: thr * block,
            max: ((thr + 1) * block).min(loopmax),
        })
        .collect();
    debug_assert_eq!(ranges.iter().map(SpawnRange::len).sum::<usize>(), loopmax);
    ranges
}

/// Run `f` once per slice of `[0, loopmax)` and wait for all of them.
pub fn spawn_loop<F>(loopmax: usize, nthr: usize, f: F)
where
    F: Fn(SpawnRange) + SweepShare,
{
    let ranges = partition(loopmax, nthr);
    tracing::trace!(loopmax, nthr, nchunks = ranges.len(), "spawn_loop");

    if ranges.len() <= 1 {
        ranges.into_iter().for_each(f);
        return;
    }

    #[cfg(feature = "parallel")]
    ranges.into_par_iter().with_max_len(1).for_each(f);

    #[cfg(not(feature = "parallel"))]
    ranges.into_iter().for_each(f);
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[test]
    fn test_partition_matches_block_rule() {
        let r = partition(7, 4);
        let bounds: Vec<(usize, usize)> = r.iter().map(|s| (s.min, s.max)).collect();
        assert_eq!(bounds, vec![(0, 2), (2, 4), (4, 6), (6, 7)]);

        let r = partition(32, 4);
        let bounds: Vec<(usize, usize)> = r.iter().map(|s| (s.min, s.max)).collect();
        assert_eq!(bounds, vec![(0, 8), (8, 16), (16, 24), (24, 32)]);
    }

    #[test]
    fn test_partition_drops_empty_slices() {
        // block = 3 -> only 3 non-empty chunks for 4 workers
        let r = partition(9, 4);
        assert_eq!(r.len(), 3);
        assert_eq!(r.last().unwrap().max, 9);
        assert!(partition(0, 4).is_empty());
        assert_eq!(partition(3, 8).len(), 3);
    }

    #[test]
    fn test_spawn_loop_visits_every_index_once() {
        let hits: Vec<AtomicUsize> = (0..100).map(|_| AtomicUsize::new(0)).collect();
        spawn_loop(100, 8, |r| {
            for i in r.min..r.max {
                hits[i].fetch_add(1, Ordering::Relaxed);
            }
        });
        assert!(hits.iter().all(|h| h.load(Ordering::SeqCst) == 1));
    }

    #[test]
    fn test_spawn_loop_single_worker_runs_inline() {
        let seen = Mutex::new(Vec::new());
        spawn_loop(5, 1, |r| seen.lock().unwrap().push((r.thr, r.min, r.max)));
        assert_eq!(*seen.lock().unwrap(), vec![(0, 0, 5)]);
    }

    #[test]
    fn test_spawn_loop_disjoint_writes_through_send_ptr() {
        let mut data = vec![0usize; 64];
        let ptr = SendPtr(data.as_mut_ptr());
        spawn_loop(64, 4, move |r| {
            for i in r.min..r.max {
                unsafe { *ptr.as_ptr().add(i) = r.thr + 1 };
            }
        });
        assert_eq!(data[0], 1);
        assert_eq!(data[63], 4);
        assert!(data.iter().all(|&v| v != 0));
    }

    #[test]
    fn test_sweep_state_is_shareable() {
        fn accepts<F: Fn(SpawnRange) + SweepShare>(_: &F) {}
        let mut data = vec![0.0f64; 4];
        let ptr = SendPtr(data.as_mut_ptr());
        let tw = crate::twiddle::TwiddleDesc::new(2).compute(8, 1);
        accepts(&move |r: SpawnRange| {
            let _ = (ptr.as_ptr(), tw.as_slice(), r.len());
        });
    }

    #[cfg(not(feature = "parallel"))]
    #[test]
    fn test_serial_sweep_accepts_thread_local_state() {
        use std::cell::Cell;
        use std::rc::Rc;
        let hits = Rc::new(Cell::new(0));
        let counter = Rc::clone(&hits);
        spawn_loop(10, 4, move |r| counter.set(counter.get() + r.len()));
        assert_eq!(hits.get(), 10);
    }

    proptest! {
        #[test]
        fn prop_partition_tiles_range(loopmax in 0usize..500, nthr in 1usize..17) {
            let ranges = partition(loopmax, nthr);
            prop_assert!(ranges.len() <= nthr);
            let mut next = 0;
            for (i, r) in ranges.iter().enumerate() {
                prop_assert_eq!(r.thr, i);
                prop_assert_eq!(r.min, next);
                prop_assert!(r.max > r.min);
                next = r.max;
            }
            prop_assert_eq!(next, loopmax);
        }
    }
}
