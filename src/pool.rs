//! Worker-pool abstraction the core consumes but does not implement.
//!
//! Spec §6 specifies `Threadpool` only at its interface — submit `tnum`
//! jobs, then block on a `wait_all` barrier — and leaves the implementation
//! to the caller. A detached `submit(Box<dyn FnOnce() + Send + 'static>)`
//! would force every fan-out site in [`crate::cmsm`]/[`crate::rmatrix`] to
//! either `Arc`-clone its inputs or reach for `unsafe` lifetime extension to
//! borrow the caller's stack data (the matrix being multiplied, the output
//! strips being written), neither of which this crate is willing to pay for
//! (`#![forbid(unsafe_code)]`; spec §5 "the iteration loop allocates
//! nothing"). [`Threadpool::scope`] instead hands the caller a
//! [`PoolScope`] that non-`'static` jobs can be submitted to and blocks
//! until all of them finish before returning — submit-then-barrier, just
//! expressed as one call instead of two, exactly like `std::thread::scope`
//! and `rayon::scope` (which [`RayonThreadpool`] wraps) already work.
//!
//! This crate ships one concrete implementation, [`RayonThreadpool`],
//! behind the `rayon-pool` feature (grounded on rayon's `scope` API,
//! already reachable transitively through the teacher crate's dependency
//! graph), plus a dependency-free [`SerialThreadpool`] that runs jobs
//! inline — useful for tests and for library consumers who want
//! deterministic single-thread execution without pulling in rayon.

/// A scope handed to [`Threadpool::scope`]'s body. Jobs submitted here may
/// borrow anything that outlives the `scope` call (typically the caller's
/// own stack frame) and are guaranteed to have finished by the time `scope`
/// returns.
pub trait PoolScope<'env> {
    /// Enqueue `job` for execution within this scope.
    fn submit(&self, job: Box<dyn FnOnce() + Send + 'env>);
}

/// A job-submit + barrier interface (spec §6), rendered as a single scoped
/// call. `body` receives a [`PoolScope`]; every job submitted to it runs to
/// completion before `scope` returns. The core's parallel routines submit
/// exactly `tnum` jobs per fan-out inside one `scope` call; they never poll
/// individual jobs or call `scope` reentrantly.
pub trait Threadpool {
    /// Run `body`, handing it a [`PoolScope`] to submit jobs to; blocks
    /// until every job submitted during `body` has completed.
    fn scope<'env>(&self, body: &mut dyn FnMut(&dyn PoolScope<'env>));
}

/// Runs every submitted job immediately, on the calling thread, inside
/// `submit` itself — `scope` is therefore just "call `body` once".
/// Deterministic and allocation-light; the natural choice for
/// single-threaded tests of the sparse-product and Gramian fan-outs
/// (`cmsm_mul`/`cmsm_trmul`), where the point of the test is the
/// arithmetic, not the scheduling.
#[derive(Debug, Default)]
pub struct SerialThreadpool;

impl SerialThreadpool {
    /// Construct a new serial pool.
    pub fn new() -> Self {
        Self
    }
}

struct InlineScope;

impl<'env> PoolScope<'env> for InlineScope {
    #[inline]
    fn submit(&self, job: Box<dyn FnOnce() + Send + 'env>) {
        job();
    }
}

impl Threadpool for SerialThreadpool {
    fn scope<'env>(&self, body: &mut dyn FnMut(&dyn PoolScope<'env>)) {
        body(&InlineScope);
    }
}

#[cfg(feature = "rayon-pool")]
mod rayon_pool {
    use super::{PoolScope, Threadpool};
    use std::sync::Mutex;

    /// A [`Threadpool`] backed by rayon's global thread pool.
    ///
    /// `scope`'s `body` submits jobs into a private buffer; once `body`
    /// returns, every buffered job is spawned into one `rayon::scope`,
    /// matching the spec's "submit `tnum` jobs, then block on all of them"
    /// contract exactly — rayon's `scope` is itself a fan-out-then-barrier
    /// primitive, so no extra synchronization is layered on top of it.
    pub struct RayonThreadpool;

    impl RayonThreadpool {
        /// Construct a pool using rayon's global (process-wide) pool.
        pub fn new() -> Self {
            Self
        }
    }

    impl Default for RayonThreadpool {
        fn default() -> Self {
            Self::new()
        }
    }

    struct CollectingScope<'env> {
        jobs: Mutex<Vec<Box<dyn FnOnce() + Send + 'env>>>,
    }

    impl<'env> PoolScope<'env> for CollectingScope<'env> {
        fn submit(&self, job: Box<dyn FnOnce() + Send + 'env>) {
            self.jobs.lock().expect("pool mutex poisoned").push(job);
        }
    }

    impl Threadpool for RayonThreadpool {
        fn scope<'env>(&self, body: &mut dyn FnMut(&dyn PoolScope<'env>)) {
            let collecting = CollectingScope {
                jobs: Mutex::new(Vec::new()),
            };
            body(&collecting);
            let jobs = collecting.jobs.into_inner().expect("pool mutex poisoned");
            rayon::scope(|s| {
                for job in jobs {
                    s.spawn(move |_| job());
                }
            });
        }
    }
}

#[cfg(feature = "rayon-pool")]
pub use rayon_pool::RayonThreadpool;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    #[cfg(feature = "rayon-pool")]
    use std::sync::Mutex;

    #[test]
    fn serial_pool_runs_jobs_synchronously() {
        let pool = SerialThreadpool::new();
        let counter = Arc::new(AtomicUsize::new(0));
        pool.scope(&mut |scope| {
            for _ in 0..8 {
                let counter = counter.clone();
                scope.submit(Box::new(move || {
                    counter.fetch_add(1, Ordering::SeqCst);
                }));
            }
        });
        assert_eq!(counter.load(Ordering::SeqCst), 8);
    }

    #[test]
    fn serial_pool_scope_can_borrow_local_data() {
        // `data` and `out` live only on this stack frame; jobs borrow them
        // directly, with no `'static` bound and no `Arc`.
        let data = [1usize, 2, 3, 4];
        let mut out = [0usize; 4];
        {
            let (a, b) = out.split_at_mut(2);
            let pool = SerialThreadpool::new();
            pool.scope(&mut |scope| {
                scope.submit(Box::new(|| {
                    a[0] = data[0] * 10;
                    a[1] = data[1] * 10;
                }));
                scope.submit(Box::new(|| {
                    b[0] = data[2] * 10;
                    b[1] = data[3] * 10;
                }));
            });
        }
        assert_eq!(out, [10, 20, 30, 40]);
    }

    #[cfg(feature = "rayon-pool")]
    #[test]
    fn rayon_pool_runs_all_submitted_jobs() {
        let pool = RayonThreadpool::new();
        let counter = Arc::new(AtomicUsize::new(0));
        pool.scope(&mut |scope| {
            for _ in 0..32 {
                let counter = counter.clone();
                scope.submit(Box::new(move || {
                    counter.fetch_add(1, Ordering::SeqCst);
                }));
            }
        });
        assert_eq!(counter.load(Ordering::SeqCst), 32);
    }

    #[cfg(feature = "rayon-pool")]
    #[test]
    fn rayon_pool_scope_can_borrow_local_data() {
        let pool = RayonThreadpool::new();
        let data = vec![1usize, 2, 3, 4, 5];
        let sums: Vec<Mutex<usize>> = (0..data.len()).map(|_| Mutex::new(0)).collect();
        pool.scope(&mut |scope| {
            for (i, sum) in sums.iter().enumerate() {
                let slice = &data[..=i];
                scope.submit(Box::new(move || {
                    *sum.lock().expect("poisoned") = slice.iter().sum();
                }));
            }
        });
        for (i, sum) in sums.iter().enumerate() {
            let want: usize = data[..=i].iter().sum();
            assert_eq!(*sum.lock().expect("poisoned"), want);
        }
    }
}
