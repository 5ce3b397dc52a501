//! Task dispatch collaborator.
//!
//! The synthesizer only needs a worker count, a way to submit work and a
//! blocking wait. [`SyncDispatcher`] runs everything inline and is always
//! available; [`RayonDispatcher`] (feature `parallel`) runs a batch on the
//! rayon pool.

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// A unit of work. Borrowed data must outlive the batch it is submitted to.
pub type Job<'a> = Box<dyn FnOnce() + Send + 'a>;

pub trait TaskDispatcher: Send + Sync {
    /// Workers available for one batch.
    fn thread_count(&self) -> usize;

    /// False when the backing pool cannot take work; callers then fall back
    /// to [`SyncDispatcher`].
    fn is_available(&self) -> bool {
        true
    }

    /// Runs every job and returns once all of them have finished.
    fn run_all<'a>(&self, jobs: Vec<Job<'a>>);
}

/// Jobs collected for one dispatcher round trip.
pub struct Batch<'d, 'a> {
    dispatcher: &'d dyn TaskDispatcher,
    jobs: Vec<Job<'a>>,
}

impl<'d, 'a> Batch<'d, 'a> {
    pub fn new(dispatcher: &'d dyn TaskDispatcher) -> Self {
        Self { dispatcher, jobs: Vec::new() }
    }

    pub fn submit(&mut self, job: impl FnOnce() + Send + 'a) {
        self.jobs.push(Box::new(job));
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// Blocks until every submitted job has run.
    pub fn await_all(self) {
        if !self.jobs.is_empty() {
            self.dispatcher.run_all(self.jobs);
        }
    }
}

/// Runs jobs on the calling thread, in submission order.
#[derive(Clone, Copy, Debug, Default)]
pub struct SyncDispatcher;

impl TaskDispatcher for SyncDispatcher {
    fn thread_count(&self) -> usize {
        1
    }

    fn run_all<'a>(&self, jobs: Vec<Job<'a>>) {
        for job in jobs {
            job();
        }
    }
}

/// Runs a batch on the global rayon pool.
#[cfg(feature = "parallel")]
#[derive(Clone, Copy, Debug, Default)]
pub struct RayonDispatcher {
    max_threads: Option<usize>,
}

#[cfg(feature = "parallel")]
impl RayonDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Caps the number of bands a frame is split into.
    pub fn with_max_threads(max_threads: usize) -> Self {
        Self { max_threads: Some(max_threads.max(1)) }
    }
}

#[cfg(feature = "parallel")]
impl TaskDispatcher for RayonDispatcher {
    fn thread_count(&self) -> usize {
        let pool = rayon::current_num_threads().max(1);
        self.max_threads.map_or(pool, |m| m.min(pool))
    }

    fn run_all<'a>(&self, jobs: Vec<Job<'a>>) {
        jobs.into_par_iter().for_each(|job| job());
    }
}

/// `dispatcher`, or the inline dispatcher when it is unavailable.
pub fn usable(dispatcher: &dyn TaskDispatcher) -> &dyn TaskDispatcher {
    if dispatcher.is_available() {
        dispatcher
    } else {
        tracing::warn!("task dispatcher unavailable, running single-threaded");
        &SyncDispatcher
    }
}

/// Dispatcher used when none is injected.
pub fn default_dispatcher() -> std::sync::Arc<dyn TaskDispatcher> {
    #[cfg(feature = "parallel")]
    {
        std::sync::Arc::new(RayonDispatcher::new())
    }
    #[cfg(not(feature = "parallel"))]
    {
        std::sync::Arc::new(SyncDispatcher)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct Offline;

    impl TaskDispatcher for Offline {
        fn thread_count(&self) -> usize {
            8
        }

        fn is_available(&self) -> bool {
            false
        }

        fn run_all<'a>(&self, _jobs: Vec<Job<'a>>) {
            panic!("offline dispatcher used");
        }
    }

    #[test]
    fn sync_dispatcher_runs_in_order() {
        let order = Mutex::new(Vec::new());
        let mut batch = Batch::new(&SyncDispatcher);
        for k in 0..5 {
            let order = &order;
            batch.submit(move || order.lock().unwrap().push(k));
        }
        assert_eq!(batch.len(), 5);
        batch.await_all();
        assert_eq!(*order.lock().unwrap(), vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn unavailable_dispatcher_falls_back_to_sync() {
        let d = usable(&Offline);
        assert_eq!(d.thread_count(), 1);
        let count = AtomicUsize::new(0);
        let mut batch = Batch::new(d);
        batch.submit(|| {
            count.fetch_add(1, Ordering::Relaxed);
        });
        batch.await_all();
        assert_eq!(count.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn empty_batch_is_a_no_op() {
        Batch::new(&Offline).await_all();
    }

    #[cfg(feature = "parallel")]
    #[test]
    fn rayon_dispatcher_runs_every_job() {
        let d = RayonDispatcher::with_max_threads(3);
        assert!(d.thread_count() >= 1 && d.thread_count() <= 3);
        let count = AtomicUsize::new(0);
        let mut batch = Batch::new(&d);
        for _ in 0..64 {
            batch.submit(|| {
                count.fetch_add(1, Ordering::Relaxed);
            });
        }
        batch.await_all();
        assert_eq!(count.load(Ordering::Relaxed), 64);
    }
}
