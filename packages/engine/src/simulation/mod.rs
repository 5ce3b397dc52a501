//! GrainSynthesizer - two-pass grain rendering of one plane
//!
//! Pass 1 fills the density field band by band, then the bands are
//! rebalanced on the measured row cost and pass 2 renders every output
//! pixel through the reconstruction kernel, each worker with its own cell
//! cache.
//!
//! The synthesizer never spawns threads. Work comes out as `Send` task
//! values (`pass1_tasks`, `pass2_tasks`) the caller may run anywhere; the
//! dispatcher module provides a synchronous and a rayon-backed runner.
//!
//! begin -> pass 1 (N tasks) -> prepare_rebalance -> pass 2 (N tasks) -> finish

use std::ops::Range;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::core::{PlaneMut, PlaneRef, SimdLevel};
use crate::systems::density::DensityField;
use crate::systems::kernel::ReconstructionKernel;
use crate::spatial::CellWindowCache;

#[path = "perf/perf_timer.rs"]
mod perf_timer;
#[path = "perf/perf_stats.rs"]
mod perf_stats;
#[path = "step/rebalance.rs"]
mod rebalance;
#[path = "step/pass1.rs"]
mod pass1;
#[path = "step/pass2.rs"]
mod pass2;
#[path = "step/render.rs"]
mod render;
#[path = "dispatch/dispatch.rs"]
pub mod dispatch;
#[path = "processor/processor.rs"]
mod processor;
mod facade;

pub use dispatch::{Batch, Job, SyncDispatcher, TaskDispatcher};
#[cfg(feature = "parallel")]
pub use dispatch::RayonDispatcher;
pub use facade::GrainFilter;
pub use pass1::Pass1Task;
pub use pass2::{CellBuilder, Pass2Task};
pub use perf_stats::FrameStats;
pub use processor::GrainProcessor;
pub use rebalance::rebalance_rows;
pub use render::synthesize;

use perf_timer::PassTimer;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Phase {
    Idle,
    Pass1,
    Pass2,
}

/// Per-worker state: its rows, its own cell cache and which passes its
/// band has been through this frame.
struct ThreadContext {
    rows: Range<usize>,
    cache: CellWindowCache,
    pass1_done: AtomicBool,
    pass2_done: AtomicBool,
}

impl ThreadContext {
    fn new() -> Self {
        Self {
            rows: 0..0,
            cache: CellWindowCache::new(),
            pass1_done: AtomicBool::new(false),
            pass2_done: AtomicBool::new(false),
        }
    }
}

/// Marks band `idx` of a pass as processed. A band runs once per pass.
fn claim_band(done: &AtomicBool, pass: u8, idx: usize) {
    let again = done.swap(true, Ordering::AcqRel);
    assert!(!again, "pass {} band {} already processed", pass, idx);
}

/// Reusable per-plane renderer.
///
/// Storage (density field, caches) is kept between frames; a pool of
/// synthesizers amortizes allocation across concurrent planes.
pub struct GrainSynthesizer {
    level: SimdLevel,
    density: DensityField,
    kernel: Option<Arc<ReconstructionKernel>>,
    contexts: Vec<ThreadContext>,
    pic_w: usize,
    pic_h: usize,
    out_scale: f32,
    draft: bool,
    phase: Phase,
    band_loads: Vec<i64>,
}

impl GrainSynthesizer {
    pub fn new(level: SimdLevel) -> Self {
        Self {
            level,
            density: DensityField::new(level),
            kernel: None,
            contexts: Vec::new(),
            pic_w: 0,
            pic_h: 0,
            out_scale: 0.0,
            draft: false,
            phase: Phase::Idle,
            band_loads: Vec::new(),
        }
    }

    pub fn level(&self) -> SimdLevel { self.level }

    pub fn thread_count(&self) -> usize { self.contexts.len() }

    pub fn is_draft(&self) -> bool { self.draft }

    /// Rows currently assigned to worker `idx`.
    pub fn rows(&self, idx: usize) -> Range<usize> {
        self.contexts[idx].rows.clone()
    }

    /// Density field of the current frame.
    pub fn density(&self) -> &DensityField { &self.density }

    /// Starts a frame and returns the number of workers, at most
    /// `max_threads` and at most one per row.
    pub fn begin(
        &mut self,
        width: usize,
        height: usize,
        kernel: Arc<ReconstructionKernel>,
        picture_seed: u32,
        draft: bool,
        max_threads: usize,
    ) -> usize {
        assert!(width > 0 && height > 0, "empty picture {}x{}", width, height);
        assert!(max_threads > 0, "at least one worker is required");

        self.pic_w = width;
        self.pic_h = height;
        self.out_scale = 1.0 / kernel.point_count() as f32;
        self.draft = draft;
        self.density.reset(
            width,
            height,
            kernel.grain_radius_mean(),
            kernel.grain_radius_stddev(),
            picture_seed,
        );
        self.kernel = Some(kernel);

        let threads = max_threads.min(height);
        self.contexts.truncate(threads);
        while self.contexts.len() < threads {
            self.contexts.push(ThreadContext::new());
        }
        for (t, ctx) in self.contexts.iter_mut().enumerate() {
            ctx.rows = height * t / threads..height * (t + 1) / threads;
            debug_assert!(!ctx.rows.is_empty());
            *ctx.pass1_done.get_mut() = false;
            *ctx.pass2_done.get_mut() = false;
        }

        self.band_loads.clear();
        self.phase = Phase::Pass1;

        tracing::debug!(width, height, threads, draft, simd = self.level.name(), "frame begin");
        threads
    }

    /// Pass 1 work items, one per worker. In draft mode they also write the
    /// output plane.
    pub fn pass1_tasks<'a>(&'a mut self, src: PlaneRef<'a>, dst: &'a mut PlaneMut<'_>) -> Vec<Pass1Task<'a>> {
        pass1::pass1_tasks(self, src, dst)
    }

    /// Runs pass 1 for worker `idx` on the calling thread.
    pub fn run_pass1(&mut self, idx: usize, src: PlaneRef<'_>, dst: &mut PlaneMut<'_>) {
        assert!(idx < self.thread_count(), "worker {} out of {}", idx, self.thread_count());
        if let Some(task) = self.pass1_tasks(src, dst).into_iter().nth(idx) {
            task.run();
        }
    }

    fn pass1_complete(&self) -> bool {
        self.contexts.iter().all(|c| c.pass1_done.load(Ordering::Acquire))
    }

    fn pass2_complete(&self) -> bool {
        self.contexts.iter().all(|c| c.pass2_done.load(Ordering::Acquire))
    }

    /// Redistributes rows on the pass 1 cost. Every pass 1 item must have
    /// completed.
    pub fn prepare_rebalance(&mut self) {
        rebalance::prepare_rebalance(self);
    }

    /// Pass 2 work items, one per worker.
    pub fn pass2_tasks<'a>(&'a mut self, dst: &'a mut PlaneMut<'_>) -> Vec<Pass2Task<'a>> {
        pass2::pass2_tasks(self, dst)
    }

    /// Runs pass 2 for worker `idx` on the calling thread.
    pub fn run_pass2(&mut self, idx: usize, dst: &mut PlaneMut<'_>) {
        assert!(idx < self.thread_count(), "worker {} out of {}", idx, self.thread_count());
        if let Some(task) = self.pass2_tasks(dst).into_iter().nth(idx) {
            task.run();
        }
    }

    /// Ends the frame and reports what it did (timings left at zero).
    pub fn finish(&mut self) -> FrameStats {
        assert!(
            self.phase == Phase::Pass2 || (self.draft && self.phase == Phase::Pass1),
            "finish called in phase {:?}",
            self.phase
        );
        if self.draft {
            assert!(self.pass1_complete(), "pass 1 incomplete");
        } else {
            assert!(self.pass2_complete(), "pass 2 incomplete");
        }
        let mut stats = FrameStats {
            threads: self.thread_count(),
            simd: self.level.name(),
            draft: self.draft,
            load_total: self.density.result().total(),
            band_rows: self.contexts.iter().map(|c| [c.rows.start, c.rows.end]).collect(),
            band_loads: self.band_loads.clone(),
            ..FrameStats::default()
        };
        if !self.draft {
            for ctx in &self.contexts {
                stats.cache.merge(&ctx.cache.stats());
            }
        }
        self.phase = Phase::Idle;

        tracing::debug!(
            threads = stats.threads,
            load = stats.load_total,
            cells = stats.cache.cells_built,
            "frame done"
        );
        stats
    }
}

#[cfg(test)]
#[path = "tests/tests.rs"]
mod tests;
