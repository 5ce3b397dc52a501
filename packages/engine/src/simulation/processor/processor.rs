use std::sync::{Arc, Mutex};

use super::dispatch::TaskDispatcher;
use super::{FrameStats, GrainSynthesizer};
use crate::core::{CpuCaps, GrainError, PlaneMut, PlaneRef, SimdLevel};
use crate::domain::GrainParams;
use crate::systems::kernel::ReconstructionKernel;

/// Validated filter instance.
///
/// Holds the parameters, the kernel built from them and a pool of
/// synthesizers, so several planes may be processed at the same time
/// through a shared reference.
pub struct GrainProcessor {
    params: GrainParams,
    kernel: Arc<ReconstructionKernel>,
    level: SimdLevel,
    dispatcher: Arc<dyn TaskDispatcher>,
    pool: Mutex<Vec<GrainSynthesizer>>,
}

impl GrainProcessor {
    pub fn new(
        params: GrainParams,
        caps: CpuCaps,
        dispatcher: Arc<dyn TaskDispatcher>,
    ) -> Result<Self, GrainError> {
        params.validate()?;
        let kernel = Arc::new(ReconstructionKernel::from_params(&params));
        let level = SimdLevel::from_caps(caps);

        tracing::info!(
            sigma = params.sigma,
            points = params.res,
            radius = params.rad,
            deviation = params.dev,
            simd = level.name(),
            workers = dispatcher.thread_count(),
            "grain processor ready"
        );

        Ok(Self { params, kernel, level, dispatcher, pool: Mutex::new(Vec::new()) })
    }

    /// Processor on the default dispatcher (rayon when `parallel` is on).
    pub fn with_defaults(params: GrainParams, caps: CpuCaps) -> Result<Self, GrainError> {
        Self::new(params, caps, super::dispatch::default_dispatcher())
    }

    pub fn params(&self) -> &GrainParams {
        &self.params
    }

    pub fn kernel(&self) -> &ReconstructionKernel {
        &self.kernel
    }

    pub fn level(&self) -> SimdLevel {
        self.level
    }

    /// Renders the grain of one plane of frame `frame_idx` into `dst`.
    pub fn process_plane(
        &self,
        dst: &mut PlaneMut<'_>,
        src: PlaneRef<'_>,
        frame_idx: u32,
        plane_idx: u32,
    ) -> FrameStats {
        let seed = self.params.picture_seed(frame_idx, plane_idx);
        let mut synth = self.acquire();
        let stats = synth.render(dst, src, &self.kernel, seed, self.params.draft, self.dispatcher.as_ref());
        self.release(synth);

        tracing::debug!(
            frame = frame_idx,
            plane = plane_idx,
            seed,
            ms = stats.total_ms(),
            "plane processed"
        );
        stats
    }

    fn acquire(&self) -> GrainSynthesizer {
        let mut pool = self.pool.lock().unwrap_or_else(|e| e.into_inner());
        pool.pop().unwrap_or_else(|| GrainSynthesizer::new(self.level))
    }

    fn release(&self, synth: GrainSynthesizer) {
        let mut pool = self.pool.lock().unwrap_or_else(|e| e.into_inner());
        pool.push(synth);
    }
}
