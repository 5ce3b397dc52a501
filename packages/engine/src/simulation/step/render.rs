use std::sync::Arc;

use super::dispatch::{self, Batch, SyncDispatcher, TaskDispatcher};
use super::{FrameStats, GrainSynthesizer, PassTimer};
use crate::core::{CpuCaps, PlaneMut, PlaneRef, SimdLevel};
use crate::systems::kernel::ReconstructionKernel;

impl GrainSynthesizer {
    /// Renders one plane: both passes on `dispatcher`, with the barrier and
    /// rebalancing in between.
    pub fn render(
        &mut self,
        dst: &mut PlaneMut<'_>,
        src: PlaneRef<'_>,
        kernel: &Arc<ReconstructionKernel>,
        picture_seed: u32,
        draft: bool,
        dispatcher: &dyn TaskDispatcher,
    ) -> FrameStats {
        let dispatcher = dispatch::usable(dispatcher);
        let mut timer = PassTimer::start();

        self.begin(
            dst.width(),
            dst.height(),
            Arc::clone(kernel),
            picture_seed,
            draft,
            dispatcher.thread_count(),
        );

        let mut batch = Batch::new(dispatcher);
        for task in self.pass1_tasks(src, dst) {
            batch.submit(move || task.run());
        }
        batch.await_all();
        timer.end_pass1();

        if !draft {
            self.prepare_rebalance();
            let mut batch = Batch::new(dispatcher);
            for task in self.pass2_tasks(dst) {
                batch.submit(move || task.run());
            }
            batch.await_all();
            timer.end_pass2();
        }

        let mut stats = self.finish();
        timer.record(&mut stats);
        stats
    }
}

/// One-shot single-threaded rendering of `src` into `dst`.
pub fn synthesize(
    dst: &mut PlaneMut<'_>,
    src: PlaneRef<'_>,
    kernel: &Arc<ReconstructionKernel>,
    picture_seed: u32,
    draft: bool,
    caps: CpuCaps,
) -> FrameStats {
    let mut synth = GrainSynthesizer::new(SimdLevel::from_caps(caps));
    synth.render(dst, src, kernel, picture_seed, draft, &SyncDispatcher)
}
