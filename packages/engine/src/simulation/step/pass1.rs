use std::ops::Range;
use std::sync::atomic::AtomicBool;

use super::{claim_band, GrainSynthesizer, Phase};
use crate::core::{PlaneMut, PlaneRef};
use crate::systems::density::DensityBand;

/// Density computation of one worker's rows.
pub struct Pass1Task<'a> {
    idx: usize,
    band: DensityBand<'a>,
    src: PlaneRef<'a>,
    coverage: Option<PlaneMut<'a>>,
    done: &'a AtomicBool,
}

impl<'a> Pass1Task<'a> {
    pub fn index(&self) -> usize {
        self.idx
    }

    pub fn rows(&self) -> Range<usize> {
        self.band.rows()
    }

    pub fn run(mut self) {
        claim_band(self.done, 1, self.idx);
        self.band.process(self.src, self.coverage.as_mut());
    }
}

pub(super) fn pass1_tasks<'a>(
    synth: &'a mut GrainSynthesizer,
    src: PlaneRef<'a>,
    dst: &'a mut PlaneMut<'_>,
) -> Vec<Pass1Task<'a>> {
    assert_eq!(synth.phase, Phase::Pass1, "pass 1 requested outside of a frame");
    assert_eq!(
        (src.width(), src.height()),
        (synth.pic_w, synth.pic_h),
        "source plane size mismatch"
    );
    assert_eq!(
        (dst.width(), dst.height()),
        (synth.pic_w, synth.pic_h),
        "destination plane size mismatch"
    );

    let ranges: Vec<Range<usize>> = synth.contexts.iter().map(|c| c.rows.clone()).collect();
    let outputs: Vec<Option<PlaneMut<'a>>> = if synth.draft {
        dst.split_rows(&ranges).into_iter().map(Some).collect()
    } else {
        ranges.iter().map(|_| None).collect()
    };

    let flags = synth.contexts.iter().map(|c| &c.pass1_done);
    synth
        .density
        .bands_mut(&ranges)
        .into_iter()
        .zip(outputs)
        .zip(flags)
        .enumerate()
        .map(|(idx, ((band, coverage), done))| Pass1Task { idx, band, src, coverage, done })
        .collect()
}
