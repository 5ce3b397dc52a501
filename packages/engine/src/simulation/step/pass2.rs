use std::ops::Range;
use std::sync::atomic::AtomicBool;

use super::{claim_band, GrainSynthesizer, Phase};
use crate::core::{PlaneMut, SimdLevel};
use crate::spatial::{CellProvider, CellWindowCache, GrainCell, GrainRadius};
use crate::systems::density::DensityResult;
use crate::systems::kernel::ReconstructionKernel;

/// Builds grain cells from the completed density field.
#[derive(Clone, Copy)]
pub struct CellBuilder<'a> {
    density: DensityResult<'a>,
    radius: GrainRadius,
    batched: bool,
}

impl<'a> CellBuilder<'a> {
    pub fn new(density: DensityResult<'a>, radius: GrainRadius, level: SimdLevel) -> Self {
        Self { density, radius, batched: level.batched_generation() }
    }
}

impl CellProvider for CellBuilder<'_> {
    fn build_cell(&self, cell: &mut GrainCell, px: usize, py: usize) {
        cell.build(self.density.q(px, py), self.density.seed(px, py), &self.radius, self.batched);
    }
}

/// Rendering of one worker's rows.
pub struct Pass2Task<'a> {
    idx: usize,
    rows: Range<usize>,
    cache: &'a mut CellWindowCache,
    done: &'a AtomicBool,
    cache_size: (usize, usize),
    builder: CellBuilder<'a>,
    kernel: &'a ReconstructionKernel,
    out: PlaneMut<'a>,
    out_scale: f32,
    level: SimdLevel,
}

impl<'a> Pass2Task<'a> {
    pub fn index(&self) -> usize {
        self.idx
    }

    pub fn rows(&self) -> Range<usize> {
        self.rows.clone()
    }

    pub fn run(mut self) {
        claim_band(self.done, 2, self.idx);
        let (cache_w, cache_h) = self.cache_size;
        self.cache.reset(cache_w, cache_h);

        let pic_w = self.builder.density.width();
        let pic_h = self.builder.density.height();
        let mut slots: Vec<(usize, f32, f32)> = Vec::new();

        for y in self.rows.clone() {
            for x in 0..pic_w {
                let hits = render_pixel(
                    self.cache,
                    &self.builder,
                    self.kernel,
                    self.level,
                    (x, y),
                    (pic_w, pic_h),
                    &mut slots,
                );
                self.out.row_mut(y)[x] = hits as f32 * self.out_scale;
            }
        }
        tracing::trace!(worker = self.idx, rows = ?self.rows, "pass 2 band done");
    }
}

/// Number of kernel points of pixel `(px, py)` covered by at least one grain.
///
/// For each footprint group the cells are brought into the cache first,
/// then every point of the group is tested against them; the first hit
/// ends the point.
pub(crate) fn render_pixel<P: CellProvider + ?Sized>(
    cache: &mut CellWindowCache,
    provider: &P,
    kernel: &ReconstructionKernel,
    level: SimdLevel,
    (px, py): (usize, usize),
    (pic_w, pic_h): (usize, usize),
    slots: &mut Vec<(usize, f32, f32)>,
) -> u32 {
    let x_max = pic_w as i32 - 1;
    let y_max = pic_h as i32 - 1;
    let mut hits = 0u32;

    for group in kernel.groups() {
        slots.clear();
        for (dx, dy) in group.footprint().cells() {
            let cx = (px as i32 + dx).clamp(0, x_max) as usize;
            let cy = (py as i32 + dy).clamp(0, y_max) as usize;
            let slot = cache.fetch(cx, cy, provider);
            // point coordinates relative to the cell centre
            slots.push((slot, dx as f32, dy as f32));
        }

        for (fx, fy) in group.points() {
            for &(slot, ox, oy) in slots.iter() {
                if cache.cell(slot).check(fx - ox, fy - oy, level) {
                    hits += 1;
                    break;
                }
            }
        }
    }
    hits
}

pub(super) fn pass2_tasks<'a>(synth: &'a mut GrainSynthesizer, dst: &'a mut PlaneMut<'_>) -> Vec<Pass2Task<'a>> {
    assert_eq!(synth.phase, Phase::Pass2, "pass 2 requested before rebalancing");
    assert!(!synth.draft, "draft frames have no pass 2");
    assert_eq!(
        (dst.width(), dst.height()),
        (synth.pic_w, synth.pic_h),
        "destination plane size mismatch"
    );
    let Some(kernel) = synth.kernel.as_deref() else {
        unreachable!("kernel is bound by begin()");
    };

    let ranges: Vec<Range<usize>> = synth.contexts.iter().map(|c| c.rows.clone()).collect();
    let bands = dst.split_rows(&ranges);

    let radius = GrainRadius::new(kernel.grain_radius_mean(), kernel.grain_radius_stddev());
    let builder = CellBuilder::new(synth.density.result(), radius, synth.level);
    // A raster scan then slides the window one row per output row.
    let cache_size = (synth.pic_w.max(kernel.width()), kernel.height());
    let out_scale = synth.out_scale;
    let level = synth.level;

    synth
        .contexts
        .iter_mut()
        .zip(bands)
        .enumerate()
        .map(|(idx, (ctx, out))| Pass2Task {
            idx,
            rows: ctx.rows.clone(),
            cache: &mut ctx.cache,
            done: &ctx.pass2_done,
            cache_size,
            builder,
            kernel,
            out,
            out_scale,
            level,
        })
        .collect()
}
