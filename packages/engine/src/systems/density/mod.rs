//! Grain density field (pass 1).
//!
//! For every source pixel: the number of grains `q` (Poisson draw whose mean
//! follows from the luminance) and the RNG state its grain cell is built
//! from. Also measures a per-row cost used to balance pass 2.
//!
//! Rows can be processed concurrently through disjoint [`DensityBand`]s;
//! the running cost total is the only shared mutable value.

mod batch;
mod scalar;

use std::f32::consts::PI;
use std::ops::Range;
use std::sync::atomic::{AtomicI64, Ordering};

use crate::core::{PlaneMut, PlaneRef, SimdLevel};

/// Lower clamp of `1 - luminance`, keeps grain counts finite at white.
pub const LUM_EPS: f32 = 4e-4;

/// Fixed-point scale of row costs.
pub const LOAD_SCALE: f64 = 65536.0;

/// Per-pixel cost is `LOAD_BIAS - (1 - luminance)`.
pub const LOAD_BIAS: f32 = 1.09;

/// Row stride granularity, in elements (32 bytes).
pub const STRIDE_ALIGN: usize = 8;

#[derive(Clone, Copy, Debug)]
pub(crate) struct DensityConsts {
    pub width: usize,
    pub stride: usize,
    pub seed: u32,
    pub lambda_mul: f32,
    pub batched: bool,
}

/// Expected grain count for a luminance.
#[inline]
pub fn lambda_for(lum: f32, lambda_mul: f32) -> f32 {
    lambda_mul * lum_neg(lum).ln()
}

#[inline]
pub(crate) fn lum_neg(lum: f32) -> f32 {
    (1.0 - lum).max(LUM_EPS).min(1.0)
}

pub struct DensityField {
    consts: DensityConsts,
    height: usize,
    q: Vec<u32>,
    seeds: Vec<u32>,
    row_cost: Vec<i64>,
    total: AtomicI64,
}

impl DensityField {
    pub fn new(level: SimdLevel) -> Self {
        Self {
            consts: DensityConsts {
                width: 0,
                stride: 0,
                seed: 0,
                lambda_mul: 0.0,
                batched: level.batched_generation(),
            },
            height: 0,
            q: Vec::new(),
            seeds: Vec::new(),
            row_cost: Vec::new(),
            total: AtomicI64::new(0),
        }
    }

    /// Prepares the field for a new picture. Storage is reused.
    pub fn reset(&mut self, width: usize, height: usize, rad_mean: f32, rad_stddev: f32, seed: u32) {
        assert!(width > 0 && height > 0, "empty picture {}x{}", width, height);
        assert!(rad_mean > 0.0);
        assert!(rad_stddev >= 0.0);

        let stride = (width + STRIDE_ALIGN - 1) / STRIDE_ALIGN * STRIDE_ALIGN;
        let len = stride * height;

        self.consts.width = width;
        self.consts.stride = stride;
        self.consts.seed = seed;
        // E[r^2] of a log-normal radius is exp(2 mu_log + 2 s^2), hence the
        // exp(2 s^2) factor next to the mean radius.
        self.consts.lambda_mul =
            -1.0 / (PI * rad_mean * rad_mean * (2.0 * rad_stddev * rad_stddev).exp());
        self.height = height;

        self.q.clear();
        self.q.resize(len, 0);
        self.seeds.clear();
        self.seeds.resize(len, 0);
        self.row_cost.clear();
        self.row_cost.resize(height, 0);
        self.total.store(0, Ordering::Relaxed);
    }

    pub fn width(&self) -> usize { self.consts.width }

    pub fn height(&self) -> usize { self.height }

    pub fn stride(&self) -> usize { self.consts.stride }

    pub fn lambda_mul(&self) -> f32 { self.consts.lambda_mul }

    /// Expected grain count of a pixel with luminance `lum`.
    pub fn lambda(&self, lum: f32) -> f32 {
        lambda_for(lum, self.consts.lambda_mul)
    }

    /// Splits the field into disjoint row bands that can be filled from
    /// different threads. Ranges must be ascending and non-overlapping.
    pub fn bands_mut(&mut self, ranges: &[Range<usize>]) -> Vec<DensityBand<'_>> {
        let consts = self.consts;
        let stride = consts.stride;
        let total = &self.total;

        let mut bands = Vec::with_capacity(ranges.len());
        let mut q_rest: &mut [u32] = &mut self.q[..];
        let mut seed_rest: &mut [u32] = &mut self.seeds[..];
        let mut cost_rest: &mut [i64] = &mut self.row_cost[..];
        let mut cursor = 0;

        for r in ranges {
            assert!(
                r.start >= cursor && r.start < r.end && r.end <= self.height,
                "invalid band {:?} (cursor {}, height {})",
                r,
                cursor,
                self.height
            );
            let skip = r.start - cursor;
            let rows = r.end - r.start;

            let (_, tail) = std::mem::take(&mut q_rest).split_at_mut(skip * stride);
            let (q, tail) = tail.split_at_mut(rows * stride);
            q_rest = tail;

            let (_, tail) = std::mem::take(&mut seed_rest).split_at_mut(skip * stride);
            let (seeds, tail) = tail.split_at_mut(rows * stride);
            seed_rest = tail;

            let (_, tail) = std::mem::take(&mut cost_rest).split_at_mut(skip);
            let (row_cost, tail) = tail.split_at_mut(rows);
            cost_rest = tail;

            cursor = r.end;
            bands.push(DensityBand { consts, rows: r.clone(), q, seeds, row_cost, total });
        }

        bands
    }

    /// Fills one row range from this thread.
    pub fn process_area(&mut self, rows: Range<usize>, lum: PlaneRef<'_>) {
        for mut band in self.bands_mut(&[rows]) {
            band.process(lum, None);
        }
    }

    /// Cost of row `y`, in [`LOAD_SCALE`] units.
    pub fn row_cost(&self, y: usize) -> i64 {
        self.row_cost[y]
    }

    /// Read-only view of the field. Only meaningful once every row has been
    /// processed.
    pub fn result(&self) -> DensityResult<'_> {
        DensityResult {
            q: &self.q,
            seeds: &self.seeds,
            row_cost: &self.row_cost,
            width: self.consts.width,
            height: self.height,
            stride: self.consts.stride,
            total: self.total.load(Ordering::Acquire),
        }
    }
}

/// Rows of a [`DensityField`] owned by one worker.
pub struct DensityBand<'a> {
    consts: DensityConsts,
    rows: Range<usize>,
    q: &'a mut [u32],
    seeds: &'a mut [u32],
    row_cost: &'a mut [i64],
    total: &'a AtomicI64,
}

impl<'a> DensityBand<'a> {
    pub fn rows(&self) -> Range<usize> {
        self.rows.clone()
    }

    /// Computes the band. In draft mode `coverage` receives, per pixel, the
    /// coverage implied by the drawn grain count.
    pub fn process(&mut self, lum: PlaneRef<'_>, mut coverage: Option<&mut PlaneMut<'_>>) {
        let c = self.consts;
        assert_eq!(lum.width(), c.width, "luminance width mismatch");
        assert!(self.rows.end <= lum.height(), "luminance plane too short");

        let mut block = 0i64;
        for (i, y) in self.rows.clone().enumerate() {
            let start = i * c.stride;
            let q_row = &mut self.q[start..start + c.width];
            let seed_row = &mut self.seeds[start..start + c.width];
            let lum_row = lum.row(y);

            let load = if c.batched {
                batch::process_row(q_row, seed_row, lum_row, y, &c)
            } else {
                scalar::process_row(q_row, seed_row, lum_row, y, 0, &c)
            };

            let cost = (load as f64 * LOAD_SCALE).round() as i64;
            self.row_cost[i] = cost;
            block += cost;

            if let Some(out) = coverage.as_deref_mut() {
                scalar::coverage_row(out.row_mut(y), q_row, c.lambda_mul);
            }
        }

        self.total.fetch_add(block, Ordering::AcqRel);
        tracing::trace!(rows = ?self.rows, load = block, "density band done");
    }
}

/// Completed density field.
#[derive(Clone, Copy)]
pub struct DensityResult<'a> {
    q: &'a [u32],
    seeds: &'a [u32],
    row_cost: &'a [i64],
    width: usize,
    height: usize,
    stride: usize,
    total: i64,
}

impl<'a> DensityResult<'a> {
    #[inline]
    pub fn q(&self, x: usize, y: usize) -> u32 {
        debug_assert!(x < self.width && y < self.height);
        self.q[y * self.stride + x]
    }

    #[inline]
    pub fn seed(&self, x: usize, y: usize) -> u32 {
        debug_assert!(x < self.width && y < self.height);
        self.seeds[y * self.stride + x]
    }

    pub fn width(&self) -> usize { self.width }

    pub fn height(&self) -> usize { self.height }

    pub fn stride(&self) -> usize { self.stride }

    pub fn total(&self) -> i64 { self.total }

    pub fn row_costs(&self) -> &'a [i64] { self.row_cost }
}
