//! Grain cells: the grains attached to one source pixel.
//!
//! A cell stores grain centres (relative to its pixel centre, in pixels) and
//! squared radii as separate arrays so the intersection test can stream
//! them 4 or 8 at a time.

mod intersect;

use wide::f32x4;

use crate::core::hash::{hash_u32, lanes_x4};
use crate::core::SimdLevel;
use crate::systems::prng::{log_normal, log_normal_x4, uniform, uniform_x4};

pub use intersect::{check_scalar, check_x4, check_x8};

/// Grain radius distribution.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GrainRadius {
    pub mean: f32,
    pub stddev: f32,
    mu_log: f32,
}

impl GrainRadius {
    pub fn new(mean: f32, stddev: f32) -> Self {
        debug_assert!(mean > 0.0 && stddev >= 0.0);
        Self { mean, stddev, mu_log: mean.ln() }
    }

    #[inline]
    pub fn is_constant(&self) -> bool {
        self.stddev <= 0.0
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct GrainCell {
    cx: Vec<f32>,
    cy: Vec<f32>,
    r2: Vec<f32>,
}

impl GrainCell {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.cx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cx.is_empty()
    }

    /// Sets the grain count. Contents are meaningless until the next build.
    pub fn resize(&mut self, q: usize) {
        self.cx.resize(q, 0.0);
        self.cy.resize(q, 0.0);
        self.r2.resize(q, 0.0);
    }

    pub fn centres_x(&self) -> &[f32] { &self.cx }

    pub fn centres_y(&self) -> &[f32] { &self.cy }

    pub fn radii_sq(&self) -> &[f32] { &self.r2 }

    /// Generates `q` grains from the pixel's cell seed.
    ///
    /// Grain k is centred on `(uniform(seed + 2k), uniform(seed + 2k + 1))`
    /// shifted to the pixel centre. Variable radii draw from a rehashed seed.
    pub fn build(&mut self, q: u32, seed: u32, radius: &GrainRadius, batched: bool) {
        let q = q as usize;
        self.resize(q);
        let nx = if batched { q & !3 } else { 0 };
        let half = f32x4::splat(0.5);

        for pos in (0..nx).step_by(4) {
            let sx = lanes_x4(seed.wrapping_add(2 * pos as u32), 2);
            let sy = sx.map(|s| s.wrapping_add(1));
            let cx = uniform_x4(sx) - half;
            let cy = uniform_x4(sy) - half;
            self.cx[pos..pos + 4].copy_from_slice(&cx.to_array());
            self.cy[pos..pos + 4].copy_from_slice(&cy.to_array());
        }
        for pos in nx..q {
            let s = seed.wrapping_add(2 * pos as u32);
            self.cx[pos] = uniform(s) - 0.5;
            self.cy[pos] = uniform(s.wrapping_add(1)) - 0.5;
        }

        if radius.is_constant() {
            self.r2.fill(radius.mean * radius.mean);
            return;
        }

        let seed = hash_u32(seed);
        for pos in (0..nx).step_by(4) {
            let states = lanes_x4(seed.wrapping_add(2 * pos as u32), 2);
            let rad = log_normal_x4(states, radius.mu_log, radius.stddev);
            self.r2[pos..pos + 4].copy_from_slice(&(rad * rad).to_array());
        }
        for pos in nx..q {
            let rad = log_normal(seed.wrapping_add(2 * pos as u32), radius.mu_log, radius.stddev);
            self.r2[pos] = rad * rad;
        }
    }

    /// True if any grain covers `(tx, ty)` (cell-relative coordinates).
    #[inline]
    pub fn check(&self, tx: f32, ty: f32, level: SimdLevel) -> bool {
        match level {
            SimdLevel::Scalar => check_scalar(&self.cx, &self.cy, &self.r2, tx, ty),
            SimdLevel::Vector4 => check_x4(&self.cx, &self.cy, &self.r2, tx, ty),
            SimdLevel::Vector8 => check_x8(&self.cx, &self.cy, &self.r2, tx, ty),
        }
    }
}

/// Source of grain cells for the window cache.
pub trait CellProvider {
    /// Fills `cell` with the grains of source pixel `(px, py)`.
    fn build_cell(&self, cell: &mut GrainCell, px: usize, py: usize);
}
