//! Vision filter: the sample points every output pixel is reconstructed from.
//!
//! The kernel is a fixed set of points approximating a 2D Gaussian (or a
//! unit box when sigma is 0), relative to the output pixel centre. Points are
//! grouped by footprint, the box of source pixels whose grains may reach
//! them, so the renderer fetches the cells of a footprint once per group.
//!
//! Immutable once built; share it across frames and threads.

mod quasirandom;

use std::collections::BTreeMap;

use crate::domain::GrainParams;
use crate::systems::prng::norm_from_uni;

pub use quasirandom::R2Sequence;

/// Radial soft clip, in standard deviations.
const CLIP_RADIUS: f32 = 4.0;

/// Grain radius upper bound used for footprints, in log-normal deviations.
const RADIUS_SPAN: f32 = 3.0;

#[inline]
pub(crate) fn round_half_up(v: f32) -> i32 {
    (v + 0.5).floor() as i32
}

/// Inclusive box of source pixel offsets.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Footprint {
    pub x_min: i32,
    pub x_max: i32,
    pub y_min: i32,
    pub y_max: i32,
}

impl Footprint {
    /// The output pixel's own source pixel.
    pub const CENTRE: Footprint = Footprint { x_min: 0, x_max: 0, y_min: 0, y_max: 0 };

    pub fn width(&self) -> usize {
        (self.x_max - self.x_min + 1) as usize
    }

    pub fn height(&self) -> usize {
        (self.y_max - self.y_min + 1) as usize
    }

    /// Number of source pixels covered (never 0).
    pub fn cell_count(&self) -> usize {
        self.width() * self.height()
    }

    /// Offsets in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = (i32, i32)> + '_ {
        (self.y_min..=self.y_max).flat_map(move |y| (self.x_min..=self.x_max).map(move |x| (x, y)))
    }

    pub fn contains(&self, x: i32, y: i32) -> bool {
        (self.x_min..=self.x_max).contains(&x) && (self.y_min..=self.y_max).contains(&y)
    }
}

/// Sample points sharing one footprint (SoA).
#[derive(Clone, Debug)]
pub struct KernelGroup {
    footprint: Footprint,
    xs: Vec<f32>,
    ys: Vec<f32>,
}

impl KernelGroup {
    pub fn footprint(&self) -> Footprint {
        self.footprint
    }

    pub fn len(&self) -> usize {
        self.xs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.xs.is_empty()
    }

    pub fn xs(&self) -> &[f32] {
        &self.xs
    }

    pub fn ys(&self) -> &[f32] {
        &self.ys
    }

    pub fn points(&self) -> impl Iterator<Item = (f32, f32)> + '_ {
        self.xs.iter().copied().zip(self.ys.iter().copied())
    }
}

#[derive(Clone, Debug)]
pub struct ReconstructionKernel {
    sigma: f32,
    point_count: usize,
    rad_mean: f32,
    rad_stddev: f32,
    groups: Vec<KernelGroup>,
    area: Footprint,
}

impl ReconstructionKernel {
    /// Builds the kernel for a filter configuration.
    ///
    /// `sigma` is the filter deviation in pixels, `point_count` the number of
    /// samples per output pixel, `rad_mean` / `rad_stddev` the grain radius
    /// distribution the footprints must account for.
    pub fn new(sigma: f32, point_count: usize, rad_mean: f32, rad_stddev: f32) -> Self {
        assert!(point_count > 0, "kernel needs at least one point");
        assert!(rad_mean > 0.0, "grain radius must be positive");
        assert!(rad_stddev >= 0.0, "grain radius deviation must be >= 0");

        let max_grain_rad = rad_mean * (rad_stddev * RADIUS_SPAN).exp();
        let mut map: BTreeMap<Footprint, (Vec<f32>, Vec<f32>)> = BTreeMap::new();

        for [u0, u1] in R2Sequence::new().take(point_count) {
            let (x, y, footprint) = if sigma <= 0.0 {
                (u0 - 0.5, u1 - 0.5, Footprint::CENTRE)
            } else {
                let [nx, ny] = norm_from_uni(u0, u1);
                let r = (nx * nx + ny * ny).sqrt();
                let scale = sigma * (1.0 + (r / CLIP_RADIUS).powi(4)).powf(-0.25);
                let (x, y) = (nx * scale, ny * scale);
                let footprint = Footprint {
                    x_min: round_half_up(x - max_grain_rad),
                    x_max: round_half_up(x + max_grain_rad),
                    y_min: round_half_up(y - max_grain_rad),
                    y_max: round_half_up(y + max_grain_rad),
                };
                (x, y, footprint)
            };

            let (xs, ys) = map.entry(footprint).or_default();
            xs.push(x);
            ys.push(y);
        }

        let groups: Vec<KernelGroup> = map
            .into_iter()
            .map(|(footprint, (xs, ys))| KernelGroup { footprint, xs, ys })
            .collect();
        let area = groups.iter().fold(Footprint::CENTRE, |acc, g| {
            let f = g.footprint();
            Footprint {
                x_min: acc.x_min.min(f.x_min),
                x_max: acc.x_max.max(f.x_max),
                y_min: acc.y_min.min(f.y_min),
                y_max: acc.y_max.max(f.y_max),
            }
        });

        tracing::debug!(
            sigma,
            point_count,
            groups = groups.len(),
            w = area.width(),
            h = area.height(),
            "reconstruction kernel built"
        );

        Self { sigma, point_count, rad_mean, rad_stddev, groups, area }
    }

    /// Kernel for validated parameters.
    pub fn from_params(params: &GrainParams) -> Self {
        Self::new(params.sigma, params.res.max(1) as usize, params.rad, params.dev)
    }

    pub fn sigma(&self) -> f32 { self.sigma }

    pub fn point_count(&self) -> usize { self.point_count }

    pub fn grain_radius_mean(&self) -> f32 { self.rad_mean }

    pub fn grain_radius_stddev(&self) -> f32 { self.rad_stddev }

    /// Width of the union of all footprints (origin included).
    pub fn width(&self) -> usize { self.area.width() }

    pub fn height(&self) -> usize { self.area.height() }

    /// Union of all footprints.
    pub fn area(&self) -> Footprint { self.area }

    /// Groups, ordered by footprint.
    pub fn groups(&self) -> &[KernelGroup] { &self.groups }
}
