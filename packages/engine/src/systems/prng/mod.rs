//! Deterministic random primitives.
//!
//! Every draw is a pure function of a 32-bit state. Draws that need two
//! uniforms consume `state` and `state + 1`, so callers advance their state
//! by 2 between draws.
//!
//! The batched forms work on 4 lanes. Integer hashing stays lane-wise and
//! the float pipeline performs the same operations in the same order as the
//! scalar one, so a lane of a batched draw equals the scalar draw.

mod batch;
mod scalar;

pub use batch::{log_normal_x4, norm_from_uni_x4, norm_trunc_x4, poisson_x4, uniform_x4};
pub use scalar::{log_normal, norm_from_uni, norm_trunc, poisson, uniform};

/// Mean above which Poisson counts use the normal approximation.
pub const POISSON_CUTOFF: f32 = 30.0;

/// Half-width of the truncated normal: 3 * 1023 * sqrt(2) / 1023.
pub const NORM_TRUNC_LIMIT: f32 = 4.243;

const UNIFORM_MUL: f32 = (1.0 / u32::MAX as f64) as f32;

// Irwin-Hall sum of 6 values of 10 bits
const NT_BITS: u32 = 10;
const NT_MASK: u32 = (1 << NT_BITS) - 1;
const NT_AVG: i32 = (NT_MASK * 6 / 2) as i32;
const NT_MUL: f32 = std::f32::consts::SQRT_2 / NT_MASK as f32;

/// Unit interval floor for Box-Muller, keeps `ln` finite.
const BM_FLOOR: f32 = 1e-35;
