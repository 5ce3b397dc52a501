use std::f32::consts::TAU;

use super::{BM_FLOOR, NT_AVG, NT_BITS, NT_MASK, NT_MUL, POISSON_CUTOFF, UNIFORM_MUL};
use crate::core::hash::hash_u32;

/// Uniform value in [0, 1].
#[inline]
pub fn uniform(state: u32) -> f32 {
    hash_u32(state) as f32 * UNIFORM_MUL
}

/// Box-Muller transform of two uniforms into two standard normal values.
#[inline]
pub fn norm_from_uni(u0: f32, u1: f32) -> [f32; 2] {
    debug_assert!((0.0..=1.0).contains(&u0), "u0 = {}", u0);
    debug_assert!((0.0..=1.0).contains(&u1), "u1 = {}", u1);
    let r = (-2.0 * u0.max(BM_FLOOR).ln()).sqrt();
    let (s, c) = (TAU * u1).sin_cos();
    [r * c, r * s]
}

/// Poisson-distributed count with mean `lambda`. Consumes 2 states.
pub fn poisson(state: u32, lambda: f32) -> u32 {
    debug_assert!(lambda >= 0.0, "lambda = {}", lambda);
    let u0 = uniform(state);

    if lambda >= POISSON_CUTOFF {
        let u1 = uniform(state.wrapping_add(1));
        let norm = norm_from_uni(u0, u1)[0];
        return poisson_from_norm(norm, lambda);
    }

    // Inverse transform sampling, bounded to 10 * lambda steps
    let n_max = (lambda * 10.0).ceil() as u32;
    let mut prod = (-lambda).exp();
    let mut sum = prod;
    let mut n = 0u32;
    while sum < u0 && n < n_max {
        n += 1;
        prod *= lambda / n as f32;
        sum += prod;
    }
    n
}

/// Normal approximation of a Poisson count, shared with the batched path.
#[inline]
pub(super) fn poisson_from_norm(norm: f32, lambda: f32) -> u32 {
    let equiv = (norm * lambda.sqrt() + (lambda - 0.5)).max(0.0);
    (equiv + 0.5).floor() as u32
}

/// Bounded approximation of a standard normal, in [-4.243, 4.243].
/// Consumes 2 states.
#[inline]
pub fn norm_trunc(state: u32) -> f32 {
    let r0 = hash_u32(state);
    let r1 = hash_u32(state.wrapping_add(1));
    norm_trunc_from_hashes(r0, r1)
}

#[inline]
pub(super) fn norm_trunc_from_hashes(r0: u32, r1: u32) -> f32 {
    let sum = (r0 & NT_MASK)
        + ((r0 >> NT_BITS) & NT_MASK)
        + ((r0 >> (2 * NT_BITS)) & NT_MASK)
        + (r1 & NT_MASK)
        + ((r1 >> NT_BITS) & NT_MASK)
        + ((r1 >> (2 * NT_BITS)) & NT_MASK);
    (sum as i32 - NT_AVG) as f32 * NT_MUL
}

/// `exp(mu_log + norm_trunc * sigma)`. Consumes 2 states.
#[inline]
pub fn log_normal(state: u32, mu_log: f32, sigma: f32) -> f32 {
    debug_assert!((-80.0..=80.0).contains(&mu_log));
    debug_assert!(sigma >= 0.0);
    (mu_log + norm_trunc(state) * sigma).exp()
}
