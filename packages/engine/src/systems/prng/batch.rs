use std::f32::consts::TAU;

use wide::f32x4;

use super::scalar::{norm_trunc_from_hashes, poisson, poisson_from_norm};
use super::{BM_FLOOR, POISSON_CUTOFF, UNIFORM_MUL};
use crate::core::hash::hash_x4;

// `wide` has no exact transcendental functions, so ln/exp/sin/cos run per
// lane with the std implementation. Arithmetic stays in vector registers.
#[inline(always)]
fn per_lane(v: f32x4, f: impl Fn(f32) -> f32) -> f32x4 {
    f32x4::new(v.to_array().map(f))
}

#[inline(always)]
fn next_states(states: [u32; 4]) -> [u32; 4] {
    states.map(|s| s.wrapping_add(1))
}

#[inline]
pub fn uniform_x4(states: [u32; 4]) -> f32x4 {
    let h = hash_x4(states);
    f32x4::new(h.map(|v| v as f32)) * f32x4::splat(UNIFORM_MUL)
}

#[inline]
pub fn norm_from_uni_x4(u0: f32x4, u1: f32x4) -> [f32x4; 2] {
    let ln_u0 = per_lane(u0.max(f32x4::splat(BM_FLOOR)), f32::ln);
    let r = (f32x4::splat(-2.0) * ln_u0).sqrt();
    let an = f32x4::splat(TAU) * u1;
    let c = per_lane(an, f32::cos);
    let s = per_lane(an, f32::sin);
    [r * c, r * s]
}

/// Poisson counts for 4 lanes.
///
/// Every lane first goes through the normal approximation; lanes whose
/// mean is under the cutoff are then redrawn with the scalar series.
pub fn poisson_x4(states: [u32; 4], lambda: f32x4) -> [u32; 4] {
    let u0 = uniform_x4(states);
    let u1 = uniform_x4(next_states(states));
    let norm = norm_from_uni_x4(u0, u1)[0];

    let lam = lambda.to_array();
    let norm = norm.to_array();
    let mut n = [0u32; 4];
    for k in 0..4 {
        n[k] = poisson_from_norm(norm[k], lam[k]);
    }

    if lam.iter().any(|&l| l < POISSON_CUTOFF) {
        for k in 0..4 {
            if lam[k] < POISSON_CUTOFF {
                n[k] = poisson(states[k], lam[k]);
            }
        }
    }
    n
}

#[inline]
pub fn norm_trunc_x4(states: [u32; 4]) -> f32x4 {
    let r0 = hash_x4(states);
    let r1 = hash_x4(next_states(states));
    f32x4::new([
        norm_trunc_from_hashes(r0[0], r1[0]),
        norm_trunc_from_hashes(r0[1], r1[1]),
        norm_trunc_from_hashes(r0[2], r1[2]),
        norm_trunc_from_hashes(r0[3], r1[3]),
    ])
}

#[inline]
pub fn log_normal_x4(states: [u32; 4], mu_log: f32, sigma: f32) -> f32x4 {
    let norm = norm_trunc_x4(states);
    per_lane(f32x4::splat(mu_log) + norm * f32x4::splat(sigma), f32::exp)
}
