use super::{lum_neg, DensityConsts, LOAD_BIAS};
use crate::core::hash::hash_u32;
use crate::systems::prng::poisson;

/// RNG state of pixel (x, y). The row goes through the hash on its own, so
/// no column index can alias a pixel of another row; columns are 256 states
/// apart. Hashed again so long grain sequences of neighbouring pixels do not
/// overlap.
#[inline]
pub(super) fn pixel_state(seed: u32, x: usize, y: usize) -> u32 {
    let s = seed
        .wrapping_add(hash_u32(y as u32))
        .wrapping_add((x as u32) << 8);
    hash_u32(s)
}

/// Grain count, cell seed and cost of one pixel.
#[inline]
pub(super) fn compute_q(seed: u32, x: usize, y: usize, lum: f32, lambda_mul: f32) -> (u32, u32, f32) {
    let state = pixel_state(seed, x, y);
    let neg = lum_neg(lum);
    let lambda = lambda_mul * neg.ln();
    let q = poisson(state, lambda);
    (q, state.wrapping_add(2), LOAD_BIAS - neg)
}

/// Processes `x_start..width` of a row and returns the summed cost.
pub(super) fn process_row(
    q_row: &mut [u32],
    seed_row: &mut [u32],
    lum_row: &[f32],
    y: usize,
    x_start: usize,
    c: &DensityConsts,
) -> f32 {
    let mut load = 0.0f32;
    for x in x_start..c.width {
        let (q, s, l) = compute_q(c.seed, x, y, lum_row[x], c.lambda_mul);
        q_row[x] = q;
        seed_row[x] = s;
        load += l;
    }
    load
}

/// Draft output: `1 - exp(q / lambda_mul)`, the coverage of `q` grains.
pub(super) fn coverage_row(out: &mut [f32], q_row: &[u32], lambda_mul: f32) {
    for (o, &q) in out.iter_mut().zip(q_row) {
        *o = 1.0 - (q as f32 / lambda_mul).exp();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wide_rows_do_not_alias_the_next_row() {
        for k in [0usize, 1, 17, 4095] {
            assert_ne!(pixel_state(7, 4096 + k, 3), pixel_state(7, k, 4));
            assert_ne!(pixel_state(7, 8192 + k, 0), pixel_state(7, k, 2));
        }
    }

    #[test]
    fn states_are_distinct_over_an_8k_frame_row_pair() {
        let mut seen = std::collections::HashSet::new();
        for y in 0..2 {
            for x in 0..8192 {
                assert!(seen.insert(pixel_state(12345, x, y)), "repeat at {},{}", x, y);
            }
        }
    }
}
