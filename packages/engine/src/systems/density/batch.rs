use wide::f32x4;

use super::{scalar, DensityConsts, LOAD_BIAS, LUM_EPS};
use crate::systems::prng::poisson_x4;

/// 4 pixels at a time, scalar tail.
pub(super) fn process_row(
    q_row: &mut [u32],
    seed_row: &mut [u32],
    lum_row: &[f32],
    y: usize,
    c: &DensityConsts,
) -> f32 {
    let nx = c.width & !3;
    let eps = f32x4::splat(LUM_EPS);
    let one = f32x4::splat(1.0);
    let bias = f32x4::splat(LOAD_BIAS);
    let mut load_v = f32x4::ZERO;

    for x in (0..nx).step_by(4) {
        let states: [u32; 4] = std::array::from_fn(|k| scalar::pixel_state(c.seed, x + k, y));
        let lum = f32x4::new(std::array::from_fn(|k| lum_row[x + k]));
        let neg = (one - lum).max(eps).min(one);
        let lambda = f32x4::new(neg.to_array().map(|v| c.lambda_mul * v.ln()));
        let q = poisson_x4(states, lambda);

        q_row[x..x + 4].copy_from_slice(&q);
        seed_row[x..x + 4].copy_from_slice(&states.map(|s| s.wrapping_add(2)));
        load_v += bias - neg;
    }

    let load: f32 = load_v.to_array().iter().sum();
    load + scalar::process_row(q_row, seed_row, lum_row, y, nx, c)
}
