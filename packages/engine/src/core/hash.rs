//! Integer hash used as the only source of randomness.
//!
//! Every consumer derives its state from (picture seed, pixel coordinates),
//! so a value never depends on execution order or thread assignment.

/// Low-bias 32-bit avalanche hash (Chris Wellons, "lowbias32").
#[inline(always)]
pub fn hash_u32(mut x: u32) -> u32 {
    x ^= x >> 16;
    x = x.wrapping_mul(0x7FEB_352D);
    x ^= x >> 15;
    x = x.wrapping_mul(0x846C_A68B);
    x ^= x >> 16;
    x
}

/// Lane-wise hash of 4 states.
#[inline(always)]
pub fn hash_x4(x: [u32; 4]) -> [u32; 4] {
    [hash_u32(x[0]), hash_u32(x[1]), hash_u32(x[2]), hash_u32(x[3])]
}

/// 4 consecutive states with a fixed spacing: `base + k * step`.
#[inline(always)]
pub fn lanes_x4(base: u32, step: u32) -> [u32; 4] {
    [
        base,
        base.wrapping_add(step),
        base.wrapping_add(step.wrapping_mul(2)),
        base.wrapping_add(step.wrapping_mul(3)),
    ]
}
