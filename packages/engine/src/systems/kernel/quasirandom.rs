//! R2 low-discrepancy sequence over the unit square.
//!
//! Additive recurrence on the inverse powers of the plastic number
//! (the real root of x^3 = x + 1), started at (0.5, 0.5).

const PLASTIC: f64 = 1.324_717_957_244_746_025_96;
const ALPHA_1: f64 = 1.0 / PLASTIC;
const ALPHA_2: f64 = 1.0 / (PLASTIC * PLASTIC);

#[derive(Clone, Debug)]
pub struct R2Sequence {
    a1n: f64,
    a2n: f64,
}

impl R2Sequence {
    pub fn new() -> Self {
        Self { a1n: 0.5, a2n: 0.5 }
    }
}

impl Default for R2Sequence {
    fn default() -> Self {
        Self::new()
    }
}

#[inline]
fn add_and_wrap(acc: &mut f64, inc: f64) {
    *acc += inc;
    if *acc >= 1.0 {
        *acc -= 1.0;
    }
}

impl Iterator for R2Sequence {
    type Item = [f32; 2];

    fn next(&mut self) -> Option<[f32; 2]> {
        let out = [self.a1n as f32, self.a2n as f32];
        add_and_wrap(&mut self.a1n, ALPHA_1);
        add_and_wrap(&mut self.a2n, ALPHA_2);
        Some(out)
    }
}
