//! Point-in-grain tests. All three widths evaluate `dx * dx + dy * dy < r2`
//! with the same operations, so they agree on every input.

use wide::{f32x4, f32x8, CmpLt};

#[inline]
fn hit(cx: f32, cy: f32, r2: f32, tx: f32, ty: f32) -> bool {
    let dx = tx - cx;
    let dy = ty - cy;
    dx * dx + dy * dy < r2
}

pub fn check_scalar(cx: &[f32], cy: &[f32], r2: &[f32], tx: f32, ty: f32) -> bool {
    debug_assert!(cx.len() == cy.len() && cx.len() == r2.len());
    cx.iter()
        .zip(cy)
        .zip(r2)
        .any(|((&x, &y), &r)| hit(x, y, r, tx, ty))
}

pub fn check_x4(cx: &[f32], cy: &[f32], r2: &[f32], tx: f32, ty: f32) -> bool {
    debug_assert!(cx.len() == cy.len() && cx.len() == r2.len());
    let n = cx.len() & !3;
    let vtx = f32x4::splat(tx);
    let vty = f32x4::splat(ty);

    for pos in (0..n).step_by(4) {
        let dx = vtx - f32x4::new(std::array::from_fn(|k| cx[pos + k]));
        let dy = vty - f32x4::new(std::array::from_fn(|k| cy[pos + k]));
        let vr2 = f32x4::new(std::array::from_fn(|k| r2[pos + k]));
        if (dx * dx + dy * dy).cmp_lt(vr2).any() {
            return true;
        }
    }
    check_scalar(&cx[n..], &cy[n..], &r2[n..], tx, ty)
}

pub fn check_x8(cx: &[f32], cy: &[f32], r2: &[f32], tx: f32, ty: f32) -> bool {
    debug_assert!(cx.len() == cy.len() && cx.len() == r2.len());
    let n = cx.len() & !7;
    let vtx = f32x8::splat(tx);
    let vty = f32x8::splat(ty);

    for pos in (0..n).step_by(8) {
        let dx = vtx - f32x8::new(std::array::from_fn(|k| cx[pos + k]));
        let dy = vty - f32x8::new(std::array::from_fn(|k| cy[pos + k]));
        let vr2 = f32x8::new(std::array::from_fn(|k| r2[pos + k]));
        if (dx * dx + dy * dy).cmp_lt(vr2).any() {
            return true;
        }
    }
    check_x4(&cx[n..], &cy[n..], &r2[n..], tx, ty)
}
