//! Interpolation kernels.

/// Linear interpolation between `x` (at 0) and `y` (at 1).
#[inline]
pub fn linear(frac: f32, x: f32, y: f32) -> f32 {
    x + (y - x) * frac
}

/// Four-point cubic (Catmull-Rom) interpolation between `x` and `y`.
///
/// `w` precedes `x` and `z` follows `y`. Returns exactly `x` at `frac == 0`.
#[inline]
pub fn cubic(frac: f32, w: f32, x: f32, y: f32, z: f32) -> f32 {
    let c1 = (y - w) * 0.5;
    let c3 = (x - y) * 1.5 + (z - w) * 0.5;
    let c2 = w - x + c1 - c3;
    ((c3 * frac + c2) * frac + c1) * frac + x
}
