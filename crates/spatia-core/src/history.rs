//! Motion history for smoothing source and listener movement across a block.

use crate::geometry::{Quat, Vec3};
use nalgebra::Quaternion;

/// Depth of [`PositionHistory`].
pub const HISTORY_DEPTH: usize = 4;

/// Shift buffer of the last four block positions, newest first.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionHistory {
    entries: [Vec3; HISTORY_DEPTH],
}

impl PositionHistory {
    /// History where every entry is `position`.
    pub fn filled(position: Vec3) -> Self {
        Self {
            entries: [position; HISTORY_DEPTH],
        }
    }

    #[inline]
    pub fn push(&mut self, position: Vec3) {
        self.entries.copy_within(0..HISTORY_DEPTH - 1, 1);
        self.entries[0] = position;
    }

    pub fn fill(&mut self, position: Vec3) {
        self.entries = [position; HISTORY_DEPTH];
    }

    #[inline]
    pub fn newest(&self) -> &Vec3 {
        &self.entries[0]
    }

    /// Entry `ago` blocks back (0 = newest).
    #[inline]
    pub fn get(&self, ago: usize) -> &Vec3 {
        &self.entries[ago.min(HISTORY_DEPTH - 1)]
    }

    /// Moving average over the history, sliding from the older window
    /// (`alpha == 0`) to the newer one (`alpha == 1`).
    ///
    /// The result lags the newest position by roughly a block and a half but
    /// moves continuously across block boundaries.
    #[inline]
    pub fn blend(&self, alpha: f64) -> Vec3 {
        let [h0, h1, h2, h3] = &self.entries;
        (h3 * (1.0 - alpha) + h2 + h1 + h0 * alpha) / 3.0
    }
}

impl Default for PositionHistory {
    fn default() -> Self {
        Self::filled(Vec3::zeros())
    }
}

/// Sinusoid generated by the two-term recurrence
/// `y[n] = 2cos(w) y[n-1] - y[n-2]`.
///
/// All state lives in the struct; `next` is the only mutation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RecursiveSine {
    mul: f64,
    prev: f64,
    curr: f64,
}

impl RecursiveSine {
    /// Generator whose first output is `sin(phase)` and which then advances by
    /// `increment` radians per call.
    pub fn new(increment: f64, phase: f64) -> Self {
        Self {
            mul: 2.0 * increment.cos(),
            prev: (phase - 2.0 * increment).sin(),
            curr: (phase - increment).sin(),
        }
    }

    #[inline]
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> f64 {
        let value = self.mul * self.curr - self.prev;
        self.prev = self.curr;
        self.curr = value;
        value
    }
}

/// Fill `out` with orientations slerped from `from` to `to`.
///
/// Frame `i` sits at `t = (i + 1) / out.len()`, so the last frame equals `to`
/// and consecutive blocks join without a repeated frame.
pub fn slerp_buffer(from: &Quat, to: &Quat, out: &mut [Quat]) {
    let n = out.len();
    if n == 0 {
        return;
    }
    let a = from.quaternion();
    let mut b = *to.quaternion();
    let mut cos_theta = a.dot(&b);
    if cos_theta < 0.0 {
        b = -b;
        cos_theta = -cos_theta;
    }

    let step = 1.0 / n as f64;
    if cos_theta > 0.9995 {
        for (i, q) in out.iter_mut().enumerate() {
            let t = (i + 1) as f64 * step;
            *q = Quat::new_normalize(a * (1.0 - t) + b * t);
        }
        return;
    }

    let theta = cos_theta.acos();
    let inv_sin = 1.0 / theta.sin();
    let dtheta = theta * step;
    let mut from_weight = RecursiveSine::new(-dtheta, theta - dtheta);
    let mut to_weight = RecursiveSine::new(dtheta, dtheta);
    for q in out.iter_mut() {
        let wa = from_weight.next() * inv_sin;
        let wb = to_weight.next() * inv_sin;
        let mixed: Quaternion<f64> = a * wa + b * wb;
        *q = Quat::new_normalize(mixed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_push_shifts_oldest_out() {
        let mut h = PositionHistory::filled(Vec3::zeros());
        for i in 1..=5 {
            h.push(Vec3::new(i as f64, 0.0, 0.0));
        }
        assert_eq!(h.newest().x, 5.0);
        assert_eq!(h.get(3).x, 2.0);
        assert_eq!(h.get(10).x, 2.0);
    }

    #[test]
    fn test_blend_of_constant_history_is_constant() {
        let p = Vec3::new(1.0, -2.0, 3.0);
        let h = PositionHistory::filled(p);
        assert!((h.blend(0.0) - p).norm() < 1e-12);
        assert!((h.blend(0.7) - p).norm() < 1e-12);
    }

    #[test]
    fn test_blend_is_continuous_across_push() {
        let mut h = PositionHistory::filled(Vec3::zeros());
        h.push(Vec3::new(3.0, 0.0, 0.0));
        let end = h.blend(1.0);
        h.push(Vec3::new(6.0, 0.0, 0.0));
        let start = h.blend(0.0);
        assert!((end - start).norm() < 1e-12, "end={:?} start={:?}", end, start);
    }

    #[test]
    fn test_recursive_sine_matches_sin() {
        let mut osc = RecursiveSine::new(0.1, 0.3);
        for k in 0..200 {
            let expected = (0.3 + 0.1 * k as f64).sin();
            let got = osc.next();
            assert!((got - expected).abs() < 1e-9, "k={} got={} expected={}", k, got, expected);
        }
    }

    #[test]
    fn test_slerp_buffer_ends_at_target() {
        let from = Quat::identity();
        let to = Quat::from_axis_angle(&Vec3::z_axis(), 1.2);
        let mut out = [Quat::identity(); 64];
        slerp_buffer(&from, &to, &mut out);
        assert!(out[63].angle_to(&to) < 1e-9);
        // evenly spaced angles
        assert!((out[31].angle_to(&from) - 0.6).abs() < 1e-9);
    }

    #[test]
    fn test_slerp_buffer_takes_short_path() {
        let from = Quat::from_axis_angle(&Vec3::z_axis(), 0.1);
        let to = Quat::new_normalize(-Quat::from_axis_angle(&Vec3::z_axis(), 0.3).into_inner());
        let mut out = [Quat::identity(); 8];
        slerp_buffer(&from, &to, &mut out);
        for q in &out {
            assert!(q.angle_to(&from) <= 0.2 + 1e-9);
        }
    }

    proptest! {
        #[test]
        fn prop_slerp_frames_are_unit(angle in -3.0f64..3.0, n in 1usize..512) {
            let to = Quat::from_axis_angle(&Vec3::y_axis(), angle);
            let mut out = vec![Quat::identity(); n];
            slerp_buffer(&Quat::identity(), &to, &mut out);
            for q in &out {
                prop_assert!((q.quaternion().norm() - 1.0).abs() < 1e-9);
            }
            prop_assert!(out[n - 1].angle_to(&to) < 1e-6);
        }
    }
}
