//! Geometry aliases and spherical helpers.

use nalgebra::{UnitQuaternion, Vector3};

pub type Vec3 = Vector3<f64>;
pub type Quat = UnitQuaternion<f64>;

/// Unit vector for an azimuth/elevation pair in degrees.
///
/// Azimuth 0 points along +x (front), 90 along +y (left); elevation 90 is +z.
#[inline]
pub fn direction_from_degrees(azimuth: f64, elevation: f64) -> Vec3 {
    let (sa, ca) = azimuth.to_radians().sin_cos();
    let (se, ce) = elevation.to_radians().sin_cos();
    Vec3::new(ca * ce, sa * ce, se)
}

/// Azimuth and elevation in degrees of a (not necessarily unit) vector.
///
/// The zero vector maps to `(0, 0)`.
pub fn degrees_from_direction(v: &Vec3) -> (f64, f64) {
    let horizontal = v.x.hypot(v.y);
    if horizontal == 0.0 && v.z == 0.0 {
        return (0.0, 0.0);
    }
    (v.y.atan2(v.x).to_degrees(), v.z.atan2(horizontal).to_degrees())
}

/// Angle in radians between two vectors, robust to rounding past ±1.
#[inline]
pub fn angle_between(a: &Vec3, b: &Vec3) -> f64 {
    let denom = a.norm() * b.norm();
    if denom == 0.0 {
        return 0.0;
    }
    (a.dot(b) / denom).clamp(-1.0, 1.0).acos()
}
