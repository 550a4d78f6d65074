//! Speaker pairs and triangles with their inverted basis.

use nalgebra::Matrix3;
use spatia_core::{angle_between, Vec3};

/// Minimum ratio of spanned volume to summed edge angle for a usable basis.
pub(crate) const MIN_VOLUME_TO_LENGTH_RATIO: f64 = 0.01;
const MIN_LENGTH: f64 = 1e-5;

/// Two (horizontal panning) or three (periphonic panning) speakers whose
/// directions form an invertible basis.
#[derive(Debug, Clone, PartialEq)]
pub struct SpeakerTriple {
    indices: [usize; 3],
    len: usize,
    directions: [Vec3; 3],
    inverse: Matrix3<f64>,
}

impl SpeakerTriple {
    /// Triangle of speakers `a`, `b`, `c`, or `None` if the directions are
    /// coplanar with the origin or the triangle is too thin to pan across.
    pub fn triangle(directions: &[Vec3], a: usize, b: usize, c: usize) -> Option<Self> {
        let (la, lb, lc) = (
            directions.get(a)?.normalize(),
            directions.get(b)?.normalize(),
            directions.get(c)?.normalize(),
        );
        let triple = Self {
            indices: [a, b, c],
            len: 3,
            directions: [la, lb, lc],
            inverse: Matrix3::from_columns(&[la, lb, lc]).try_inverse()?,
        };
        (triple.volume_to_length_ratio() >= MIN_VOLUME_TO_LENGTH_RATIO).then_some(triple)
    }

    /// Pair of speakers panned on the horizontal plane.
    ///
    /// Directions are flattened to the plane before inversion; `None` if the two
    /// speakers are (nearly) opposite or coincident.
    pub fn pair(directions: &[Vec3], a: usize, b: usize) -> Option<Self> {
        let flat = |v: &Vec3| {
            let f = Vec3::new(v.x, v.y, 0.0);
            (f.norm() > 1e-9).then(|| f.normalize())
        };
        let la = flat(directions.get(a)?)?;
        let lb = flat(directions.get(b)?)?;
        let area = la.cross(&lb).norm();
        let length = angle_between(&la, &lb);
        if length <= MIN_LENGTH || area / length < MIN_VOLUME_TO_LENGTH_RATIO {
            return None;
        }
        let basis = Matrix3::from_columns(&[la, lb, Vec3::z()]);
        Some(Self {
            indices: [a, b, usize::MAX],
            len: 2,
            directions: [la, lb, Vec3::zeros()],
            inverse: basis.try_inverse()?,
        })
    }

    /// Speaker indices (two or three) into the layout.
    #[inline]
    pub fn speakers(&self) -> &[usize] {
        &self.indices[..self.len]
    }

    #[inline]
    pub fn is_pair(&self) -> bool {
        self.len == 2
    }

    #[inline]
    pub fn contains(&self, speaker: usize) -> bool {
        self.speakers().contains(&speaker)
    }

    /// Unit direction of each vertex (flattened for pairs).
    #[inline]
    pub fn directions(&self) -> &[Vec3] {
        &self.directions[..self.len]
    }

    /// Unnormalized gains placing `direction` in this basis. For pairs the
    /// vertical component is ignored and the third gain is zero.
    #[inline]
    pub fn gains(&self, direction: &Vec3) -> Vec3 {
        if self.is_pair() {
            let mut g = self.inverse * Vec3::new(direction.x, direction.y, 0.0);
            g.z = 0.0;
            g
        } else {
            self.inverse * direction
        }
    }

    /// `|(a × b) · c|` over the sum of the vertex-to-vertex angles.
    pub(crate) fn volume_to_length_ratio(&self) -> f64 {
        let [a, b, c] = &self.directions;
        let volume = a.cross(b).dot(c).abs();
        let length = angle_between(a, b) + angle_between(a, c) + angle_between(b, c);
        if length > MIN_LENGTH {
            volume / length
        } else {
            0.0
        }
    }

    /// Edges as `(speaker, speaker, direction, direction)`.
    pub(crate) fn edges(&self) -> impl Iterator<Item = (usize, usize, Vec3, Vec3)> + '_ {
        let n = self.len;
        (0..n).map(move |i| {
            let j = (i + 1) % n;
            (
                self.indices[i],
                self.indices[j],
                self.directions[i],
                self.directions[j],
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use spatia_core::direction_from_degrees;

    fn dirs(angles: &[(f64, f64)]) -> Vec<Vec3> {
        angles
            .iter()
            .map(|&(az, el)| direction_from_degrees(az, el))
            .collect()
    }

    #[test]
    fn test_triangle_gains_reproduce_vertices() {
        let d = dirs(&[(0.0, 0.0), (90.0, 0.0), (0.0, 90.0)]);
        let t = SpeakerTriple::triangle(&d, 0, 1, 2).unwrap();
        for (i, v) in d.iter().enumerate() {
            let g = t.gains(v);
            for k in 0..3 {
                let expected = if k == i { 1.0 } else { 0.0 };
                assert!((g[k] - expected).abs() < 1e-12, "vertex {} gains {:?}", i, g);
            }
        }
    }

    #[test]
    fn test_coplanar_triangle_rejected() {
        let d = dirs(&[(0.0, 0.0), (90.0, 0.0), (180.0, 0.0)]);
        assert!(SpeakerTriple::triangle(&d, 0, 1, 2).is_none());
    }

    #[test]
    fn test_thin_triangle_rejected() {
        let d = dirs(&[(0.0, 0.0), (0.3, 0.0), (0.15, 0.2)]);
        assert!(SpeakerTriple::triangle(&d, 0, 1, 2).is_none());
    }

    #[test]
    fn test_pair_ignores_elevation() {
        let d = dirs(&[(-45.0, 0.0), (45.0, 0.0)]);
        let p = SpeakerTriple::pair(&d, 0, 1).unwrap();
        let g = p.gains(&direction_from_degrees(0.0, 30.0));
        assert!((g[0] - g[1]).abs() < 1e-12);
        assert_eq!(g[2], 0.0);
        assert_eq!(p.speakers(), &[0, 1]);
    }

    #[test]
    fn test_opposite_pair_rejected() {
        let d = dirs(&[(0.0, 0.0), (180.0, 0.0)]);
        assert!(SpeakerTriple::pair(&d, 0, 1).is_none());
        assert!(SpeakerTriple::pair(&d, 0, 5).is_none());
    }
}
