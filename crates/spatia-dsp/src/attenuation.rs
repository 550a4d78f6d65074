//! Distance attenuation laws.

use crate::{Error, Result};

/// How gain falls off between the near and far clip distances.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AttenuationLaw {
    /// Unity gain at every distance.
    None,
    /// Straight line from 1 at `near` to `far_bias` at `far`.
    Linear,
    /// `1/d` style roll-off reaching 0.25 at `far`.
    #[default]
    Inverse,
    /// `1/d²` style roll-off reaching 0.0625 at `far`.
    InverseSquare,
}

/// Gain as a function of source distance.
///
/// Distances are clamped to `[near, far]`, so a source inside the near clip
/// plays at unity and one beyond the far clip holds the far-clip gain.
#[derive(Debug, Clone, PartialEq)]
pub struct DistanceAttenuation {
    law: AttenuationLaw,
    near: f64,
    far: f64,
    far_bias: f64,
    scale: f64,
}

impl Default for DistanceAttenuation {
    fn default() -> Self {
        let mut atten = Self {
            law: AttenuationLaw::Inverse,
            near: 0.1,
            far: 20.0,
            far_bias: 0.0,
            scale: 0.0,
        };
        atten.update_scale();
        atten
    }
}

impl DistanceAttenuation {
    pub fn new(near: f64, far: f64, law: AttenuationLaw, far_bias: f64) -> Result<Self> {
        if !(near > 0.0 && far > near && far.is_finite()) {
            return Err(Error::InvalidParameter(format!(
                "clip distances must satisfy 0 < near < far (near={}, far={})",
                near, far
            )));
        }
        if !(0.0..=1.0).contains(&far_bias) {
            return Err(Error::InvalidParameter(format!(
                "far_bias {} out of range (0-1)",
                far_bias
            )));
        }
        let mut atten = Self {
            law,
            near,
            far,
            far_bias,
            scale: 0.0,
        };
        atten.update_scale();
        Ok(atten)
    }

    fn update_scale(&mut self) {
        let (near, far) = (self.near, self.far);
        self.scale = match self.law {
            AttenuationLaw::None => 0.0,
            AttenuationLaw::Linear => (1.0 - self.far_bias) / (far - near),
            AttenuationLaw::Inverse => (near / 0.25 - near) / (far - near),
            AttenuationLaw::InverseSquare => {
                let near2 = near * near;
                (near2 / 0.0625 - near2) / (far * far - near2)
            }
        };
    }

    pub fn law(&self) -> AttenuationLaw {
        self.law
    }

    pub fn near(&self) -> f64 {
        self.near
    }

    pub fn far(&self) -> f64 {
        self.far
    }

    pub fn far_bias(&self) -> f64 {
        self.far_bias
    }

    pub fn set_law(&mut self, law: AttenuationLaw) {
        self.law = law;
        self.update_scale();
    }

    /// Gain for a source `distance` meters away.
    #[inline]
    pub fn gain(&self, distance: f64) -> f64 {
        let d = distance.clamp(self.near, self.far);
        match self.law {
            AttenuationLaw::None => 1.0,
            AttenuationLaw::Linear => 1.0 - self.scale * (d - self.near),
            AttenuationLaw::Inverse => self.near / (self.near + self.scale * (d - self.near)),
            AttenuationLaw::InverseSquare => {
                let near2 = self.near * self.near;
                near2 / (near2 + self.scale * (d * d - near2))
            }
        }
    }
}
