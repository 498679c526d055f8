//! Angle newtypes, so that degrees reported by capture hardware don't get fed into trigonometry
//! by accident.

use serde::Deserialize;
use std::f32::consts::PI;

/// An angle in degrees.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Deserialize)]
#[serde(transparent)]
pub struct Degrees(pub f32);

/// An angle in radians.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Deserialize)]
#[serde(transparent)]
pub struct Radians(pub f32);

impl Degrees {
    #[inline]
    pub fn to_radians(self) -> Radians {
        Radians(self.0 * PI / 180.0)
    }

    #[inline]
    pub fn half(self) -> Self {
        Self(self.0 * 0.5)
    }
}

impl Radians {
    #[inline]
    pub fn to_degrees(self) -> Degrees {
        Degrees(self.0 * 180.0 / PI)
    }

    #[inline]
    pub fn tan(self) -> f32 {
        self.0.tan()
    }
}

impl From<Degrees> for Radians {
    fn from(value: Degrees) -> Self {
        value.to_radians()
    }
}

impl From<Radians> for Degrees {
    fn from(value: Radians) -> Self {
        value.to_degrees()
    }
}
