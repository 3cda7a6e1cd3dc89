use std::ops::Mul;

#[cfg(any(test, feature = "approx"))]
use approx::{AbsDiffEq, RelativeEq};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A change in pose expressed in the tangent space of SE(3).
///
/// `(dx, dy, dz)` is the linear part in meters and `(rx, ry, rz)` is the angular part as a
/// rotation vector in radians, both in the frame of the pose the twist is applied to. See
/// [`Pose3d::exp`](crate::Pose3d::exp) and [`Pose3d::log`](crate::Pose3d::log).
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Twist3d {
    pub dx: f64,
    pub dy: f64,
    pub dz: f64,
    pub rx: f64,
    pub ry: f64,
    pub rz: f64,
}

impl Twist3d {
    #[must_use]
    pub const fn new(dx: f64, dy: f64, dz: f64, rx: f64, ry: f64, rz: f64) -> Self {
        Self {
            dx,
            dy,
            dz,
            rx,
            ry,
            rz,
        }
    }
}

impl Mul<f64> for Twist3d {
    type Output = Self;

    fn mul(self, rhs: f64) -> Self::Output {
        Self::new(
            self.dx * rhs,
            self.dy * rhs,
            self.dz * rhs,
            self.rx * rhs,
            self.ry * rhs,
            self.rz * rhs,
        )
    }
}

#[cfg(any(test, feature = "approx"))]
impl Twist3d {
    fn components(&self) -> [f64; 6] {
        [self.dx, self.dy, self.dz, self.rx, self.ry, self.rz]
    }
}

#[cfg(any(test, feature = "approx"))]
impl AbsDiffEq<Self> for Twist3d {
    type Epsilon = <f64 as AbsDiffEq>::Epsilon;

    fn default_epsilon() -> Self::Epsilon {
        f64::default_epsilon()
    }

    fn abs_diff_eq(&self, other: &Self, epsilon: Self::Epsilon) -> bool {
        self.components()
            .iter()
            .zip(other.components().iter())
            .all(|(a, b)| a.abs_diff_eq(b, epsilon))
    }
}

#[cfg(any(test, feature = "approx"))]
impl RelativeEq for Twist3d {
    fn default_max_relative() -> Self::Epsilon {
        f64::default_max_relative()
    }

    fn relative_eq(
        &self,
        other: &Self,
        epsilon: Self::Epsilon,
        max_relative: Self::Epsilon,
    ) -> bool {
        self.components()
            .iter()
            .zip(other.components().iter())
            .all(|(a, b)| a.relative_eq(b, epsilon, max_relative))
    }
}
