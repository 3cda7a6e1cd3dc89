use crate::rotation::Rotation3d;
use nalgebra::Vector3;
use std::fmt;
use std::fmt::{Display, Formatter};
use std::ops::{Add, Div, Mul, Neg, Sub};
use uom::si::f64::Length;
use uom::si::length::meter;

#[cfg(any(test, feature = "approx"))]
use approx::{AbsDiffEq, RelativeEq};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A translation (or position) in 3D space, in meters.
///
/// Translations are plain vectors: they add component-wise, scale by scalars, and rotate by
/// quaternion conjugation (see [`Translation3d::rotate_by`]). Which frame the components are
/// expressed in is up to the surrounding type (eg, [`Pose3d`](crate::Pose3d) or
/// [`Transform3d`](crate::Transform3d)).
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Translation3d {
    x: f64,
    y: f64,
    z: f64,
}

impl Translation3d {
    /// Constructs a translation from components in meters.
    #[must_use]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    #[must_use]
    pub const fn zero() -> Self {
        Self::new(0., 0., 0.)
    }

    /// Constructs a translation from typed lengths.
    #[must_use]
    pub fn from_lengths(x: impl Into<Length>, y: impl Into<Length>, z: impl Into<Length>) -> Self {
        Self::new(
            x.into().get::<meter>(),
            y.into().get::<meter>(),
            z.into().get::<meter>(),
        )
    }

    #[must_use]
    pub fn x(&self) -> f64 {
        self.x
    }

    #[must_use]
    pub fn y(&self) -> f64 {
        self.y
    }

    #[must_use]
    pub fn z(&self) -> f64 {
        self.z
    }

    /// Euclidean length of this translation.
    #[must_use]
    pub fn norm(&self) -> Length {
        Length::new::<meter>(self.to_vector().norm())
    }

    /// Euclidean distance between two positions.
    #[must_use]
    pub fn distance(&self, other: &Self) -> Length {
        self.minus(other).norm()
    }

    /// Rotates this translation by `rotation`, ie, `q (0, t) q⁻¹`.
    #[must_use]
    pub fn rotate_by(&self, rotation: &Rotation3d) -> Self {
        Self::from(rotation.rotate_vector(&self.to_vector()))
    }

    #[must_use]
    pub fn plus(&self, other: &Self) -> Self {
        Self::new(self.x + other.x, self.y + other.y, self.z + other.z)
    }

    #[must_use]
    pub fn minus(&self, other: &Self) -> Self {
        Self::new(self.x - other.x, self.y - other.y, self.z - other.z)
    }

    #[must_use]
    pub fn unary_minus(&self) -> Self {
        Self::new(-self.x, -self.y, -self.z)
    }

    #[must_use]
    pub fn times(&self, scalar: f64) -> Self {
        Self::new(self.x * scalar, self.y * scalar, self.z * scalar)
    }

    #[must_use]
    pub fn div(&self, scalar: f64) -> Self {
        self.times(1. / scalar)
    }

    /// Linearly interpolates between `self` (at `t = 0`) and `end` (at `t = 1`).
    ///
    /// `t` is clamped to `[0, 1]`.
    #[must_use]
    pub fn interpolate(&self, end: &Self, t: f64) -> Self {
        self.plus(&end.minus(self).times(t.clamp(0., 1.)))
    }

    #[must_use]
    pub fn to_vector(&self) -> Vector3<f64> {
        Vector3::new(self.x, self.y, self.z)
    }

    pub(crate) fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

impl From<Vector3<f64>> for Translation3d {
    fn from(v: Vector3<f64>) -> Self {
        Self::new(v.x, v.y, v.z)
    }
}

impl From<Translation3d> for Vector3<f64> {
    fn from(t: Translation3d) -> Self {
        t.to_vector()
    }
}

impl Display for Translation3d {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Translation3d(x: {:.4} m, y: {:.4} m, z: {:.4} m)",
            self.x, self.y, self.z
        )
    }
}

impl Add for Translation3d {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        self.plus(&rhs)
    }
}

impl Sub for Translation3d {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        self.minus(&rhs)
    }
}

impl Neg for Translation3d {
    type Output = Self;

    fn neg(self) -> Self::Output {
        self.unary_minus()
    }
}

impl Mul<f64> for Translation3d {
    type Output = Self;

    fn mul(self, rhs: f64) -> Self::Output {
        self.times(rhs)
    }
}

impl Div<f64> for Translation3d {
    type Output = Self;

    fn div(self, rhs: f64) -> Self::Output {
        Translation3d::div(&self, rhs)
    }
}

#[cfg(any(test, feature = "approx"))]
impl AbsDiffEq<Self> for Translation3d {
    type Epsilon = <f64 as AbsDiffEq>::Epsilon;

    fn default_epsilon() -> Self::Epsilon {
        f64::default_epsilon()
    }

    fn abs_diff_eq(&self, other: &Self, epsilon: Self::Epsilon) -> bool {
        self.to_vector().abs_diff_eq(&other.to_vector(), epsilon)
    }
}

#[cfg(any(test, feature = "approx"))]
impl RelativeEq for Translation3d {
    fn default_max_relative() -> Self::Epsilon {
        f64::default_max_relative()
    }

    fn relative_eq(
        &self,
        other: &Self,
        epsilon: Self::Epsilon,
        max_relative: Self::Epsilon,
    ) -> bool {
        self.to_vector()
            .relative_eq(&other.to_vector(), epsilon, max_relative)
    }
}
