use crate::pose::Pose3d;
use crate::rotation::Rotation3d;
use crate::translation::Translation3d;
use std::fmt;
use std::fmt::{Display, Formatter};
use std::ops::{Add, Div, Mul, Neg};

#[cfg(any(test, feature = "approx"))]
use approx::{AbsDiffEq, RelativeEq};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A rigid body transform, ie, the displacement from one pose to another expressed in the frame
/// of the first pose.
///
/// Where a [`Pose3d`] says "where something is", a `Transform3d` says "how to get from here to
/// there". Applying a transform to a pose (see [`Pose3d::transform_by`]) moves the pose by the
/// transform's translation _in the pose's own frame_, and then rotates it by the transform's
/// rotation, also in the pose's own frame.
///
/// For example, a camera mounted 30 cm ahead of and 50 cm above a robot's center, pitched up by
/// 15°, is described by the robot-to-camera transform
/// `Transform3d::new(Translation3d::new(0.3, 0., 0.5), Rotation3d::new(0°, -15°, 0°))`, and the
/// camera's pose on the field is `robot_pose.transform_by(&robot_to_camera)`.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Transform3d {
    translation: Translation3d,
    rotation: Rotation3d,
}

impl Transform3d {
    #[must_use]
    pub const fn new(translation: Translation3d, rotation: Rotation3d) -> Self {
        Self {
            translation,
            rotation,
        }
    }

    #[must_use]
    pub const fn identity() -> Self {
        Self::new(Translation3d::zero(), Rotation3d::identity())
    }

    /// Constructs the transform that takes `initial` to `last`, so that
    /// `initial.transform_by(&Transform3d::between(initial, last)) == last`.
    #[must_use]
    pub fn between(initial: &Pose3d, last: &Pose3d) -> Self {
        Self {
            translation: last
                .translation()
                .minus(&initial.translation())
                .rotate_by(&initial.rotation().unary_minus()),
            rotation: last.rotation().minus(&initial.rotation()),
        }
    }

    #[must_use]
    pub fn translation(&self) -> Translation3d {
        self.translation
    }

    #[must_use]
    pub fn rotation(&self) -> Rotation3d {
        self.rotation
    }

    #[must_use]
    pub fn x(&self) -> f64 {
        self.translation.x()
    }

    #[must_use]
    pub fn y(&self) -> f64 {
        self.translation.y()
    }

    #[must_use]
    pub fn z(&self) -> f64 {
        self.translation.z()
    }

    /// Returns the transform that undoes this one.
    #[must_use]
    pub fn inverse(&self) -> Self {
        // (t, R)⁻¹ = (-Rᵀt, Rᵀ)
        let inverse_rotation = self.rotation.unary_minus();
        Self {
            translation: self
                .translation
                .unary_minus()
                .rotate_by(&inverse_rotation),
            rotation: inverse_rotation,
        }
    }

    /// Composes two transforms: the result is `self` followed by `other`, with `other` expressed
    /// in the frame `self` leads to.
    #[must_use]
    pub fn plus(&self, other: &Self) -> Self {
        let origin = Pose3d::identity();
        Self::between(&origin, &origin.transform_by(self).transform_by(other))
    }

    /// Scales both parts of this transform (the rotation along its geodesic).
    #[must_use]
    pub fn times(&self, scalar: f64) -> Self {
        Self::new(self.translation.times(scalar), self.rotation.times(scalar))
    }

    #[must_use]
    pub fn div(&self, scalar: f64) -> Self {
        self.times(1. / scalar)
    }

    pub(crate) fn is_finite(&self) -> bool {
        let q = self.rotation.quaternion();
        self.translation.is_finite()
            && q.w().is_finite()
            && q.x().is_finite()
            && q.y().is_finite()
            && q.z().is_finite()
    }
}

impl From<Pose3d> for Transform3d {
    /// The transform from the origin to `pose`.
    fn from(pose: Pose3d) -> Self {
        Self::new(pose.translation(), pose.rotation())
    }
}

impl Display for Transform3d {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "Transform3d({}, {})", self.translation, self.rotation)
    }
}

impl Add for Transform3d {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        self.plus(&rhs)
    }
}

impl Neg for Transform3d {
    type Output = Self;

    fn neg(self) -> Self::Output {
        self.inverse()
    }
}

impl Mul<f64> for Transform3d {
    type Output = Self;

    fn mul(self, rhs: f64) -> Self::Output {
        self.times(rhs)
    }
}

impl Div<f64> for Transform3d {
    type Output = Self;

    fn div(self, rhs: f64) -> Self::Output {
        Transform3d::div(&self, rhs)
    }
}

#[cfg(any(test, feature = "approx"))]
impl AbsDiffEq<Self> for Transform3d {
    type Epsilon = <f64 as AbsDiffEq>::Epsilon;

    fn default_epsilon() -> Self::Epsilon {
        f64::default_epsilon()
    }

    fn abs_diff_eq(&self, other: &Self, epsilon: Self::Epsilon) -> bool {
        self.translation.abs_diff_eq(&other.translation, epsilon)
            && self.rotation.abs_diff_eq(&other.rotation, epsilon)
    }
}

#[cfg(any(test, feature = "approx"))]
impl RelativeEq for Transform3d {
    fn default_max_relative() -> Self::Epsilon {
        f64::default_max_relative()
    }

    fn relative_eq(
        &self,
        other: &Self,
        epsilon: Self::Epsilon,
        max_relative: Self::Epsilon,
    ) -> bool {
        self.translation
            .relative_eq(&other.translation, epsilon, max_relative)
            && self
                .rotation
                .relative_eq(&other.rotation, epsilon, max_relative)
    }
}
