use crate::rotation::Rotation3d;
use crate::transform::Transform3d;
use crate::translation::Translation3d;
use crate::twist::Twist3d;
use nalgebra::{Matrix3, Vector3};
use std::fmt;
use std::fmt::{Display, Formatter};
use std::ops::{Add, Sub};

#[cfg(any(test, feature = "approx"))]
use approx::{AbsDiffEq, RelativeEq};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Below this rotation angle (in radians) the SE(3) exponential and logarithm switch to their
/// Taylor expansions.
const SMALL_ANGLE: f64 = 1e-9;

/// The position and orientation of an object, relative to some reference frame.
///
/// Poses are the "where is it" half of the rigid body algebra; [`Transform3d`] is the "how do I
/// get there" half. The two are related through:
///
/// - [`Pose3d::transform_by`] (or `pose + transform`), which moves a pose by a transform
///   expressed in the pose's own frame;
/// - [`Pose3d::minus`] (or `pose - other`), which returns the transform that takes `other` to
///   `pose`; and
/// - [`Pose3d::relative_to`], which re-expresses a pose in the frame of another pose.
///
/// Poses also form a Lie group, so [`Pose3d::exp`] and [`Pose3d::log`] move between poses and
/// [`Twist3d`]s, which in turn gives geodesic [interpolation](Pose3d::interpolate).
///
/// Serialized poses have the `{translation: {x, y, z}, rotation: {quaternion: {W, X, Y, Z}}}`
/// shape that field layout files use.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Pose3d {
    translation: Translation3d,
    rotation: Rotation3d,
}

impl Pose3d {
    #[must_use]
    pub const fn new(translation: Translation3d, rotation: Rotation3d) -> Self {
        Self {
            translation,
            rotation,
        }
    }

    /// The pose at the origin of the reference frame, aligned with its axes.
    #[must_use]
    pub const fn identity() -> Self {
        Self::new(Translation3d::zero(), Rotation3d::identity())
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

    /// Moves this pose by `transform`, which is expressed in this pose's own frame.
    ///
    /// The translation moves along this pose's axes, and the rotation is applied about this
    /// pose's axes, so the resulting orientation is `R_self R_transform`.
    #[doc(alias = "plus")]
    #[must_use]
    pub fn transform_by(&self, transform: &Transform3d) -> Self {
        Self {
            translation: self
                .translation
                .plus(&transform.translation().rotate_by(&self.rotation)),
            rotation: transform.rotation().plus(&self.rotation),
        }
    }

    /// Returns the transform that takes `other` to `self`.
    #[must_use]
    pub fn minus(&self, other: &Self) -> Transform3d {
        Transform3d::from(self.relative_to(other))
    }

    /// Re-expresses this pose in the frame of `other`.
    ///
    /// The result is what this pose looks like to an observer sitting at `other`.
    #[must_use]
    pub fn relative_to(&self, other: &Self) -> Self {
        let transform = Transform3d::between(other, self);
        Self::new(transform.translation(), transform.rotation())
    }

    /// Rotates this pose about the origin of its reference frame.
    #[must_use]
    pub fn rotate_by(&self, rotation: &Rotation3d) -> Self {
        Self::new(
            self.translation.rotate_by(rotation),
            self.rotation.plus(rotation),
        )
    }

    /// Scales the translation and rotation of this pose (the latter along its geodesic).
    #[must_use]
    pub fn times(&self, scalar: f64) -> Self {
        Self::new(self.translation.times(scalar), self.rotation.times(scalar))
    }

    #[must_use]
    pub fn div(&self, scalar: f64) -> Self {
        self.times(1. / scalar)
    }

    /// Follows `twist` from this pose along a constant-velocity screw motion.
    ///
    /// The twist's angular part is a rotation vector and its linear part is integrated through
    /// the left Jacobian of SO(3):
    ///
    /// ```text
    /// J = I + (1 - cos θ)/θ² Ω + (θ - sin θ)/θ³ Ω²
    /// ```
    ///
    /// where `Ω` is the skew-symmetric matrix of the rotation vector and `θ` its norm.
    #[must_use]
    pub fn exp(&self, twist: &Twist3d) -> Self {
        let u = Vector3::new(twist.dx, twist.dy, twist.dz);
        let rvec = Vector3::new(twist.rx, twist.ry, twist.rz);

        let omega = rvec.cross_matrix();
        let omega_sq = omega * omega;
        let theta = rvec.norm();
        let theta_sq = theta * theta;

        let (b, c) = if theta < SMALL_ANGLE {
            (
                0.5 - theta_sq / 24. + theta_sq * theta_sq / 720.,
                1. / 6. - theta_sq / 120. + theta_sq * theta_sq / 5040.,
            )
        } else {
            (
                (1. - theta.cos()) / theta_sq,
                (theta - theta.sin()) / (theta_sq * theta),
            )
        };

        let j = Matrix3::identity() + omega * b + omega_sq * c;
        let transform = Transform3d::new(
            Translation3d::from(j * u),
            Rotation3d::from_rotation_vector(rvec),
        );
        self.transform_by(&transform)
    }

    /// Returns the twist that [`Pose3d::exp`] needs to take this pose to `end`.
    ///
    /// The inverse left Jacobian is
    ///
    /// ```text
    /// J⁻¹ = I - ½ Ω + (1 - A/(2B))/θ² Ω²,    A = sin θ/θ,    B = (1 - cos θ)/θ²
    /// ```
    #[must_use]
    pub fn log(&self, end: &Self) -> Twist3d {
        let transform = end.relative_to(self);
        let rvec = transform.rotation().to_rotation_vector();

        let omega = rvec.cross_matrix();
        let omega_sq = omega * omega;
        let theta = rvec.norm();
        let theta_sq = theta * theta;

        let c = if theta < SMALL_ANGLE {
            1. / 12. + theta_sq / 720. + theta_sq * theta_sq / 30240.
        } else {
            let a = theta.sin() / theta;
            let b = (1. - theta.cos()) / theta_sq;
            (1. - a / (2. * b)) / theta_sq
        };

        let j_inv = Matrix3::identity() - omega * 0.5 + omega_sq * c;
        let u = j_inv * transform.translation().to_vector();

        Twist3d::new(u.x, u.y, u.z, rvec.x, rvec.y, rvec.z)
    }

    /// Interpolates along the geodesic (screw motion) between `self` (at `t = 0`) and `end` (at
    /// `t = 1`).
    #[must_use]
    pub fn interpolate(&self, end: &Self, t: f64) -> Self {
        if t < 0. {
            *self
        } else if t >= 1. {
            *end
        } else {
            self.exp(&(self.log(end) * t))
        }
    }
}

impl From<Transform3d> for Pose3d {
    /// The pose reached by applying `transform` to the origin.
    fn from(transform: Transform3d) -> Self {
        Self::new(transform.translation(), transform.rotation())
    }
}

impl Display for Pose3d {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "Pose3d({}, {})", self.translation, self.rotation)
    }
}

impl Add<Transform3d> for Pose3d {
    type Output = Self;

    fn add(self, rhs: Transform3d) -> Self::Output {
        self.transform_by(&rhs)
    }
}

impl Sub for Pose3d {
    type Output = Transform3d;

    fn sub(self, rhs: Self) -> Self::Output {
        self.minus(&rhs)
    }
}

#[cfg(any(test, feature = "approx"))]
impl AbsDiffEq<Self> for Pose3d {
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
impl RelativeEq for Pose3d {
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

#[cfg(test)]
mod tests {
    use super::Pose3d;
    use crate::rotation::Rotation3d;
    use crate::transform::Transform3d;
    use crate::translation::Translation3d;
    use crate::twist::Twist3d;
    use approx::assert_relative_eq;
    use quickcheck::quickcheck;
    use rstest::rstest;
    use std::f64::consts::PI;
    use uom::si::angle::degree;
    use uom::si::f64::Angle;

    fn d(deg: f64) -> Angle {
        Angle::new::<degree>(deg)
    }

    #[test]
    fn transform_by_moves_in_own_frame() {
        let pose = Pose3d::new(
            Translation3d::new(1., 2., 0.),
            Rotation3d::new(d(0.), d(0.), d(90.)),
        );
        let moved = pose
            + Transform3d::new(
                Translation3d::new(1., 0., 0.),
                Rotation3d::new(d(0.), d(0.), d(90.)),
            );
        assert_relative_eq!(moved.translation(), Translation3d::new(1., 3., 0.), epsilon = 1e-12);
        assert_relative_eq!(moved.rotation(), Rotation3d::new(d(0.), d(0.), d(180.)), epsilon = 1e-12);
    }

    #[test]
    fn transform_by_composes_rotation_on_the_right() {
        // pitch down in the body frame of a yawed pose keeps the yaw
        let pose = Pose3d::new(Translation3d::zero(), Rotation3d::new(d(0.), d(0.), d(90.)));
        let tilted = pose.transform_by(&Transform3d::new(
            Translation3d::zero(),
            Rotation3d::new(d(0.), d(30.), d(0.)),
        ));
        assert_relative_eq!(tilted.rotation(), Rotation3d::new(d(0.), d(30.), d(90.)), epsilon = 1e-12);
        assert_relative_eq!(
            tilted.rotation().to_matrix(),
            pose.rotation().to_matrix() * Rotation3d::new(d(0.), d(30.), d(0.)).to_matrix(),
            epsilon = 1e-12
        );
    }

    #[test]
    fn relative_to_and_minus() {
        let robot = Pose3d::new(
            Translation3d::new(2., 0., 0.),
            Rotation3d::new(d(0.), d(0.), d(180.)),
        );
        let ball = Pose3d::new(Translation3d::new(1., 0.5, 0.), Rotation3d::identity());

        // behind the field origin's x axis means in front of a robot facing backwards
        let seen = ball.relative_to(&robot);
        assert_relative_eq!(seen.translation(), Translation3d::new(1., -0.5, 0.), epsilon = 1e-12);
        assert_relative_eq!(seen.rotation(), Rotation3d::new(d(0.), d(0.), d(180.)), epsilon = 1e-12);

        assert_relative_eq!(robot + (ball - robot), ball, epsilon = 1e-12);
    }

    #[test]
    fn rotate_by_rotates_about_origin() {
        let pose = Pose3d::new(Translation3d::new(1., 0., 0.), Rotation3d::identity());
        let r = Rotation3d::new(d(0.), d(0.), d(90.));
        let rotated = pose.rotate_by(&r);
        assert_relative_eq!(rotated.translation(), Translation3d::new(0., 1., 0.), epsilon = 1e-12);
        assert_relative_eq!(rotated.rotation(), r, epsilon = 1e-12);
    }

    #[test]
    fn exp_of_pure_translation() {
        let pose = Pose3d::new(Translation3d::new(1., 1., 1.), Rotation3d::new(d(0.), d(0.), d(90.)));
        let out = pose.exp(&Twist3d::new(2., 0., 0., 0., 0., 0.));
        assert_relative_eq!(out.translation(), Translation3d::new(1., 3., 1.), epsilon = 1e-12);
        assert_relative_eq!(out.rotation(), pose.rotation(), epsilon = 1e-12);
    }

    #[test]
    fn exp_follows_an_arc() {
        // a quarter circle of radius 1 counterclockwise about +z
        let twist = Twist3d::new(PI / 2., 0., 0., 0., 0., PI / 2.);
        let out = Pose3d::identity().exp(&twist);
        assert_relative_eq!(out.translation(), Translation3d::new(1., 1., 0.), epsilon = 1e-12);
        assert_relative_eq!(out.rotation(), Rotation3d::new(d(0.), d(0.), d(90.)), epsilon = 1e-12);
        assert_relative_eq!(Pose3d::identity().log(&out), twist, epsilon = 1e-12);
    }

    #[rstest]
    #[case(Twist3d::new(0., 0., 0., 0., 0., 0.))]
    #[case(Twist3d::new(1e-12, 0., -1e-12, 1e-13, 0., 0.))]
    #[case(Twist3d::new(0.5, -0.2, 1.1, 0.3, -0.1, 0.7))]
    #[case(Twist3d::new(-3., 0., 0., 0., PI - 1e-4, 0.))]
    fn log_undoes_exp(#[case] twist: Twist3d) {
        let start = Pose3d::new(
            Translation3d::new(0.2, -0.7, 1.5),
            Rotation3d::new(d(5.), d(10.), d(-20.)),
        );
        let end = start.exp(&twist);
        assert_relative_eq!(start.log(&end), twist, epsilon = 1e-9);
    }

    #[test]
    fn interpolate_endpoints() {
        let a = Pose3d::new(Translation3d::new(0., 0., 0.), Rotation3d::identity());
        let b = Pose3d::new(
            Translation3d::new(4., 2., 0.),
            Rotation3d::new(d(0.), d(0.), d(60.)),
        );
        assert_eq!(a.interpolate(&b, -0.5), a);
        assert_eq!(a.interpolate(&b, 1.), b);
        assert_eq!(a.interpolate(&b, 7.), b);

        let mid = a.interpolate(&b, 0.5);
        assert_relative_eq!(mid.rotation(), Rotation3d::new(d(0.), d(0.), d(30.)), epsilon = 1e-12);
        // halfway along the screw, not halfway along the chord
        assert_relative_eq!(a.log(&mid) * 2., a.log(&b), epsilon = 1e-12);
    }

    #[test]
    fn display() {
        let pose = Pose3d::new(
            Translation3d::new(1., 2., 0.5),
            Rotation3d::new(d(10.), d(20.), d(30.)),
        );
        insta::assert_snapshot!(
            pose,
            @"Pose3d(Translation3d(x: 1.0000 m, y: 2.0000 m, z: 0.5000 m), Rotation3d(roll: 10.000°, pitch: 20.000°, yaw: 30.000°))"
        );
    }

    #[cfg(feature = "serde")]
    #[test]
    fn serde_shape() {
        let pose = Pose3d::new(Translation3d::new(1., 2., 3.), Rotation3d::identity());
        insta::assert_snapshot!(serde_yaml::to_string(&pose).expect("serializable"), @r"
        translation:
          x: 1.0
          y: 2.0
          z: 3.0
        rotation:
          quaternion:
            W: 1.0
            X: 0.0
            Y: 0.0
            Z: 0.0
        ");
    }

    quickcheck! {
        fn exp_log_roundtrip(a: Pose3d, b: Pose3d) -> bool {
            approx::relative_eq!(a.exp(&a.log(&b)), b, epsilon = 1e-6)
        }

        fn relative_to_self_is_identity(a: Pose3d) -> bool {
            approx::relative_eq!(a.relative_to(&a), Pose3d::identity(), epsilon = 1e-9)
        }
    }
}
