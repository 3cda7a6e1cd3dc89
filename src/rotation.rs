use crate::error::RotationError;
use crate::quaternion::Quaternion;
use nalgebra::{Matrix3, Vector3};
use std::fmt;
use std::fmt::{Display, Formatter};
use std::ops::{Add, Div, Mul, Neg, Sub};
use uom::si::angle::{degree, radian};
use uom::si::f64::Angle;

#[cfg(any(test, feature = "approx"))]
use approx::{AbsDiffEq, RelativeEq};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A rotation in 3D space, ie, an element of SO(3).
///
/// Mathematically speaking, this is a wrapper around a [unit quaternion] that acts on vectors
/// through conjugation (`v' = q v q⁻¹`). All constructors normalize the quaternion they store.
///
/// <div class="warning">
///
/// Rotations compose with [`Rotation3d::plus`] (or `+`), and the order of the operands matters.
/// `a.plus(b)` first applies `a` and then applies `b`, both about the axes of the fixed reference
/// frame. In quaternion terms that is `q_b * q_a`, or `R_b R_a` for the equivalent rotation
/// matrices. Composition is associative but _not_ commutative.
///
/// </div>
///
/// Equality is defined on the manifold: two rotations are equal when their quaternions satisfy
/// `|q1 · q2| > 1 - 1e-9`, which treats `q` and `-q` as the same rotation.
///
/// [unit quaternion]: https://en.wikipedia.org/wiki/Versor
#[derive(Clone, Copy, Debug, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
// deserialized quaternions are renormalized on the way in
#[cfg_attr(feature = "serde", serde(from = "SerializedRotation"))]
pub struct Rotation3d {
    quaternion: Quaternion,
}

#[cfg(feature = "serde")]
#[derive(Deserialize)]
struct SerializedRotation {
    quaternion: Quaternion,
}

#[cfg(feature = "serde")]
impl From<SerializedRotation> for Rotation3d {
    fn from(value: SerializedRotation) -> Self {
        Self::from_quaternion(value.quaternion)
    }
}

impl Rotation3d {
    /// The rotation that does nothing.
    #[must_use]
    pub const fn identity() -> Self {
        Self {
            quaternion: Quaternion::identity(),
        }
    }

    /// Wraps a quaternion that the caller guarantees to be unit-norm.
    pub(crate) const fn from_unit_quaternion(quaternion: Quaternion) -> Self {
        Self { quaternion }
    }

    /// Constructs a rotation from a quaternion, normalizing it first.
    ///
    /// A zero quaternion has no meaningful rotation associated with it and yields the identity.
    #[must_use]
    pub fn from_quaternion(quaternion: Quaternion) -> Self {
        Self {
            quaternion: quaternion.normalize(),
        }
    }

    /// Constructs a rotation from extrinsic roll, pitch, and yaw angles.
    ///
    /// Roll is rotation about the X axis, pitch about the Y axis, and yaw about the Z axis, all of
    /// the fixed reference frame and applied in that order. This is equivalent to intrinsic
    /// rotations in the order yaw, pitch, roll.
    ///
    /// To determine the direction of rotation, use the [right-hand rule][rhrot].
    ///
    /// [rhrot]: https://en.wikipedia.org/wiki/Right-hand_rule#Rotations
    #[doc(alias = "from_rpy")]
    #[must_use]
    pub fn new(roll: impl Into<Angle>, pitch: impl Into<Angle>, yaw: impl Into<Angle>) -> Self {
        let roll = roll.into().get::<radian>();
        let pitch = pitch.into().get::<radian>();
        let yaw = yaw.into().get::<radian>();

        // https://en.wikipedia.org/wiki/Conversion_between_quaternions_and_Euler_angles#Euler_angles_(in_3-2-1_sequence)_to_quaternion_conversion
        let (sr, cr) = (roll * 0.5).sin_cos();
        let (sp, cp) = (pitch * 0.5).sin_cos();
        let (sy, cy) = (yaw * 0.5).sin_cos();

        Self::from_quaternion(Quaternion::new(
            cr * cp * cy + sr * sp * sy,
            sr * cp * cy - cr * sp * sy,
            cr * sp * cy + sr * cp * sy,
            cr * cp * sy - sr * sp * cy,
        ))
    }

    /// Constructs a rotation of `angle` about `axis` (right-handed).
    ///
    /// The axis does not need to be normalized. A zero axis has no direction to rotate about, so
    /// the identity is returned.
    #[must_use]
    pub fn from_axis_angle(axis: Vector3<f64>, angle: impl Into<Angle>) -> Self {
        let norm = axis.norm();
        if norm == 0. {
            return Self::identity();
        }

        let angle = angle.into().get::<radian>();
        let v = axis / norm * (angle / 2.).sin();
        Self::from_quaternion(Quaternion::new((angle / 2.).cos(), v.x, v.y, v.z))
    }

    /// Constructs a rotation from a rotation vector, ie, the rotation axis scaled by the rotation
    /// angle in radians (also known as a Rodrigues vector).
    #[must_use]
    pub fn from_rotation_vector(rvec: Vector3<f64>) -> Self {
        Self::from_quaternion(Quaternion::from_rotation_vector([rvec.x, rvec.y, rvec.z]))
    }

    /// Constructs a rotation from a 3×3 [direction cosine matrix][dcm].
    ///
    /// Fails if the matrix is not special orthogonal (ie, `R Rᵀ ≠ I` or `det R ≠ 1`).
    ///
    /// [dcm]: https://en.wikipedia.org/wiki/Rotation_matrix
    pub fn from_matrix(matrix: &Matrix3<f64>) -> Result<Self, RotationError> {
        let orthogonality = (matrix * matrix.transpose() - Matrix3::identity()).norm();
        if !(orthogonality <= 1e-9) {
            return Err(RotationError::NotOrthogonal { orthogonality });
        }
        let determinant = matrix.determinant();
        if (determinant - 1.).abs() > 1e-9 {
            return Err(RotationError::NotProper { determinant });
        }
        Ok(Self::from_matrix_unchecked(matrix))
    }

    /// Converts a matrix that is already known to be a rotation (eg, projected onto SO(3) with an
    /// SVD) without validating it.
    pub(crate) fn from_matrix_unchecked(m: &Matrix3<f64>) -> Self {
        // Shepperd's method: pick the branch with the largest divisor so that traces near -1
        // (rotations by close to 180°) stay well conditioned.
        let trace = m[(0, 0)] + m[(1, 1)] + m[(2, 2)];
        let q = if trace > 0. {
            let b1 = 0.5 * (1. + trace).sqrt();
            Quaternion::new(
                b1,
                (m[(2, 1)] - m[(1, 2)]) / (4. * b1),
                (m[(0, 2)] - m[(2, 0)]) / (4. * b1),
                (m[(1, 0)] - m[(0, 1)]) / (4. * b1),
            )
        } else if m[(0, 0)] > m[(1, 1)] && m[(0, 0)] > m[(2, 2)] {
            let s = 2. * (1. + m[(0, 0)] - m[(1, 1)] - m[(2, 2)]).sqrt();
            Quaternion::new(
                (m[(2, 1)] - m[(1, 2)]) / s,
                0.25 * s,
                (m[(0, 1)] + m[(1, 0)]) / s,
                (m[(0, 2)] + m[(2, 0)]) / s,
            )
        } else if m[(1, 1)] > m[(2, 2)] {
            let s = 2. * (1. + m[(1, 1)] - m[(0, 0)] - m[(2, 2)]).sqrt();
            Quaternion::new(
                (m[(0, 2)] - m[(2, 0)]) / s,
                (m[(0, 1)] + m[(1, 0)]) / s,
                0.25 * s,
                (m[(1, 2)] + m[(2, 1)]) / s,
            )
        } else {
            let s = 2. * (1. + m[(2, 2)] - m[(0, 0)] - m[(1, 1)]).sqrt();
            Quaternion::new(
                (m[(1, 0)] - m[(0, 1)]) / s,
                (m[(0, 2)] + m[(2, 0)]) / s,
                (m[(1, 2)] + m[(2, 1)]) / s,
                0.25 * s,
            )
        };
        Self::from_quaternion(q)
    }

    /// Returns the underlying unit quaternion.
    #[must_use]
    pub fn quaternion(&self) -> Quaternion {
        self.quaternion
    }

    /// Returns the equivalent rotation matrix `R` such that rotating `v` yields `R v`.
    #[must_use]
    pub fn to_matrix(&self) -> Matrix3<f64> {
        let q = self.quaternion;
        let (w, x, y, z) = (q.w(), q.x(), q.y(), q.z());
        Matrix3::new(
            1. - 2. * (y * y + z * z),
            2. * (x * y - w * z),
            2. * (x * z + w * y),
            2. * (x * y + w * z),
            1. - 2. * (x * x + z * z),
            2. * (y * z - w * x),
            2. * (x * z - w * y),
            2. * (y * z + w * x),
            1. - 2. * (x * x + y * y),
        )
    }

    /// Returns the rotation vector (axis scaled by angle, in radians) of this rotation.
    #[must_use]
    pub fn to_rotation_vector(&self) -> Vector3<f64> {
        Vector3::from(self.quaternion.to_rotation_vector())
    }

    /// Applies `self` and then `other`.
    ///
    /// See the [type-level documentation](Rotation3d) for the composition order.
    #[must_use]
    pub fn plus(&self, other: &Self) -> Self {
        Self::from_quaternion(other.quaternion * self.quaternion)
    }

    /// Returns `self` relative to `other`, ie, `self.plus(&other.unary_minus())`.
    #[must_use]
    pub fn minus(&self, other: &Self) -> Self {
        self.plus(&other.unary_minus())
    }

    /// Returns the inverse rotation.
    #[doc(alias = "inverse")]
    #[must_use]
    pub fn unary_minus(&self) -> Self {
        Self::from_unit_quaternion(self.quaternion.inverse())
    }

    /// Scales this rotation along the shortest geodesic from the identity.
    ///
    /// A scalar of `0` yields the identity, `1` yields `self`, and `0.5` yields the rotation
    /// halfway there (slerp from the identity).
    #[must_use]
    pub fn times(&self, scalar: f64) -> Self {
        let q = self.quaternion;
        let axis = Vector3::new(q.x(), q.y(), q.z());
        // rounding can push a normalized w just past ±1
        let w = q.w().clamp(-1., 1.);
        // https://en.wikipedia.org/wiki/Slerp#Quaternion_Slerp
        if w >= 0. {
            Self::from_axis_angle(axis, Angle::new::<radian>(2. * scalar * w.acos()))
        } else {
            Self::from_axis_angle(-axis, Angle::new::<radian>(2. * scalar * (-w).acos()))
        }
    }

    #[must_use]
    pub fn div(&self, scalar: f64) -> Self {
        self.times(1. / scalar)
    }

    /// Spherically interpolates between `self` (at `t = 0`) and `end` (at `t = 1`).
    ///
    /// `t` is clamped to `[0, 1]`.
    #[must_use]
    pub fn interpolate(&self, end: &Self, t: f64) -> Self {
        // end.minus(self) is the delta in self's body frame (q_self⁻¹ q_end), so it has to be
        // applied before self to land on end at t = 1
        end.minus(self).times(t.clamp(0., 1.)).plus(self)
    }

    /// Returns the rotation about the X axis (roll), in `(-π, π]`.
    #[doc(alias = "get_x")]
    #[must_use]
    pub fn roll(&self) -> Angle {
        let q = self.quaternion;
        let (w, x, y, z) = (q.w(), q.x(), q.y(), q.z());

        let cxcy = 1. - 2. * (x * x + y * y);
        let sxcy = 2. * (w * x + y * z);
        let cy_sq = cxcy * cxcy + sxcy * sxcy;
        if cy_sq > 1e-20 {
            Angle::new::<radian>(sxcy.atan2(cxcy))
        } else {
            // gimbal lock: attribute everything to yaw
            Angle::new::<radian>(0.)
        }
    }

    /// Returns the rotation about the Y axis (pitch), in `[-π/2, π/2]`.
    ///
    /// At gimbal lock the `asin` argument can leave `[-1, 1]` through rounding; it is clamped to
    /// `±π/2` rather than producing NaN.
    #[doc(alias = "get_y")]
    #[must_use]
    pub fn pitch(&self) -> Angle {
        let q = self.quaternion;
        let (w, x, y, z) = (q.w(), q.x(), q.y(), q.z());

        let ratio = 2. * (w * y - z * x);
        if ratio.abs() >= 1. {
            Angle::new::<radian>(std::f64::consts::FRAC_PI_2.copysign(ratio))
        } else {
            Angle::new::<radian>(ratio.asin())
        }
    }

    /// Returns the rotation about the Z axis (yaw), in `(-π, π]`.
    #[doc(alias = "get_z")]
    #[must_use]
    pub fn yaw(&self) -> Angle {
        let q = self.quaternion;
        let (w, x, y, z) = (q.w(), q.x(), q.y(), q.z());

        let cycz = 1. - 2. * (y * y + z * z);
        let cysz = 2. * (w * z + x * y);
        let cy_sq = cycz * cycz + cysz * cysz;
        if cy_sq > 1e-20 {
            Angle::new::<radian>(cysz.atan2(cycz))
        } else {
            Angle::new::<radian>((2. * w * z).atan2(w * w - z * z))
        }
    }

    /// Returns the unit axis of rotation, or the zero vector for the identity.
    #[must_use]
    pub fn axis(&self) -> Vector3<f64> {
        let q = self.quaternion;
        let norm = q.vector_norm();
        if norm == 0. {
            Vector3::zeros()
        } else {
            Vector3::new(q.x() / norm, q.y() / norm, q.z() / norm)
        }
    }

    /// Returns the angle of rotation about [`Rotation3d::axis`], in `[0, 2π)`.
    #[must_use]
    pub fn angle(&self) -> Angle {
        let q = self.quaternion;
        Angle::new::<radian>(2. * q.vector_norm().atan2(q.w()))
    }

    /// Rotates a vector by conjugation, `q (0, v) q⁻¹`.
    pub(crate) fn rotate_vector(&self, v: &Vector3<f64>) -> Vector3<f64> {
        let p = Quaternion::new(0., v.x, v.y, v.z);
        let q = self.quaternion;
        let rotated = q * p * q.inverse();
        Vector3::new(rotated.x(), rotated.y(), rotated.z())
    }
}

impl PartialEq<Self> for Rotation3d {
    fn eq(&self, other: &Self) -> bool {
        self.quaternion.eq(&other.quaternion)
    }
}

impl Display for Rotation3d {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Rotation3d(roll: {:.3}°, pitch: {:.3}°, yaw: {:.3}°)",
            self.roll().get::<degree>(),
            self.pitch().get::<degree>(),
            self.yaw().get::<degree>()
        )
    }
}

impl Add for Rotation3d {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        self.plus(&rhs)
    }
}

impl Sub for Rotation3d {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        self.minus(&rhs)
    }
}

impl Neg for Rotation3d {
    type Output = Self;

    fn neg(self) -> Self::Output {
        self.unary_minus()
    }
}

impl Mul<f64> for Rotation3d {
    type Output = Self;

    fn mul(self, rhs: f64) -> Self::Output {
        self.times(rhs)
    }
}

impl Div<f64> for Rotation3d {
    type Output = Self;

    fn div(self, rhs: f64) -> Self::Output {
        Rotation3d::div(&self, rhs)
    }
}

impl From<nalgebra::UnitQuaternion<f64>> for Rotation3d {
    fn from(q: nalgebra::UnitQuaternion<f64>) -> Self {
        Self::from_quaternion(Quaternion::from(q))
    }
}

impl From<Rotation3d> for nalgebra::UnitQuaternion<f64> {
    fn from(r: Rotation3d) -> Self {
        nalgebra::UnitQuaternion::new_normalize(r.quaternion.into())
    }
}

#[cfg(any(test, feature = "approx"))]
impl AbsDiffEq<Self> for Rotation3d {
    type Epsilon = <f64 as AbsDiffEq>::Epsilon;

    fn default_epsilon() -> Self::Epsilon {
        Quaternion::default_epsilon()
    }

    fn abs_diff_eq(&self, other: &Self, epsilon: Self::Epsilon) -> bool {
        self.quaternion.abs_diff_eq(&other.quaternion, epsilon)
    }
}

#[cfg(any(test, feature = "approx"))]
impl RelativeEq for Rotation3d {
    fn default_max_relative() -> Self::Epsilon {
        Quaternion::default_max_relative()
    }

    fn relative_eq(
        &self,
        other: &Self,
        epsilon: Self::Epsilon,
        max_relative: Self::Epsilon,
    ) -> bool {
        self.quaternion
            .relative_eq(&other.quaternion, epsilon, max_relative)
    }
}

#[cfg(test)]
mod tests {
    use super::Rotation3d;
    use crate::error::RotationError;
    use crate::quaternion::Quaternion;
    use approx::assert_relative_eq;
    use nalgebra::{Matrix3, Vector3};
    use quickcheck::quickcheck;
    use rstest::rstest;
    use uom::si::angle::{degree, radian};
    use uom::si::f64::Angle;

    fn d(deg: f64) -> Angle {
        Angle::new::<degree>(deg)
    }

    #[rstest]
    #[case(d(10.), d(0.), d(0.))]
    #[case(d(0.), d(-35.), d(0.))]
    #[case(d(0.), d(0.), d(170.))]
    #[case(d(12.), d(-30.), d(75.))]
    #[case(d(-179.), d(89.), d(-1.))]
    fn euler_angles_roundtrip(#[case] roll: Angle, #[case] pitch: Angle, #[case] yaw: Angle) {
        let r = Rotation3d::new(roll, pitch, yaw);
        assert_relative_eq!(r.roll().get::<radian>(), roll.get::<radian>(), epsilon = 1e-9);
        assert_relative_eq!(r.pitch().get::<radian>(), pitch.get::<radian>(), epsilon = 1e-9);
        assert_relative_eq!(r.yaw().get::<radian>(), yaw.get::<radian>(), epsilon = 1e-9);
    }

    #[test]
    fn pitch_saturates_at_gimbal_lock() {
        let r = Rotation3d::new(d(0.), d(90.), d(0.));
        let pitch = r.pitch().get::<radian>();
        assert!(!pitch.is_nan());
        assert_relative_eq!(pitch, std::f64::consts::FRAC_PI_2, epsilon = 1e-7);
    }

    #[test]
    fn zero_axis_is_identity() {
        let r = Rotation3d::from_axis_angle(Vector3::zeros(), d(45.));
        assert_eq!(r, Rotation3d::identity());
        assert_eq!(r.axis(), Vector3::zeros());
    }

    #[test]
    fn axis_angle_matches_euler() {
        let about_z = Rotation3d::from_axis_angle(Vector3::new(0., 0., 2.), d(90.));
        assert_relative_eq!(about_z, Rotation3d::new(d(0.), d(0.), d(90.)), epsilon = 1e-12);
        assert_relative_eq!(about_z.angle().get::<degree>(), 90., epsilon = 1e-9);
        assert_relative_eq!(about_z.axis(), Vector3::z(), epsilon = 1e-12);
    }

    #[test]
    fn plus_applies_left_operand_first() {
        let roll = Rotation3d::new(d(90.), d(0.), d(0.));
        let yaw = Rotation3d::new(d(0.), d(0.), d(90.));

        // x stays put under the roll, then the yaw turns it into y
        let v = roll.plus(&yaw).rotate_vector(&Vector3::x());
        assert_relative_eq!(v, Vector3::y(), epsilon = 1e-12);

        // y becomes z under the roll, and the yaw leaves z alone
        let v = roll.plus(&yaw).rotate_vector(&Vector3::y());
        assert_relative_eq!(v, Vector3::z(), epsilon = 1e-12);

        assert_ne!(roll + yaw, yaw + roll);
        assert_relative_eq!(
            roll.plus(&yaw).to_matrix(),
            yaw.to_matrix() * roll.to_matrix(),
            epsilon = 1e-12
        );
    }

    #[test]
    fn minus_undoes_plus() {
        let a = Rotation3d::new(d(10.), d(20.), d(30.));
        let b = Rotation3d::new(d(-40.), d(5.), d(60.));
        assert_relative_eq!(a.plus(&b).minus(&b), a, epsilon = 1e-12);
        assert_eq!(a.minus(&a), Rotation3d::identity());
    }

    #[test]
    fn matrix_roundtrip_near_half_turn() {
        for r in [
            Rotation3d::new(d(180.), d(0.), d(0.)),
            Rotation3d::new(d(0.), d(0.), d(179.999)),
            Rotation3d::from_axis_angle(Vector3::new(1., 1., 1.), d(180.)),
            Rotation3d::new(d(23.), d(-61.), d(-117.)),
        ] {
            let back = Rotation3d::from_matrix(&r.to_matrix()).expect("a rotation matrix");
            assert_relative_eq!(back, r, epsilon = 1e-9);
        }
    }

    #[test]
    fn non_orthogonal_matrix_is_rejected() {
        let skewed = Matrix3::new(1., 0.1, 0., 0., 1., 0., 0., 0., 1.);
        assert!(matches!(
            Rotation3d::from_matrix(&skewed),
            Err(RotationError::NotOrthogonal { .. })
        ));

        let reflection = Matrix3::new(-1., 0., 0., 0., 1., 0., 0., 0., 1.);
        assert!(matches!(
            Rotation3d::from_matrix(&reflection),
            Err(RotationError::NotProper { .. })
        ));
    }

    #[test]
    fn times_scales_angle() {
        let r = Rotation3d::new(d(0.), d(0.), d(80.));
        assert_relative_eq!(r.times(0.5), Rotation3d::new(d(0.), d(0.), d(40.)), epsilon = 1e-12);
        assert_eq!(r.times(0.), Rotation3d::identity());
        assert_relative_eq!(r / 4., Rotation3d::new(d(0.), d(0.), d(20.)), epsilon = 1e-12);

        // a negative-w representation of the same rotation scales the same way
        let flipped = Rotation3d::from_unit_quaternion(-r.quaternion());
        assert_relative_eq!(flipped.times(0.5), r.times(0.5), epsilon = 1e-12);
    }

    #[test]
    fn interpolate_hits_endpoints_and_clamps() {
        let a = Rotation3d::new(d(10.), d(-20.), d(30.));
        let b = Rotation3d::new(d(-50.), d(40.), d(120.));
        assert_relative_eq!(a.interpolate(&b, 0.), a, epsilon = 1e-12);
        assert_relative_eq!(a.interpolate(&b, 1.), b, epsilon = 1e-12);
        assert_relative_eq!(a.interpolate(&b, 2.), b, epsilon = 1e-12);
        assert_relative_eq!(a.interpolate(&b, -1.), a, epsilon = 1e-12);

        let half = Rotation3d::identity().interpolate(&Rotation3d::new(d(0.), d(90.), d(0.)), 0.5);
        assert_relative_eq!(half, Rotation3d::new(d(0.), d(45.), d(0.)), epsilon = 1e-12);
    }

    #[test]
    fn constructor_normalizes() {
        let r = Rotation3d::from_quaternion(Quaternion::new(2., 0., 0., 2.));
        assert_relative_eq!(r.quaternion().norm(), 1., epsilon = 1e-15);
        assert_relative_eq!(r.yaw().get::<degree>(), 90., epsilon = 1e-9);
    }

    #[test]
    fn display() {
        insta::assert_snapshot!(
            Rotation3d::new(d(15.), d(-30.), d(90.)),
            @"Rotation3d(roll: 15.000°, pitch: -30.000°, yaw: 90.000°)"
        );
    }

    #[cfg(feature = "serde")]
    #[test]
    fn deserialize_normalizes() {
        let r: Rotation3d = serde_yaml::from_str(
            r#"
            quaternion:
              W: 0.0
              X: 0.0
              Y: 0.0
              Z: 3.0
            "#,
        )
        .expect("valid rotation");
        assert_relative_eq!(r.quaternion().norm(), 1.);
        assert_relative_eq!(r.angle().get::<degree>(), 180., epsilon = 1e-9);
    }

    quickcheck! {
        fn plus_is_associative(a: Rotation3d, b: Rotation3d, c: Rotation3d) -> bool {
            let left = a.plus(&b).plus(&c);
            let right = a.plus(&b.plus(&c));
            approx::relative_eq!(left, right, epsilon = 1e-9)
        }

        fn unary_minus_is_inverse(r: Rotation3d) -> bool {
            r.plus(&r.unary_minus()) == Rotation3d::identity()
        }

        fn matrix_agrees_with_conjugation(r: Rotation3d) -> bool {
            let v = Vector3::new(0.3, -1.2, 2.5);
            approx::relative_eq!(r.to_matrix() * v, r.rotate_vector(&v), epsilon = 1e-9)
        }

        fn rotation_vector_roundtrip(r: Rotation3d) -> bool {
            let back = Rotation3d::from_rotation_vector(r.to_rotation_vector());
            approx::relative_eq!(back, r, epsilon = 1e-9)
        }
    }
}
