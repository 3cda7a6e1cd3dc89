use std::fmt;
use std::fmt::{Display, Formatter};
use std::ops::{Mul, Neg};

#[cfg(any(test, feature = "approx"))]
use approx::{AbsDiffEq, RelativeEq};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Below this norm a vector part is treated as zero and Taylor expansions take over.
const SMALL_NORM: f64 = 1e-9;

/// A [quaternion] `w + xi + yj + zk` with `f64` components.
///
/// Quaternions that represent rotations (see [`Rotation3d`](crate::Rotation3d)) are always
/// unit-norm. This type does not enforce that on its own, since the exponential and logarithm
/// maps need non-unit intermediate values, but every public constructor of
/// [`Rotation3d`](crate::Rotation3d) normalizes before storing one.
///
/// Equality follows the double cover of SO(3): `q` and `-q` describe the same rotation, so two
/// quaternions compare equal when `|q1 · q2| > 1 - 1e-9`. This is only meaningful for unit
/// quaternions.
///
/// [quaternion]: https://en.wikipedia.org/wiki/Quaternion
#[derive(Clone, Copy, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Quaternion {
    // the upper-case names match the field layout JSON that WPILib-style tools write
    #[cfg_attr(feature = "serde", serde(rename = "W"))]
    w: f64,
    #[cfg_attr(feature = "serde", serde(rename = "X"))]
    x: f64,
    #[cfg_attr(feature = "serde", serde(rename = "Y"))]
    y: f64,
    #[cfg_attr(feature = "serde", serde(rename = "Z"))]
    z: f64,
}

impl Default for Quaternion {
    fn default() -> Self {
        Self::identity()
    }
}

impl Quaternion {
    /// Constructs a quaternion from its scalar part `w` and vector part `(x, y, z)`.
    ///
    /// No normalization takes place.
    #[must_use]
    pub const fn new(w: f64, x: f64, y: f64, z: f64) -> Self {
        Self { w, x, y, z }
    }

    /// The identity rotation `1 + 0i + 0j + 0k`.
    #[must_use]
    pub const fn identity() -> Self {
        Self::new(1., 0., 0., 0.)
    }

    #[must_use]
    pub fn w(&self) -> f64 {
        self.w
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

    /// Hamilton product `self * other`.
    ///
    /// With `v` denoting the vector parts: `w = w1 w2 - v1 · v2` and
    /// `v = w1 v2 + w2 v1 + v1 × v2`.
    #[must_use]
    pub fn times(&self, other: &Self) -> Self {
        let (w1, x1, y1, z1) = (self.w, self.x, self.y, self.z);
        let (w2, x2, y2, z2) = (other.w, other.x, other.y, other.z);

        // v1 × v2
        let cx = y1 * z2 - z1 * y2;
        let cy = z1 * x2 - x1 * z2;
        let cz = x1 * y2 - y1 * x2;

        Self {
            w: w1 * w2 - (x1 * x2 + y1 * y2 + z1 * z2),
            x: w1 * x2 + w2 * x1 + cx,
            y: w1 * y2 + w2 * y1 + cy,
            z: w1 * z2 + w2 * z1 + cz,
        }
    }

    /// Returns the conjugate `w - xi - yj - zk`.
    #[must_use]
    pub fn conjugate(&self) -> Self {
        Self::new(self.w, -self.x, -self.y, -self.z)
    }

    /// Returns the multiplicative inverse.
    ///
    /// For the unit quaternions used to represent rotations this is exactly the conjugate.
    #[must_use]
    pub fn inverse(&self) -> Self {
        let norm_sq = self.dot(self);
        let c = self.conjugate();
        Self::new(c.w / norm_sq, c.x / norm_sq, c.y / norm_sq, c.z / norm_sq)
    }

    /// The four-dimensional dot product of two quaternions.
    #[must_use]
    pub fn dot(&self, other: &Self) -> f64 {
        self.w * other.w + self.x * other.x + self.y * other.y + self.z * other.z
    }

    #[must_use]
    pub fn norm(&self) -> f64 {
        self.dot(self).sqrt()
    }

    /// Returns this quaternion scaled to unit length.
    ///
    /// A quaternion with a norm of exactly zero has no direction to preserve, so the identity is
    /// returned instead.
    #[must_use]
    pub fn normalize(&self) -> Self {
        let norm = self.norm();
        if norm == 0. {
            Self::identity()
        } else {
            Self::new(self.w / norm, self.x / norm, self.y / norm, self.z / norm)
        }
    }

    /// The quaternion exponential `e^q`.
    #[must_use]
    pub fn exp(&self) -> Self {
        let scalar = self.w.exp();
        let axial_magnitude = self.vector_norm();
        let cosine = axial_magnitude.cos();

        let axial_scalar = if axial_magnitude < SMALL_NORM {
            // taylor expansion of sin(x)/x around zero
            let a2 = axial_magnitude * axial_magnitude;
            1. - a2 / 6. + a2 * a2 / 120.
        } else {
            axial_magnitude.sin() / axial_magnitude
        };

        Self::new(
            cosine * scalar,
            self.x * axial_scalar * scalar,
            self.y * axial_scalar * scalar,
            self.z * axial_scalar * scalar,
        )
    }

    /// The principal quaternion logarithm `ln(q)`.
    #[must_use]
    pub fn log(&self) -> Self {
        let v_norm = self.vector_norm();
        let scalar = self.norm().ln();

        let v_scalar = if v_norm < SMALL_NORM {
            1. / self.w - v_norm * v_norm / (3. * self.w * self.w * self.w)
        } else {
            v_norm.atan2(self.w) / v_norm
        };

        Self::new(scalar, v_scalar * self.x, v_scalar * self.y, v_scalar * self.z)
    }

    /// Returns the rotation vector (axis scaled by angle, in radians) of this unit quaternion.
    ///
    /// The sign of the quaternion is chosen such that the `w ≥ 0` branch is always evaluated, so
    /// `q` and `-q` produce the same rotation vector with an angle in `[0, π]`.
    #[must_use]
    pub fn to_rotation_vector(&self) -> [f64; 3] {
        let norm = self.vector_norm();

        let coeff = if norm < SMALL_NORM {
            2. / self.w - 2. / 3. * norm * norm / (self.w * self.w * self.w)
        } else if self.w < 0. {
            2. * (-norm).atan2(-self.w) / norm
        } else {
            2. * norm.atan2(self.w) / norm
        };

        [coeff * self.x, coeff * self.y, coeff * self.z]
    }

    /// Constructs the unit quaternion for a rotation vector (axis scaled by angle, in radians).
    #[must_use]
    pub fn from_rotation_vector(rvec: [f64; 3]) -> Self {
        let theta = (rvec[0] * rvec[0] + rvec[1] * rvec[1] + rvec[2] * rvec[2]).sqrt();
        let cos = (theta / 2.).cos();

        let axial_scalar = if theta < SMALL_NORM {
            // taylor expansion of sin(θ/2)/θ around zero
            let t2 = theta * theta;
            1. / 2. - t2 / 48. + t2 * t2 / 3840.
        } else {
            (theta / 2.).sin() / theta
        };

        Self::new(
            cos,
            axial_scalar * rvec[0],
            axial_scalar * rvec[1],
            axial_scalar * rvec[2],
        )
    }

    pub(crate) fn vector_norm(&self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }
}

impl PartialEq<Self> for Quaternion {
    fn eq(&self, other: &Self) -> bool {
        self.dot(other).abs() > 1. - 1e-9
    }
}

impl Display for Quaternion {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Quaternion(w: {:.4}, x: {:.4}, y: {:.4}, z: {:.4})",
            self.w, self.x, self.y, self.z
        )
    }
}

impl Mul for Quaternion {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self::Output {
        self.times(&rhs)
    }
}

impl Neg for Quaternion {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Self::new(-self.w, -self.x, -self.y, -self.z)
    }
}

impl From<Quaternion> for nalgebra::Quaternion<f64> {
    fn from(q: Quaternion) -> Self {
        nalgebra::Quaternion::new(q.w, q.x, q.y, q.z)
    }
}

impl From<nalgebra::Quaternion<f64>> for Quaternion {
    fn from(q: nalgebra::Quaternion<f64>) -> Self {
        Self::new(q.w, q.i, q.j, q.k)
    }
}

impl From<nalgebra::UnitQuaternion<f64>> for Quaternion {
    fn from(q: nalgebra::UnitQuaternion<f64>) -> Self {
        Self::from(q.into_inner())
    }
}

#[cfg(any(test, feature = "approx"))]
impl AbsDiffEq<Self> for Quaternion {
    type Epsilon = <f64 as AbsDiffEq>::Epsilon;

    fn default_epsilon() -> Self::Epsilon {
        f64::default_epsilon()
    }

    fn abs_diff_eq(&self, other: &Self, epsilon: Self::Epsilon) -> bool {
        // q and -q are the same rotation
        let same = [
            (self.w, other.w),
            (self.x, other.x),
            (self.y, other.y),
            (self.z, other.z),
        ];
        same.iter().all(|(a, b)| a.abs_diff_eq(b, epsilon))
            || same.iter().all(|(a, b)| a.abs_diff_eq(&-b, epsilon))
    }
}

#[cfg(any(test, feature = "approx"))]
impl RelativeEq for Quaternion {
    fn default_max_relative() -> Self::Epsilon {
        f64::default_max_relative()
    }

    fn relative_eq(
        &self,
        other: &Self,
        epsilon: Self::Epsilon,
        max_relative: Self::Epsilon,
    ) -> bool {
        let same = [
            (self.w, other.w),
            (self.x, other.x),
            (self.y, other.y),
            (self.z, other.z),
        ];
        same.iter()
            .all(|(a, b)| a.relative_eq(b, epsilon, max_relative))
            || same
                .iter()
                .all(|(a, b)| a.relative_eq(&-b, epsilon, max_relative))
    }
}
