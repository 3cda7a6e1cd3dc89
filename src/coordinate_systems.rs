//! Axis conventions, and conversions between them.
//!
//! Every pose-carrying type in this crate ([`Pose3d`], [`Transform3d`], ...) is expressed in the
//! [`Nwu`] convention: +X forward (North), +Y left (West), +Z up. Camera math and image-space
//! solvers, on the other hand, want the optical [`Edn`] convention: +X right (East), +Y down, +Z
//! forward along the optical axis.
//!
//! Convert at the boundary, and only there. The pose solvers in [`pnp`](crate::pnp) take and
//! return [`Nwu`] values and do the [`Edn`] round-trip internally, so most code never needs this
//! module directly. When it does, the generic [`convert_translation`], [`convert_rotation`], and
//! [`convert_pose`] functions name both conventions in their type parameters so the direction of
//! a conversion is visible at the call site:
//!
//! ```
//! use tagpose::coordinate_systems::{convert_translation, Edn, Nwu};
//! use tagpose::Translation3d;
//!
//! // one meter straight ahead
//! let ahead = Translation3d::new(1., 0., 0.);
//! let optical = convert_translation::<Nwu, Edn>(&ahead);
//! assert!((optical.z() - 1.).abs() < 1e-12);
//! ```

use crate::pose::Pose3d;
use crate::quaternion::Quaternion;
use crate::rotation::Rotation3d;
use crate::translation::Translation3d;
use nalgebra::Vector3;

/// The rotation that takes NWU-expressed vectors to EDN-expressed ones.
///
/// As a matrix, this is `[[0, -1, 0], [0, 0, -1], [1, 0, 0]]`.
pub const NWU_TO_EDN: Rotation3d =
    Rotation3d::from_unit_quaternion(Quaternion::new(0.5, 0.5, -0.5, 0.5));

/// The rotation that takes EDN-expressed vectors to NWU-expressed ones; the inverse of
/// [`NWU_TO_EDN`].
///
/// As a matrix, this is `[[0, 0, 1], [-1, 0, 0], [0, -1, 0]]`.
pub const EDN_TO_NWU: Rotation3d =
    Rotation3d::from_unit_quaternion(Quaternion::new(0.5, -0.5, 0.5, -0.5));

/// Defines an axis convention by how it relates to [`Nwu`].
///
/// Implementations are marker types; they are never instantiated.
pub trait CoordinateSystem {
    /// The rotation that takes NWU-expressed vectors to vectors expressed in this convention.
    fn from_nwu() -> Rotation3d;
}

/// Marks the North-West-Up convention used for robot, field, and camera poses.
///
/// - Positive X is forward (North).
/// - Positive Y is to the left (West).
/// - Positive Z is up.
pub struct Nwu;

/// Marks the East-Down-North convention used by optical camera models.
///
/// - Positive X is to the right in the image (East).
/// - Positive Y is down in the image.
/// - Positive Z is along the optical axis (North).
pub struct Edn;

impl CoordinateSystem for Nwu {
    fn from_nwu() -> Rotation3d {
        Rotation3d::identity()
    }
}

impl CoordinateSystem for Edn {
    fn from_nwu() -> Rotation3d {
        NWU_TO_EDN
    }
}

/// The change of basis `C` from `From` to `To`, so that `v_to = C v_from`.
fn change_of_basis<From: CoordinateSystem, To: CoordinateSystem>() -> Rotation3d {
    From::from_nwu().unary_minus().plus(&To::from_nwu())
}

/// Re-expresses a translation given in `From` axes in `To` axes.
#[must_use]
pub fn convert_translation<From: CoordinateSystem, To: CoordinateSystem>(
    translation: &Translation3d,
) -> Translation3d {
    translation.rotate_by(&change_of_basis::<From, To>())
}

/// Re-expresses a rotation given in `From` axes in `To` axes, ie, `C R Cᵀ`.
///
/// The result describes the same physical motion, so rotating a converted vector by the converted
/// rotation is the same as converting the rotated vector.
#[must_use]
pub fn convert_rotation<From: CoordinateSystem, To: CoordinateSystem>(
    rotation: &Rotation3d,
) -> Rotation3d {
    let basis = change_of_basis::<From, To>();
    basis.unary_minus().plus(&rotation.plus(&basis))
}

/// Re-expresses both parts of a pose given in `From` axes in `To` axes.
#[must_use]
pub fn convert_pose<From: CoordinateSystem, To: CoordinateSystem>(pose: &Pose3d) -> Pose3d {
    Pose3d::new(
        convert_translation::<From, To>(&pose.translation()),
        convert_rotation::<From, To>(&pose.rotation()),
    )
}

#[must_use]
pub fn translation_nwu_to_edn(translation: &Translation3d) -> Translation3d {
    translation.rotate_by(&NWU_TO_EDN)
}

#[must_use]
pub fn translation_edn_to_nwu(translation: &Translation3d) -> Translation3d {
    translation.rotate_by(&EDN_TO_NWU)
}

#[must_use]
pub fn rotation_nwu_to_edn(rotation: &Rotation3d) -> Rotation3d {
    NWU_TO_EDN
        .unary_minus()
        .plus(&rotation.plus(&NWU_TO_EDN))
}

#[must_use]
pub fn rotation_edn_to_nwu(rotation: &Rotation3d) -> Rotation3d {
    EDN_TO_NWU
        .unary_minus()
        .plus(&rotation.plus(&EDN_TO_NWU))
}

/// Converts an NWU rotation into the EDN rotation vector that optical solvers exchange.
#[must_use]
pub fn rotation_to_rvec(rotation: &Rotation3d) -> Vector3<f64> {
    rotation_nwu_to_edn(rotation).to_rotation_vector()
}

/// Converts an EDN rotation vector back into an NWU rotation.
#[must_use]
pub fn rvec_to_rotation(rvec: &Vector3<f64>) -> Rotation3d {
    rotation_edn_to_nwu(&Rotation3d::from_rotation_vector(*rvec))
}

#[must_use]
pub fn translation_to_tvec(translation: &Translation3d) -> Vector3<f64> {
    translation_nwu_to_edn(translation).to_vector()
}

#[must_use]
pub fn tvec_to_translation(tvec: &Vector3<f64>) -> Translation3d {
    translation_edn_to_nwu(&Translation3d::from(*tvec))
}
