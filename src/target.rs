use crate::pose::Pose3d;
use crate::rot_trl::RotTrlTransform3d;
use crate::rotation::Rotation3d;
use crate::translation::Translation3d;
use uom::si::angle::radian;
use uom::si::f64::{Angle, Length};
use uom::si::length::meter;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Vertices with `|x|` below this (in meters) count as lying on the target's face.
const PLANAR_TOLERANCE: f64 = 1e-9;

/// Side length of a 36h11-family AprilTag, measured across its outer black border.
pub const APRIL_TAG_36H11_SIZE_M: f64 = 0.1651;

/// Side length of a 16h5-family AprilTag, measured across its outer black border.
pub const APRIL_TAG_16H5_SIZE_M: f64 = 0.1524;

/// The physical geometry of a target, as points in the target's own frame.
///
/// A target's frame is NWU with the origin at its center and +X pointing out of its face, so the
/// vertices of a flat target all lie on the `x = 0` plane. For rectangles, the vertices go
/// around the face in a fixed order: seen from the front (ie, from +X), they are top-left,
/// top-right, bottom-right, then bottom-left. Detected corners must be reported in the same
/// order.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TargetModel {
    vertices: Vec<Translation3d>,
    is_planar: bool,
    is_spherical: bool,
}

impl TargetModel {
    /// A flat rectangle `width` across (along Y) and `height` tall (along Z).
    #[must_use]
    pub fn rectangle(width: impl Into<Length>, height: impl Into<Length>) -> Self {
        let w = width.into().get::<meter>() / 2.;
        let h = height.into().get::<meter>() / 2.;
        Self {
            vertices: vec![
                Translation3d::new(0., -w, h),
                Translation3d::new(0., w, h),
                Translation3d::new(0., w, -h),
                Translation3d::new(0., -w, -h),
            ],
            is_planar: true,
            is_spherical: false,
        }
    }

    #[must_use]
    pub fn square(side: impl Into<Length>) -> Self {
        let side = side.into();
        Self::rectangle(side, side)
    }

    /// A sphere of the given diameter.
    ///
    /// A sphere looks the same from every direction, so its vertices are four points on the
    /// silhouette circle as seen along +X. Place it with [`TargetModel::oriented_pose`] so that
    /// +X faces the camera.
    #[must_use]
    pub fn sphere(diameter: impl Into<Length>) -> Self {
        let r = diameter.into().get::<meter>() / 2.;
        Self {
            vertices: vec![
                Translation3d::new(0., -r, 0.),
                Translation3d::new(0., 0., -r),
                Translation3d::new(0., r, 0.),
                Translation3d::new(0., 0., r),
            ],
            is_planar: false,
            is_spherical: true,
        }
    }

    /// A target with arbitrary vertices in its own frame.
    ///
    /// The model is planar when every vertex lies on the `x = 0` plane.
    #[must_use]
    pub fn from_vertices(vertices: Vec<Translation3d>) -> Self {
        let is_planar = vertices.iter().all(|v| v.x().abs() < PLANAR_TOLERANCE);
        Self {
            vertices,
            is_planar,
            is_spherical: false,
        }
    }

    /// A 36h11-family AprilTag, eg, as used on FRC fields since 2024.
    #[must_use]
    pub fn april_tag_36h11() -> Self {
        Self::square(Length::new::<meter>(APRIL_TAG_36H11_SIZE_M))
    }

    /// A 16h5-family AprilTag.
    #[must_use]
    pub fn april_tag_16h5() -> Self {
        Self::square(Length::new::<meter>(APRIL_TAG_16H5_SIZE_M))
    }

    #[must_use]
    pub fn vertices(&self) -> &[Translation3d] {
        &self.vertices
    }

    #[must_use]
    pub fn is_planar(&self) -> bool {
        self.is_planar
    }

    #[must_use]
    pub fn is_spherical(&self) -> bool {
        self.is_spherical
    }

    /// The vertices of this target when it sits at `target_pose` in the field.
    #[must_use]
    pub fn field_vertices(&self, target_pose: &Pose3d) -> Vec<Translation3d> {
        RotTrlTransform3d::new(target_pose.rotation(), target_pose.translation())
            .apply_translations(&self.vertices)
    }

    /// A pose at `target_translation` whose +X axis points at `camera_translation`, with no roll.
    ///
    /// Spherical targets have no orientation of their own; this is the one to place their
    /// vertices with.
    #[must_use]
    pub fn oriented_pose(
        target_translation: &Translation3d,
        camera_translation: &Translation3d,
    ) -> Pose3d {
        let to_camera = camera_translation.minus(target_translation);
        let pitch = (-to_camera.z()).atan2(to_camera.x().hypot(to_camera.y()));
        let yaw = to_camera.y().atan2(to_camera.x());
        Pose3d::new(
            *target_translation,
            Rotation3d::new(
                Angle::new::<radian>(0.),
                Angle::new::<radian>(pitch),
                Angle::new::<radian>(yaw),
            ),
        )
    }
}
