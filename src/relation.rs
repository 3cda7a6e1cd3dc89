use crate::pose::Pose3d;
use crate::transform::Transform3d;
use uom::si::angle::radian;
use uom::si::f64::{Angle, Length};
use uom::si::length::meter;

/// How one object appears from another: range, bearing, and elevation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Sightline {
    /// The viewed object's pose in the viewer's frame.
    pub transform: Transform3d,
    /// Straight-line distance.
    pub distance: Length,
    /// Distance projected onto the viewer's XY plane.
    pub distance_xy: Length,
    /// Angle to the left of the viewer's +X axis.
    pub yaw: Angle,
    /// Angle below the viewer's XY plane.
    pub pitch: Angle,
    /// Total angle off the viewer's +X axis, as `hypot(yaw, pitch)`.
    pub angle: Angle,
}

impl Sightline {
    fn between(viewer: &Pose3d, viewed: &Pose3d) -> Self {
        let transform = Transform3d::between(viewer, viewed);
        let (x, y, z) = (transform.x(), transform.y(), transform.z());
        let distance_xy = x.hypot(y);
        let yaw = y.atan2(x);
        let pitch = (-z).atan2(distance_xy);
        Self {
            transform,
            distance: transform.translation().norm(),
            distance_xy: Length::new::<meter>(distance_xy),
            yaw: Angle::new::<radian>(yaw),
            pitch: Angle::new::<radian>(pitch),
            angle: Angle::new::<radian>(yaw.hypot(pitch)),
        }
    }
}

/// Diagnostic view of a camera and a target from each other's perspective.
///
/// Handy for deciding whether a target is worth trusting, eg, because it is far away or seen at
/// a grazing angle.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraTargetRelation {
    pub camera_pose: Pose3d,
    pub target_pose: Pose3d,
    /// The target as seen from the camera.
    pub camera_to_target: Sightline,
    /// The camera as seen from the target.
    pub target_to_camera: Sightline,
}

impl CameraTargetRelation {
    #[must_use]
    pub fn new(camera_pose: Pose3d, target_pose: Pose3d) -> Self {
        Self {
            camera_pose,
            target_pose,
            camera_to_target: Sightline::between(&camera_pose, &target_pose),
            target_to_camera: Sightline::between(&target_pose, &camera_pose),
        }
    }
}
