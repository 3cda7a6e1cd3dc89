//! Generators and scene helpers shared by the unit tests.

use crate::camera::CameraModel;
use crate::pose::Pose3d;
use crate::quaternion::Quaternion;
use crate::rotation::Rotation3d;
use crate::translation::Translation3d;
use nalgebra::Point2;
use quickcheck::Arbitrary;
use uom::si::angle::radian;
use uom::si::f64::Angle;

/// Draws a normal (or zero) `f64` and folds it into `[lo, hi)`.
fn bounded_f64(g: &mut quickcheck::Gen, lo: f64, hi: f64) -> f64 {
    // quickcheck will give us awkward f64 values -- we ignore those
    let f = loop {
        match f64::arbitrary(g) {
            0. => break 0.,
            f if f.is_normal() => break f,
            _ => {}
        }
    };
    lo + f.rem_euclid(hi - lo)
}

impl Arbitrary for Quaternion {
    fn arbitrary(g: &mut quickcheck::Gen) -> Self {
        loop {
            let q = Quaternion::new(
                bounded_f64(g, -1., 1.),
                bounded_f64(g, -1., 1.),
                bounded_f64(g, -1., 1.),
                bounded_f64(g, -1., 1.),
            );
            // too short to normalize without amplifying rounding
            if q.norm() > 0.1 {
                return q.normalize();
            }
        }
    }
}

impl Arbitrary for Rotation3d {
    fn arbitrary(g: &mut quickcheck::Gen) -> Self {
        Rotation3d::from_quaternion(Quaternion::arbitrary(g))
    }
}

impl Arbitrary for Translation3d {
    fn arbitrary(g: &mut quickcheck::Gen) -> Self {
        Translation3d::new(
            bounded_f64(g, -10., 10.),
            bounded_f64(g, -10., 10.),
            bounded_f64(g, -10., 10.),
        )
    }
}

impl Arbitrary for Pose3d {
    fn arbitrary(g: &mut quickcheck::Gen) -> Self {
        Pose3d::new(Translation3d::arbitrary(g), Rotation3d::arbitrary(g))
    }
}

/// A 640×480 camera with a roughly 70° horizontal field of view.
pub(crate) fn camera_640x480(dist_coeffs: &[f64]) -> CameraModel {
    CameraModel::new(
        &nalgebra::Matrix3::new(450., 0., 320., 0., 450., 240., 0., 0., 1.),
        dist_coeffs,
    )
    .expect("valid intrinsics")
}

/// The orientation of a camera at `from` that looks straight at `at`, with no roll.
pub(crate) fn looking_at(from: &Translation3d, at: &Translation3d) -> Rotation3d {
    let dir = at.minus(from);
    let yaw = dir.y().atan2(dir.x());
    let pitch = (-dir.z()).atan2(dir.x().hypot(dir.y()));
    Rotation3d::new(
        Angle::new::<radian>(0.),
        Angle::new::<radian>(pitch),
        Angle::new::<radian>(yaw),
    )
}

/// Projects field points through a camera at `camera_pose`.
pub(crate) fn project(
    camera: &CameraModel,
    camera_pose: &Pose3d,
    points: &[Translation3d],
) -> Vec<Point2<f64>> {
    camera.project_points(
        &crate::rot_trl::RotTrlTransform3d::make_relative_to(camera_pose),
        points,
    )
}
