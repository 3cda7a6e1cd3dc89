//! This library estimates where a camera is from the fiducials (eg, AprilTags) it sees, along
//! with the rigid body algebra needed to do so without losing track of which frame is which.
//!
//! The algebra comes first: [`Rotation3d`], [`Translation3d`], [`Pose3d`], and [`Transform3d`]
//! are small value types in the robot-friendly North-West-Up convention (see
//! [`coordinate_systems`]). A [`Pose3d`] says where something _is_; a [`Transform3d`] says how to
//! get from one pose to another. Poses also have a Lie group structure, so they can be
//! [interpolated](Pose3d::interpolate) along screw motions via [`Twist3d`].
//!
//! On top of that sits the vision side:
//!
//! - a [`CameraModel`] describes a pinhole camera with OpenCV-style lens [`Distortion`];
//! - a [`TargetModel`] describes the physical shape of a fiducial;
//! - a [`FieldLayout`] says where each fiducial is on the field; and
//! - a [`VisionEstimator`] turns the [`TagDetection`]s of a single frame into the camera's field
//!   pose, using the solvers from the [`pnp`] module.
//!
//! # Examples
//!
//! A camera one meter up at the field origin, looking at a single tag:
//!
//! ```
//! use nalgebra::Matrix3;
//! use tagpose::{
//!     AprilTag, CameraModel, FieldLayout, Pose3d, Rotation3d, RotTrlTransform3d, SolverOptions,
//!     TagDetection, TargetModel, Translation3d, VisionEstimator,
//! };
//! use uom::si::angle::degree;
//! use uom::si::f64::Angle;
//!
//! let camera = CameraModel::new(
//!     &Matrix3::new(600., 0., 320., 0., 600., 240., 0., 0., 1.),
//!     &[0.05, -0.1, 0., 0., 0.],
//! )
//! .expect("intrinsics are well-formed");
//!
//! // tag 7 hangs on a wall 3 m ahead, facing back at the origin
//! let tag = AprilTag {
//!     id: 7,
//!     pose: Pose3d::new(
//!         Translation3d::new(3., 0.2, 1.2),
//!         Rotation3d::new(
//!             Angle::new::<degree>(0.),
//!             Angle::new::<degree>(0.),
//!             Angle::new::<degree>(180.),
//!         ),
//!     ),
//! };
//! let layout = FieldLayout::new(vec![tag], None);
//! let model = TargetModel::april_tag_36h11();
//!
//! // in real life, the corners come from a tag detector; here we synthesize them
//! let truth = Pose3d::new(Translation3d::new(0., 0., 1.), Rotation3d::identity());
//! let corners = camera.project_points(
//!     &RotTrlTransform3d::make_relative_to(&truth),
//!     &model.field_vertices(&tag.pose),
//! );
//!
//! let estimator = VisionEstimator::new(camera, SolverOptions::default());
//! let estimate = estimator
//!     .estimate(&[TagDetection::new(7, corners)], &layout, &model)
//!     .expect("tag 7 is in view");
//!
//! let camera_pose = Pose3d::from(estimate.best);
//! assert!((camera_pose.z() - 1.).abs() < 1e-3);
//! // a single tag always leaves the planar flip as an alternative
//! assert!(estimate.alt.is_some());
//! ```

mod camera;
mod error;
mod estimation;
mod field;
mod options;
mod pose;
mod quaternion;
mod relation;
mod rot_trl;
mod rotation;
mod target;
mod transform;
mod translation;
mod twist;

pub mod coordinate_systems;
pub mod pnp;

#[cfg(test)]
mod testing;

pub use camera::{
    CameraModel, Distortion, DEFAULT_UNDISTORT_ITERATIONS, DEFAULT_UNDISTORT_TOLERANCE_PX,
};
pub use error::{CameraModelError, PnpError, RotationError};
pub use estimation::{estimate_cam_pose_pnp, visible_layout_tags, VisionEstimator};
pub use field::{AprilTag, FieldDimensions, FieldLayout, TagDetection};
pub use options::SolverOptions;
pub use pnp::PnpResult;
pub use pose::Pose3d;
pub use quaternion::Quaternion;
pub use relation::{CameraTargetRelation, Sightline};
pub use rot_trl::RotTrlTransform3d;
pub use rotation::Rotation3d;
pub use target::{TargetModel, APRIL_TAG_16H5_SIZE_M, APRIL_TAG_36H11_SIZE_M};
pub use transform::Transform3d;
pub use translation::Translation3d;
pub use twist::Twist3d;
