//! Camera pose estimation against a known field layout.
//!
//! This is where the pieces come together: detections are matched against a [`FieldLayout`],
//! the matching corners are handed to one of the [`pnp`](crate::pnp) solvers, and the solver's
//! camera-relative answer is turned into where the camera is on the field.

use crate::camera::CameraModel;
use crate::error::PnpError;
use crate::field::{AprilTag, FieldLayout, TagDetection};
use crate::options::SolverOptions;
use crate::pnp::{solve_pnp_sqpnp, solve_pnp_square, PnpResult};
use crate::pose::Pose3d;
use crate::target::TargetModel;
use crate::transform::Transform3d;
use crate::translation::Translation3d;
use nalgebra::{Matrix3, Point2};

/// The layout tags that `detections` refer to, in detection order.
///
/// Detections of tags the layout does not know about are skipped.
#[must_use]
pub fn visible_layout_tags(detections: &[TagDetection], layout: &FieldLayout) -> Vec<AprilTag> {
    known_detections(detections, layout)
        .map(|(_, tag)| *tag)
        .collect()
}

/// Pairs each detection with its layout tag, skipping detections of unknown tags.
fn known_detections<'a>(
    detections: &'a [TagDetection],
    layout: &'a FieldLayout,
) -> impl Iterator<Item = (&'a TagDetection, &'a AprilTag)> {
    detections.iter().filter_map(|detection| {
        let tag = layout.tag(detection.id);
        if tag.is_none() {
            tracing::debug!(id = detection.id, "dropping detection of a tag not in the layout");
        }
        tag.map(|tag| (detection, tag))
    })
}

/// Estimates camera field poses from tag detections.
///
/// An estimator is built once per camera (its intrinsics do not change from frame to frame) and
/// then asked for an estimate per frame. It holds no mutable state, so it can be shared freely.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VisionEstimator {
    camera: CameraModel,
    options: SolverOptions,
}

impl VisionEstimator {
    #[must_use]
    pub fn new(camera: CameraModel, options: SolverOptions) -> Self {
        Self { camera, options }
    }

    #[must_use]
    pub fn camera(&self) -> &CameraModel {
        &self.camera
    }

    #[must_use]
    pub fn options(&self) -> &SolverOptions {
        &self.options
    }

    /// Estimates where the camera is on the field.
    ///
    /// The [`best`](PnpResult::best) (and [`alt`](PnpResult::alt)) of the result is the field
    /// pose of the camera, as a transform from the field origin; use `Pose3d::from` for the pose
    /// itself.
    ///
    /// With a single known tag in view, the result carries both solutions of the planar flip
    /// ambiguity. With two or more, all corners are solved for at once, which is both more
    /// accurate and unambiguous, so there is no alternative and the ambiguity is zero.
    ///
    /// Detections of unknown tags are ignored. The estimate fails with
    /// [`PnpError::InsufficientCorrespondence`] when no known tags remain or when the corner
    /// count does not fit `model`, and with [`PnpError::NumericDivergence`] when the solver
    /// does not converge.
    pub fn estimate(
        &self,
        detections: &[TagDetection],
        layout: &FieldLayout,
        model: &TargetModel,
    ) -> Result<PnpResult, PnpError> {
        let known: Vec<(&TagDetection, Pose3d)> = known_detections(detections, layout)
            .map(|(detection, tag)| (detection, tag.pose))
            .collect();

        let corners: usize = known.iter().map(|(d, _)| d.corners.len()).sum();
        let per_tag = model.vertices().len();
        if known.is_empty()
            || corners % 4 != 0
            || known.iter().any(|(d, _)| d.corners.len() != per_tag)
        {
            return Err(PnpError::InsufficientCorrespondence {
                required: known.len().max(1) * per_tag,
                actual: corners,
            });
        }

        match known.as_slice() {
            [(detection, tag_pose)] => self.estimate_single(detection, tag_pose, model),
            _ => self.estimate_multi(&known, model),
        }
    }

    fn estimate_single(
        &self,
        detection: &TagDetection,
        tag_pose: &Pose3d,
        model: &TargetModel,
    ) -> Result<PnpResult, PnpError> {
        let camera_to_tag =
            solve_pnp_square(&self.camera, model.vertices(), &detection.corners, &self.options)?;

        // the tag as seen from the camera, turned around
        let field_pose = |camera_to_tag: &Transform3d| {
            Transform3d::from(tag_pose.transform_by(&camera_to_tag.inverse()))
        };

        let result = PnpResult {
            best: field_pose(&camera_to_tag.best),
            alt: camera_to_tag.alt.as_ref().map(field_pose),
            ..camera_to_tag
        };
        tracing::debug!(
            id = detection.id,
            error = result.best_reproj_error,
            ambiguity = result.ambiguity,
            "estimated camera pose from a single tag"
        );
        Ok(result)
    }

    fn estimate_multi(
        &self,
        known: &[(&TagDetection, Pose3d)],
        model: &TargetModel,
    ) -> Result<PnpResult, PnpError> {
        let object: Vec<Translation3d> = known
            .iter()
            .flat_map(|(_, pose)| model.field_vertices(pose))
            .collect();
        let image: Vec<Point2<f64>> = known
            .iter()
            .flat_map(|(detection, _)| detection.corners.iter().copied())
            .collect();

        let camera_to_field = solve_pnp_sqpnp(&self.camera, &object, &image, &self.options)?;
        let result = PnpResult::unambiguous(
            camera_to_field.best.inverse(),
            camera_to_field.best_reproj_error,
        );
        tracing::debug!(
            tags = known.len(),
            error = result.best_reproj_error,
            "estimated camera pose from multiple tags"
        );
        Ok(result)
    }
}

/// One-shot estimate of where a camera is on the field, with default [`SolverOptions`].
///
/// Equivalent to building a [`VisionEstimator`] from `camera_matrix` and `dist_coeffs` and asking
/// it for a single estimate. Malformed intrinsics are reported as
/// [`PnpError::InvalidCameraModel`]; callers that estimate every frame should build the
/// estimator once instead, so that such errors surface at startup.
pub fn estimate_cam_pose_pnp(
    camera_matrix: &Matrix3<f64>,
    dist_coeffs: &[f64],
    detections: &[TagDetection],
    layout: &FieldLayout,
    model: &TargetModel,
) -> Result<PnpResult, PnpError> {
    let camera = CameraModel::new(camera_matrix, dist_coeffs)?;
    VisionEstimator::new(camera, SolverOptions::default()).estimate(detections, layout, model)
}
