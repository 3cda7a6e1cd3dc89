//! Perspective-n-Point solvers.
//!
//! Both solvers take object points in NWU (see [`coordinate_systems`](crate::coordinate_systems))
//! and distorted pixel observations, and return the pose of the object's frame as seen from the
//! camera, ie, the camera-to-object [`Transform3d`] in NWU.
//!
//! - [`solve_pnp_square`] handles a single square fiducial (four coplanar corners) and reports
//!   both solutions of the planar flip ambiguity.
//! - [`solve_pnp_sqpnp`] handles any number of points from one or more fiducials, and reports a
//!   single, refined solution.

mod dlt;
mod homography;
mod ippe;
mod refine;

use crate::camera::CameraModel;
use crate::coordinate_systems::{rotation_edn_to_nwu, translation_to_tvec, tvec_to_translation};
use crate::error::PnpError;
use crate::options::SolverOptions;
use crate::rotation::Rotation3d;
use crate::transform::Transform3d;
use crate::translation::Translation3d;
use nalgebra::{Isometry3, Point2, Vector3};
use std::cmp::Ordering;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Fewest correspondences [`solve_pnp_sqpnp`] accepts.
pub const MIN_CORRESPONDENCES: usize = 4;

/// The outcome of a pose solve.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PnpResult {
    /// The solution with the lowest reprojection error.
    pub best: Transform3d,
    /// Root-mean-square reprojection error of [`PnpResult::best`], in pixels.
    pub best_reproj_error: f64,
    /// The other solution of a planar flip ambiguity, if the solver produced one.
    pub alt: Option<Transform3d>,
    /// Root-mean-square reprojection error of [`PnpResult::alt`], in pixels.
    pub alt_reproj_error: Option<f64>,
    /// `best_reproj_error / alt_reproj_error`, in `[0, 1]`.
    ///
    /// Values near 0 mean the best solution is clearly better than the alternative; values near 1
    /// mean the view could not tell them apart. Zero when there is no alternative.
    pub ambiguity: f64,
}

impl PnpResult {
    /// A result with a single solution.
    #[must_use]
    pub fn unambiguous(best: Transform3d, best_reproj_error: f64) -> Self {
        Self {
            best,
            best_reproj_error,
            alt: None,
            alt_reproj_error: None,
            ambiguity: 0.,
        }
    }

    /// A result with two competing solutions, ordered so that `best` has the lower error.
    #[must_use]
    pub fn ambiguous(
        best: Transform3d,
        best_reproj_error: f64,
        alt: Transform3d,
        alt_reproj_error: f64,
    ) -> Self {
        let (best, best_reproj_error, alt, alt_reproj_error) =
            if best_reproj_error <= alt_reproj_error {
                (best, best_reproj_error, alt, alt_reproj_error)
            } else {
                (alt, alt_reproj_error, best, best_reproj_error)
            };
        let ambiguity = if alt_reproj_error > 0. {
            best_reproj_error / alt_reproj_error
        } else {
            // two perfect fits are as ambiguous as it gets
            1.
        };
        Self {
            best,
            best_reproj_error,
            alt: Some(alt),
            alt_reproj_error: Some(alt_reproj_error),
            ambiguity,
        }
    }
}

/// Reorders a circular sequence, starting at `shift` and walking backwards if asked to.
///
/// Element `i` of the result is element `(dir · (i + shift)) mod n` of the input, where `dir` is
/// `-1` when walking backwards and `1` otherwise. So with `backwards = true` and `shift = -1`,
/// `[a, b, c, d]` becomes `[b, a, d, c]`.
#[must_use]
pub fn reorder_circular<T: Clone>(elements: &[T], backwards: bool, shift: isize) -> Vec<T> {
    let n = elements.len() as isize;
    let dir = if backwards { -1 } else { 1 };
    (0..n)
        .map(|i| elements[(dir * (i + shift)).rem_euclid(n) as usize].clone())
        .collect()
}

/// A camera-from-object pose in the optical frame, with its pixel reprojection error.
#[derive(Clone, Copy, Debug)]
struct Candidate {
    pose: Isometry3<f64>,
    error: f64,
}

impl Candidate {
    fn score(
        pose: Isometry3<f64>,
        camera: &CameraModel,
        object: &[Vector3<f64>],
        image: &[Point2<f64>],
    ) -> Self {
        let in_camera: Vec<Vector3<f64>> = object
            .iter()
            .map(|p| pose.rotation * p + pose.translation.vector)
            .collect();
        // a pose that puts any point behind the camera is not a solution
        if in_camera.iter().any(|c| !(c.z > 0.)) {
            return Self {
                pose,
                error: f64::INFINITY,
            };
        }

        let projected: Vec<Point2<f64>> = in_camera.iter().map(|c| camera.project_edn(c)).collect();
        let error = CameraModel::rms_pixel_error(&projected, image);
        Self {
            pose,
            error: if error.is_finite() { error } else { f64::INFINITY },
        }
    }

    fn by_error(a: &Self, b: &Self) -> Ordering {
        a.error.total_cmp(&b.error)
    }

    /// The camera-to-object transform in NWU.
    fn to_transform(&self) -> Transform3d {
        Transform3d::new(
            tvec_to_translation(&self.pose.translation.vector),
            rotation_edn_to_nwu(&Rotation3d::from(self.pose.rotation)),
        )
    }

    fn is_valid(&self) -> bool {
        self.error.is_finite() && self.to_transform().is_finite()
    }
}

/// Solves for the pose of a square fiducial from its four corners.
///
/// `model_trls` are the corners in the fiducial's own frame (NWU, on the `x = 0` plane, eg, from
/// [`TargetModel::vertices`](crate::TargetModel::vertices)) and `image_points` the matching
/// distorted pixel observations, in the same order.
///
/// Small planar targets have two poses that explain the corners almost equally well. Both are
/// returned, ordered by reprojection error, along with their [ambiguity](PnpResult::ambiguity).
/// If the solver produces a non-finite result, it retries once with the first corner nudged by
/// [`SolverOptions::retry_perturbation_px`].
pub fn solve_pnp_square(
    camera: &CameraModel,
    model_trls: &[Translation3d],
    image_points: &[Point2<f64>],
    options: &SolverOptions,
) -> Result<PnpResult, PnpError> {
    if model_trls.len() != 4 || image_points.len() != 4 {
        return Err(PnpError::InsufficientCorrespondence {
            required: 4,
            actual: model_trls.len().min(image_points.len()),
        });
    }

    // keep the corners in the winding order square-target solvers conventionally expect
    let object: Vec<Vector3<f64>> = reorder_circular(model_trls, true, -1)
        .iter()
        .map(translation_to_tvec)
        .collect();
    let image = reorder_circular(image_points, true, -1);

    retry_with_nudge(&image, options.retry_perturbation_px, |image| {
        solve_square_once(camera, &object, image, options)
    })
    .ok_or(PnpError::NumericDivergence)
}

/// One attempt at the square solve. `None` unless the best candidate is finite.
fn solve_square_once(
    camera: &CameraModel,
    object: &[Vector3<f64>],
    image: &[Point2<f64>],
    options: &SolverOptions,
) -> Option<PnpResult> {
    let normalized = camera.normalize_points_with(
        image,
        options.undistort_max_iterations,
        options.undistort_tolerance_px,
    );
    let mut candidates: Vec<Candidate> = ippe::solve(object, &normalized)?
        .into_iter()
        .map(|pose| Candidate::score(pose, camera, object, image))
        .collect();
    candidates.sort_by(Candidate::by_error);

    let [best, alt] = candidates.as_slice() else {
        return None;
    };
    if !best.is_valid() {
        return None;
    }
    let result = if alt.is_valid() {
        PnpResult::ambiguous(best.to_transform(), best.error, alt.to_transform(), alt.error)
    } else {
        PnpResult::unambiguous(best.to_transform(), best.error)
    };
    tracing::trace!(
        best_error = result.best_reproj_error,
        ambiguity = result.ambiguity,
        "solved square target"
    );
    Some(result)
}

/// Runs `attempt` on `image`, and if that finds nothing, once more with the first point moved by
/// `-perturbation_px` along both axes.
fn retry_with_nudge<T>(
    image: &[Point2<f64>],
    perturbation_px: f64,
    mut attempt: impl FnMut(&[Point2<f64>]) -> Option<T>,
) -> Option<T> {
    if let Some(found) = attempt(image) {
        return Some(found);
    }
    tracing::debug!(perturbation_px, "square target solve was not finite, nudging a corner");
    let mut nudged = image.to_vec();
    if let Some(first) = nudged.first_mut() {
        first.x -= perturbation_px;
        first.y -= perturbation_px;
    }
    attempt(&nudged)
}

/// Solves for a camera-to-object pose from any number (at least four) of point correspondences.
///
/// The object points may come from several fiducials and need not be coplanar. The solver seeds
/// itself with the planar solutions of the points' best-fit plane (and, for six or more
/// non-coplanar points, a linear solve), refines every seed by minimizing the pixel reprojection
/// error, and keeps the best one. There is never an alternative solution, so the result's
/// [ambiguity](PnpResult::ambiguity) is zero.
pub fn solve_pnp_sqpnp(
    camera: &CameraModel,
    object_trls: &[Translation3d],
    image_points: &[Point2<f64>],
    options: &SolverOptions,
) -> Result<PnpResult, PnpError> {
    if object_trls.len() != image_points.len() {
        return Err(PnpError::InsufficientCorrespondence {
            required: object_trls.len(),
            actual: image_points.len(),
        });
    }
    if object_trls.len() < MIN_CORRESPONDENCES {
        return Err(PnpError::InsufficientCorrespondence {
            required: MIN_CORRESPONDENCES,
            actual: object_trls.len(),
        });
    }

    let object: Vec<Vector3<f64>> = object_trls.iter().map(translation_to_tvec).collect();
    let normalized = camera.normalize_points_with(
        image_points,
        options.undistort_max_iterations,
        options.undistort_tolerance_px,
    );

    let mut seeds: Vec<Isometry3<f64>> = Vec::new();
    if let Some(planar) = ippe::solve(&object, &normalized) {
        seeds.extend(planar);
    }
    let coplanar = ippe::Plane::fit(&object).is_some_and(|plane| plane.is_coplanar());
    if !coplanar && object.len() >= dlt::MIN_POINTS {
        seeds.extend(dlt::solve(&object, &normalized));
    }
    tracing::trace!(seeds = seeds.len(), coplanar, "seeded multi-point solve");

    let refiner = refine::Refiner::new(&object, &normalized, camera.fx(), camera.fy());
    let best = seeds
        .into_iter()
        .map(|seed| refiner.refine(seed, options.refine_max_iterations, options.refine_min_step))
        .map(|pose| Candidate::score(pose, camera, &object, image_points))
        .filter(Candidate::is_valid)
        .min_by(Candidate::by_error)
        .ok_or_else(|| {
            tracing::debug!(points = object.len(), "multi-point solve found no finite pose");
            PnpError::NumericDivergence
        })?;

    Ok(PnpResult::unambiguous(best.to_transform(), best.error))
}
