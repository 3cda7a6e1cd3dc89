use crate::camera::{DEFAULT_UNDISTORT_ITERATIONS, DEFAULT_UNDISTORT_TOLERANCE_PX};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Tunables for the pose solvers.
///
/// Every field has a sensible default, so configuration files only need to name what they change:
///
/// ```
/// # #[cfg(feature = "serde")] {
/// # use tagpose::SolverOptions;
/// let options: SolverOptions = serde_yaml::from_str("refine_max_iterations: 50").unwrap();
/// assert_eq!(options.refine_max_iterations, 50);
/// assert_eq!(options.undistort_max_iterations, 20);
/// # }
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SolverOptions {
    /// Upper bound on fixed-point iterations when removing lens distortion from each corner.
    pub undistort_max_iterations: u32,
    /// Pixel residual at which lens undistortion stops early.
    pub undistort_tolerance_px: f64,
    /// Upper bound on Levenberg-Marquardt iterations in the multi-tag solver.
    pub refine_max_iterations: u32,
    /// The refinement stops once a step changes the pose by less than this (in radians and
    /// meters combined).
    pub refine_min_step: f64,
    /// How far (in pixels, along both axes) the first corner is nudged when the single-tag
    /// solver has to retry after a non-finite result.
    pub retry_perturbation_px: f64,
}

impl Default for SolverOptions {
    fn default() -> Self {
        Self {
            undistort_max_iterations: DEFAULT_UNDISTORT_ITERATIONS,
            undistort_tolerance_px: DEFAULT_UNDISTORT_TOLERANCE_PX,
            refine_max_iterations: 100,
            refine_min_step: 1e-12,
            retry_perturbation_px: 0.001,
        }
    }
}
