use thiserror::Error;

/// Why a matrix could not be turned into a [`Rotation3d`](crate::Rotation3d).
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum RotationError {
    /// `‖R Rᵀ - I‖` exceeded the tolerance.
    #[error("matrix is not orthogonal (‖R Rᵀ - I‖ = {orthogonality:e})")]
    NotOrthogonal { orthogonality: f64 },
    /// The matrix is orthogonal but includes a reflection.
    #[error("matrix is not a proper rotation (det R = {determinant})")]
    NotProper { determinant: f64 },
}

/// Why camera intrinsics were rejected by [`CameraModel::new`](crate::CameraModel::new).
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum CameraModelError {
    #[error("camera matrix must have the form [fx 0 cx; 0 fy cy; 0 0 1]")]
    NotPinhole,
    #[error("focal lengths must be finite and positive (fx = {fx}, fy = {fy})")]
    InvalidFocalLength { fx: f64, fy: f64 },
    #[error("expected 5 or 8 distortion coefficients, got {0}")]
    DistortionCoefficientCount(usize),
    #[error("camera model contains non-finite values")]
    NonFinite,
}

/// Why a pose could not be estimated.
///
/// Apart from [`PnpError::InvalidCameraModel`], none of these are exceptional: a frame without
/// enough known tags is routine, and callers should treat it as "no estimate for this frame". An
/// invalid camera model is a configuration bug and is best surfaced at startup by building a
/// [`CameraModel`](crate::CameraModel) up front.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum PnpError {
    /// Too few (or malformed) 2D–3D correspondences to solve for a pose.
    #[error("need {required} point correspondences, got {actual}")]
    InsufficientCorrespondence { required: usize, actual: usize },
    /// The solver only produced non-finite candidates, even after retrying.
    #[error("solver did not produce a finite pose")]
    NumericDivergence,
    #[error("invalid camera model: {0}")]
    InvalidCameraModel(#[from] CameraModelError),
}
