//! Pinhole camera model with OpenCV-style lens distortion.

use crate::coordinate_systems::translation_nwu_to_edn;
use crate::error::CameraModelError;
use crate::rot_trl::RotTrlTransform3d;
use crate::translation::Translation3d;
use nalgebra::{Matrix3, Point2, Vector3};

/// Maximum number of fixed-point iterations [`CameraModel::undistort_points`] runs per point.
pub const DEFAULT_UNDISTORT_ITERATIONS: u32 = 20;

/// Pixel residual below which [`CameraModel::undistort_points`] stops iterating early.
pub const DEFAULT_UNDISTORT_TOLERANCE_PX: f64 = 1e-4;

/// Radial and tangential lens distortion coefficients.
///
/// The model matches OpenCV's: with `r² = x² + y²` for normalized image coordinates `(x, y)`,
///
/// ```text
/// radial = (1 + k1 r² + k2 r⁴ + k3 r⁶) / (1 + k4 r² + k5 r⁴ + k6 r⁶)
/// x' = x radial + 2 p1 x y + p2 (r² + 2 x²)
/// y' = y radial + p1 (r² + 2 y²) + 2 p2 x y
/// ```
///
/// The 5-coefficient form `(k1, k2, p1, p2, k3)` leaves `k4 = k5 = k6 = 0`.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Distortion {
    k1: f64,
    k2: f64,
    p1: f64,
    p2: f64,
    k3: f64,
    k4: f64,
    k5: f64,
    k6: f64,
}

impl Distortion {
    /// No distortion at all.
    #[must_use]
    pub const fn none() -> Self {
        Self {
            k1: 0.,
            k2: 0.,
            p1: 0.,
            p2: 0.,
            k3: 0.,
            k4: 0.,
            k5: 0.,
            k6: 0.,
        }
    }

    /// Reads coefficients in OpenCV order, `(k1, k2, p1, p2, k3[, k4, k5, k6])`.
    pub fn from_coefficients(coefficients: &[f64]) -> Result<Self, CameraModelError> {
        let c = match coefficients.len() {
            5 | 8 => coefficients,
            n => return Err(CameraModelError::DistortionCoefficientCount(n)),
        };
        if c.iter().any(|k| !k.is_finite()) {
            return Err(CameraModelError::NonFinite);
        }
        let rational = |i: usize| c.get(i).copied().unwrap_or(0.);
        Ok(Self {
            k1: c[0],
            k2: c[1],
            p1: c[2],
            p2: c[3],
            k3: c[4],
            k4: rational(5),
            k5: rational(6),
            k6: rational(7),
        })
    }

    /// The coefficients in OpenCV order, always in the 8-coefficient form.
    #[must_use]
    pub fn coefficients(&self) -> [f64; 8] {
        [
            self.k1, self.k2, self.p1, self.p2, self.k3, self.k4, self.k5, self.k6,
        ]
    }

    fn radial(&self, r2: f64) -> f64 {
        let numerator = 1. + r2 * (self.k1 + r2 * (self.k2 + r2 * self.k3));
        let denominator = 1. + r2 * (self.k4 + r2 * (self.k5 + r2 * self.k6));
        numerator / denominator
    }

    fn tangential(&self, x: f64, y: f64, r2: f64) -> (f64, f64) {
        (
            2. * self.p1 * x * y + self.p2 * (r2 + 2. * x * x),
            self.p1 * (r2 + 2. * y * y) + 2. * self.p2 * x * y,
        )
    }

    /// Distorts an undistorted normalized image point.
    fn apply(&self, x: f64, y: f64) -> (f64, f64) {
        let r2 = x * x + y * y;
        let radial = self.radial(r2);
        let (dx, dy) = self.tangential(x, y, r2);
        (x * radial + dx, y * radial + dy)
    }
}

/// Camera intrinsics: focal lengths and principal point (in pixels), plus lens distortion.
///
/// Construct through [`CameraModel::new`], which validates its inputs, so that every solver can
/// assume a well-formed model.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraModel {
    fx: f64,
    fy: f64,
    cx: f64,
    cy: f64,
    distortion: Distortion,
}

impl CameraModel {
    /// Constructs a camera model from a 3×3 intrinsic matrix `[fx 0 cx; 0 fy cy; 0 0 1]` and 5 or
    /// 8 distortion coefficients in OpenCV order.
    pub fn new(
        camera_matrix: &Matrix3<f64>,
        dist_coeffs: &[f64],
    ) -> Result<Self, CameraModelError> {
        if camera_matrix.iter().any(|v| !v.is_finite()) {
            return Err(CameraModelError::NonFinite);
        }
        let m = camera_matrix;
        let skewed = m[(0, 1)] != 0. || m[(1, 0)] != 0.;
        let projective = m[(2, 0)] != 0. || m[(2, 1)] != 0. || m[(2, 2)] != 1.;
        if skewed || projective {
            return Err(CameraModelError::NotPinhole);
        }
        let distortion = Distortion::from_coefficients(dist_coeffs)?;
        Self::from_parts(m[(0, 0)], m[(1, 1)], m[(0, 2)], m[(1, 2)], distortion)
    }

    /// Constructs a camera model from its individual parameters.
    pub fn from_parts(
        fx: f64,
        fy: f64,
        cx: f64,
        cy: f64,
        distortion: Distortion,
    ) -> Result<Self, CameraModelError> {
        if !cx.is_finite() || !cy.is_finite() {
            return Err(CameraModelError::NonFinite);
        }
        if !(fx.is_finite() && fx > 0. && fy.is_finite() && fy > 0.) {
            return Err(CameraModelError::InvalidFocalLength { fx, fy });
        }
        Ok(Self {
            fx,
            fy,
            cx,
            cy,
            distortion,
        })
    }

    #[must_use]
    pub fn fx(&self) -> f64 {
        self.fx
    }

    #[must_use]
    pub fn fy(&self) -> f64 {
        self.fy
    }

    #[must_use]
    pub fn cx(&self) -> f64 {
        self.cx
    }

    #[must_use]
    pub fn cy(&self) -> f64 {
        self.cy
    }

    #[must_use]
    pub fn distortion(&self) -> Distortion {
        self.distortion
    }

    #[must_use]
    pub fn camera_matrix(&self) -> Matrix3<f64> {
        Matrix3::new(self.fx, 0., self.cx, 0., self.fy, self.cy, 0., 0., 1.)
    }

    /// Maps an undistorted normalized image point to distorted pixel coordinates.
    pub(crate) fn normalized_to_pixel(&self, normalized: &Point2<f64>) -> Point2<f64> {
        let (x, y) = self.distortion.apply(normalized.x, normalized.y);
        Point2::new(self.fx * x + self.cx, self.fy * y + self.cy)
    }

    /// Projects a point given in the camera's optical (EDN) frame to pixel coordinates.
    ///
    /// Points at or behind the camera plane have no image and project to NaN.
    pub(crate) fn project_edn(&self, point: &Vector3<f64>) -> Point2<f64> {
        if !(point.z > 0.) {
            return Point2::new(f64::NAN, f64::NAN);
        }
        self.normalized_to_pixel(&Point2::new(point.x / point.z, point.y / point.z))
    }

    /// Projects points through a camera.
    ///
    /// `world_to_camera` maps world (NWU) points into the camera's NWU frame, eg,
    /// [`RotTrlTransform3d::make_relative_to`] with the camera's field pose. The result is in
    /// distorted pixel coordinates, in the same order as `object_points`. Points at or behind the
    /// camera come out as NaN.
    #[must_use]
    pub fn project_points(
        &self,
        world_to_camera: &RotTrlTransform3d,
        object_points: &[Translation3d],
    ) -> Vec<Point2<f64>> {
        object_points
            .iter()
            .map(|p| {
                let in_camera = translation_nwu_to_edn(&world_to_camera.apply_translation(p));
                self.project_edn(&in_camera.to_vector())
            })
            .collect()
    }

    /// Applies lens distortion to undistorted pixel coordinates.
    #[must_use]
    pub fn distort_points(&self, points: &[Point2<f64>]) -> Vec<Point2<f64>> {
        points
            .iter()
            .map(|p| self.normalized_to_pixel(&self.pixel_to_normalized(p)))
            .collect()
    }

    /// Removes lens distortion from pixel coordinates, returning undistorted pixel coordinates.
    ///
    /// Uses the default iteration budget; see [`CameraModel::undistort_points_with`].
    #[must_use]
    pub fn undistort_points(&self, points: &[Point2<f64>]) -> Vec<Point2<f64>> {
        self.undistort_points_with(
            points,
            DEFAULT_UNDISTORT_ITERATIONS,
            DEFAULT_UNDISTORT_TOLERANCE_PX,
        )
    }

    /// Removes lens distortion with an explicit iteration cap and pixel tolerance.
    #[must_use]
    pub fn undistort_points_with(
        &self,
        points: &[Point2<f64>],
        max_iterations: u32,
        tolerance_px: f64,
    ) -> Vec<Point2<f64>> {
        self.normalize_points_with(points, max_iterations, tolerance_px)
            .iter()
            .map(|n| Point2::new(self.fx * n.x + self.cx, self.fy * n.y + self.cy))
            .collect()
    }

    /// Removes lens distortion and the intrinsic matrix, returning normalized image coordinates
    /// (ie, points on the `z = 1` plane of the optical frame).
    #[must_use]
    pub fn normalize_points_with(
        &self,
        points: &[Point2<f64>],
        max_iterations: u32,
        tolerance_px: f64,
    ) -> Vec<Point2<f64>> {
        points
            .iter()
            .map(|p| self.undistort_normalized(p, max_iterations, tolerance_px))
            .collect()
    }

    fn pixel_to_normalized(&self, p: &Point2<f64>) -> Point2<f64> {
        Point2::new((p.x - self.cx) / self.fx, (p.y - self.cy) / self.fy)
    }

    fn undistort_normalized(
        &self,
        pixel: &Point2<f64>,
        max_iterations: u32,
        tolerance_px: f64,
    ) -> Point2<f64> {
        let d = &self.distortion;
        let distorted = self.pixel_to_normalized(pixel);
        let (x0, y0) = (distorted.x, distorted.y);
        let (mut x, mut y) = (x0, y0);

        for _ in 0..max_iterations {
            let r2 = x * x + y * y;
            let icdist = 1. / d.radial(r2);
            if icdist < 0. {
                // past the fold of the distortion polynomial; there is no meaningful inverse
                tracing::trace!(x0, y0, "undistortion left the invertible region");
                return Point2::new(x0, y0);
            }
            let (dx, dy) = d.tangential(x, y, r2);
            x = (x0 - dx) * icdist;
            y = (y0 - dy) * icdist;

            let (xd, yd) = d.apply(x, y);
            let residual = ((xd - x0) * self.fx).hypot((yd - y0) * self.fy);
            if residual < tolerance_px {
                break;
            }
        }
        Point2::new(x, y)
    }

    /// Root-mean-square pixel distance between two equally long point lists.
    pub(crate) fn rms_pixel_error(projected: &[Point2<f64>], observed: &[Point2<f64>]) -> f64 {
        let sum: f64 = projected
            .iter()
            .zip(observed)
            .map(|(p, o)| (p - o).norm_squared())
            .sum();
        (sum / projected.len() as f64).sqrt()
    }
}
