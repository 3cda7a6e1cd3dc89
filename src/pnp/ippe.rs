//! Infinitesimal Plane-based Pose Estimation.
//!
//! T. Collins and A. Bartoli, "Infinitesimal Plane-Based Pose Estimation", IJCV 2014.
//!
//! A planar target seen by a pinhole camera is described by a homography, and the local behavior
//! of that homography at a single point (its Jacobian) pins the target's rotation down to exactly
//! two candidates. Those two are the well-known "flip" ambiguity of small or distant planar
//! targets, and both are returned so that callers can judge how ambiguous a view was.

use super::homography::find_homography;
use nalgebra::{
    Isometry3, Matrix2, Matrix3, Point2, Rotation3, Translation3, UnitQuaternion, Vector2, Vector3,
};

/// Spread ratio (smallest over largest covariance eigenvalue) below which points count as
/// coplanar.
const COPLANAR_RATIO: f64 = 1e-10;

/// The best-fit plane through a point set.
pub(crate) struct Plane {
    centroid: Vector3<f64>,
    /// Columns are the two in-plane directions and the normal, forming a right-handed frame.
    axes: Matrix3<f64>,
    flatness: f64,
}

impl Plane {
    /// Fits a plane through `points` by principal component analysis.
    ///
    /// Returns `None` when the points do not span a plane (all coincident or collinear).
    pub(crate) fn fit(points: &[Vector3<f64>]) -> Option<Self> {
        if points.is_empty() {
            return None;
        }
        let centroid = points.iter().sum::<Vector3<f64>>() / points.len() as f64;
        let covariance = points.iter().fold(Matrix3::zeros(), |acc, p| {
            let d = p - centroid;
            acc + d * d.transpose()
        });

        let eigen = covariance.symmetric_eigen();
        let mut order = [0, 1, 2];
        order.sort_by(|&a, &b| eigen.eigenvalues[a].total_cmp(&eigen.eigenvalues[b]));
        let [normal, minor, major] = order;

        let spread = eigen.eigenvalues[major];
        if !(spread > 0.) || eigen.eigenvalues[minor] <= spread * 1e-12 {
            return None;
        }

        let n = eigen.eigenvectors.column(normal).normalize();
        let e1 = eigen.eigenvectors.column(major).normalize();
        let e2 = n.cross(&e1).normalize();
        let e1 = e2.cross(&n);

        Some(Self {
            centroid,
            axes: Matrix3::from_columns(&[e1, e2, n]),
            flatness: eigen.eigenvalues[normal].max(0.) / spread,
        })
    }

    pub(crate) fn is_coplanar(&self) -> bool {
        self.flatness < COPLANAR_RATIO
    }

    fn to_local(&self, p: &Vector3<f64>) -> Vector3<f64> {
        self.axes.transpose() * (p - self.centroid)
    }
}

/// Rotation that takes the optical axis `(0, 0, 1)` onto the direction of `(v, 1)`.
fn rotate_z_axis_to(v: &Vector2<f64>) -> Matrix3<f64> {
    let t = v.norm();
    if t < f64::EPSILON {
        return Matrix3::identity();
    }
    let s = (t * t + 1.).sqrt();
    let cos = 1. / s;
    let sin = t / s;
    let (kx, ky) = (v.x / t, v.y / t);
    let k = Matrix3::new(0., 0., kx, 0., 0., ky, -kx, -ky, 0.);
    Matrix3::identity() + k * sin + k * k * (1. - cos)
}

/// The two rotations compatible with homography Jacobian `j` at a point imaged at `v`.
fn rotations_from_jacobian(
    j: &Matrix2<f64>,
    v: &Vector2<f64>,
) -> Option<(Matrix3<f64>, Matrix3<f64>)> {
    let rv = rotate_z_axis_to(v);

    // B = [I2 | -v] Rv[:, 0..2]
    let b = Matrix2::new(
        rv[(0, 0)] - v.x * rv[(2, 0)],
        rv[(0, 1)] - v.x * rv[(2, 1)],
        rv[(1, 0)] - v.y * rv[(2, 0)],
        rv[(1, 1)] - v.y * rv[(2, 1)],
    );
    let a = b.try_inverse()? * j;

    // largest singular value of A, from the eigenvalues of A Aᵀ
    let aat = a * a.transpose();
    let half_trace = 0.5 * (aat[(0, 0)] + aat[(1, 1)]);
    let gap = (0.25 * (aat[(0, 0)] - aat[(1, 1)]).powi(2) + aat[(0, 1)].powi(2)).sqrt();
    let gamma = (half_trace + gap).sqrt();
    if !(gamma > f64::EPSILON) {
        return None;
    }

    let r22 = a / gamma;
    let h = Matrix2::identity() - r22.transpose() * r22;
    let b0 = h[(0, 0)].max(0.).sqrt();
    let mut b1 = h[(1, 1)].max(0.).sqrt();
    if h[(0, 1)] < 0. {
        b1 = -b1;
    }

    let d = Vector3::new(r22[(0, 0)], r22[(1, 0)], b0)
        .cross(&Vector3::new(r22[(0, 1)], r22[(1, 1)], b1));
    let (c, a) = (Vector2::new(d.x, d.y), d.z);

    #[rustfmt::skip]
    let first = Matrix3::new(
        r22[(0, 0)], r22[(0, 1)], c.x,
        r22[(1, 0)], r22[(1, 1)], c.y,
        b0, b1, a,
    );
    #[rustfmt::skip]
    let second = Matrix3::new(
        r22[(0, 0)], r22[(0, 1)], -c.x,
        r22[(1, 0)], r22[(1, 1)], -c.y,
        -b0, -b1, a,
    );
    Some((rv * first, rv * second))
}

/// Least-squares translation for a known rotation, from `t_x - u t_z = u (R p)_z - (R p)_x` and
/// the same for `v`.
fn translation_for(
    rotation: &Matrix3<f64>,
    object: &[Vector3<f64>],
    normalized: &[Point2<f64>],
) -> Option<Vector3<f64>> {
    let mut ata = Matrix3::zeros();
    let mut atb = Vector3::zeros();
    for (p, m) in object.iter().zip(normalized) {
        let rp = rotation * p;
        let rows = [
            (Vector3::new(1., 0., -m.x), m.x * rp.z - rp.x),
            (Vector3::new(0., 1., -m.y), m.y * rp.z - rp.y),
        ];
        for (a, b) in rows {
            ata += a * a.transpose();
            atb += a * b;
        }
    }
    ata.cholesky().map(|c| c.solve(&atb))
}

/// Solves for the two IPPE poses of a (roughly) planar point set.
///
/// `object` is in the optical frame of the target and `normalized` holds the matching
/// undistorted, normalized image points. Each returned isometry maps object points into the
/// camera's optical frame. If the points are not exactly coplanar, the poses are those of their
/// best-fit plane, which is good enough to seed a refinement.
pub(crate) fn solve(
    object: &[Vector3<f64>],
    normalized: &[Point2<f64>],
) -> Option<[Isometry3<f64>; 2]> {
    let plane = Plane::fit(object)?;
    let local: Vec<Vector3<f64>> = object.iter().map(|p| plane.to_local(p)).collect();
    let flat: Vec<Point2<f64>> = local.iter().map(|p| Point2::new(p.x, p.y)).collect();

    let h = find_homography(&flat, normalized)?;
    let j = Matrix2::new(
        h[(0, 0)] - h[(2, 0)] * h[(0, 2)],
        h[(0, 1)] - h[(2, 1)] * h[(0, 2)],
        h[(1, 0)] - h[(2, 0)] * h[(1, 2)],
        h[(1, 1)] - h[(2, 1)] * h[(1, 2)],
    );
    let v = Vector2::new(h[(0, 2)], h[(1, 2)]);
    let (first, second) = rotations_from_jacobian(&j, &v)?;

    let to_object_frame = |rotation: Matrix3<f64>| -> Option<Isometry3<f64>> {
        let t = translation_for(&rotation, &local, normalized)?;
        // x_cam = R Pᵀ (x - c) + t
        let rotation = rotation * plane.axes.transpose();
        let translation = t - rotation * plane.centroid;
        let rotation =
            UnitQuaternion::from_rotation_matrix(&Rotation3::from_matrix_unchecked(rotation));
        Some(Isometry3::from_parts(Translation3::from(translation), rotation))
    };
    Some([to_object_frame(first)?, to_object_frame(second)?])
}

#[cfg(test)]
mod tests {
    use super::{solve, Plane};
    use approx::assert_relative_eq;
    use nalgebra::{Isometry3, Point2, Vector3};

    fn project(pose: &Isometry3<f64>, points: &[Vector3<f64>]) -> Vec<Point2<f64>> {
        points
            .iter()
            .map(|p| {
                let c = pose.rotation * p + pose.translation.vector;
                Point2::new(c.x / c.z, c.y / c.z)
            })
            .collect()
    }

    fn square(side: f64) -> Vec<Vector3<f64>> {
        let h = side / 2.;
        vec![
            Vector3::new(-h, h, 0.),
            Vector3::new(h, h, 0.),
            Vector3::new(h, -h, 0.),
            Vector3::new(-h, -h, 0.),
        ]
    }

    #[test]
    fn one_candidate_is_the_true_pose() {
        let truth = Isometry3::new(Vector3::new(0.1, -0.05, 1.5), Vector3::new(0.3, -0.4, 0.2));
        let object = square(0.2);
        let image = project(&truth, &object);

        let [a, b] = solve(&object, &image).expect("well-posed");
        let error = |pose: &Isometry3<f64>| {
            project(pose, &object)
                .iter()
                .zip(&image)
                .map(|(p, q)| (p - q).norm())
                .fold(0., f64::max)
        };
        let best = if error(&a) <= error(&b) { a } else { b };
        assert!(error(&best) < 1e-9);
        assert_relative_eq!(best.translation.vector, truth.translation.vector, epsilon = 1e-7);
        assert!(best.rotation.angle_to(&truth.rotation) < 1e-7);
    }

    #[test]
    fn handles_a_plane_not_at_z_zero() {
        let truth = Isometry3::new(Vector3::new(-0.2, 0.1, 3.), Vector3::new(-0.1, 0.6, 0.05));
        // a tilted board of six points, away from the origin
        let object: Vec<_> = [(0., 0.), (0.4, 0.), (0.4, 0.3), (0., 0.3), (0.2, 0.1), (0.1, 0.25)]
            .into_iter()
            .map(|(x, y)| Vector3::new(1. + x, 2. + y, 0.5 + 0.5 * x - 0.2 * y))
            .collect();
        let image = project(&truth, &object);

        let candidates = solve(&object, &image).expect("well-posed");
        assert!(candidates.iter().any(|c| {
            (c.translation.vector - truth.translation.vector).norm() < 1e-7
                && c.rotation.angle_to(&truth.rotation) < 1e-7
        }));
    }

    #[test]
    fn plane_fit() {
        let flat = [
            Vector3::new(0., 0., 1.),
            Vector3::new(1., 0., 1.),
            Vector3::new(0., 1., 1.),
            Vector3::new(1., 1., 1.),
        ];
        let plane = Plane::fit(&flat).expect("spans a plane");
        assert!(plane.is_coplanar());

        let bumpy = [flat[0], flat[1], flat[2], Vector3::new(1., 1., 2.)];
        assert!(!Plane::fit(&bumpy).expect("spans a plane").is_coplanar());

        let line = [Vector3::zeros(), Vector3::x(), Vector3::x() * 2.];
        assert!(Plane::fit(&line).is_none());
    }
}
