use nalgebra::{Matrix3, Point2, SMatrix, SVector, Vector2};
use std::f64::consts::SQRT_2;

/// Hartley conditioning: moves the centroid to the origin and scales the mean distance from it to
/// √2.
fn conditioning(points: &[Point2<f64>]) -> Option<Matrix3<f64>> {
    let n = points.len() as f64;
    let centroid = points
        .iter()
        .fold(Vector2::zeros(), |acc, p| acc + p.coords)
        / n;
    let mean_distance = points
        .iter()
        .map(|p| (p.coords - centroid).norm())
        .sum::<f64>()
        / n;
    if !(mean_distance > f64::EPSILON) {
        return None;
    }

    let s = SQRT_2 / mean_distance;
    Some(Matrix3::new(
        s,
        0.,
        -s * centroid.x,
        0.,
        s,
        -s * centroid.y,
        0.,
        0.,
        1.,
    ))
}

/// Estimates the homography `H` with `dst ~ H src` by the normalized direct linear transform.
///
/// The solution is the eigenvector of `AᵀA` with the smallest eigenvalue, which is the same as the
/// last right singular vector of `A` but avoids a thin SVD that would drop it when `A` has fewer
/// rows than columns. The result is scaled so that `H[(2, 2)] = 1`.
///
/// Returns `None` for fewer than four correspondences, for degenerate point sets, and when the
/// source origin maps to infinity.
pub(crate) fn find_homography(src: &[Point2<f64>], dst: &[Point2<f64>]) -> Option<Matrix3<f64>> {
    if src.len() < 4 || src.len() != dst.len() {
        return None;
    }
    let t_src = conditioning(src)?;
    let t_dst = conditioning(dst)?;

    let mut ata = SMatrix::<f64, 9, 9>::zeros();
    for (s, d) in src.iter().zip(dst) {
        let s = t_src.transform_point(s);
        let d = t_dst.transform_point(d);
        let rows = [
            [-s.x, -s.y, -1., 0., 0., 0., d.x * s.x, d.x * s.y, d.x],
            [0., 0., 0., -s.x, -s.y, -1., d.y * s.x, d.y * s.y, d.y],
        ];
        for row in rows {
            let a = SVector::<f64, 9>::from_column_slice(&row);
            ata += a * a.transpose();
        }
    }

    let eigen = ata.symmetric_eigen();
    let (smallest, _) = eigen
        .eigenvalues
        .iter()
        .enumerate()
        .min_by(|a, b| a.1.total_cmp(b.1))?;
    let h = eigen.eigenvectors.column(smallest);
    let conditioned = Matrix3::new(h[0], h[1], h[2], h[3], h[4], h[5], h[6], h[7], h[8]);

    let homography = t_dst.try_inverse()? * conditioned * t_src;
    let scale = homography[(2, 2)];
    if !(scale.abs() > 1e-12) || homography.iter().any(|v| !v.is_finite()) {
        return None;
    }
    Some(homography / scale)
}

#[cfg(test)]
mod tests {
    use super::find_homography;
    use approx::assert_relative_eq;
    use nalgebra::{Matrix3, Point2};

    #[test]
    fn recovers_exact_homography() {
        let truth = Matrix3::new(1.2, 0.1, 0.3, -0.05, 0.9, -0.2, 0.02, 0.01, 1.);
        let src = [
            Point2::new(-1., -1.),
            Point2::new(1., -1.),
            Point2::new(1., 1.),
            Point2::new(-1., 1.),
            Point2::new(0.3, 0.2),
        ];
        let dst: Vec<_> = src.iter().map(|p| truth.transform_point(p)).collect();
        let h = find_homography(&src, &dst).expect("well-posed");
        assert_relative_eq!(h, truth, epsilon = 1e-9);
    }

    #[test]
    fn rejects_degenerate_input() {
        let same = [Point2::new(1., 1.); 4];
        let other = [
            Point2::new(0., 0.),
            Point2::new(1., 0.),
            Point2::new(1., 1.),
            Point2::new(0., 1.),
        ];
        assert!(find_homography(&same, &other).is_none());
        assert!(find_homography(&other[..3], &other[..3]).is_none());
    }
}
