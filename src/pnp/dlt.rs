use nalgebra::{
    Isometry3, Matrix3, Point2, Rotation3, SMatrix, SVector, Translation3, UnitQuaternion, Vector3,
};

/// Fewest correspondences the linear solve is determined for.
pub(crate) const MIN_POINTS: usize = 6;

/// Linear pose from six or more non-coplanar points, via the direct linear transform.
///
/// Solves for the 3×4 projection matrix in normalized image coordinates, then projects its left
/// block onto SO(3). The result is only as good as a linear method gets under noise, and is meant
/// to seed an iterative refinement.
pub(crate) fn solve(object: &[Vector3<f64>], normalized: &[Point2<f64>]) -> Option<Isometry3<f64>> {
    if object.len() < MIN_POINTS || object.len() != normalized.len() {
        return None;
    }

    // condition the object points: centroid at the origin, mean distance √3
    let n = object.len() as f64;
    let centroid = object.iter().sum::<Vector3<f64>>() / n;
    let mean_distance = object.iter().map(|p| (p - centroid).norm()).sum::<f64>() / n;
    if !(mean_distance > f64::EPSILON) {
        return None;
    }
    let scale = 3f64.sqrt() / mean_distance;

    let mut ata = SMatrix::<f64, 12, 12>::zeros();
    for (p, m) in object.iter().zip(normalized) {
        let x = (p - centroid) * scale;
        let rows = [
            [
                x.x, x.y, x.z, 1., 0., 0., 0., 0., -m.x * x.x, -m.x * x.y, -m.x * x.z, -m.x,
            ],
            [
                0., 0., 0., 0., x.x, x.y, x.z, 1., -m.y * x.x, -m.y * x.y, -m.y * x.z, -m.y,
            ],
        ];
        for row in rows {
            let a = SVector::<f64, 12>::from_column_slice(&row);
            ata += a * a.transpose();
        }
    }

    let eigen = ata.symmetric_eigen();
    let (smallest, _) = eigen
        .eigenvalues
        .iter()
        .enumerate()
        .min_by(|a, b| a.1.total_cmp(b.1))?;
    let p = eigen.eigenvectors.column(smallest);

    // undo the conditioning: P = P' [s I, -s c; 0, 1]
    let mut m = Matrix3::new(p[0], p[1], p[2], p[4], p[5], p[6], p[8], p[9], p[10]) * scale;
    let mut last = Vector3::new(p[3], p[7], p[11]) - m * centroid;

    if m.determinant() < 0. {
        m = -m;
        last = -last;
    }

    let svd = m.svd(true, true);
    let (u, v_t) = (svd.u?, svd.v_t?);
    let rotation = u * v_t;
    if rotation.determinant() < 0. {
        return None;
    }
    let lambda = svd.singular_values.sum() / 3.;
    if !(lambda > f64::EPSILON) {
        return None;
    }
    let translation = last / lambda;

    Some(Isometry3::from_parts(
        Translation3::from(translation),
        UnitQuaternion::from_rotation_matrix(&Rotation3::from_matrix_unchecked(rotation)),
    ))
}
