use nalgebra::{Isometry3, Matrix6, Point2, Translation3, UnitQuaternion, Vector3, Vector6};

/// How many times the damping may grow within one iteration before giving up on it.
const MAX_DAMPING_ATTEMPTS: usize = 10;

/// Points closer to the camera plane than this (in the units of the object points) are treated
/// as behind the camera.
const MIN_DEPTH: f64 = 1e-9;

/// Levenberg-Marquardt refinement of a camera-from-object pose on SE(3).
///
/// The residual is the difference between projected and observed normalized image points,
/// scaled by the focal lengths so that the cost is (approximately) in squared pixels. Updates are
/// left perturbations `exp(δ) · T` with `δ = (ω, ρ)`.
pub(crate) struct Refiner<'a> {
    object: &'a [Vector3<f64>],
    observed: &'a [Point2<f64>],
    fx: f64,
    fy: f64,
}

impl<'a> Refiner<'a> {
    pub(crate) fn new(
        object: &'a [Vector3<f64>],
        observed: &'a [Point2<f64>],
        fx: f64,
        fy: f64,
    ) -> Self {
        Self {
            object,
            observed,
            fx,
            fy,
        }
    }

    /// Sum of squared residuals, or infinity if any point falls behind the camera.
    pub(crate) fn cost(&self, pose: &Isometry3<f64>) -> f64 {
        let mut cost = 0.;
        for (p, m) in self.object.iter().zip(self.observed) {
            let c = pose.rotation * p + pose.translation.vector;
            if c.z < MIN_DEPTH {
                return f64::INFINITY;
            }
            let ru = self.fx * (c.x / c.z - m.x);
            let rv = self.fy * (c.y / c.z - m.y);
            cost += ru * ru + rv * rv;
        }
        cost
    }

    /// Gauss-Newton normal equations `(JᵀJ, Jᵀr)` at `pose`.
    fn normal_equations(&self, pose: &Isometry3<f64>) -> (Matrix6<f64>, Vector6<f64>) {
        let mut jtj = Matrix6::zeros();
        let mut jtr = Vector6::zeros();
        for (p, m) in self.object.iter().zip(self.observed) {
            let c = pose.rotation * p + pose.translation.vector;
            if c.z < MIN_DEPTH {
                continue;
            }
            let inv_z = 1. / c.z;
            let (x, y) = (c.x * inv_z, c.y * inv_z);

            let ru = self.fx * (x - m.x);
            let rv = self.fy * (y - m.y);
            let ju = Vector6::new(-x * y, 1. + x * x, -y, inv_z, 0., -x * inv_z) * self.fx;
            let jv = Vector6::new(-(1. + y * y), x * y, x, 0., inv_z, -y * inv_z) * self.fy;

            jtj += ju * ju.transpose() + jv * jv.transpose();
            jtr += ju * ru + jv * rv;
        }
        (jtj, jtr)
    }

    /// Refines `initial` for at most `max_iterations` iterations, stopping early once a step
    /// shrinks below `min_step` or no damping yields an improvement.
    ///
    /// Never returns a pose with a higher cost than `initial`.
    pub(crate) fn refine(
        &self,
        initial: Isometry3<f64>,
        max_iterations: u32,
        min_step: f64,
    ) -> Isometry3<f64> {
        let mut pose = initial;
        let mut cost = self.cost(&pose);
        if !cost.is_finite() {
            return pose;
        }

        let mut lambda = 1e-3;
        for iteration in 0..max_iterations {
            let (jtj, jtr) = self.normal_equations(&pose);

            let mut step = None;
            for _ in 0..MAX_DAMPING_ATTEMPTS {
                let mut damped = jtj;
                for i in 0..6 {
                    damped[(i, i)] += lambda * jtj[(i, i)].max(1e-12);
                }
                let Some(delta) = damped.cholesky().map(|c| c.solve(&-jtr)) else {
                    lambda *= 10.;
                    continue;
                };

                let candidate = perturb(&pose, &delta);
                let candidate_cost = self.cost(&candidate);
                if candidate_cost < cost {
                    pose = candidate;
                    cost = candidate_cost;
                    lambda = (lambda / 10.).max(1e-12);
                    step = Some(delta.norm());
                    break;
                }
                lambda *= 10.;
            }

            match step {
                Some(size) if size >= min_step => {}
                _ => {
                    tracing::trace!(iteration, cost, "pose refinement converged");
                    break;
                }
            }
        }
        pose
    }
}

/// `exp(δ) · T` for `δ = (ω, ρ)`, with the rotation applied as a rotation vector.
fn perturb(pose: &Isometry3<f64>, delta: &Vector6<f64>) -> Isometry3<f64> {
    let dr = UnitQuaternion::from_scaled_axis(Vector3::new(delta[0], delta[1], delta[2]));
    let translation = dr * pose.translation.vector + Vector3::new(delta[3], delta[4], delta[5]);
    Isometry3::from_parts(Translation3::from(translation), dr * pose.rotation)
}

#[cfg(test)]
mod tests {
    use super::Refiner;
    use approx::assert_relative_eq;
    use nalgebra::{Isometry3, Point2, Vector3};

    fn scene() -> (Isometry3<f64>, Vec<Vector3<f64>>, Vec<Point2<f64>>) {
        let truth = Isometry3::new(Vector3::new(0.2, 0.1, 3.), Vector3::new(0.1, -0.3, 0.05));
        let object: Vec<_> = [
            (-0.5, -0.5, 0.),
            (0.5, -0.5, 0.),
            (0.5, 0.5, 0.),
            (-0.5, 0.5, 0.),
            (0., 0., 0.4),
            (0.3, -0.2, -0.3),
        ]
        .into_iter()
        .map(|(x, y, z)| Vector3::new(x, y, z))
        .collect();
        let image = object
            .iter()
            .map(|p| {
                let c = truth.rotation * p + truth.translation.vector;
                Point2::new(c.x / c.z, c.y / c.z)
            })
            .collect();
        (truth, object, image)
    }

    #[test]
    fn converges_from_a_perturbed_start() {
        let (truth, object, image) = scene();
        let refiner = Refiner::new(&object, &image, 500., 500.);
        let start = Isometry3::new(
            truth.translation.vector + Vector3::new(0.1, -0.1, 0.3),
            truth.rotation.scaled_axis() + Vector3::new(0.05, 0.05, -0.05),
        );
        let refined = refiner.refine(start, 100, 1e-12);
        assert!(refiner.cost(&refined) < 1e-16);
        assert_relative_eq!(refined.translation.vector, truth.translation.vector, epsilon = 1e-7);
        assert!(refined.rotation.angle_to(&truth.rotation) < 1e-7);
    }

    #[test]
    fn never_gets_worse() {
        let (truth, object, image) = scene();
        let refiner = Refiner::new(&object, &image, 500., 500.);
        let start = Isometry3::new(
            truth.translation.vector + Vector3::new(0.5, 0., 0.),
            truth.rotation.scaled_axis(),
        );
        let after_one = refiner.refine(start, 1, 0.);
        assert!(refiner.cost(&after_one) <= refiner.cost(&start));
        assert_eq!(refiner.refine(start, 0, 0.), start);
    }

    #[test]
    fn leaves_poses_behind_the_camera_alone() {
        let (truth, object, image) = scene();
        let refiner = Refiner::new(&object, &image, 500., 500.);
        let behind = Isometry3::new(-truth.translation.vector, truth.rotation.scaled_axis());
        assert_eq!(refiner.cost(&behind), f64::INFINITY);
        assert_eq!(refiner.refine(behind, 100, 1e-12), behind);
    }
}
