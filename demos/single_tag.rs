//! Synthesizes a frame with one or two tags in view and estimates the camera's field pose from it.
//!
//! Run with `RUST_LOG=tagpose=trace` to see what the solvers are up to.

use nalgebra::Matrix3;
use tagpose::{
    AprilTag, CameraModel, CameraTargetRelation, FieldLayout, Pose3d, RotTrlTransform3d,
    Rotation3d, SolverOptions, TagDetection, TargetModel, Translation3d, VisionEstimator,
};
use tracing_subscriber::EnvFilter;
use uom::si::angle::degree;
use uom::si::f64::Angle;
use uom::si::length::meter;

fn tag(id: i32, x: f64, y: f64, z: f64, yaw: f64) -> AprilTag {
    AprilTag {
        id,
        pose: Pose3d::new(
            Translation3d::new(x, y, z),
            Rotation3d::new(
                Angle::new::<degree>(0.),
                Angle::new::<degree>(0.),
                Angle::new::<degree>(yaw),
            ),
        ),
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let camera = CameraModel::new(
        &Matrix3::new(910., 0., 640., 0., 910., 400., 0., 0., 1.),
        &[0.042, -0.087, 0.0004, -0.0002, 0.011],
    )
    .expect("intrinsics are well-formed");
    let estimator = VisionEstimator::new(camera, SolverOptions::default());

    let layout = FieldLayout::new(
        vec![tag(1, 6., 1.5, 1.4, 180.), tag(2, 6., -1., 0.9, 180.)],
        None,
    );
    let model = TargetModel::april_tag_36h11();

    let truth = Pose3d::new(
        Translation3d::new(1.2, 0.4, 0.6),
        Rotation3d::new(
            Angle::new::<degree>(0.),
            Angle::new::<degree>(-5.),
            Angle::new::<degree>(3.),
        ),
    );
    let world_to_camera = RotTrlTransform3d::make_relative_to(&truth);
    let detect = |tag: &AprilTag| {
        TagDetection::new(
            tag.id,
            camera.project_points(&world_to_camera, &model.field_vertices(&tag.pose)),
        )
    };

    println!("true camera pose: {truth}");
    for visible in [&layout.tags()[..1], layout.tags()] {
        let detections: Vec<_> = visible.iter().map(detect).collect();
        match estimator.estimate(&detections, &layout, &model) {
            Ok(estimate) => {
                println!(
                    "{} tag(s): {} ({:.4} px, ambiguity {:.3})",
                    visible.len(),
                    Pose3d::from(estimate.best),
                    estimate.best_reproj_error,
                    estimate.ambiguity,
                );
                if let Some(alt) = estimate.alt {
                    println!("  alternative: {}", Pose3d::from(alt));
                }
            }
            Err(error) => println!("{} tag(s): no estimate ({error})", visible.len()),
        }
    }

    for tag in layout.tags() {
        let relation = CameraTargetRelation::new(truth, tag.pose);
        println!(
            "tag {}: {:.2} m away, {:.1}° off axis",
            tag.id,
            relation.camera_to_target.distance.get::<meter>(),
            relation.camera_to_target.angle.get::<degree>(),
        );
    }
}
