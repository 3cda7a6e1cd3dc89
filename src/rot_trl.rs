use crate::pose::Pose3d;
use crate::rotation::Rotation3d;
use crate::transform::Transform3d;
use crate::translation::Translation3d;

#[cfg(any(test, feature = "approx"))]
use approx::{AbsDiffEq, RelativeEq};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A point-mapping transform that first rotates and then translates, `p' = R p + t`.
///
/// Unlike [`Transform3d`], which moves a _pose_ in its own frame, this maps _points_ between two
/// reference frames. The two are easily confused, so the constructors name the frames involved:
///
/// - [`RotTrlTransform3d::between`] maps points attached to `initial` to the same points attached
///   to `last`;
/// - [`RotTrlTransform3d::make_relative_to`] maps points in the reference frame into the frame of
///   a pose (eg, field points into a camera's frame); and
/// - [`RotTrlTransform3d::new`] with a pose's rotation and translation maps points in that pose's
///   frame out into the reference frame (eg, a tag's corners onto the field).
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RotTrlTransform3d {
    rotation: Rotation3d,
    translation: Translation3d,
}

impl RotTrlTransform3d {
    /// Constructs the transform `p' = R p + t`.
    #[must_use]
    pub const fn new(rotation: Rotation3d, translation: Translation3d) -> Self {
        Self {
            rotation,
            translation,
        }
    }

    #[must_use]
    pub const fn identity() -> Self {
        Self::new(Rotation3d::identity(), Translation3d::zero())
    }

    /// Constructs the transform that carries `initial` onto `last`.
    ///
    /// A point rigidly attached to `initial` ends up at the same spot relative to `last`, and
    /// `apply_pose(initial) == last`.
    #[must_use]
    pub fn between(initial: &Pose3d, last: &Pose3d) -> Self {
        // R = R_last R_initialᵀ
        let rotation = initial.rotation().unary_minus().plus(&last.rotation());
        let translation = last
            .translation()
            .minus(&initial.translation().rotate_by(&rotation));
        Self::new(rotation, translation)
    }

    /// Interprets a [`Transform3d`] as "rotate by its rotation, then translate by its
    /// translation".
    #[must_use]
    pub fn from_transform(transform: &Transform3d) -> Self {
        Self::new(transform.rotation(), transform.translation())
    }

    /// Constructs the transform that maps points in the reference frame into the frame of `pose`.
    #[must_use]
    pub fn make_relative_to(pose: &Pose3d) -> Self {
        Self::new(pose.rotation(), pose.translation()).inverse()
    }

    #[must_use]
    pub fn rotation(&self) -> Rotation3d {
        self.rotation
    }

    #[must_use]
    pub fn translation(&self) -> Translation3d {
        self.translation
    }

    /// The transform that maps points back, `p = Rᵀ (p' - t)`.
    #[must_use]
    pub fn inverse(&self) -> Self {
        let inverse_rotation = self.rotation.unary_minus();
        let inverse_translation = self.translation.rotate_by(&inverse_rotation).unary_minus();
        Self::new(inverse_rotation, inverse_translation)
    }

    /// Returns the transform that applies `self` and then `next`.
    #[must_use]
    pub fn then(&self, next: &Self) -> Self {
        Self::new(
            self.rotation.plus(&next.rotation),
            next.apply_translation(&self.translation),
        )
    }

    /// The same rotation and translation packaged as a [`Transform3d`].
    ///
    /// This is exactly the pose of the origin of the source frame when seen from the target
    /// frame.
    #[must_use]
    pub fn to_transform(&self) -> Transform3d {
        Transform3d::new(self.translation, self.rotation)
    }

    #[must_use]
    pub fn apply_translation(&self, translation: &Translation3d) -> Translation3d {
        translation.rotate_by(&self.rotation).plus(&self.translation)
    }

    #[must_use]
    pub fn apply_rotation(&self, rotation: &Rotation3d) -> Rotation3d {
        rotation.plus(&self.rotation)
    }

    #[must_use]
    pub fn apply_pose(&self, pose: &Pose3d) -> Pose3d {
        Pose3d::new(
            self.apply_translation(&pose.translation()),
            self.apply_rotation(&pose.rotation()),
        )
    }

    #[must_use]
    pub fn apply_translations(&self, translations: &[Translation3d]) -> Vec<Translation3d> {
        translations
            .iter()
            .map(|t| self.apply_translation(t))
            .collect()
    }

    #[must_use]
    pub fn apply_poses(&self, poses: &[Pose3d]) -> Vec<Pose3d> {
        poses.iter().map(|p| self.apply_pose(p)).collect()
    }
}

#[cfg(any(test, feature = "approx"))]
impl AbsDiffEq<Self> for RotTrlTransform3d {
    type Epsilon = <f64 as AbsDiffEq>::Epsilon;

    fn default_epsilon() -> Self::Epsilon {
        f64::default_epsilon()
    }

    fn abs_diff_eq(&self, other: &Self, epsilon: Self::Epsilon) -> bool {
        self.rotation.abs_diff_eq(&other.rotation, epsilon)
            && self.translation.abs_diff_eq(&other.translation, epsilon)
    }
}

#[cfg(any(test, feature = "approx"))]
impl RelativeEq for RotTrlTransform3d {
    fn default_max_relative() -> Self::Epsilon {
        f64::default_max_relative()
    }

    fn relative_eq(
        &self,
        other: &Self,
        epsilon: Self::Epsilon,
        max_relative: Self::Epsilon,
    ) -> bool {
        self.rotation
            .relative_eq(&other.rotation, epsilon, max_relative)
            && self
                .translation
                .relative_eq(&other.translation, epsilon, max_relative)
    }
}

#[cfg(test)]
mod tests {
    use super::RotTrlTransform3d;
    use crate::pose::Pose3d;
    use crate::rotation::Rotation3d;
    use crate::translation::Translation3d;
    use approx::assert_relative_eq;
    use quickcheck::quickcheck;
    use uom::si::angle::degree;
    use uom::si::f64::Angle;

    fn d(deg: f64) -> Angle {
        Angle::new::<degree>(deg)
    }

    #[test]
    fn between_carries_initial_onto_last() {
        let initial = Pose3d::new(
            Translation3d::new(1., 0., 0.),
            Rotation3d::new(d(0.), d(0.), d(90.)),
        );
        let last = Pose3d::new(
            Translation3d::new(-2., 3., 1.),
            Rotation3d::new(d(20.), d(-10.), d(-45.)),
        );
        let t = RotTrlTransform3d::between(&initial, &last);
        assert_relative_eq!(t.apply_pose(&initial), last, epsilon = 1e-12);

        // a point one meter ahead of initial is one meter ahead of last afterwards
        let ahead = Translation3d::new(1., 0., 0.);
        assert_relative_eq!(
            t.apply_translation(&initial.translation().plus(&ahead.rotate_by(&initial.rotation()))),
            last.translation().plus(&ahead.rotate_by(&last.rotation())),
            epsilon = 1e-12
        );
    }

    #[test]
    fn make_relative_to_puts_points_in_pose_frame() {
        let camera = Pose3d::new(
            Translation3d::new(0., 0., 1.),
            Rotation3d::new(d(0.), d(0.), d(90.)),
        );
        let to_camera = RotTrlTransform3d::make_relative_to(&camera);
        // 2 m along +y on the field is 2 m straight ahead of the camera
        assert_relative_eq!(
            to_camera.apply_translation(&Translation3d::new(0., 2., 1.)),
            Translation3d::new(2., 0., 0.),
            epsilon = 1e-12
        );
        assert_relative_eq!(to_camera.apply_pose(&camera), Pose3d::identity(), epsilon = 1e-12);
    }

    #[test]
    fn apply_many() {
        let t = RotTrlTransform3d::new(
            Rotation3d::new(d(0.), d(0.), d(180.)),
            Translation3d::new(1., 0., 0.),
        );
        let out = t.apply_translations(&[Translation3d::new(1., 0., 0.), Translation3d::zero()]);
        assert_relative_eq!(out[0], Translation3d::zero(), epsilon = 1e-12);
        assert_relative_eq!(out[1], Translation3d::new(1., 0., 0.), epsilon = 1e-12);

        let poses = t.apply_poses(&[Pose3d::identity()]);
        assert_relative_eq!(
            poses[0],
            Pose3d::new(Translation3d::new(1., 0., 0.), Rotation3d::new(d(0.), d(0.), d(180.))),
            epsilon = 1e-12
        );
    }

    #[test]
    fn to_transform_is_pose_of_source_origin() {
        let pose = Pose3d::new(
            Translation3d::new(3., -1., 0.5),
            Rotation3d::new(d(0.), d(15.), d(60.)),
        );
        let t = RotTrlTransform3d::make_relative_to(&pose);
        // the field origin, as seen from the pose
        assert_relative_eq!(
            Pose3d::from(t.to_transform()),
            Pose3d::identity().relative_to(&pose),
            epsilon = 1e-12
        );
    }

    quickcheck! {
        fn inverse_undoes_apply(pose: Pose3d, point: Pose3d) -> bool {
            let t = RotTrlTransform3d::new(pose.rotation(), pose.translation());
            let p = point.translation();
            approx::relative_eq!(t.inverse().apply_translation(&t.apply_translation(&p)), p, epsilon = 1e-9)
        }

        fn then_matches_sequential_application(a: Pose3d, b: Pose3d, point: Pose3d) -> bool {
            let ta = RotTrlTransform3d::new(a.rotation(), a.translation());
            let tb = RotTrlTransform3d::new(b.rotation(), b.translation());
            let p = point.translation();
            approx::relative_eq!(
                ta.then(&tb).apply_translation(&p),
                tb.apply_translation(&ta.apply_translation(&p)),
                epsilon = 1e-9
            )
        }
    }
}
