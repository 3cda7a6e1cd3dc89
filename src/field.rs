//! Where the landmarks are, and what a camera saw of them.

use crate::pose::Pose3d;
use nalgebra::Point2;
use std::collections::HashMap;
use uom::si::f64::Length;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A fiducial with a known identifier at a known field pose.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AprilTag {
    #[cfg_attr(feature = "serde", serde(rename = "ID"))]
    pub id: i32,
    pub pose: Pose3d,
}

/// The size of the field the layout is expressed in.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FieldDimensions {
    #[cfg_attr(feature = "serde", serde(with = "meters"))]
    pub length: Length,
    #[cfg_attr(feature = "serde", serde(with = "meters"))]
    pub width: Length,
}

/// The known landmarks of a field, by identifier.
///
/// Layouts are loaded once and then only read. With the `serde` feature, they (de)serialize in
/// the shape of the usual JSON field layout files:
///
/// ```
/// # #[cfg(feature = "serde")] {
/// # use tagpose::FieldLayout;
/// let json = r#"{
///   "tags": [{
///     "ID": 7,
///     "pose": {
///       "translation": {"x": 1.0, "y": 2.0, "z": 0.5},
///       "rotation": {"quaternion": {"W": 1.0, "X": 0.0, "Y": 0.0, "Z": 0.0}}
///     }
///   }],
///   "field": {"length": 16.54, "width": 8.21}
/// }"#;
/// // JSON is YAML, too
/// let layout: FieldLayout = serde_yaml::from_str(json).unwrap();
/// assert_eq!(layout.tag_pose(7).unwrap().x(), 1.0);
/// assert!(layout.tag_pose(8).is_none());
/// # }
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(from = "SerializedLayout", into = "SerializedLayout"))]
pub struct FieldLayout {
    tags: Vec<AprilTag>,
    by_id: HashMap<i32, usize>,
    field: Option<FieldDimensions>,
}

impl FieldLayout {
    /// Builds a layout from a list of tags.
    ///
    /// If an identifier appears more than once, the last tag with it wins lookups.
    #[must_use]
    pub fn new(tags: Vec<AprilTag>, field: Option<FieldDimensions>) -> Self {
        let by_id = tags.iter().enumerate().map(|(i, tag)| (tag.id, i)).collect();
        Self { tags, by_id, field }
    }

    /// All tags, in the order the layout lists them.
    #[must_use]
    pub fn tags(&self) -> &[AprilTag] {
        &self.tags
    }

    #[must_use]
    pub fn tag(&self, id: i32) -> Option<&AprilTag> {
        self.by_id.get(&id).map(|&i| &self.tags[i])
    }

    /// The field pose of the tag with identifier `id`, if the layout has one.
    #[must_use]
    pub fn tag_pose(&self, id: i32) -> Option<Pose3d> {
        self.tag(id).map(|tag| tag.pose)
    }

    #[must_use]
    pub fn field(&self) -> Option<FieldDimensions> {
        self.field
    }
}

#[cfg(feature = "serde")]
#[derive(Serialize, Deserialize)]
struct SerializedLayout {
    tags: Vec<AprilTag>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    field: Option<FieldDimensions>,
}

#[cfg(feature = "serde")]
impl From<SerializedLayout> for FieldLayout {
    fn from(layout: SerializedLayout) -> Self {
        Self::new(layout.tags, layout.field)
    }
}

#[cfg(feature = "serde")]
impl From<FieldLayout> for SerializedLayout {
    fn from(layout: FieldLayout) -> Self {
        Self {
            tags: layout.tags,
            field: layout.field,
        }
    }
}

/// Lengths as plain numbers of meters.
#[cfg(feature = "serde")]
mod meters {
    use serde::{Deserialize, Deserializer, Serializer};
    use uom::si::f64::Length;
    use uom::si::length::meter;

    pub(super) fn serialize<S: Serializer>(
        length: &Length,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(length.get::<meter>())
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Length, D::Error> {
        f64::deserialize(deserializer).map(Length::new::<meter>)
    }
}

/// One detected fiducial in one camera frame.
///
/// `corners` are distorted pixel coordinates, in the vertex order of the
/// [`TargetModel`](crate::TargetModel) the fiducial is solved with.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TagDetection {
    pub id: i32,
    pub corners: Vec<Point2<f64>>,
}

impl TagDetection {
    #[must_use]
    pub fn new(id: i32, corners: Vec<Point2<f64>>) -> Self {
        Self { id, corners }
    }
}

#[cfg(test)]
mod tests {
    use super::{AprilTag, FieldLayout};
    use crate::pose::Pose3d;
    use crate::rotation::Rotation3d;
    use crate::translation::Translation3d;

    fn tag(id: i32, x: f64) -> AprilTag {
        AprilTag {
            id,
            pose: Pose3d::new(Translation3d::new(x, 0., 1.), Rotation3d::identity()),
        }
    }

    #[test]
    fn lookup_by_id() {
        let layout = FieldLayout::new(vec![tag(3, 1.), tag(9, 2.)], None);
        assert_eq!(layout.tags().len(), 2);
        assert_eq!(layout.tag_pose(9).map(|p| p.x()), Some(2.));
        assert_eq!(layout.tag(3), Some(&tag(3, 1.)));
        assert_eq!(layout.tag_pose(4), None);
        assert_eq!(layout.field(), None);
        assert_eq!(FieldLayout::default().tag_pose(3), None);
    }

    #[test]
    fn duplicate_ids_resolve_to_the_last() {
        let layout = FieldLayout::new(vec![tag(3, 1.), tag(3, 5.)], None);
        assert_eq!(layout.tag_pose(3).map(|p| p.x()), Some(5.));
    }

    #[cfg(all(feature = "serde", feature = "approx"))]
    #[test]
    fn reads_layout_json() {
        use uom::si::length::meter;

        let json = r#"{
            "tags": [
                {
                    "ID": 1,
                    "pose": {
                        "translation": {"x": 15.079, "y": 0.246, "z": 1.356},
                        "rotation": {"quaternion": {"W": 0.5, "X": 0.0, "Y": 0.0, "Z": 0.866}}
                    }
                },
                {
                    "ID": 2,
                    "pose": {
                        "translation": {"x": 16.185, "y": 0.884, "z": 1.356},
                        "rotation": {"quaternion": {"W": 1.0, "X": 0.0, "Y": 0.0, "Z": 0.0}}
                    }
                }
            ],
            "field": {"length": 16.541, "width": 8.211}
        }"#;
        let layout: FieldLayout = serde_yaml::from_str(json).expect("valid layout");
        assert_eq!(layout.tags().len(), 2);
        let field = layout.field().expect("has dimensions");
        assert_eq!(field.length.get::<meter>(), 16.541);

        let first = layout.tag_pose(1).expect("tag 1 exists");
        assert_eq!(first.translation(), Translation3d::new(15.079, 0.246, 1.356));
        // the slightly-off quaternion is renormalized on the way in
        assert!((first.rotation().quaternion().norm() - 1.).abs() < 1e-12);

        let again: FieldLayout =
            serde_yaml::from_str(&serde_yaml::to_string(&layout).expect("serializable"))
                .expect("round trips");
        for (a, b) in again.tags().iter().zip(layout.tags()) {
            assert_eq!(a.id, b.id);
            approx::assert_relative_eq!(a.pose, b.pose);
        }
        assert_eq!(again.tags().len(), layout.tags().len());
        assert_eq!(again.field(), layout.field());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn field_dimensions_are_optional() {
        let layout: FieldLayout = serde_yaml::from_str(r#"{"tags": []}"#).expect("valid layout");
        assert!(layout.tags().is_empty());
        assert_eq!(layout.field(), None);
        insta::assert_snapshot!(serde_yaml::to_string(&layout).expect("serializable"), @"tags: []");
    }
}
