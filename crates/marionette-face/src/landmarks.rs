//! Landmark sets and the named point table
//!
//! Points follow the iBUG 300-W 68-point convention. Left and right are the
//! subject's own: the left eye appears on the right of a non-mirrored image.

use marionette_core::{MarionetteError, MarionetteResult};

/// Points per detection in the 68-point layout
pub const LANDMARK_COUNT: usize = 68;

/// A single detected 2-D landmark
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Point2 {
    pub x: f32,
    pub y: f32,
}

impl Point2 {
    #[inline]
    pub fn new(x: f32, y: f32) -> Self {
        Point2 { x, y }
    }

    /// Euclidean distance
    #[inline]
    pub fn distance(&self, other: &Point2) -> f32 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    #[inline]
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl From<(f32, f32)> for Point2 {
    fn from((x, y): (f32, f32)) -> Self {
        Point2 { x, y }
    }
}

/// Semantic landmark names used by the ratio calculator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LandmarkPoint {
    // Right eye (subject's right)
    RightEyeOuterCorner,
    RightEyeUpperOuter,
    RightEyeUpperInner,
    RightEyeInnerCorner,
    RightEyeLowerInner,
    RightEyeLowerOuter,

    // Left eye
    LeftEyeInnerCorner,
    LeftEyeUpperInner,
    LeftEyeUpperOuter,
    LeftEyeOuterCorner,
    LeftEyeLowerOuter,
    LeftEyeLowerInner,

    // Inner lip contour
    MouthInnerRightCorner,
    MouthInnerUpperRight,
    MouthInnerUpperCenter,
    MouthInnerUpperLeft,
    MouthInnerLeftCorner,
    MouthInnerLowerLeft,
    MouthInnerLowerCenter,
    MouthInnerLowerRight,
}

impl LandmarkPoint {
    pub const ALL: [LandmarkPoint; 20] = [
        LandmarkPoint::RightEyeOuterCorner,
        LandmarkPoint::RightEyeUpperOuter,
        LandmarkPoint::RightEyeUpperInner,
        LandmarkPoint::RightEyeInnerCorner,
        LandmarkPoint::RightEyeLowerInner,
        LandmarkPoint::RightEyeLowerOuter,
        LandmarkPoint::LeftEyeInnerCorner,
        LandmarkPoint::LeftEyeUpperInner,
        LandmarkPoint::LeftEyeUpperOuter,
        LandmarkPoint::LeftEyeOuterCorner,
        LandmarkPoint::LeftEyeLowerOuter,
        LandmarkPoint::LeftEyeLowerInner,
        LandmarkPoint::MouthInnerRightCorner,
        LandmarkPoint::MouthInnerUpperRight,
        LandmarkPoint::MouthInnerUpperCenter,
        LandmarkPoint::MouthInnerUpperLeft,
        LandmarkPoint::MouthInnerLeftCorner,
        LandmarkPoint::MouthInnerLowerLeft,
        LandmarkPoint::MouthInnerLowerCenter,
        LandmarkPoint::MouthInnerLowerRight,
    ];
}

/// Eye contour in EAR order: p1 corner, p2/p3 upper lid, p4 opposite corner,
/// p5/p6 lower lid (p2 faces p6, p3 faces p5)
pub const RIGHT_EYE: [LandmarkPoint; 6] = [
    LandmarkPoint::RightEyeOuterCorner,
    LandmarkPoint::RightEyeUpperOuter,
    LandmarkPoint::RightEyeUpperInner,
    LandmarkPoint::RightEyeInnerCorner,
    LandmarkPoint::RightEyeLowerInner,
    LandmarkPoint::RightEyeLowerOuter,
];

pub const LEFT_EYE: [LandmarkPoint; 6] = [
    LandmarkPoint::LeftEyeInnerCorner,
    LandmarkPoint::LeftEyeUpperInner,
    LandmarkPoint::LeftEyeUpperOuter,
    LandmarkPoint::LeftEyeOuterCorner,
    LandmarkPoint::LeftEyeLowerOuter,
    LandmarkPoint::LeftEyeLowerInner,
];

/// Inner mouth in MAR order: p1 corner, p2..p4 upper lip, p5 opposite corner,
/// p6..p8 lower lip (p2 faces p8, p3 faces p7, p4 faces p6)
pub const INNER_MOUTH: [LandmarkPoint; 8] = [
    LandmarkPoint::MouthInnerRightCorner,
    LandmarkPoint::MouthInnerUpperRight,
    LandmarkPoint::MouthInnerUpperCenter,
    LandmarkPoint::MouthInnerUpperLeft,
    LandmarkPoint::MouthInnerLeftCorner,
    LandmarkPoint::MouthInnerLowerLeft,
    LandmarkPoint::MouthInnerLowerCenter,
    LandmarkPoint::MouthInnerLowerRight,
];

/// Index table for one landmark model
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LandmarkLayout {
    /// Model identifier
    pub name: &'static str,
    /// Points per detection
    pub point_count: usize,
    indices: [usize; 20],
}

impl LandmarkLayout {
    /// iBUG 300-W 68-point layout
    pub const IBUG_68: LandmarkLayout = LandmarkLayout {
        name: "ibug-300w-68",
        point_count: LANDMARK_COUNT,
        indices: [
            36, 37, 38, 39, 40, 41, // right eye
            42, 43, 44, 45, 46, 47, // left eye
            60, 61, 62, 63, 64, 65, 66, 67, // inner mouth
        ],
    };

    /// Build a layout from an explicit table, in [`LandmarkPoint::ALL`] order
    pub fn custom(name: &'static str, point_count: usize, indices: [usize; 20]) -> Self {
        LandmarkLayout {
            name,
            point_count,
            indices,
        }
    }

    /// Index of a named point
    #[inline]
    pub fn index(&self, point: LandmarkPoint) -> usize {
        self.indices[point as usize]
    }

    /// Check the table once: indices in bounds, no point named twice,
    /// and the point count matches what a [`LandmarkSet`] carries
    pub fn validate(&self) -> MarionetteResult<()> {
        if self.point_count != LANDMARK_COUNT {
            return Err(MarionetteError::InvalidConfig(format!(
                "landmark layout {} has {} points, expected {}",
                self.name, self.point_count, LANDMARK_COUNT
            )));
        }

        for (i, &idx) in self.indices.iter().enumerate() {
            if idx >= self.point_count {
                return Err(MarionetteError::InvalidConfig(format!(
                    "landmark layout {}: {:?} index {} out of range",
                    self.name,
                    LandmarkPoint::ALL[i],
                    idx
                )));
            }
            if self.indices[..i].contains(&idx) {
                return Err(MarionetteError::InvalidConfig(format!(
                    "landmark layout {}: index {} assigned twice",
                    self.name, idx
                )));
            }
        }

        Ok(())
    }
}

impl Default for LandmarkLayout {
    fn default() -> Self {
        Self::IBUG_68
    }
}

/// Exactly [`LANDMARK_COUNT`] points from one detection event
#[derive(Debug, Clone, PartialEq)]
pub struct LandmarkSet {
    points: [Point2; LANDMARK_COUNT],
}

impl LandmarkSet {
    /// Build from a detector frame; any other length is rejected
    pub fn from_slice(points: &[Point2]) -> MarionetteResult<Self> {
        let points: [Point2; LANDMARK_COUNT] =
            points
                .try_into()
                .map_err(|_| MarionetteError::InvalidLandmarkCount {
                    expected: LANDMARK_COUNT,
                    actual: points.len(),
                })?;
        Ok(LandmarkSet { points })
    }

    /// Every point at `point`; a starting frame for synthetic faces
    pub fn filled(point: Point2) -> Self {
        LandmarkSet {
            points: [point; LANDMARK_COUNT],
        }
    }

    /// Build from `(x, y)` pairs
    pub fn from_pairs(pairs: &[(f32, f32)]) -> MarionetteResult<Self> {
        let points: Vec<Point2> = pairs.iter().copied().map(Point2::from).collect();
        Self::from_slice(&points)
    }

    #[inline]
    pub fn points(&self) -> &[Point2; LANDMARK_COUNT] {
        &self.points
    }

    #[inline]
    pub fn point(&self, layout: &LandmarkLayout, name: LandmarkPoint) -> Point2 {
        self.points[layout.index(name)]
    }

    /// Gather a named contour
    pub fn contour<const N: usize>(
        &self,
        layout: &LandmarkLayout,
        names: &[LandmarkPoint; N],
    ) -> [Point2; N] {
        names.map(|name| self.point(layout, name))
    }

    /// Mutable access for building synthetic faces
    #[inline]
    pub fn set(&mut self, layout: &LandmarkLayout, name: LandmarkPoint, point: Point2) {
        self.points[layout.index(name)] = point;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ibug_layout_valid() {
        assert!(LandmarkLayout::IBUG_68.validate().is_ok());
        assert_eq!(
            LandmarkLayout::IBUG_68.index(LandmarkPoint::LeftEyeOuterCorner),
            45
        );
        assert_eq!(
            LandmarkLayout::IBUG_68.index(LandmarkPoint::MouthInnerLowerRight),
            67
        );
    }

    #[test]
    fn test_layout_rejects_out_of_range() {
        let mut indices = LandmarkLayout::IBUG_68.indices;
        indices[3] = 68;
        let layout = LandmarkLayout::custom("broken", LANDMARK_COUNT, indices);
        assert!(matches!(
            layout.validate(),
            Err(MarionetteError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_layout_rejects_duplicates() {
        let mut indices = LandmarkLayout::IBUG_68.indices;
        indices[1] = indices[0];
        let layout = LandmarkLayout::custom("dup", LANDMARK_COUNT, indices);
        assert!(layout.validate().is_err());
    }

    #[test]
    fn test_layout_rejects_other_models() {
        let layout = LandmarkLayout::custom("mediapipe", 468, LandmarkLayout::IBUG_68.indices);
        assert!(layout.validate().is_err());
    }

    #[test]
    fn test_landmark_set_count() {
        let ok = vec![Point2::default(); LANDMARK_COUNT];
        assert!(LandmarkSet::from_slice(&ok).is_ok());

        let short = vec![Point2::default(); 67];
        assert_eq!(
            LandmarkSet::from_slice(&short),
            Err(MarionetteError::InvalidLandmarkCount {
                expected: 68,
                actual: 67
            })
        );

        assert!(LandmarkSet::from_pairs(&[(0.0, 0.0); 69]).is_err());
    }

    #[test]
    fn test_contour_order() {
        let pairs: Vec<(f32, f32)> = (0..LANDMARK_COUNT).map(|i| (i as f32, 0.0)).collect();
        let set = LandmarkSet::from_pairs(&pairs).unwrap();
        let eye = set.contour(&LandmarkLayout::IBUG_68, &RIGHT_EYE);
        let xs: Vec<f32> = eye.iter().map(|p| p.x).collect();
        assert_eq!(xs, vec![36.0, 37.0, 38.0, 39.0, 40.0, 41.0]);
    }

    #[test]
    fn test_point_distance() {
        let a = Point2::new(0.0, 0.0);
        let b = Point2::new(3.0, 4.0);
        assert!((a.distance(&b) - 5.0).abs() < 1e-6);
    }
}
