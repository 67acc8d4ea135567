//! Engine-native dense cloud container.

use nalgebra::{Point3, Vector3};
use scan_types::{Point, PointSource, ScanColor};

/// A dense, engine-owned point cloud.
///
/// Points are stored in double precision with a packed `0x00RRGGBB` color
/// and, once estimated, a unit normal. Callers see the cloud only through
/// push, count and indexed get, which is all the pipeline needs from an
/// engine handle.
///
/// # Example
///
/// ```
/// use scan_engine::EngineCloud;
/// use scan_types::ScanColor;
///
/// let mut cloud = EngineCloud::new();
/// cloud.push_point(1.0, 2.0, 3.0, ScanColor::RED.packed());
///
/// assert_eq!(cloud.len(), 1);
/// let p = cloud.get(0).unwrap();
/// assert_eq!(p.color, ScanColor::RED);
/// assert!(!cloud.has_normals());
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EngineCloud {
    pub(crate) points: Vec<EnginePoint>,
}

/// One point as the engine stores it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct EnginePoint {
    pub(crate) position: Point3<f64>,
    pub(crate) packed_rgb: u32,
    pub(crate) normal: Option<Vector3<f64>>,
}

impl EnginePoint {
    pub(crate) fn coords(&self) -> [f64; 3] {
        [self.position.x, self.position.y, self.position.z]
    }
}

impl EngineCloud {
    /// Creates an empty cloud.
    #[must_use]
    pub const fn new() -> Self {
        Self { points: Vec::new() }
    }

    /// Creates an empty cloud with room for `capacity` points.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            points: Vec::with_capacity(capacity),
        }
    }

    /// Appends a point given its coordinates and a `0x00RRGGBB` color.
    pub fn push_point(&mut self, x: f32, y: f32, z: f32, packed_rgb: u32) {
        self.points.push(EnginePoint {
            position: Point3::new(f64::from(x), f64::from(y), f64::from(z)),
            packed_rgb,
            normal: None,
        });
    }

    /// Appends a scanned sample.
    pub fn push(&mut self, point: &Point) {
        self.push_point(point.x(), point.y(), point.z(), point.color.packed());
    }

    /// Returns the number of points in the cloud.
    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Returns true if the cloud has no points.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Gets a point by index, narrowed back to scan precision.
    ///
    /// Returns `None` if the index is out of bounds.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    // Truncation: positions entered as f32 and are read back as f32
    pub fn get(&self, index: usize) -> Option<Point> {
        self.points.get(index).map(|p| {
            Point::new(
                p.position.x as f32,
                p.position.y as f32,
                p.position.z as f32,
                ScanColor::from_packed(p.packed_rgb),
            )
        })
    }

    /// Gets the estimated normal of a point.
    ///
    /// Returns `None` if the index is out of bounds or normals have not been
    /// estimated.
    #[must_use]
    pub fn normal(&self, index: usize) -> Option<Vector3<f64>> {
        self.points.get(index).and_then(|p| p.normal)
    }

    /// Returns true if every point carries a normal.
    #[must_use]
    pub fn has_normals(&self) -> bool {
        !self.points.is_empty() && self.points.iter().all(|p| p.normal.is_some())
    }

    /// Iterates over all points in index order.
    pub fn iter(&self) -> impl Iterator<Item = Point> + '_ {
        (0..self.points.len()).filter_map(|i| self.get(i))
    }

    /// Returns the centroid of the cloud, or `None` if it is empty.
    #[must_use]
    pub(crate) fn centroid(&self) -> Option<Point3<f64>> {
        if self.points.is_empty() {
            return None;
        }
        let sum: Vector3<f64> = self.points.iter().map(|p| p.position.coords).sum();
        #[allow(clippy::cast_precision_loss)]
        let centroid = sum / self.points.len() as f64;
        Some(Point3::from(centroid))
    }

    /// Builds a new cloud from the points whose mask entry is true.
    pub(crate) fn retain_mask(&self, keep: &[bool]) -> Self {
        let points = self
            .points
            .iter()
            .zip(keep)
            .filter_map(|(p, &k)| k.then_some(*p))
            .collect();
        Self { points }
    }
}

impl PointSource for EngineCloud {
    fn point_count(&self) -> usize {
        self.len()
    }

    fn point(&self, index: usize) -> Option<Point> {
        self.get(index)
    }
}

impl<'a> FromIterator<&'a Point> for EngineCloud {
    fn from_iter<I: IntoIterator<Item = &'a Point>>(iter: I) -> Self {
        let mut cloud = Self::new();
        for point in iter {
            cloud.push(point);
        }
        cloud
    }
}

impl FromIterator<Point> for EngineCloud {
    fn from_iter<I: IntoIterator<Item = Point>>(iter: I) -> Self {
        let mut cloud = Self::new();
        for point in iter {
            cloud.push(&point);
        }
        cloud
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn push_and_get_preserve_values() {
        let mut cloud = EngineCloud::with_capacity(2);
        cloud.push_point(0.1, -2.5, 7.0, 0x0010_2030);
        let p = cloud.get(0).unwrap();

        assert_relative_eq!(p.x(), 0.1);
        assert_relative_eq!(p.y(), -2.5);
        assert_eq!(p.color, ScanColor::new(0x10, 0x20, 0x30));
        assert!(cloud.get(1).is_none());
    }

    #[test]
    fn collect_from_points() {
        let points = vec![
            Point::new(1.0, 0.0, 0.0, ScanColor::WHITE),
            Point::new(2.0, 0.0, 0.0, ScanColor::RED),
        ];
        let cloud: EngineCloud = points.iter().collect();

        assert_eq!(cloud.len(), 2);
        assert_eq!(cloud.iter().collect::<Vec<_>>(), points);
    }

    #[test]
    fn normals_absent_until_estimated() {
        let mut cloud = EngineCloud::new();
        assert!(!cloud.has_normals());
        cloud.push_point(0.0, 0.0, 0.0, 0);
        assert!(!cloud.has_normals());
        assert!(cloud.normal(0).is_none());
    }

    #[test]
    fn centroid_of_two_points() {
        let cloud: EngineCloud = [Point::from_coords(0.0, 0.0, 0.0), Point::from_coords(2.0, 4.0, 6.0)]
            .into_iter()
            .collect();
        let c = cloud.centroid().unwrap();
        assert_relative_eq!(c.x, 1.0);
        assert_relative_eq!(c.y, 2.0);
        assert_relative_eq!(c.z, 3.0);
        assert!(EngineCloud::new().centroid().is_none());
    }

    #[test]
    fn retain_mask_keeps_order() {
        let cloud: EngineCloud = (0..4u8)
            .map(|i| Point::from_coords(f32::from(i), 0.0, 0.0))
            .collect();
        let kept = cloud.retain_mask(&[true, false, true, false]);
        let xs: Vec<f32> = kept.iter().map(|p| p.x()).collect();
        assert_eq!(xs, vec![0.0, 2.0]);
    }
}
