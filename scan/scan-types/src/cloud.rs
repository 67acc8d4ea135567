//! Paired scanner clouds and random point access.

use crate::point::{Point, Side};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Random access to the points of a cloud.
///
/// Meshes resolve their faces through this trait, so any cloud
/// representation that can answer "how many" and "which one" can back a
/// mesh export.
pub trait PointSource {
    /// Number of points.
    fn point_count(&self) -> usize;

    /// Get a point by index.
    ///
    /// Returns `None` if the index is out of bounds.
    fn point(&self, index: usize) -> Option<Point>;
}

impl PointSource for [Point] {
    fn point_count(&self) -> usize {
        self.len()
    }

    fn point(&self, index: usize) -> Option<Point> {
        self.get(index).copied()
    }
}

impl PointSource for Vec<Point> {
    fn point_count(&self) -> usize {
        self.len()
    }

    fn point(&self, index: usize) -> Option<Point> {
        self.get(index).copied()
    }
}

/// Left and right sample sequences from one scan, not yet merged.
///
/// This is the shape a raw upload produces. Transforms keep the two sides
/// apart and preserve point order within each side.
///
/// # Example
///
/// ```
/// use scan_types::{PairedCloud, Point, Side};
///
/// let cloud = PairedCloud::from_sides(
///     vec![Point::from_coords(0.0, 0.0, 0.0)],
///     vec![Point::from_coords(1.0, 0.0, 0.0), Point::from_coords(2.0, 0.0, 0.0)],
/// );
///
/// assert_eq!(cloud.side(Side::Right).len(), 2);
/// assert_eq!(cloud.counts(), (1, 2));
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PairedCloud {
    /// Samples from the left camera.
    pub left: Vec<Point>,
    /// Samples from the right camera.
    pub right: Vec<Point>,
}

impl PairedCloud {
    /// Create an empty paired cloud.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            left: Vec::new(),
            right: Vec::new(),
        }
    }

    /// Create a paired cloud from its two sides.
    #[must_use]
    pub const fn from_sides(left: Vec<Point>, right: Vec<Point>) -> Self {
        Self { left, right }
    }

    /// Points of one side.
    #[must_use]
    pub fn side(&self, side: Side) -> &[Point] {
        match side {
            Side::Left => &self.left,
            Side::Right => &self.right,
        }
    }

    /// Mutable points of one side.
    pub fn side_mut(&mut self, side: Side) -> &mut Vec<Point> {
        match side {
            Side::Left => &mut self.left,
            Side::Right => &mut self.right,
        }
    }

    /// Point counts as `(left, right)`.
    #[must_use]
    pub fn counts(&self) -> (usize, usize) {
        (self.left.len(), self.right.len())
    }

    /// Total number of points over both sides.
    #[must_use]
    pub fn len(&self) -> usize {
        self.left.len() + self.right.len()
    }

    /// Returns true if neither side has points.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.left.is_empty() && self.right.is_empty()
    }

    /// Iterate over all points, left side first.
    pub fn iter(&self) -> impl Iterator<Item = &Point> {
        self.left.iter().chain(self.right.iter())
    }

    /// Build a new paired cloud by applying `f` to each side independently.
    ///
    /// The closure receives the side and its points; `self` is not modified.
    ///
    /// # Example
    ///
    /// ```
    /// use scan_types::{PairedCloud, Point};
    ///
    /// let cloud = PairedCloud::from_sides(
    ///     vec![Point::from_coords(-1.0, 0.0, 0.0), Point::from_coords(1.0, 0.0, 0.0)],
    ///     vec![Point::from_coords(2.0, 0.0, 0.0)],
    /// );
    /// let positive = cloud.map_sides(|_, points| {
    ///     points.iter().copied().filter(|p| p.x() > 0.0).collect()
    /// });
    ///
    /// assert_eq!(positive.counts(), (1, 1));
    /// ```
    #[must_use]
    pub fn map_sides<F>(&self, mut f: F) -> Self
    where
        F: FnMut(Side, &[Point]) -> Vec<Point>,
    {
        Self {
            left: f(Side::Left, &self.left),
            right: f(Side::Right, &self.right),
        }
    }

    /// Merge both sides into one sequence, left side first.
    #[must_use]
    pub fn merged(&self) -> Vec<Point> {
        self.iter().copied().collect()
    }
}

impl PointSource for PairedCloud {
    fn point_count(&self) -> usize {
        self.len()
    }

    /// Indexes the merged sequence: left points first, then right.
    fn point(&self, index: usize) -> Option<Point> {
        if index < self.left.len() {
            self.left.get(index).copied()
        } else {
            self.right.get(index - self.left.len()).copied()
        }
    }
}
